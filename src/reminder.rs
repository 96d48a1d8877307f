//! Reminder due-time resolution
//!
//! Turns the free-form time phrase captured by the reminder rule into an
//! absolute due time and the phrase used in the spoken confirmation.

use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Delay used when the phrase carries no usable amount
const DEFAULT_DELAY_MINUTES: i64 = 5;

lazy_static! {
    static ref AMOUNT: Regex =
        Regex::new(r"(?i)(\d+)\s*(minute|hour)s?").expect("reminder amount pattern must compile");
}

/// When a reminder fires and how the confirmation describes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSchedule {
    pub due: DateTime<Utc>,
    pub phrase: String,
}

/// Resolve a reminder time phrase relative to `now`
pub fn resolve(time_raw: &str, now: DateTime<Utc>) -> ReminderSchedule {
    let fallback = now + Duration::minutes(DEFAULT_DELAY_MINUTES);

    if let Some(caps) = AMOUNT.captures(time_raw) {
        let unit = caps[2].to_lowercase();
        let offset = caps[1]
            .parse::<i64>()
            .ok()
            .and_then(|amount| offset_for(amount, &unit).map(|offset| (amount, offset)));

        return match offset.and_then(|(amount, offset)| {
            now.checked_add_signed(offset).map(|due| (amount, due))
        }) {
            Some((amount, due)) => {
                let plural = if amount > 1 { "s" } else { "" };
                ReminderSchedule {
                    due,
                    phrase: format!("in {amount} {unit}{plural}"),
                }
            }
            None => ReminderSchedule {
                due: fallback,
                phrase: "soon".to_string(),
            },
        };
    }

    let lowered = time_raw.trim().to_lowercase();
    let phrase = if lowered == "later" || lowered == "soon" {
        "soon".to_string()
    } else {
        format!("for {}", time_raw.trim())
    };

    ReminderSchedule {
        due: fallback,
        phrase,
    }
}

fn offset_for(amount: i64, unit: &str) -> Option<Duration> {
    match unit {
        "minute" => Duration::try_minutes(amount),
        "hour" => Duration::try_hours(amount),
        _ => None,
    }
}
