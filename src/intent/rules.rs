//! Ordered intent grammar
//!
//! Rules are evaluated top to bottom against normalized text and the first
//! rule whose pattern matches and whose extractor accepts wins. Several
//! patterns overlap ("play ... on youtube" vs "search ... on youtube",
//! "open youtube" vs "open youtube.com"), so the order of `RULES` is part
//! of the public behavior. Bump `RULE_TABLE_VERSION` whenever a rule is
//! added, removed, reordered, or its pattern changes meaning.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::trace;

use super::command::{Command, Intent, IntentKind};
use super::normalize::normalize;

/// Version of the rule table below
pub const RULE_TABLE_VERSION: u32 = 2;

/// Name the assistant answers to in greetings and farewells
const ASSISTANT_NAME: &str = "trushna";

type Extractor = fn(&Captures<'_>) -> Option<Intent>;

/// A single pattern and the extractor that turns its captures into an intent
pub struct Rule {
    pub name: &'static str,
    pub kind: IntentKind,
    pattern: Regex,
    extract: Extractor,
}

impl Rule {
    fn new(name: &'static str, kind: IntentKind, pattern: &str, extract: Extractor) -> Self {
        Self {
            name,
            kind,
            pattern: Regex::new(pattern).expect("intent rule pattern must compile"),
            extract,
        }
    }

    fn apply(&self, text: &str) -> Option<Intent> {
        let captures = self.pattern.captures(text)?;
        (self.extract)(&captures)
    }
}

lazy_static! {
    static ref RULES: Vec<Rule> = build_rules();
}

fn build_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "generate_image",
            IntentKind::GenerateImage,
            r"^(?:generate|create|draw|make|build|imagine|visualize|img)\s+(?:an?\s+)?(?:image|picture|photo|drawing|illustration|img)s?\s+(?:(?:of|about|showing|depicting)\s+)?(.+)$",
            |c| {
                Some(Intent::GenerateImage {
                    prompt: group(c, 1)?,
                })
            },
        ),
        Rule::new(
            "reminder",
            IntentKind::Reminder,
            r"\bset(?: an?| the)? reminder(?: to)?\s+(.+?)(?:\s+(?:at|in|for)\s+(.+))?$",
            |c| {
                Some(Intent::Reminder {
                    task: group(c, 1)?,
                    time_raw: group(c, 2).unwrap_or_else(|| "later".to_string()),
                })
            },
        ),
        Rule::new(
            "weather",
            IntentKind::Weather,
            r"\bwhat(?:'s| is) the weather(?: like)?(?: in (.+))?",
            |c| {
                Some(Intent::Weather {
                    location: group(c, 1).unwrap_or_else(|| "current location".to_string()),
                })
            },
        ),
        Rule::new(
            "send_message",
            IntentKind::SendMessage,
            r"\bsend (?:a )?message(?: to (.+?))?(?:[.\s]+(?:(?:saying|that says|content|body|text|say)\s+)?(.+))?$",
            |c| {
                Some(Intent::SendMessage {
                    to: group(c, 1),
                    body: group(c, 2),
                })
            },
        ),
        Rule::new(
            "open_youtube",
            IntentKind::OpenYoutube,
            r"^open youtube$",
            |_| Some(Intent::OpenYoutube),
        ),
        Rule::new(
            "play_song_youtube",
            IntentKind::PlaySongYoutube,
            r"^(?:play|stream)\s+(?:song\s+)?(.+?)(?:\s+on\s+youtube)?$",
            |c| {
                Some(Intent::PlaySongYoutube {
                    song_name: group(c, 1)?,
                })
            },
        ),
        Rule::new(
            "search_youtube",
            IntentKind::SearchYoutube,
            r"^search\s+(.+?)\s+on\s+youtube$",
            |c| Some(Intent::SearchYoutube { query: group(c, 1)? }),
        ),
        Rule::new(
            "browser_search",
            IntentKind::BrowserSearch,
            r"^(?:search|find)(?:\s+(?:for|about))?\s+(.+?)(?:\s+on\s+(?:browser|google|web))?$",
            |c| Some(Intent::BrowserSearch { query: group(c, 1)? }),
        ),
        Rule::new(
            "open_gmail",
            IntentKind::OpenGmail,
            r"^open gmail$",
            |_| Some(Intent::OpenGmail),
        ),
        Rule::new(
            "open_google",
            IntentKind::OpenGoogle,
            r"^open google$",
            |_| Some(Intent::OpenGoogle),
        ),
        Rule::new(
            "open_chatgpt",
            IntentKind::OpenChatgpt,
            r"^open chat ?gpt$",
            |_| Some(Intent::OpenChatgpt),
        ),
        Rule::new(
            "open_brave",
            IntentKind::OpenBrave,
            r"^open brave(?: search)?$",
            |_| Some(Intent::OpenBrave),
        ),
        Rule::new(
            "open_instagram",
            IntentKind::OpenInstagram,
            r"^open instagram$",
            |_| Some(Intent::OpenInstagram),
        ),
        Rule::new(
            "open_snapchat",
            IntentKind::OpenSnapchat,
            r"^open snapchat$",
            |_| Some(Intent::OpenSnapchat),
        ),
        Rule::new(
            "open_email",
            IntentKind::OpenEmail,
            r"^open (?:my )?email(?: (?:client|app))?$",
            |_| Some(Intent::OpenEmail),
        ),
        Rule::new(
            "open_url_scheme",
            IntentKind::OpenUrl,
            r"\bopen (?:url |website )?(https?://\S+)",
            |c| Some(Intent::OpenUrl { url: group(c, 1)? }),
        ),
        Rule::new(
            "open_url_bare",
            IntentKind::OpenUrl,
            r"\bopen (?:url |website )?([a-z0-9-]+\.[a-z]{2,}(?:\.[a-z]{2,})?(?:/\S*)?)",
            |c| {
                let token = group(c, 1)?;
                is_bare_domain(&token).then_some(Intent::OpenUrl { url: token })
            },
        ),
        Rule::new(
            "greeting",
            IntentKind::Greeting,
            &format!(
                r"^(?:hi|hello|hey|greetings|good morning|good afternoon|good evening)\b(?:\s+{ASSISTANT_NAME})?"
            ),
            |_| Some(Intent::Greeting),
        ),
        Rule::new(
            "farewell",
            IntentKind::Farewell,
            &format!(r"^(?:bye|goodbye|see you|later|farewell)\b(?:\s+{ASSISTANT_NAME})?"),
            |_| Some(Intent::Farewell),
        ),
        Rule::new(
            "get_time",
            IntentKind::GetTime,
            r"\b(?:what(?:'s|s| is)?(?: the)?|tell me the|current|wats the)\s*time\b|^(?:the )?time(?: now)?$",
            |_| Some(Intent::GetTime),
        ),
        Rule::new(
            "get_date",
            IntentKind::GetDate,
            r"\bwhat(?:'s|s| is)? (?:the )?(?:current )?(?:date|day)\b|\btoday(?:'s|s)?\s*date\b|^(?:the )?(?:current )?date$",
            |_| Some(Intent::GetDate),
        ),
    ]
}

/// Trimmed, non-empty text of a capture group
fn group(captures: &Captures<'_>, index: usize) -> Option<String> {
    captures
        .get(index)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accept "example.com" or "youtube.com/watch", reject "notepad" or "example."
fn is_bare_domain(token: &str) -> bool {
    if !token.contains('.') || token.ends_with('.') {
        return false;
    }
    let host = token.split('/').next().unwrap_or_default();
    let labels: Vec<&str> = host.split('.').collect();
    labels.len() >= 2 && !labels[0].is_empty()
}

/// Classify raw command text into a typed command
///
/// Total and pure: every input yields exactly one command, falling back to
/// `unknown` with the raw text when no rule matches.
pub fn classify(raw: &str) -> Command {
    let text = normalize(raw);

    for rule in RULES.iter() {
        if let Some(intent) = rule.apply(&text) {
            trace!(rule = rule.name, kind = %rule.kind, text = %text, "intent rule matched");
            return Command::new(intent, raw);
        }
    }

    trace!(text = %text, "no intent rule matched");
    Command::new(
        Intent::Unknown {
            command: raw.to_string(),
        },
        raw,
    )
}

/// Names of the rules in evaluation order
pub fn rule_order() -> Vec<&'static str> {
    RULES.iter().map(|rule| rule.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(text: &str) -> IntentKind {
        classify(text).kind()
    }

    #[test]
    fn test_rule_order_is_pinned() {
        assert_eq!(RULE_TABLE_VERSION, 2);
        assert_eq!(
            rule_order(),
            vec![
                "generate_image",
                "reminder",
                "weather",
                "send_message",
                "open_youtube",
                "play_song_youtube",
                "search_youtube",
                "browser_search",
                "open_gmail",
                "open_google",
                "open_chatgpt",
                "open_brave",
                "open_instagram",
                "open_snapchat",
                "open_email",
                "open_url_scheme",
                "open_url_bare",
                "greeting",
                "farewell",
                "get_time",
                "get_date",
            ]
        );
    }

    #[test]
    fn test_rule_kinds_match_extracted_intents() {
        let samples = [
            ("generate_image", "generate image of a cat"),
            ("reminder", "set a reminder to stretch"),
            ("weather", "what's the weather"),
            ("send_message", "send a message to bob saying hi"),
            ("open_youtube", "open youtube"),
            ("play_song_youtube", "play despacito"),
            ("search_youtube", "search cats on youtube"),
            ("browser_search", "find pizza"),
            ("open_gmail", "open gmail"),
            ("open_google", "open google"),
            ("open_chatgpt", "open chatgpt"),
            ("open_brave", "open brave"),
            ("open_instagram", "open instagram"),
            ("open_snapchat", "open snapchat"),
            ("open_email", "open email"),
            ("open_url_scheme", "open https://example.com"),
            ("open_url_bare", "open example.com"),
            ("greeting", "hello"),
            ("farewell", "goodbye"),
            ("get_time", "what time is it"),
            ("get_date", "what's the date"),
        ];

        for (name, text) in samples {
            let rule = RULES.iter().find(|r| r.name == name).unwrap();
            let intent = rule
                .apply(&normalize(text))
                .unwrap_or_else(|| panic!("rule {name} did not accept {text:?}"));
            assert_eq!(intent.kind(), rule.kind, "rule {name}");
        }
    }

    #[test]
    fn test_generate_image() {
        assert_eq!(
            classify("generate image of a sunset over mountains").intent,
            Intent::GenerateImage {
                prompt: "a sunset over mountains".to_string()
            }
        );
        assert_eq!(
            classify("Draw a picture of a cat wearing a hat").intent,
            Intent::GenerateImage {
                prompt: "a cat wearing a hat".to_string()
            }
        );
        assert_eq!(
            classify("create an illustration showing a dragon").intent,
            Intent::GenerateImage {
                prompt: "a dragon".to_string()
            }
        );
        // No prompt, nothing to generate
        assert_eq!(kind_of("make a picture"), IntentKind::Unknown);
    }

    #[test]
    fn test_reminder() {
        assert_eq!(
            classify("set a reminder to call mom in 10 minutes").intent,
            Intent::Reminder {
                task: "call mom".to_string(),
                time_raw: "10 minutes".to_string()
            }
        );
        assert_eq!(
            classify("set a reminder to stretch").intent,
            Intent::Reminder {
                task: "stretch".to_string(),
                time_raw: "later".to_string()
            }
        );
        assert_eq!(
            classify("set the reminder to water plants at 5 pm").intent,
            Intent::Reminder {
                task: "water plants".to_string(),
                time_raw: "5 pm".to_string()
            }
        );
    }

    #[test]
    fn test_weather() {
        assert_eq!(
            classify("What's the weather like in New York?").intent,
            Intent::Weather {
                location: "new york".to_string()
            }
        );
        assert_eq!(
            classify("what is the weather").intent,
            Intent::Weather {
                location: "current location".to_string()
            }
        );
    }

    #[test]
    fn test_send_message() {
        assert_eq!(
            classify("send a message to john saying see you soon").intent,
            Intent::SendMessage {
                to: Some("john".to_string()),
                body: Some("see you soon".to_string())
            }
        );
        assert_eq!(
            classify("send a message to mom").intent,
            Intent::SendMessage {
                to: Some("mom".to_string()),
                body: None
            }
        );
        assert_eq!(
            classify("send message running late").intent,
            Intent::SendMessage {
                to: None,
                body: Some("running late".to_string())
            }
        );
        assert_eq!(
            classify("send message").intent,
            Intent::SendMessage { to: None, body: None }
        );
    }

    #[test]
    fn test_open_youtube_is_exact() {
        assert_eq!(classify("open youtube").intent, Intent::OpenYoutube);
        assert_eq!(classify("Open YouTube.").intent, Intent::OpenYoutube);
        assert_eq!(
            classify("open youtube.com/watch").intent,
            Intent::OpenUrl {
                url: "youtube.com/watch".to_string()
            }
        );
    }

    #[test]
    fn test_youtube_play_and_search() {
        assert_eq!(
            classify("play bohemian rhapsody on youtube").intent,
            Intent::PlaySongYoutube {
                song_name: "bohemian rhapsody".to_string()
            }
        );
        assert_eq!(
            classify("stream song lofi beats").intent,
            Intent::PlaySongYoutube {
                song_name: "lofi beats".to_string()
            }
        );
        assert_eq!(
            classify("search cooking videos on youtube").intent,
            Intent::SearchYoutube {
                query: "cooking videos".to_string()
            }
        );
    }

    #[test]
    fn test_browser_search() {
        assert_eq!(
            classify("search for rust tutorials on google").intent,
            Intent::BrowserSearch {
                query: "rust tutorials".to_string()
            }
        );
        assert_eq!(
            classify("find pizza near me").intent,
            Intent::BrowserSearch {
                query: "pizza near me".to_string()
            }
        );
        assert_eq!(kind_of("searching is fun"), IntentKind::Unknown);
    }

    #[test]
    fn test_site_openers() {
        assert_eq!(kind_of("open gmail"), IntentKind::OpenGmail);
        assert_eq!(kind_of("open google"), IntentKind::OpenGoogle);
        assert_eq!(kind_of("open chat gpt"), IntentKind::OpenChatgpt);
        assert_eq!(kind_of("open brave search"), IntentKind::OpenBrave);
        assert_eq!(kind_of("open instagram"), IntentKind::OpenInstagram);
        assert_eq!(kind_of("open snapchat"), IntentKind::OpenSnapchat);
        assert_eq!(kind_of("open my email client"), IntentKind::OpenEmail);
        assert_eq!(kind_of("open email app"), IntentKind::OpenEmail);
    }

    #[test]
    fn test_open_url() {
        assert_eq!(
            classify("open https://example.com/path?q=1").intent,
            Intent::OpenUrl {
                url: "https://example.com/path?q=1".to_string()
            }
        );
        assert_eq!(
            classify("open website rust-lang.org").intent,
            Intent::OpenUrl {
                url: "rust-lang.org".to_string()
            }
        );
        assert_eq!(kind_of("open notepad"), IntentKind::Unknown);
        assert_eq!(kind_of("open the door"), IntentKind::Unknown);
    }

    #[test]
    fn test_open_url_inside_longer_utterance() {
        for (text, url) in [
            ("please open github.com", "github.com"),
            ("open github.com now", "github.com"),
            ("can you open example.org", "example.org"),
        ] {
            assert_eq!(
                classify(text).intent,
                Intent::OpenUrl {
                    url: url.to_string()
                },
                "{text}"
            );
        }
    }

    #[test]
    fn test_open_url_needs_domain_shape() {
        assert_eq!(kind_of("open v1.2"), IntentKind::Unknown);
        assert_eq!(kind_of("open 3.14"), IntentKind::Unknown);
        assert_eq!(kind_of("reopen github.com"), IntentKind::Unknown);
    }

    #[test]
    fn test_bare_domain_validation() {
        assert!(is_bare_domain("example.com"));
        assert!(is_bare_domain("youtube.com/watch"));
        assert!(!is_bare_domain("example"));
        assert!(!is_bare_domain("example."));
        assert!(!is_bare_domain(".com"));
    }

    #[test]
    fn test_greeting_and_farewell() {
        assert_eq!(kind_of("hello"), IntentKind::Greeting);
        assert_eq!(kind_of("Hey Trushna"), IntentKind::Greeting);
        assert_eq!(kind_of("good morning trushna"), IntentKind::Greeting);
        assert_eq!(kind_of("bye"), IntentKind::Farewell);
        assert_eq!(kind_of("see you later"), IntentKind::Farewell);
        // Leading token must be a whole word
        assert_eq!(kind_of("history of rome"), IntentKind::Unknown);
    }

    #[test]
    fn test_time_and_date() {
        assert_eq!(kind_of("what time is it"), IntentKind::GetTime);
        assert_eq!(kind_of("what's the time now"), IntentKind::GetTime);
        assert_eq!(kind_of("tell me the time"), IntentKind::GetTime);
        assert_eq!(kind_of("time"), IntentKind::GetTime);
        assert_eq!(kind_of("what's the date"), IntentKind::GetDate);
        assert_eq!(kind_of("what is the current date"), IntentKind::GetDate);
        assert_eq!(kind_of("today's date"), IntentKind::GetDate);
        assert_eq!(kind_of("what day is it"), IntentKind::GetDate);
    }

    #[test]
    fn test_priority_order() {
        // generate_image outranks reminder
        assert_eq!(
            kind_of("generate image of someone who set a reminder to run"),
            IntentKind::GenerateImage
        );
        // reminder outranks the youtube rules
        assert_eq!(
            kind_of("set a reminder to search cats on youtube"),
            IntentKind::Reminder
        );
        // search_youtube outranks browser_search
        assert_eq!(kind_of("search cats on youtube"), IntentKind::SearchYoutube);
        // reminder outranks get_time
        assert_eq!(
            kind_of("set a reminder to check the time"),
            IntentKind::Reminder
        );
    }

    #[test]
    fn test_unknown_keeps_raw_text() {
        let command = classify("zzz nonsense zzz");
        assert_eq!(
            command.intent,
            Intent::Unknown {
                command: "zzz nonsense zzz".to_string()
            }
        );

        let command = classify("  Tell Me A JOKE ");
        assert_eq!(
            command.intent,
            Intent::Unknown {
                command: "  Tell Me A JOKE ".to_string()
            }
        );
        assert_eq!(command.original_text, "  Tell Me A JOKE ");
    }

    #[test]
    fn test_classify_is_total() {
        let inputs = [
            "",
            " ",
            "?!.,",
            "日本語のテキスト",
            "ÖFFNE YOUTUBE",
            "open",
            "play",
            "set a reminder",
            "🙂🙂🙂",
        ];

        for input in inputs {
            let command = classify(input);
            assert!(IntentKind::ALL.contains(&command.kind()));
            assert_eq!(command.original_text, input);
        }
        assert_eq!(kind_of(""), IntentKind::Unknown);
    }
}
