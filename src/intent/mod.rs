//! Intent classification for finalized voice commands
//!
//! Maps canonical command text onto a fixed, hand-authored grammar:
//! - `normalize`: canonicalization shared with the wake-word gate
//! - `command`: the closed `IntentKind` set and typed payloads
//! - `rules`: the ordered rule table and the total `classify` function

mod command;
mod normalize;
mod rules;

pub use command::{Command, Intent, IntentKind};
pub use normalize::canonicalize_command;
pub use rules::{classify, rule_order, RULE_TABLE_VERSION};
