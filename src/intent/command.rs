//! Typed commands produced by the classifier

use serde::{Deserialize, Serialize};

/// The closed set of intents the classifier can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Greeting,
    Farewell,
    Reminder,
    Weather,
    SendMessage,
    OpenUrl,
    GetTime,
    GetDate,
    OpenYoutube,
    PlaySongYoutube,
    SearchYoutube,
    BrowserSearch,
    OpenGmail,
    OpenGoogle,
    OpenChatgpt,
    OpenBrave,
    OpenInstagram,
    OpenSnapchat,
    OpenEmail,
    GenerateImage,
    Unknown,
}

impl IntentKind {
    /// Every intent kind, in declaration order
    pub const ALL: [IntentKind; 21] = [
        IntentKind::Greeting,
        IntentKind::Farewell,
        IntentKind::Reminder,
        IntentKind::Weather,
        IntentKind::SendMessage,
        IntentKind::OpenUrl,
        IntentKind::GetTime,
        IntentKind::GetDate,
        IntentKind::OpenYoutube,
        IntentKind::PlaySongYoutube,
        IntentKind::SearchYoutube,
        IntentKind::BrowserSearch,
        IntentKind::OpenGmail,
        IntentKind::OpenGoogle,
        IntentKind::OpenChatgpt,
        IntentKind::OpenBrave,
        IntentKind::OpenInstagram,
        IntentKind::OpenSnapchat,
        IntentKind::OpenEmail,
        IntentKind::GenerateImage,
        IntentKind::Unknown,
    ];

    /// Wire name of the intent
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Greeting => "greeting",
            IntentKind::Farewell => "farewell",
            IntentKind::Reminder => "reminder",
            IntentKind::Weather => "weather",
            IntentKind::SendMessage => "send_message",
            IntentKind::OpenUrl => "open_url",
            IntentKind::GetTime => "get_time",
            IntentKind::GetDate => "get_date",
            IntentKind::OpenYoutube => "open_youtube",
            IntentKind::PlaySongYoutube => "play_song_youtube",
            IntentKind::SearchYoutube => "search_youtube",
            IntentKind::BrowserSearch => "browser_search",
            IntentKind::OpenGmail => "open_gmail",
            IntentKind::OpenGoogle => "open_google",
            IntentKind::OpenChatgpt => "open_chatgpt",
            IntentKind::OpenBrave => "open_brave",
            IntentKind::OpenInstagram => "open_instagram",
            IntentKind::OpenSnapchat => "open_snapchat",
            IntentKind::OpenEmail => "open_email",
            IntentKind::GenerateImage => "generate_image",
            IntentKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An intent together with its extracted parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Farewell,
    Reminder {
        task: String,
        /// Unresolved time phrase, "later" when none was spoken
        time_raw: String,
    },
    Weather {
        location: String,
    },
    SendMessage {
        to: Option<String>,
        body: Option<String>,
    },
    OpenUrl {
        url: String,
    },
    GetTime,
    GetDate,
    OpenYoutube,
    PlaySongYoutube {
        song_name: String,
    },
    SearchYoutube {
        query: String,
    },
    BrowserSearch {
        query: String,
    },
    OpenGmail,
    OpenGoogle,
    OpenChatgpt,
    OpenBrave,
    OpenInstagram,
    OpenSnapchat,
    OpenEmail,
    GenerateImage {
        prompt: String,
    },
    Unknown {
        /// The text exactly as it was handed to the classifier
        command: String,
    },
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Greeting => IntentKind::Greeting,
            Intent::Farewell => IntentKind::Farewell,
            Intent::Reminder { .. } => IntentKind::Reminder,
            Intent::Weather { .. } => IntentKind::Weather,
            Intent::SendMessage { .. } => IntentKind::SendMessage,
            Intent::OpenUrl { .. } => IntentKind::OpenUrl,
            Intent::GetTime => IntentKind::GetTime,
            Intent::GetDate => IntentKind::GetDate,
            Intent::OpenYoutube => IntentKind::OpenYoutube,
            Intent::PlaySongYoutube { .. } => IntentKind::PlaySongYoutube,
            Intent::SearchYoutube { .. } => IntentKind::SearchYoutube,
            Intent::BrowserSearch { .. } => IntentKind::BrowserSearch,
            Intent::OpenGmail => IntentKind::OpenGmail,
            Intent::OpenGoogle => IntentKind::OpenGoogle,
            Intent::OpenChatgpt => IntentKind::OpenChatgpt,
            Intent::OpenBrave => IntentKind::OpenBrave,
            Intent::OpenInstagram => IntentKind::OpenInstagram,
            Intent::OpenSnapchat => IntentKind::OpenSnapchat,
            Intent::OpenEmail => IntentKind::OpenEmail,
            Intent::GenerateImage { .. } => IntentKind::GenerateImage,
            Intent::Unknown { .. } => IntentKind::Unknown,
        }
    }
}

/// A classified command, ready for a dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(flatten)]
    pub intent: Intent,
    pub original_text: String,
}

impl Command {
    pub fn new(intent: Intent, original_text: impl Into<String>) -> Self {
        Self {
            intent,
            original_text: original_text.into(),
        }
    }

    pub fn kind(&self) -> IntentKind {
        self.intent.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_match_serde() {
        for kind in IntentKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_command_serialization() {
        let command = Command::new(
            Intent::Reminder {
                task: "call mom".to_string(),
                time_raw: "10 minutes".to_string(),
            },
            "set a reminder to call mom in 10 minutes",
        );
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["type"], "reminder");
        assert_eq!(json["task"], "call mom");
        assert_eq!(json["time_raw"], "10 minutes");
        assert_eq!(json["original_text"], "set a reminder to call mom in 10 minutes");
    }

    #[test]
    fn test_command_deserialization() {
        let json = r#"{"type":"open_youtube","original_text":"open youtube"}"#;
        let command: Command = serde_json::from_str(json).unwrap();
        assert_eq!(command.kind(), IntentKind::OpenYoutube);
        assert_eq!(command.original_text, "open youtube");
    }
}
