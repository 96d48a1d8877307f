//! Command planning
//!
//! Maps a classified `Command` onto the `Action` the assistant front end
//! should carry out. Planning never performs side effects itself: opening
//! pages, speaking replies and calling generative backends are left to
//! whoever receives the action.

use chrono::{DateTime, Local, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::intent::{Command, Intent};
use crate::reminder;

const GREETINGS: [&str; 3] = ["Hello there!", "Hi! How can I help you today?", "Hey! What's up?"];
const FAREWELLS: [&str; 3] = ["Goodbye!", "See you later!", "Catch you on the flip side!"];

const EMAIL_SUBJECT: &str = "Message from Trushna";

/// What the front end should do with a finalized command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Speak and display a reply
    Reply { text: String },

    /// Open a page in a new tab
    Open { url: String, reply: String },

    /// Hand a `mailto:` URL to the mail client
    ComposeEmail { url: String, reply: String },

    /// Schedule a reminder notification
    Remind {
        task: String,
        due: DateTime<Utc>,
        reply: String,
    },

    /// Ask the image backend for a picture
    GenerateImage { prompt: String, reply: String },

    /// Pass the raw command to the conversational backend
    Converse { command: String },
}

impl Action {
    /// Text to speak immediately, if any
    pub fn reply(&self) -> Option<&str> {
        match self {
            Action::Reply { text } => Some(text),
            Action::Open { reply, .. }
            | Action::ComposeEmail { reply, .. }
            | Action::Remind { reply, .. }
            | Action::GenerateImage { reply, .. } => Some(reply),
            Action::Converse { .. } => None,
        }
    }
}

/// Plan the action for a classified command
pub fn plan(command: &Command, now: DateTime<Local>) -> Action {
    let action = match &command.intent {
        Intent::Greeting => reply(pick(&GREETINGS)),
        Intent::Farewell => reply(pick(&FAREWELLS)),
        Intent::Reminder { task, time_raw } => {
            let schedule = reminder::resolve(time_raw, now.with_timezone(&Utc));
            Action::Remind {
                task: task.clone(),
                due: schedule.due,
                reply: format!("Okay, I've set a reminder for: {task} {}.", schedule.phrase),
            }
        }
        Intent::Weather { .. } => reply(
            "I can't check the actual weather right now, but I hope it's nice where you are!",
        ),
        Intent::SendMessage { to, body } => plan_message(to.as_deref(), body.as_deref()),
        Intent::OpenUrl { url } => {
            let url = with_scheme(url);
            Action::Open {
                reply: format!("Opening {url}..."),
                url,
            }
        }
        Intent::GetTime => reply(format!("The current time is {}.", now.format("%H:%M"))),
        Intent::GetDate => reply(format!("Today is {}.", now.format("%A, %B %-d, %Y"))),
        Intent::OpenYoutube => open("https://youtube.com", "Opening YouTube..."),
        Intent::PlaySongYoutube { song_name } => Action::Open {
            url: youtube_results(&format!("{song_name} song")),
            reply: format!("Searching for \"{song_name}\" on YouTube..."),
        },
        Intent::SearchYoutube { query } => Action::Open {
            url: youtube_results(query),
            reply: format!("Searching for \"{query}\" on YouTube..."),
        },
        Intent::BrowserSearch { query } => Action::Open {
            url: format!(
                "https://www.google.com/search?q={}",
                urlencoding::encode(query)
            ),
            reply: format!("Searching for \"{query}\"..."),
        },
        Intent::OpenGmail => open("https://mail.google.com", "Opening Gmail..."),
        Intent::OpenGoogle => open("https://google.com", "Opening Google..."),
        Intent::OpenChatgpt => open("https://chat.openai.com", "Opening ChatGPT..."),
        Intent::OpenBrave => open("https://search.brave.com", "Opening Brave Search..."),
        Intent::OpenInstagram => open("https://instagram.com", "Opening Instagram..."),
        Intent::OpenSnapchat => open("https://web.snapchat.com", "Opening Snapchat..."),
        Intent::OpenEmail => Action::ComposeEmail {
            url: "mailto:".to_string(),
            reply: "Opening your email client...".to_string(),
        },
        Intent::GenerateImage { prompt } => Action::GenerateImage {
            prompt: prompt.clone(),
            reply: format!("Okay, generating an image of: {prompt}..."),
        },
        Intent::Unknown { command } => Action::Converse {
            command: command.clone(),
        },
    };

    debug!(kind = %command.kind(), ?action, "command planned");
    action
}

fn plan_message(to: Option<&str>, body: Option<&str>) -> Action {
    match (to, body) {
        (Some(to), Some(body)) => Action::ComposeEmail {
            url: mailto(to, body),
            reply: format!("I've opened your email client to send a message to {to}."),
        },
        (None, Some(body)) => Action::ComposeEmail {
            url: mailto("", body),
            reply: "I've opened your email client with the message. Please specify recipient."
                .to_string(),
        },
        _ => reply("I can help draft a message. Who is it for and what should it say?"),
    }
}

fn mailto(to: &str, body: &str) -> String {
    format!(
        "mailto:{to}?subject={}&body={}",
        urlencoding::encode(EMAIL_SUBJECT),
        urlencoding::encode(body)
    )
}

fn with_scheme(url: &str) -> String {
    let lowered = url.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

fn youtube_results(query: &str) -> String {
    format!(
        "https://www.youtube.com/results?search_query={}",
        urlencoding::encode(query)
    )
}

fn open(url: &str, reply: &str) -> Action {
    Action::Open {
        url: url.to_string(),
        reply: reply.to_string(),
    }
}

fn reply(text: impl Into<String>) -> Action {
    Action::Reply { text: text.into() }
}

fn pick(choices: &[&str]) -> String {
    choices
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
        .to_string()
}
