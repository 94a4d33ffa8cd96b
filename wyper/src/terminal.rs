use std::collections::HashSet;
use std::sync::Mutex;

use log::debug;
use owo_colors::OwoColorize;
use termimad::MadSkin;

use wyper::models::{ChatEntry, Delivery};
use wyper::services::ChatView;
use wyper::store::Theme;

pub fn skin_for(theme: Theme) -> MadSkin {
    match theme {
        Theme::Dark => MadSkin::default_dark(),
        Theme::Light => MadSkin::default_light(),
    }
}

/// Prints each message once, as it first shows up in a poll.
#[derive(Default)]
pub struct TerminalChatView {
    printed: Mutex<HashSet<(i64, bool)>>,
}

impl TerminalChatView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChatView for TerminalChatView {
    fn render(&self, entries: &[ChatEntry], current_user: Option<&str>) {
        let mut printed = match self.printed.lock() {
            Ok(printed) => printed,
            Err(poisoned) => poisoned.into_inner(),
        };

        for entry in entries {
            let local = entry.delivery == Delivery::LocalOnly;
            if !printed.insert((entry.message.id, local)) {
                continue;
            }

            let message = &entry.message;
            let time = message.time.format("%H:%M");
            let mine = current_user == Some(message.user.as_str());
            let user = if mine {
                message.user.bright_green().to_string()
            } else {
                message.user.bright_cyan().to_string()
            };

            if local {
                println!(
                    "{} {}: {} {}",
                    time.dimmed(),
                    user,
                    message.content,
                    "(not sent)".yellow()
                );
            } else {
                println!("{} {}: {}", time.dimmed(), user, message.content);
            }
        }
    }

    fn scroll_to_latest(&self) {
        // a terminal is always scrolled to its last line
        debug!("scroll to latest");
    }
}
