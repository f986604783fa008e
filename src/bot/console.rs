// Interactive terminal transport for the support bot
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

use crate::bot::handler::{InboundEvent, SupportBot};
use crate::errors::{Result, SupportError};

const PROMPT: &str = "you> ";

/// Reads lines from the terminal and delivers them as direct messages
pub struct ConsoleTransport {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
}

impl ConsoleTransport {
    pub fn new(history_path: Option<PathBuf>) -> Result<Self> {
        let mut editor = DefaultEditor::new()
            .map_err(|e| SupportError::Generic(format!("Failed to start line editor: {}", e)))?;

        if let Some(path) = &history_path {
            if path.exists() {
                let _ = editor.load_history(path);
            }
        }

        Ok(Self {
            editor,
            history_path,
        })
    }

    /// Next line, or `None` on EOF / Ctrl-C
    fn read_line(&mut self) -> Result<Option<String>> {
        match self.editor.readline(PROMPT) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = self.editor.add_history_entry(trimmed);
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(SupportError::Generic(format!("Readline error: {}", e))),
        }
    }

    /// Run until the user exits
    pub async fn run(&mut self, bot: &SupportBot) -> Result<()> {
        println!(
            "{}",
            "Support bot ready. Type a question, or /quit to exit.".bright_black()
        );

        while let Some(line) = self.read_line()? {
            if matches!(line.trim(), "/quit" | "/exit") {
                break;
            }

            let event = InboundEvent::direct(line);
            match bot.handle(&event).await {
                Some(reply) => println!("{} {}\n", "bot>".green().bold(), reply),
                None => println!("{}\n", "(no reply needed)".bright_black()),
            }
        }

        self.save_history();
        Ok(())
    }

    fn save_history(&mut self) {
        if let Some(path) = &self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = self.editor.save_history(path);
        }
    }
}
