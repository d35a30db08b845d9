//! Terminal prompts.

use std::io;

use dialoguer::{Confirm, Input, Password};

pub const PHONE_LABEL:    &str = "Phone number";
pub const PASSWORD_LABEL: &str = "Password";
pub const CODE_LABEL:     &str = "Received code";
pub const CLOSE_LABEL:    &str = "(confirm to close console)";

/// Blocking questions to the person at the terminal.
pub trait Prompter {
    /// Read a visible line of text.
    fn text(&mut self, label: &str) -> io::Result<String>;
    /// Read hidden input. May be empty.
    fn secret(&mut self, label: &str) -> io::Result<String>;
    /// Ask a yes/no question.
    fn confirm(&mut self, label: &str) -> io::Result<bool>;
}

/// [`Prompter`] backed by `dialoguer`.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn text(&mut self, label: &str) -> io::Result<String> {
        Input::<String>::new()
            .with_prompt(label)
            .interact_text()
            .map_err(io::Error::other)
    }

    fn secret(&mut self, label: &str) -> io::Result<String> {
        Password::new()
            .with_prompt(label)
            .allow_empty_password(true)
            .interact()
            .map_err(io::Error::other)
    }

    fn confirm(&mut self, label: &str) -> io::Result<bool> {
        Confirm::new()
            .with_prompt(label)
            .default(true)
            .interact()
            .map_err(io::Error::other)
    }
}
