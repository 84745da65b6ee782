/// Input read from the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line, nothing to do.
    Empty,
    /// Leave the application. Triggered by `/exit`.
    Exit,
    /// Show how many turns the session history holds. Triggered by `/history`.
    History,
    /// Start a new session with an empty history. Triggered by `/new`.
    New,
    /// Anything else is sent to the model.
    Message(String),
}

impl Command {
    pub fn available_commands() -> Vec<String> {
        vec!["/exit".to_string(), "/history".to_string(), "/new".to_string()]
    }

    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "" => Command::Empty,
            "/exit" => Command::Exit,
            "/history" => Command::History,
            "/new" => Command::New,
            text => Command::Message(text.to_string()),
        }
    }
}
