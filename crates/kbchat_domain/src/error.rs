use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Upstream responded with an error: {message}")]
    Upstream { code: Option<String>, message: String },

    #[error("Invalid Status Code: {0}")]
    InvalidStatusCode(u16),

    #[error("Unknown preset '{0}', expected one of: plain, vanilla, rag, rag-cot")]
    UnknownTreatment(String),

    #[error("Missing system prompt for treatment '{0}'")]
    MissingSystemPrompt(String),
}

pub type Result<A> = std::result::Result<A, Error>;
