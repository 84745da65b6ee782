use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL for {field}: {source}")]
    Url {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("No API key configured. Set provider.api_key, provider.api_key_file or OPENAI_API_KEY")]
    MissingApiKey,

    #[error(transparent)]
    Domain(#[from] kbchat_domain::Error),
}

pub type Result<A> = std::result::Result<A, Error>;
