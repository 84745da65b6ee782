mod app_config;
mod error;

pub use app_config::*;
pub use error::*;
