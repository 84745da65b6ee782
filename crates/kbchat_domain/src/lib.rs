mod chat_response;
mod context;
mod entity;
mod error;
mod history;
mod lookup_args;
mod message;
mod model;
mod result_stream;
mod tool_call;
mod tool_definition;
mod treatment;

pub use chat_response::*;
pub use context::*;
pub use entity::*;
pub use error::*;
pub use history::*;
pub use lookup_args::*;
pub use message::*;
pub use model::*;
pub use result_stream::*;
pub use tool_call::*;
pub use tool_definition::*;
pub use treatment::*;
