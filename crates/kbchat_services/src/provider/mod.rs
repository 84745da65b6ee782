mod openai;
mod request;
mod response;

pub use openai::*;
