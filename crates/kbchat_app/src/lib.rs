mod orch;
#[cfg(test)]
mod orch_spec;
mod prompts;
mod services;
mod sink;
mod tools;

pub use orch::*;
pub use services::*;
pub use sink::*;
pub use tools::*;
