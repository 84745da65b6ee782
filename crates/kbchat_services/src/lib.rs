mod kbchat_services;
mod lookup;
mod provider;
mod session;
mod utils;

pub use kbchat_services::*;
pub use lookup::*;
pub use provider::*;
pub use session::*;
