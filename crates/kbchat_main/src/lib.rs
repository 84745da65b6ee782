mod cli;
mod console;
mod model;
mod ui;

pub use cli::*;
pub use console::*;
pub use model::*;
pub use ui::*;
