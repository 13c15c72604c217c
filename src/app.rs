//! Application module: the view model used by the terminal UI and runtime.

mod model;

pub use model::*;
