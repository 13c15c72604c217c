//! Output side: the field sink abstraction, the display template and the
//! fixed-period tick driver that feeds them.

mod sink;
mod template;
mod tick;

pub use sink::{Field, FileSink, Sink};
pub use tick::TickDriver;

#[cfg(test)]
mod tests;
