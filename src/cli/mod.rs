//! Command-line interface module.

mod args;
pub mod check;
pub mod pack;

pub use args::{Cli, Commands};
