mod args;
mod commands;
mod util;

pub use args::Cli;
