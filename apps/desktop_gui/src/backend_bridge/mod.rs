//! Backend worker: a tokio runtime on its own thread serving UI commands.

pub mod commands;
pub mod runtime;
