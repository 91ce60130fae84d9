//! Terminal UI: Elm-style messages and commands, one screen per queue.

pub mod app;
pub mod command;
pub mod runtime;
pub mod screen;
pub mod theme;
pub mod view;

pub use app::{App, AppMsg, QueueKind};
pub use command::Command;
