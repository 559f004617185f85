//! Terminal front end: renders the conversation and reads queries from stdin.

pub mod render;
pub mod repl;

pub use render::Renderer;
pub use repl::{run, Command};
