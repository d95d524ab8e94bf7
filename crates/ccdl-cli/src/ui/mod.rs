//! Console output.
//!
//! - [`theme`] - Colors, icons, and size formatting
//! - [`progress`] - Transfer line formatting and redraw throttling
//! - [`actor`] - Message-passing event loop that owns stdout
//! - [`output`] - Public API for commands; implements the core `Reporter`

pub mod actor;
pub mod output;
pub mod progress;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
