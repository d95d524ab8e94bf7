//! Download operations shared by the commands.
//!
//! - [`context`] - State handed to every operation
//! - [`error`] - Errors surfaced to the user
//! - [`prompt`] - Interactive and scripted prompting
//! - [`select`] - Turning hints and answers into a selection
//! - [`fetch`] - Executing plans, asset lists and icon downloads

pub mod context;
pub mod error;
pub mod fetch;
pub mod prompt;
pub mod select;

pub use context::Context;
pub use error::CliError;
