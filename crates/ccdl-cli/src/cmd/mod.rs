pub mod completions;
pub mod download;
pub mod setup;
pub mod suite;
