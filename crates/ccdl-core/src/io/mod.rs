//! IO modules - side effects (network, filesystem)

pub mod archive;
pub mod catalog;
pub mod client;
pub mod download;
pub mod xml;
