//! Core of ccdl: catalog and manifest fetching, package selection,
//! download planning, resumable downloads and installer descriptors.

pub mod assets;
pub mod condition;
pub mod descriptor;
pub mod filter;
pub mod io;
pub mod plan;
pub mod prune;
pub mod reporter;
pub mod resolver;
pub mod setup;
pub mod vendor;

pub use plan::{ManifestSource, Plan, ProductPlan, build_plan};
pub use reporter::{NullReporter, Reporter};
pub use resolver::{ChoiceReason, NeedsUserChoice, resolve};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("ccdl-core/", env!("CARGO_PKG_VERSION"));
