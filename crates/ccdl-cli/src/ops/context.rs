//! Shared download context.
//!
//! Groups the state every download operation needs so it does not have to
//! be threaded through each call separately.

use ccdl_core::Reporter;
use ccdl_core::condition::OsVersion;
use ccdl_core::io::client::VendorClient;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Groups common state used during download operations.
#[derive(Clone)]
pub struct Context {
    pub client: VendorClient,
    /// `<dest>/products`; each product gets a directory named by its code.
    pub products_dir: PathBuf,
    pub os_version: OsVersion,
    pub skip_existing: bool,
    pub reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("products_dir", &self.products_dir)
            .field("os_version", &self.os_version)
            .field("skip_existing", &self.skip_existing)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(
        client: VendorClient,
        products_dir: PathBuf,
        os_version: OsVersion,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            client,
            products_dir,
            os_version,
            skip_existing: false,
            reporter,
        }
    }

    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }

    /// Directory holding the packages of `code`.
    pub fn product_dir(&self, code: &str) -> PathBuf {
        self.products_dir.join(code)
    }
}
