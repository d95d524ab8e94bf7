//! Transitive download plan.
//!
//! Starting from the selected product, every manifest is fetched, filtered
//! and pruned, and its dependencies are walked depth-first in manifest
//! order. The result lists products in pre-order, each exactly once.

use std::collections::HashSet;

use async_trait::async_trait;
use ccdl_schema::{Catalog, Manifest, Selection, VersionEntry};
use thiserror::Error;
use tracing::{debug, warn};

use crate::assets;
use crate::condition::OsVersion;
use crate::filter::{FilterContext, RelaxedCondition, filter};
use crate::io::client::FetchError;
use crate::prune::prune;

/// Where manifests come from.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetch the manifest of one catalog version entry.
    async fn manifest(&self, entry: &VersionEntry) -> Result<Manifest, FetchError>;
}

/// Errors that stop planning.
#[derive(Error, Debug)]
pub enum PlanError {
    /// A manifest could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The requested SAP code is absent from the catalog.
    #[error("product {0} is not in the catalog")]
    UnknownProduct(String),

    /// The product exists but not at the requested version.
    #[error("version {version} of {code} is not in the catalog")]
    UnknownVersion {
        /// SAP code of the product.
        code: String,
        /// Requested product version.
        version: String,
    },

    /// Every version of the product lacks a build for the platform.
    #[error("no downloadable version of {0}")]
    NoUsableVersion(String),

    /// The catalog carries no CDN base for the product.
    #[error("no CDN address for {0}")]
    MissingCdn(String),
}

/// Non-fatal problems met while walking dependencies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    /// A dependency leads back to a product already on the walk.
    #[error("dependency cycle: {}", chain.join(" -> "))]
    DependencyCycle {
        /// SAP codes from the first repeated product back to itself.
        chain: Vec<String>,
    },

    /// A dependency has no usable catalog entry and was skipped.
    #[error("{code} (required by {required_by}) is not downloadable")]
    MissingDependency {
        /// SAP code of the missing dependency.
        code: String,
        /// SAP code of the product that asked for it.
        required_by: String,
    },
}

/// One product of the plan.
#[derive(Debug, Clone)]
pub struct ProductPlan {
    /// SAP code.
    pub code: String,
    /// Product version being downloaded.
    pub version: String,
    /// False for dependencies pulled in by another product.
    pub is_application: bool,
    /// Pruned manifest, written next to the packages.
    pub manifest: Manifest,
    /// Absolute package URLs in manifest order.
    pub urls: Vec<String>,
    /// Retained packages of type `core`.
    pub core_count: usize,
    /// Retained packages of any other type.
    pub other_count: usize,
    /// Sum of `ExtractSize` over the retained packages.
    pub install_size: u64,
    /// Conditions that were kept despite failing to parse.
    pub relaxed: Vec<RelaxedCondition>,
}

/// Everything to download, dependencies first.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Products in download order.
    pub products: Vec<ProductPlan>,
    /// Problems that did not stop planning.
    pub warnings: Vec<PlanWarning>,
}

impl Plan {
    /// Number of package URLs across all products.
    pub fn total_packages(&self) -> usize {
        self.products.iter().map(|p| p.urls.len()).sum()
    }
}

enum Frame {
    Enter {
        code: String,
        version: Option<String>,
        required_by: Option<String>,
    },
    Exit,
}

pub(crate) fn join_url(cdn: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}{}", cdn.trim_end_matches('/'), path)
}

/// Build the plan for `selection`.
///
/// # Errors
///
/// Fails when the selected product itself cannot be planned or when any
/// manifest cannot be fetched. Problems with dependencies that can be
/// skipped are reported as [`PlanWarning`]s instead.
pub async fn build_plan<S: ManifestSource + ?Sized>(
    source: &S,
    catalog: &Catalog,
    selection: &Selection,
    os_version: &OsVersion,
) -> Result<Plan, PlanError> {
    let ctx = FilterContext::new(selection, os_version);
    let mut plan = Plan::default();
    let mut done: HashSet<String> = HashSet::new();
    let mut in_progress: Vec<String> = Vec::new();
    let mut stack = vec![Frame::Enter {
        code: selection.product_code.clone(),
        version: Some(selection.version.clone()),
        required_by: None,
    }];

    while let Some(frame) = stack.pop() {
        let (code, version, required_by) = match frame {
            Frame::Exit => {
                if let Some(finished) = in_progress.pop() {
                    done.insert(finished);
                }
                continue;
            }
            Frame::Enter {
                code,
                version,
                required_by,
            } => (code.to_ascii_uppercase(), version, required_by),
        };

        if done.contains(&code) {
            continue;
        }
        if in_progress.contains(&code) {
            let mut chain = in_progress.clone();
            chain.push(code);
            let warning = PlanWarning::DependencyCycle { chain };
            warn!(%warning, "abandoning dependency branch");
            plan.warnings.push(warning);
            continue;
        }

        let missing = |plan: &mut Plan, parent: &str| {
            let warning = PlanWarning::MissingDependency {
                code: code.clone(),
                required_by: parent.to_string(),
            };
            warn!(%warning, "skipping dependency");
            plan.warnings.push(warning);
        };

        let Some(product) = catalog.product(&code) else {
            match &required_by {
                Some(parent) => {
                    missing(&mut plan, parent);
                    continue;
                }
                None => return Err(PlanError::UnknownProduct(code)),
            }
        };

        let entry = match (&version, &required_by) {
            (Some(version), _) => product.version(version).ok_or_else(|| PlanError::UnknownVersion {
                code: code.clone(),
                version: version.clone(),
            })?,
            (None, Some(parent)) => match product.first_usable() {
                Some(entry) if !assets::uses_asset_list(entry) => entry,
                _ => {
                    missing(&mut plan, parent);
                    continue;
                }
            },
            (None, None) => product
                .latest()
                .ok_or_else(|| PlanError::NoUsableVersion(code.clone()))?,
        };

        let manifest = source.manifest(entry).await?;
        let outcome = filter(manifest.package_records(), &ctx);
        let pruned = prune(&manifest, &outcome, &selection.languages);

        let cdn = manifest
            .cdn()
            .or(catalog.cdn.as_deref())
            .ok_or_else(|| PlanError::MissingCdn(code.clone()))?;
        let urls = outcome.urls.iter().map(|path| join_url(cdn, path)).collect();

        debug!(
            %code,
            version = %entry.version,
            core = outcome.core_count,
            other = outcome.other_count,
            "planned product"
        );

        let dependencies: Vec<String> = pruned
            .dependency_list()
            .iter()
            .map(|d| d.code.clone())
            .collect();

        plan.products.push(ProductPlan {
            code: code.clone(),
            version: entry.version.clone(),
            is_application: product.is_application(),
            manifest: pruned,
            urls,
            core_count: outcome.core_count,
            other_count: outcome.other_count,
            install_size: outcome.install_size(),
            relaxed: outcome.relaxed,
        });

        in_progress.push(code.clone());
        stack.push(Frame::Exit);
        for dependency in dependencies.into_iter().rev() {
            stack.push(Frame::Enter {
                code: dependency,
                version: None,
                required_by: Some(code.clone()),
            });
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccdl_schema::{
        Dependency, LanguageSet, PackageKind, PackageRecord, Platform, Product, ProductKind,
    };
    use ccdl_schema::manifest::DependencyList;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeSource {
        manifests: HashMap<String, Manifest>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ManifestSource for FakeSource {
        async fn manifest(&self, entry: &VersionEntry) -> Result<Manifest, FetchError> {
            self.requested.lock().unwrap().push(entry.code.clone());
            Ok(self.manifests[&entry.code].clone())
        }
    }

    fn manifest(code: &str, deps: &[&str]) -> Manifest {
        let mut manifest = Manifest::new(
            code,
            vec![
                PackageRecord::new(format!("{code}-core"), format!("/{code}/core.zip"), PackageKind::Core)
                    .with_extract_size(10),
                PackageRecord::new(format!("{code}-x86"), format!("/{code}/x86.zip"), PackageKind::Other)
                    .with_condition("[OSProcessorFamily] == 32-bit"),
            ],
        );
        manifest.dependencies = Some(DependencyList {
            dependencies: deps.iter().map(|d| Dependency::new(*d, "1.0")).collect(),
        });
        manifest
    }

    fn setup(graph: &[(&str, &[&str])]) -> (Catalog, FakeSource) {
        let mut catalog = Catalog {
            cdn: Some("https://cdn.example.com/".into()),
            ..Catalog::default()
        };
        let mut manifests = HashMap::new();

        for (i, (code, deps)) in graph.iter().enumerate() {
            let kind = if i == 0 {
                ProductKind::Application
            } else {
                ProductKind::Dependency
            };
            let mut product = Product::new(*code, *code, kind);
            product.upsert_version(VersionEntry {
                code: (*code).into(),
                display_name: (*code).into(),
                platform: Platform::Win64,
                version: "1.0".into(),
                supported_languages: Vec::new(),
                build_id: Some(format!("{code}-guid")),
                manifest_url: None,
            });
            catalog.products.insert((*code).into(), product);
            manifests.insert((*code).to_string(), manifest(code, deps));
        }

        let source = FakeSource {
            manifests,
            requested: Mutex::new(Vec::new()),
        };
        (catalog, source)
    }

    fn selection(code: &str) -> Selection {
        Selection {
            product_code: code.into(),
            version: "1.0".into(),
            platform: Platform::Win64,
            languages: LanguageSet::from_request("en_US"),
        }
    }

    fn codes(plan: &Plan) -> Vec<&str> {
        plan.products.iter().map(|p| p.code.as_str()).collect()
    }

    #[tokio::test]
    async fn test_preorder_and_dedup() {
        let (catalog, source) = setup(&[("APP", &["B", "C"]), ("B", &["C"]), ("C", &[])]);
        let os: OsVersion = "10.0".parse().unwrap();

        let plan = build_plan(&source, &catalog, &selection("APP"), &os).await.unwrap();

        assert_eq!(codes(&plan), vec!["APP", "B", "C"]);
        assert!(plan.warnings.is_empty());
        assert_eq!(*source.requested.lock().unwrap(), vec!["APP", "B", "C"]);
        assert!(plan.products[0].is_application);
        assert!(!plan.products[1].is_application);
    }

    #[tokio::test]
    async fn test_urls_are_absolute_and_filtered() {
        let (catalog, source) = setup(&[("APP", &[])]);
        let os: OsVersion = "10.0".parse().unwrap();

        let plan = build_plan(&source, &catalog, &selection("APP"), &os).await.unwrap();

        let app = &plan.products[0];
        assert_eq!(app.urls, vec!["https://cdn.example.com/APP/core.zip"]);
        assert_eq!(app.core_count, 1);
        assert_eq!(app.other_count, 0);
        assert_eq!(app.install_size, 10);
        assert_eq!(app.manifest.package_records().len(), 1);
        assert_eq!(plan.total_packages(), 1);
    }

    #[tokio::test]
    async fn test_cycle_is_reported_and_cut() {
        let (catalog, source) = setup(&[("APP", &["B"]), ("B", &["APP"])]);
        let os: OsVersion = "10.0".parse().unwrap();

        let plan = build_plan(&source, &catalog, &selection("APP"), &os).await.unwrap();

        assert_eq!(codes(&plan), vec!["APP", "B"]);
        assert_eq!(
            plan.warnings,
            vec![PlanWarning::DependencyCycle {
                chain: vec!["APP".into(), "B".into(), "APP".into()]
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_dependency_is_a_warning() {
        let (catalog, source) = setup(&[("APP", &["GONE", "B"]), ("B", &[])]);
        let os: OsVersion = "10.0".parse().unwrap();

        let plan = build_plan(&source, &catalog, &selection("APP"), &os).await.unwrap();

        assert_eq!(codes(&plan), vec!["APP", "B"]);
        assert_eq!(
            plan.warnings,
            vec![PlanWarning::MissingDependency {
                code: "GONE".into(),
                required_by: "APP".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_unknown_root_is_an_error() {
        let (catalog, source) = setup(&[("APP", &[])]);
        let os: OsVersion = "10.0".parse().unwrap();

        let err = build_plan(&source, &catalog, &selection("NOPE"), &os).await.unwrap_err();
        assert!(matches!(err, PlanError::UnknownProduct(code) if code == "NOPE"));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://a/", "/b.zip"), "https://a/b.zip");
        assert_eq!(join_url("https://a", "/b.zip"), "https://a/b.zip");
        assert_eq!(join_url("https://a", "https://c/d.zip"), "https://c/d.zip");
    }
}
