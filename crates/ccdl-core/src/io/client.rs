//! HTTP access to the vendor distribution API.
//!
//! All request headers come from one immutable [`FetchConfig`] built at
//! startup. Headers that vary per request, such as the build identifier of
//! a manifest, are attached at the call site.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use ccdl_schema::{Catalog, Manifest, Platform, VersionEntry};
use rand::Rng;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use thiserror::Error;
use tracing::{debug, info};

use crate::io::catalog::{CatalogOptions, parse_catalog};
use crate::io::xml::{Element, XmlError};
use crate::plan::ManifestSource;
use crate::vendor;

/// Underlying cause of a failed fetch.
#[derive(Error, Debug)]
pub enum FetchSource {
    /// Transport failure or non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body was not well-formed XML.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// The body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configured value cannot be sent as the named header.
    #[error("invalid header value for {0}")]
    Header(&'static str),

    /// The catalog entry has no build to fetch a manifest for.
    #[error("no build identifier")]
    MissingBuildId,
}

/// A remote document that could not be obtained.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The product catalog request failed.
    #[error("product catalog unavailable: {0}")]
    CatalogUnavailable(#[source] FetchSource),

    /// The manifest of one product failed.
    #[error("manifest for {code} unavailable: {source}")]
    ManifestUnavailable {
        /// SAP code of the product.
        code: String,
        /// What went wrong.
        #[source]
        source: FetchSource,
    },

    /// Any other XML document failed.
    #[error("{url} unavailable: {source}")]
    DocumentUnavailable {
        /// Address that was requested.
        url: String,
        /// What went wrong.
        #[source]
        source: FetchSource,
    },
}

/// Catalog URL schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum UrlVersion {
    /// `core/v4`
    V4,
    /// `core/v5`
    V5,
    /// `core/v6`, the current schema.
    #[default]
    V6,
}

impl UrlVersion {
    /// Every supported version, oldest first.
    pub const ALL: [UrlVersion; 3] = [Self::V4, Self::V5, Self::V6];

    /// The number that goes into the catalog path.
    pub fn number(self) -> u8 {
        match self {
            Self::V4 => 4,
            Self::V5 => 5,
            Self::V6 => 6,
        }
    }
}

impl fmt::Display for UrlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

impl FromStr for UrlVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches(['v', 'V']);
        match digits {
            "4" => Ok(Self::V4),
            "5" => Ok(Self::V5),
            "6" => Ok(Self::V6),
            _ => Err(format!("invalid URL version '{s}' (expected v4, v5 or v6)")),
        }
    }
}

/// Endpoint templates, overridable for tests and mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Product catalog, with `{url_version}` and `{platforms}` placeholders.
    pub products: String,
    /// Applications endpoint that serves product manifests.
    pub applications: String,
    /// Installer support feed, with `{os_version}`, `{platform}` and `{version}` placeholders.
    pub setup: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            products: vendor::PRODUCTS_URL.to_string(),
            applications: vendor::APPLICATIONS_URL.to_string(),
            setup: vendor::SETUP_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Same paths as the vendor API, rooted at `base`.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            products: format!("{base}/core/v{{url_version}}/products/all?platform={{platforms}}"),
            applications: format!("{base}/core/v3/applications"),
            setup: format!(
                "{base}/core/v1/applications?osVersion={{os_version}}&platform={{platform}}&version={{version}}"
            ),
        }
    }
}

/// Immutable request configuration for one run.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Value of the app id header.
    pub app_id: String,
    /// Value of the API key header.
    pub api_key: String,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Session cookie, generated once per run.
    pub cookie: String,
    /// Optional value of the `Authorization` header.
    pub auth_token: Option<String>,
    /// Catalog URL schema to request.
    pub url_version: UrlVersion,
    /// Platform the catalog is filtered to.
    pub platform: Platform,
    /// Where requests go.
    pub endpoints: Endpoints,
}

impl FetchConfig {
    /// Configuration for the catalog and manifest endpoints.
    pub fn new(platform: Platform, url_version: UrlVersion, auth_token: Option<String>) -> Self {
        Self {
            app_id: vendor::CATALOG_APP_ID.to_string(),
            api_key: vendor::API_KEY.to_string(),
            user_agent: vendor::API_USER_AGENT.to_string(),
            cookie: session_cookie(),
            auth_token: auth_token.filter(|t| !t.trim().is_empty()),
            url_version,
            platform,
            endpoints: Endpoints::default(),
        }
    }

    /// Configuration for the installer support feed.
    pub fn for_setup(platform: Platform) -> Self {
        Self {
            app_id: vendor::SETUP_APP_ID.to_string(),
            ..Self::new(platform, UrlVersion::default(), None)
        }
    }

    /// Replace the endpoint templates.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Catalog URL for this configuration.
    pub fn products_url(&self) -> String {
        let version = self.url_version.number().to_string();
        let platforms = self.platform.catalog_filter();
        vendor::render(
            &self.endpoints.products,
            &[("url_version", &version), ("platforms", &platforms)],
        )
    }

    /// Installer support feed URL.
    pub fn setup_url(&self, os_version: &str, setup_version: &str) -> String {
        vendor::render(
            &self.endpoints.setup,
            &[
                ("os_version", os_version),
                ("platform", self.platform.as_str()),
                ("version", setup_version),
            ],
        )
    }

    /// Headers sent with every API request.
    pub fn headers(&self) -> Result<HeaderMap, FetchSource> {
        fn value(name: &'static str, raw: &str) -> Result<HeaderValue, FetchSource> {
            HeaderValue::from_str(raw).map_err(|_| FetchSource::Header(name))
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(vendor::APP_ID_HEADER),
            value(vendor::APP_ID_HEADER, &self.app_id)?,
        );
        headers.insert(
            HeaderName::from_static(vendor::API_KEY_HEADER),
            value(vendor::API_KEY_HEADER, &self.api_key)?,
        );
        headers.insert(USER_AGENT, value("user-agent", &self.user_agent)?);
        headers.insert(COOKIE, value("cookie", &self.cookie)?);
        if let Some(token) = &self.auth_token {
            let mut auth = value("authorization", token.trim())?;
            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }
        Ok(headers)
    }
}

/// `fg=` followed by 26 random upper-case alphanumerics and `======`.
fn session_cookie() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::rng();
    let token: String = (0..26)
        .map(|_| char::from(CHARSET[rng.random_range(0..CHARSET.len())]))
        .collect();
    format!("fg={token}======")
}

/// Client for the catalog, manifest and XML document endpoints.
#[derive(Debug, Clone)]
pub struct VendorClient {
    http: Client,
    config: FetchConfig,
}

impl VendorClient {
    /// Build a client whose default headers come from `config`.
    pub fn new(config: FetchConfig) -> Result<Self, FetchSource> {
        let http = Client::builder().default_headers(config.headers()?).build()?;
        Ok(Self { http, config })
    }

    /// Underlying HTTP client, carrying the API headers.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Configuration this client was built from.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch and parse the product catalog.
    pub async fn fetch_catalog(&self) -> Result<Catalog, FetchError> {
        let url = self.config.products_url();
        info!(%url, "fetching product catalog");

        let fetch = async {
            let body = self.http.get(&url).send().await?.error_for_status()?.text().await?;
            let root = Element::parse_str(&body)?;
            Ok::<_, FetchSource>(parse_catalog(
                &root,
                &CatalogOptions {
                    platform: self.config.platform,
                    url_version: self.config.url_version,
                },
            ))
        };

        let catalog = fetch.await.map_err(FetchError::CatalogUnavailable)?;
        debug!(products = catalog.products.len(), "catalog parsed");
        Ok(catalog)
    }

    /// Fetch the package manifest of one build.
    pub async fn fetch_manifest(&self, code: &str, build_id: &str) -> Result<Manifest, FetchError> {
        debug!(code, build_id, "fetching manifest");

        let fetch = async {
            let body = self
                .http
                .get(&self.config.endpoints.applications)
                .header(vendor::BUILD_GUID_HEADER, build_id)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            Ok::<_, FetchSource>(Manifest::from_json(&body)?)
        };

        fetch.await.map_err(|source| FetchError::ManifestUnavailable {
            code: code.to_string(),
            source,
        })
    }

    /// Fetch an arbitrary XML document (asset lists, setup feeds).
    pub async fn fetch_xml(&self, url: &str) -> Result<Element, FetchError> {
        debug!(url, "fetching XML document");

        let fetch = async {
            let body = self.http.get(url).send().await?.error_for_status()?.text().await?;
            Ok::<_, FetchSource>(Element::parse_str(&body)?)
        };

        fetch.await.map_err(|source| FetchError::DocumentUnavailable {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ManifestSource for VendorClient {
    async fn manifest(&self, entry: &VersionEntry) -> Result<Manifest, FetchError> {
        match entry.build_id.as_deref() {
            Some(build_id) => self.fetch_manifest(&entry.code, build_id).await,
            None => Err(FetchError::ManifestUnavailable {
                code: entry.code.clone(),
                source: FetchSource::MissingBuildId,
            }),
        }
    }
}
