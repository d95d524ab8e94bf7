//! Vendor distribution API endpoints and fixed request values.

/// Product catalog feed; `{url_version}` and `{platforms}` are substituted.
pub const PRODUCTS_URL: &str = "https://prod-rel-ffc-ccm.oobesaas.adobe.com/adobe-ffc-external/core/v{url_version}/products/all?channel=ccm&channel=sti&platform={platforms}&productType=Desktop&_type=xml";

/// Package manifest endpoint, addressed through [`BUILD_GUID_HEADER`].
pub const APPLICATIONS_URL: &str = "https://cdn-ffc.oobesaas.adobe.com/core/v3/applications";

/// Installer support package feed.
pub const SETUP_URL: &str = "https://cdn-ffc.oobesaas.adobe.com/core/v1/applications?name=CreativeCloud&name=CCLBS&osVersion={os_version}&platform={platform}&version={version}";

/// Bootstrapper location recorded in `ApplicationInfo.xml`.
pub const LBS_URL: &str = "http://ccmdl.adobe.com/AdobeProducts/KCCC/1/win32/CreativeCloudSet-Up.exe";

/// App id sent when talking to the catalog and manifest endpoints.
pub const CATALOG_APP_ID: &str = "accc-hdcore-desktop";

/// App id sent when talking to the installer support feed.
pub const SETUP_APP_ID: &str = "accc-apps-panel-desktop";

/// Value of [`API_KEY_HEADER`].
pub const API_KEY: &str = "CC_HD_ESD_1_0";

/// User agent for API requests.
pub const API_USER_AGENT: &str = "Adobe Application Manager 2.0";

/// User agent for `HEAD` size checks before a download.
pub const DOWNLOAD_USER_AGENT: &str = "Creative Cloud";

/// Header carrying the app id.
pub const APP_ID_HEADER: &str = "x-adobe-app-id";
/// Header carrying [`API_KEY`].
pub const API_KEY_HEADER: &str = "x-api-key";
/// Header that selects the build whose manifest is returned.
pub const BUILD_GUID_HEADER: &str = "x-adobe-build-guid";

/// Products that are always fetched through an asset list.
pub const ASSET_LIST_PRODUCTS: &[&str] = &["APRO"];

/// Catalog channel holding user-facing applications.
pub const APPLICATION_CHANNEL: &str = "ccm";

/// Language set package types that make a platform entry downloadable.
pub const DOWNLOADABLE_PACKAGE_TYPES: &[&str] = &["hdPackage", "application"];

/// Icon sizes referenced by the suite descriptor.
pub const ICON_SIZES: &[&str] = &["20x19", "32x32", "44x42", "64x64", "88x84", "176x168"];

/// Fill `{name}` placeholders in an endpoint template.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |url, (key, value)| {
        url.replace(&format!("{{{key}}}"), value)
    })
}
