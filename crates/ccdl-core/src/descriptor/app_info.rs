//! Installer support feed model and `ApplicationInfo.xml`.

use crate::condition::OsVersion;
use crate::io::xml::Element;
use crate::vendor;

use super::DescriptorError;

/// Install path marking a package set the installer does not use.
pub const UNUSED_INSTALL_PATH: &str = "[NOT-USED]";

/// One support package of a package set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPackage {
    /// Package name, also the directory it unpacks into.
    pub name: String,
    /// Install order within the set, as published.
    pub sequence: String,
    /// Published `optional` flag, copied through verbatim.
    pub optional: String,
    /// Reference to the package's asset list, relative to the feed CDN.
    pub manifest_url: String,
    /// Extra installer metadata, copied into the descriptor untouched.
    pub additional_info: Option<Element>,
}

/// A group of support packages sharing an install path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSet {
    /// Set name.
    pub name: String,
    /// Where the installer places the set.
    pub install_path: String,
    /// Install order among sets, as published.
    pub sequence: String,
    /// Member packages ordered by sequence number.
    pub packages: Vec<SetupPackage>,
    /// Extra installer metadata, copied into the descriptor untouched.
    pub additional_info: Option<Element>,
}

/// The parts of the installer support feed that drive a setup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupFeed {
    /// Application name.
    pub name: String,
    /// Platform the feed was published for.
    pub platform: String,
    /// Installer version the feed describes.
    pub version: String,
    /// Base URL of the package assets.
    pub cdn: String,
    /// Used package sets, both levels ordered by sequence number.
    pub sets: Vec<PackageSet>,
}

fn sequence_key(sequence: &str) -> u64 {
    sequence.trim().parse().unwrap_or(u64::MAX)
}

fn required<'a>(element: &'a Element, path: &'static str, context: &str) -> Result<&'a str, DescriptorError> {
    element
        .find(path)
        .map(Element::text)
        .ok_or_else(|| DescriptorError::MissingField {
            context: context.to_string(),
            field: path,
        })
}

impl SetupFeed {
    /// Read the first `application` of a feed document.
    pub fn from_element(root: &Element) -> Result<Self, DescriptorError> {
        let application = root
            .descendants("application")
            .into_iter()
            .next()
            .ok_or_else(|| DescriptorError::MissingField {
                context: "setup feed".into(),
                field: "application",
            })?;
        let cdn = root
            .descendants("cdn")
            .into_iter()
            .find_map(|cdn| cdn.child("secure"))
            .map(|secure| secure.text().to_string())
            .ok_or_else(|| DescriptorError::MissingField {
                context: "setup feed".into(),
                field: "cdn/secure",
            })?;

        let mut sets = Vec::new();
        for set in root.descendants("packageSet") {
            let name = required(set, "name", "package set")?;
            let install_path = set.child_text("installPath").unwrap_or_default();
            if install_path == UNUSED_INSTALL_PATH {
                continue;
            }

            let mut packages = Vec::new();
            for package in set.find_all("packages/package") {
                packages.push(SetupPackage {
                    name: required(package, "name", name)?.to_string(),
                    sequence: package.child_text("sequenceNumber").unwrap_or_default().to_string(),
                    optional: package.child_text("optional").unwrap_or_default().to_string(),
                    manifest_url: required(package, "manifestUrl", name)?.to_string(),
                    additional_info: package.child("additionalInfo").cloned(),
                });
            }
            packages.sort_by_key(|p| sequence_key(&p.sequence));

            sets.push(PackageSet {
                name: name.to_string(),
                install_path: install_path.to_string(),
                sequence: set.child_text("sequenceNumber").unwrap_or_default().to_string(),
                packages,
                additional_info: set.child("additionalInfo").cloned(),
            });
        }
        sets.sort_by_key(|s| sequence_key(&s.sequence));

        Ok(Self {
            name: application.child_text("name").unwrap_or_default().to_string(),
            platform: application.child_text("platform").unwrap_or_default().to_string(),
            version: required(application, "version", "application")?.to_string(),
            cdn,
            sets,
        })
    }

    /// Number of packages across all sets.
    pub fn package_count(&self) -> usize {
        self.sets.iter().map(|s| s.packages.len()).sum()
    }
}

/// Windows style path of a package's `.pimx` file below `packages/`.
pub fn pimx_path(set: &str, package: &str) -> String {
    format!("\\{set}\\{package}\\{package}.pimx")
}

/// Build the `ApplicationInfo.xml` tree for `feed`.
pub fn build_application_info(feed: &SetupFeed, os_version: &OsVersion) -> Element {
    let sets = feed.sets.iter().map(|set| {
        let packages = set.packages.iter().map(|package| {
            let mut element = Element::new("package").with_children([
                Element::text_node("name", &package.name),
                Element::text_node("sequenceNumber", &package.sequence),
                Element::text_node("optional", &package.optional),
                Element::text_node("pimxPath", pimx_path(&set.name, &package.name)),
            ]);
            if let Some(info) = &package.additional_info {
                element.push(info.clone());
            }
            element
        });

        let mut element = Element::new("packageSet").with_children([
            Element::text_node("name", &set.name),
            Element::text_node("installPath", &set.install_path),
            Element::text_node("sequenceNumber", &set.sequence),
            Element::new("packages").with_children(packages),
            Element::new("filters").with_child(
                Element::new("filter")
                    .with_attr("type", "operatingSystem")
                    .with_child(Element::text_node("config", os_version.major_minor())),
            ),
        ]);
        if let Some(info) = &set.additional_info {
            element.push(info.clone());
        }
        element
    });

    Element::new("application").with_children([
        Element::text_node("name", &feed.name),
        Element::text_node("platform", &feed.platform),
        Element::text_node("lbsurl", vendor::LBS_URL),
        Element::new("packageSets").with_children(sets),
        Element::text_node("version", &feed.version),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<response>
  <cdn><secure>https://setup.example.com</secure></cdn>
  <applications>
    <application>
      <name>CreativeCloud</name>
      <platform>win64</platform>
      <version>6.2.0.554</version>
      <packageSets>
        <packageSet>
          <name>UTILS</name>
          <installPath>[INSTALLDIR]</installPath>
          <sequenceNumber>10</sequenceNumber>
          <packages>
            <package><name>B</name><sequenceNumber>2</sequenceNumber><optional>false</optional><manifestUrl>/b.xml</manifestUrl></package>
            <package><name>A</name><sequenceNumber>1</sequenceNumber><optional>true</optional><manifestUrl>/a.xml</manifestUrl>
              <additionalInfo><flag>on</flag></additionalInfo></package>
          </packages>
        </packageSet>
        <packageSet>
          <name>ADC</name>
          <installPath>[COMMONFILES]</installPath>
          <sequenceNumber>9</sequenceNumber>
          <packages>
            <package><name>Core</name><sequenceNumber>1</sequenceNumber><optional>false</optional><manifestUrl>/core.xml</manifestUrl></package>
          </packages>
          <additionalInfo><key>v</key></additionalInfo>
        </packageSet>
        <packageSet>
          <name>LEGACY</name>
          <installPath>[NOT-USED]</installPath>
          <sequenceNumber>1</sequenceNumber>
        </packageSet>
      </packageSets>
    </application>
  </applications>
</response>"#;

    fn feed() -> SetupFeed {
        SetupFeed::from_element(&Element::parse_str(FEED).unwrap()).unwrap()
    }

    #[test]
    fn test_feed_is_sorted_numerically_and_unused_sets_dropped() {
        let feed = feed();
        assert_eq!(feed.version, "6.2.0.554");
        assert_eq!(feed.cdn, "https://setup.example.com");

        let sets: Vec<_> = feed.sets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(sets, vec!["ADC", "UTILS"]);
        let packages: Vec<_> = feed.sets[1].packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(packages, vec!["A", "B"]);
        assert_eq!(feed.package_count(), 3);
    }

    #[test]
    fn test_application_info_tree() {
        let os: OsVersion = "10.0.19045".parse().unwrap();
        let root = build_application_info(&feed(), &os);

        let order: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["name", "platform", "lbsurl", "packageSets", "version"]);

        let adc = root.find("packageSets/packageSet").unwrap();
        assert_eq!(adc.child_text("name"), Some("ADC"));
        assert_eq!(adc.find("filters/filter").unwrap().attr("type"), Some("operatingSystem"));
        assert_eq!(adc.find("filters/filter/config").unwrap().text(), "10.0.0");
        assert_eq!(adc.find("additionalInfo/key").unwrap().text(), "v");
        assert_eq!(
            adc.find("packages/package/pimxPath").unwrap().text(),
            "\\ADC\\Core\\Core.pimx"
        );

        let sets = root.find_all("packageSets/packageSet");
        let utils = sets[1];
        assert_eq!(
            utils.find("packages/package/additionalInfo/flag").unwrap().text(),
            "on"
        );
    }

    #[test]
    fn test_feed_without_version_is_rejected() {
        let root = Element::parse_str(
            "<r><cdn><secure>x</secure></cdn><application><name>n</name></application></r>",
        )
        .unwrap();
        assert!(matches!(
            SetupFeed::from_element(&root),
            Err(DescriptorError::MissingField { field: "version", .. })
        ));
    }
}
