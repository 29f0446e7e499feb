//! AdoptOpenJDK API v3 client.
//!
//! The assets endpoints are paginated without a page count, so pages are read
//! until the API answers 404. When the requested range pins a single major
//! version that the `available_releases` index knows about, only that feature
//! release is enumerated; otherwise every version is scanned.

use super::{build_url, decode_records, CatalogQuery, ReleaseCatalog};
use crate::error::{SetupError, TransportError};
use crate::transport::Transport;
use crate::types::{Distribution, ReleaseDescriptor};
use crate::version::{parse_version, VersionSpec};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

const PAGE_SIZE: u32 = 20;
const FULL_RANGE_PATH: &str = "/assets/version/%5B1.0,100.0%5D";

#[derive(Debug, Deserialize)]
struct AdoptRelease {
    version_data: AdoptVersionData,
    #[serde(default)]
    binaries: Vec<AdoptBinary>,
}

#[derive(Debug, Deserialize)]
struct AdoptVersionData {
    semver: String,
    #[serde(default)]
    major: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct AdoptBinary {
    package: AdoptPackage,
}

#[derive(Debug, Deserialize)]
struct AdoptPackage {
    link: String,
}

/// The version endpoints answer with a bare array; older deployments wrapped
/// it in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AdoptPage {
    Bare(Vec<serde_json::Value>),
    Wrapped { versions: Vec<serde_json::Value> },
}

impl AdoptPage {
    fn into_items(self) -> Vec<serde_json::Value> {
        match self {
            AdoptPage::Bare(items) => items,
            AdoptPage::Wrapped { versions } => versions,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AvailableReleases {
    available_releases: Vec<u64>,
}

pub struct AdoptCatalog {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl AdoptCatalog {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn unavailable(source: TransportError) -> SetupError {
        SetupError::CatalogUnavailable {
            distribution: Distribution::Adopt.display_name().to_string(),
            source,
        }
    }

    async fn available_majors(&self) -> Result<Vec<u64>, TransportError> {
        let url = build_url(&self.base_url, "/info/available_releases", &[]);
        let body = self.transport.get_json(&url).await?;
        let index: AvailableReleases =
            serde_json::from_value(body).map_err(|e| TransportError::Decode {
                url,
                message: e.to_string(),
            })?;
        Ok(index.available_releases)
    }

    /// Major version to restrict the scan to, if the index allows it.
    async fn narrowed_major(&self, spec: &VersionSpec) -> Option<u64> {
        let major = spec.fixed_major().or_else(|| spec.early_access_major())?;
        match self.available_majors().await {
            Ok(majors) if majors.contains(&major) => {
                tracing::debug!("Narrowing AdoptOpenJDK search to feature release {}", major);
                Some(major)
            }
            Ok(majors) => {
                tracing::debug!(
                    "Major version {} is not in the available releases {:?}, scanning all versions",
                    major,
                    majors
                );
                None
            }
            Err(e) => {
                tracing::warn!("Could not read the AdoptOpenJDK major version index: {}", e);
                None
            }
        }
    }

    fn page_params(query: &CatalogQuery, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("architecture", query.architecture.clone()),
            ("heap_size", "normal".to_string()),
            ("image_type", query.package_type.to_string()),
            ("jvm_impl", "hotspot".to_string()),
            ("os", query.os.clone()),
            ("project", "jdk".to_string()),
            ("vendor", "adoptopenjdk".to_string()),
            ("sort_method", "DEFAULT".to_string()),
            ("sort_order", "DESC".to_string()),
            ("page_size", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ]
    }

    async fn fetch_page(&self, url: &str) -> Result<Vec<serde_json::Value>, TransportError> {
        let body = self.transport.get_json(url).await?;
        let page: AdoptPage = serde_json::from_value(body).map_err(|e| TransportError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(page.into_items())
    }

    /// Reads pages from 0 upward until the API reports there are no more.
    async fn paginate(
        &self,
        path: &str,
        query: &CatalogQuery,
    ) -> Result<Vec<AdoptRelease>, SetupError> {
        let mut page = 0u32;
        let mut releases = Vec::new();

        loop {
            let url = build_url(&self.base_url, path, &Self::page_params(query, page));
            match self.fetch_page(&url).await {
                Ok(items) if items.is_empty() => break,
                Ok(items) => {
                    tracing::debug!("Read {} releases from page {}", items.len(), page);
                    releases.extend(decode_records::<AdoptRelease>(Distribution::Adopt, items));
                    page += 1;
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!("No more AdoptOpenJDK pages after page {}", page);
                    break;
                }
                Err(e) if page == 0 => return Err(Self::unavailable(e)),
                Err(e) => {
                    tracing::warn!(
                        "Stopping AdoptOpenJDK enumeration at page {}: {}. Continuing with {} releases",
                        page,
                        e,
                        releases.len()
                    );
                    break;
                }
            }
        }

        Ok(releases)
    }
}

#[async_trait]
impl ReleaseCatalog for AdoptCatalog {
    fn distribution(&self) -> Distribution {
        Distribution::Adopt
    }

    async fn list_releases(
        &self,
        spec: &VersionSpec,
        query: &CatalogQuery,
    ) -> Result<Vec<ReleaseDescriptor>, SetupError> {
        let path = match self.narrowed_major(spec).await {
            Some(major) => {
                let release_type = if spec.is_prerelease() { "ea" } else { "ga" };
                format!("/assets/feature_releases/{}/{}", major, release_type)
            }
            None => FULL_RANGE_PATH.to_string(),
        };

        let releases = self.paginate(&path, query).await?;
        let total = releases.len();
        let descriptors: Vec<ReleaseDescriptor> = releases
            .into_iter()
            .filter_map(|release| {
                // binaries are already filtered by os/arch/image type, so the first one is ours
                let binary = release.binaries.into_iter().next()?;
                let major = release
                    .version_data
                    .major
                    .or_else(|| parse_version(&release.version_data.semver).map(|v| v.major));
                let descriptor = ReleaseDescriptor::new(release.version_data.semver, binary.package.link);
                Some(match major {
                    Some(major) => descriptor.with_major(major),
                    None => descriptor,
                })
            })
            .collect();

        tracing::info!(
            "Found {} AdoptOpenJDK releases with binaries for {}/{} ({} listed)",
            descriptors.len(),
            query.os,
            query.architecture,
            total
        );
        Ok(descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::stub::StubTransport;
    use crate::types::PackageType;
    use serde_json::json;

    const BASE: &str = "https://api.adopt.test/v3";

    fn query() -> CatalogQuery {
        CatalogQuery {
            os: "linux".to_string(),
            architecture: "x64".to_string(),
            bitness: 64,
            package_type: PackageType::Jdk,
            archive_extension: "tar.gz".to_string(),
        }
    }

    fn record(semver: &str) -> serde_json::Value {
        json!({
            "release_name": format!("jdk-{}", semver),
            "version_data": { "semver": semver, "major": semver.split('.').next().unwrap().parse::<u64>().unwrap() },
            "binaries": [{ "package": { "link": format!("https://dl.test/{}.tar.gz", semver), "name": "jdk.tar.gz" } }]
        })
    }

    fn spec(s: &str) -> VersionSpec {
        VersionSpec::normalize(s).unwrap()
    }

    #[tokio::test]
    async fn test_pages_are_read_until_failure() {
        let transport = Arc::new(
            StubTransport::new()
                .status("/info/available_releases", 503)
                .json("page=0", json!([record("16.0.1+9"), record("15.0.2+7")]))
                .json("page=1", json!([record("11.0.10+9"), record("11.0.9+11")]))
                .status("page=2", 500),
        );
        let catalog = AdoptCatalog::new(transport.clone(), BASE);

        let releases = catalog.list_releases(&spec("x"), &query()).await.unwrap();
        let versions: Vec<_> = releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, ["16.0.1+9", "15.0.2+7", "11.0.10+9", "11.0.9+11"]);

        let pages: Vec<_> = transport
            .calls()
            .into_iter()
            .filter(|url| url.contains(FULL_RANGE_PATH))
            .collect();
        assert_eq!(pages.len(), 3);
        assert!(pages[0].ends_with("page=0"));
        assert!(pages[2].ends_with("page=2"));
    }

    #[tokio::test]
    async fn test_not_found_ends_enumeration() {
        let transport = Arc::new(
            StubTransport::new()
                .json("page=0", json!({ "versions": [record("11.0.10+9")] }))
                .status("page=1", 404),
        );
        let catalog = AdoptCatalog::new(transport, BASE);

        let releases = catalog.list_releases(&spec(">=11"), &query()).await.unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].major, Some(11));
        assert_eq!(releases[0].download_link, "https://dl.test/11.0.10+9.tar.gz");
    }

    #[tokio::test]
    async fn test_first_page_failure_is_fatal() {
        let transport = Arc::new(StubTransport::new().status("page=0", 502));
        let catalog = AdoptCatalog::new(transport, BASE);

        let err = catalog.list_releases(&spec("11"), &query()).await.unwrap_err();
        assert!(matches!(err, SetupError::CatalogUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_first_page_not_found_is_empty() {
        let transport = Arc::new(StubTransport::new().status("page=0", 404));
        let catalog = AdoptCatalog::new(transport, BASE);

        let releases = catalog.list_releases(&spec("11"), &query()).await.unwrap();
        assert!(releases.is_empty());
    }

    #[tokio::test]
    async fn test_major_index_narrows_search() {
        let transport = Arc::new(
            StubTransport::new()
                .json(
                    "/info/available_releases",
                    json!({ "available_releases": [8, 11, 16], "most_recent_feature_release": 16 }),
                )
                .status("page=1", 404)
                .json("/assets/feature_releases/11/ga", json!([record("11.0.10+9")])),
        );
        let catalog = AdoptCatalog::new(transport.clone(), BASE);

        let releases = catalog.list_releases(&spec("11"), &query()).await.unwrap();
        assert_eq!(releases.len(), 1);

        let calls = transport.calls();
        assert!(calls[1].starts_with(&format!("{}/assets/feature_releases/11/ga?", BASE)));
        assert!(calls[1].contains("architecture=x64"));
        assert!(calls[1].contains("image_type=jdk"));
        assert!(calls[1].contains("os=linux"));
        assert!(calls[1].contains("vendor=adoptopenjdk"));
        assert!(calls[1].contains("page_size=20"));
        assert!(calls.iter().all(|url| !url.contains(FULL_RANGE_PATH)));
    }

    #[tokio::test]
    async fn test_early_access_narrows_to_ea_feature_release() {
        let transport = Arc::new(
            StubTransport::new()
                .json(
                    "/info/available_releases",
                    json!({ "available_releases": [11, 14], "most_recent_feature_release": 14 }),
                )
                .status("page=1", 404)
                .json(
                    "/assets/feature_releases/14/ea",
                    json!([record("14.0.0-ea.36"), record("14.0.0-ea.35")]),
                ),
        );
        let catalog = AdoptCatalog::new(transport.clone(), BASE);

        let releases = catalog.list_releases(&spec("14-ea"), &query()).await.unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].version, "14.0.0-ea.36");

        let calls = transport.calls();
        assert!(calls[1].starts_with(&format!("{}/assets/feature_releases/14/ea?", BASE)));
        assert!(calls.iter().all(|url| !url.contains(FULL_RANGE_PATH)));
    }

    #[tokio::test]
    async fn test_unknown_major_falls_back_to_full_scan() {
        let transport = Arc::new(
            StubTransport::new()
                .json("/info/available_releases", json!({ "available_releases": [8, 11] }))
                .json("page=0", json!([record("11.0.10+9")]))
                .status("page=1", 404),
        );
        let catalog = AdoptCatalog::new(transport.clone(), BASE);

        catalog.list_releases(&spec("12"), &query()).await.unwrap();
        assert!(transport.calls()[1].contains(FULL_RANGE_PATH));
    }

    #[tokio::test]
    async fn test_releases_without_binaries_and_malformed_records_are_dropped() {
        let transport = Arc::new(
            StubTransport::new()
                .json(
                    "page=0",
                    json!([
                        record("11.0.10+9"),
                        { "version_data": { "semver": "11.0.9+11" }, "binaries": [] },
                        { "unexpected": true }
                    ]),
                )
                .status("page=1", 404),
        );
        let catalog = AdoptCatalog::new(transport, BASE);

        let releases = catalog.list_releases(&spec(">=11"), &query()).await.unwrap();
        let versions: Vec<_> = releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, ["11.0.10+9"]);
    }
}
