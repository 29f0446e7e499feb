//! Azul Zulu community API client.
//!
//! The bundle list carries version tuples but not always a download URL, so
//! the best match is looked up a second time through `bundles/latest`, which
//! returns the URL for one exact version.

use super::{build_url, decode_records, CatalogQuery, ReleaseCatalog};
use crate::error::{SetupError, TransportError};
use crate::resolver;
use crate::transport::Transport;
use crate::types::{Distribution, ReleaseDescriptor};
use crate::version::{coerce, VersionSpec};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct ZuluBundle {
    #[allow(dead_code)]
    id: u64,
    jdk_version: Vec<u64>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZuluBundleDetail {
    url: String,
}

pub struct ZuluCatalog {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl ZuluCatalog {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn unavailable(source: TransportError) -> SetupError {
        SetupError::CatalogUnavailable {
            distribution: Distribution::Zulu.display_name().to_string(),
            source,
        }
    }

    fn platform_params(query: &CatalogQuery) -> Vec<(&'static str, String)> {
        vec![
            ("os", query.os.clone()),
            ("arch", query.architecture.clone()),
            ("hw_bitness", query.bitness.to_string()),
            ("ext", query.archive_extension.clone()),
            ("bundle_type", query.package_type.to_string()),
        ]
    }

    async fn bundles(&self, query: &CatalogQuery) -> Result<Vec<ZuluBundle>, TransportError> {
        let url = build_url(&self.base_url, "/bundles/", &Self::platform_params(query));
        let body = self.transport.get_json(&url).await?;
        let items: Vec<serde_json::Value> =
            serde_json::from_value(body).map_err(|e| TransportError::Decode {
                url: url.clone(),
                message: e.to_string(),
            })?;
        Ok(decode_records(Distribution::Zulu, items))
    }

    async fn latest_url(&self, version: &str, query: &CatalogQuery) -> Result<String, TransportError> {
        let mut params = Self::platform_params(query);
        params.push(("jdk_version", version.to_string()));
        let url = build_url(&self.base_url, "/bundles/latest/", &params);

        let body = self.transport.get_json(&url).await?;
        let detail: ZuluBundleDetail =
            serde_json::from_value(body).map_err(|e| TransportError::Decode {
                url,
                message: e.to_string(),
            })?;
        Ok(detail.url)
    }
}

#[async_trait]
impl ReleaseCatalog for ZuluCatalog {
    fn distribution(&self) -> Distribution {
        Distribution::Zulu
    }

    async fn list_releases(
        &self,
        spec: &VersionSpec,
        query: &CatalogQuery,
    ) -> Result<Vec<ReleaseDescriptor>, SetupError> {
        let bundles = self.bundles(query).await.map_err(Self::unavailable)?;
        tracing::debug!("Zulu returned {} bundles", bundles.len());

        let mut descriptors: Vec<ReleaseDescriptor> = bundles
            .into_iter()
            .filter_map(|bundle| {
                let joined = bundle
                    .jdk_version
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join(".");
                let Some(version) = coerce(&joined) else {
                    tracing::warn!("Skipping Zulu bundle with version '{}'", joined);
                    return None;
                };
                Some(
                    ReleaseDescriptor::new(version.to_string(), bundle.url.unwrap_or_default())
                        .with_major(version.major),
                )
            })
            .collect();

        // only the release that will be chosen needs an authoritative link
        if let Ok(best) = resolver::resolve(spec, &descriptors) {
            let url = self.latest_url(&best.version, query).await.map_err(Self::unavailable)?;
            if let Some(slot) = descriptors.iter_mut().find(|d| **d == best) {
                tracing::debug!("Zulu {} download URL: {}", best.version, url);
                slot.download_link = url;
            }
        }

        Ok(descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::stub::StubTransport;
    use crate::types::PackageType;
    use serde_json::json;

    const BASE: &str = "https://api.zulu.test/v1.0";

    fn query() -> CatalogQuery {
        CatalogQuery {
            os: "linux".to_string(),
            architecture: "x86".to_string(),
            bitness: 64,
            package_type: PackageType::Jdk,
            archive_extension: "tar.gz".to_string(),
        }
    }

    fn bundles() -> serde_json::Value {
        json!([
            { "id": 1, "jdk_version": [8, 0, 282, 8], "zulu_version": [8, 52, 0, 23] },
            { "id": 2, "jdk_version": [11, 0, 10, 9], "zulu_version": [11, 45, 27] },
            { "id": 3, "jdk_version": [11, 0, 9, 11], "url": "https://cdn.zulu.test/zulu11.0.9.tar.gz" },
            { "id": "broken" }
        ])
    }

    #[tokio::test]
    async fn test_best_match_gets_latest_url() {
        let transport = Arc::new(
            StubTransport::new()
                .json(
                    "/bundles/latest/",
                    json!({ "id": 2, "url": "https://cdn.zulu.test/zulu11.45.27-jdk11.0.10.tar.gz" }),
                )
                .json("/bundles/", bundles()),
        );
        let catalog = ZuluCatalog::new(transport.clone(), BASE);

        let spec = VersionSpec::normalize("11").unwrap();
        let releases = catalog.list_releases(&spec, &query()).await.unwrap();
        let versions: Vec<_> = releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, ["8.0.282", "11.0.10", "11.0.9"]);

        assert_eq!(releases[0].download_link, "");
        assert_eq!(
            releases[1].download_link,
            "https://cdn.zulu.test/zulu11.45.27-jdk11.0.10.tar.gz"
        );
        assert_eq!(releases[2].download_link, "https://cdn.zulu.test/zulu11.0.9.tar.gz");

        let calls = transport.calls();
        assert_eq!(
            calls[0],
            format!("{}/bundles/?os=linux&arch=x86&hw_bitness=64&ext=tar.gz&bundle_type=jdk", BASE)
        );
        assert!(calls[1].contains("/bundles/latest/?"));
        assert!(calls[1].ends_with("jdk_version=11.0.10"));
    }

    #[tokio::test]
    async fn test_no_match_skips_second_query() {
        let transport = Arc::new(StubTransport::new().json("/bundles/", bundles()));
        let catalog = ZuluCatalog::new(transport.clone(), BASE);

        let spec = VersionSpec::normalize("17").unwrap();
        let releases = catalog.list_releases(&spec, &query()).await.unwrap();
        assert_eq!(releases.len(), 3);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_catalog() {
        let transport = Arc::new(StubTransport::new().status("/bundles/", 500));
        let catalog = ZuluCatalog::new(transport, BASE);

        let spec = VersionSpec::normalize("11").unwrap();
        let err = catalog.list_releases(&spec, &query()).await.unwrap_err();
        assert!(matches!(err, SetupError::CatalogUnavailable { .. }));
        assert!(err.to_string().contains("Azul Systems, Inc."));
    }
}
