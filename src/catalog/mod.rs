//! Vendor release catalogs
//!
//! Each vendor speaks its own HTTP API. Clients decode the vendor's JSON into
//! typed records at this boundary and hand back uniform [`ReleaseDescriptor`]s.
//! Which client is used is decided by [`Distribution`], never by probing.

pub mod adopt;
pub mod zulu;

use crate::error::SetupError;
use crate::transport::Transport;
use crate::types::{Distribution, JdkupSettings, PackageType, ReleaseDescriptor};
use crate::version::VersionSpec;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub use adopt::AdoptCatalog;
pub use zulu::ZuluCatalog;

/// Filters every catalog query carries, already in the vendor's vocabulary
/// where the vendor has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub os: String,
    pub architecture: String,
    pub bitness: u8,
    pub package_type: PackageType,
    pub archive_extension: String,
}

#[async_trait]
pub trait ReleaseCatalog: Send + Sync {
    fn distribution(&self) -> Distribution;

    /// Releases available for the query's platform. Releases without a binary
    /// for that platform are left out.
    async fn list_releases(
        &self,
        spec: &VersionSpec,
        query: &CatalogQuery,
    ) -> Result<Vec<ReleaseDescriptor>, SetupError>;
}

pub fn for_distribution(
    distribution: Distribution,
    transport: Arc<dyn Transport>,
    settings: &JdkupSettings,
) -> Box<dyn ReleaseCatalog> {
    match distribution {
        Distribution::Adopt => Box::new(AdoptCatalog::new(transport, &settings.adopt_api_url)),
        Distribution::Zulu => Box::new(ZuluCatalog::new(transport, &settings.zulu_api_url)),
    }
}

/// Decodes the items of a JSON array one by one, logging and skipping the ones
/// that do not fit `T`.
pub(crate) fn decode_records<T: DeserializeOwned>(
    distribution: Distribution,
    items: Vec<serde_json::Value>,
) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping malformed {} release record: {}", distribution, e);
                None
            }
        })
        .collect()
}

pub(crate) fn build_url(base: &str, path: &str, params: &[(&str, String)]) -> String {
    let base = base.trim_end_matches('/');
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    if query.is_empty() {
        format!("{}{}", base, path)
    } else {
        format!("{}{}?{}", base, path, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        assert_eq!(
            build_url(
                "https://api.example.com/v3/",
                "/info/available_releases",
                &[]
            ),
            "https://api.example.com/v3/info/available_releases"
        );
        assert_eq!(
            build_url(
                "https://api.example.com",
                "/bundles/",
                &[("os", "linux".to_string()), ("ext", "tar.gz".to_string())]
            ),
            "https://api.example.com/bundles/?os=linux&ext=tar.gz"
        );
    }

    #[test]
    fn test_decode_records_skips_malformed() {
        #[derive(serde::Deserialize)]
        struct Record {
            id: u64,
        }
        let items = vec![
            serde_json::json!({ "id": 1 }),
            serde_json::json!({ "id": "nope" }),
            serde_json::json!({ "id": 3 }),
        ];
        let decoded: Vec<Record> = decode_records(Distribution::Zulu, items);
        assert_eq!(decoded.iter().map(|r| r.id).collect::<Vec<_>>(), [1, 3]);
    }

    #[test]
    fn test_for_distribution_selects_variant() {
        let transport: Arc<dyn Transport> = Arc::new(crate::transport::stub::StubTransport::new());
        let settings = JdkupSettings::default();
        assert_eq!(
            for_distribution(Distribution::Adopt, transport.clone(), &settings).distribution(),
            Distribution::Adopt
        );
        assert_eq!(
            for_distribution(Distribution::Zulu, transport, &settings).distribution(),
            Distribution::Zulu
        );
    }
}
