use crate::cache::{version_from_cache_path, ToolCache};
use crate::catalog::{self, CatalogQuery, ReleaseCatalog};
use crate::download::{archive_file_name, extract_archive};
use crate::error::SetupError;
use crate::platform::HostPlatform;
use crate::resolver;
use crate::transport::Transport;
use crate::types::{
    tool_name, CacheKey, Distribution, InstallationResult, JdkupSettings, PackageType,
    ReleaseDescriptor,
};
use crate::version::{clean_version, VersionSpec};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub version: String,
    pub architecture: String,
    pub package_type: PackageType,
}

/// Resolves a request to a cached or freshly downloaded Java installation.
///
/// The flow is linear: normalize the version, look in the tool cache, and on
/// a miss query the catalog, resolve one release, download, extract and store
/// it. Any failure ends the run; nothing is cached unless the store completed.
pub struct Installer {
    distribution: Distribution,
    catalog: Box<dyn ReleaseCatalog>,
    cache: Box<dyn ToolCache>,
    transport: Arc<dyn Transport>,
    platform: HostPlatform,
}

impl Installer {
    pub fn new(
        distribution: Distribution,
        transport: Arc<dyn Transport>,
        cache: Box<dyn ToolCache>,
        platform: HostPlatform,
        settings: &JdkupSettings,
    ) -> Self {
        let catalog = catalog::for_distribution(distribution, transport.clone(), settings);
        Self::with_catalog(catalog, transport, cache, platform)
    }

    pub fn with_catalog(
        catalog: Box<dyn ReleaseCatalog>,
        transport: Arc<dyn Transport>,
        cache: Box<dyn ToolCache>,
        platform: HostPlatform,
    ) -> Self {
        Self {
            distribution: catalog.distribution(),
            catalog,
            cache,
            transport,
            platform,
        }
    }

    pub async fn setup(&self, request: &InstallRequest) -> Result<InstallationResult, SetupError> {
        let spec = VersionSpec::normalize(&request.version)?;
        let name = tool_name(self.distribution, request.package_type);

        let installed = match self.cache.find(&name, &spec, &request.architecture)? {
            Some(hit) => {
                tracing::info!(
                    "Resolved Java {} from tool-cache ({})",
                    hit.version,
                    self.distribution.display_name()
                );
                let version = version_from_cache_path(&hit.path).unwrap_or(hit.version);
                InstallationResult {
                    install_path: hit.path,
                    installed_version: version,
                }
            }
            None => {
                tracing::info!(
                    "Java {} ({}) was not found in tool-cache",
                    spec,
                    self.distribution.display_name()
                );
                let release = self.find_release(&spec, request).await?;
                self.download_and_cache(&release, request).await?
            }
        };

        Ok(self.finalize(installed))
    }

    /// Catalog query and resolution only, without touching the cache.
    pub async fn resolve_release(
        &self,
        request: &InstallRequest,
    ) -> Result<ReleaseDescriptor, SetupError> {
        let spec = VersionSpec::normalize(&request.version)?;
        self.find_release(&spec, request).await
    }

    fn catalog_query(&self, request: &InstallRequest) -> CatalogQuery {
        let (architecture, bitness) = self
            .platform
            .catalog_arch(self.distribution, &request.architecture);
        CatalogQuery {
            os: self.platform.catalog_os(self.distribution),
            architecture,
            bitness,
            package_type: request.package_type,
            archive_extension: self.platform.archive_extension().to_string(),
        }
    }

    async fn find_release(
        &self,
        spec: &VersionSpec,
        request: &InstallRequest,
    ) -> Result<ReleaseDescriptor, SetupError> {
        let query = self.catalog_query(request);
        let releases = self.catalog.list_releases(spec, &query).await?;
        resolver::resolve_downloadable(spec, &releases, &query.os, &request.architecture)
    }

    async fn download_and_cache(
        &self,
        release: &ReleaseDescriptor,
        request: &InstallRequest,
    ) -> Result<InstallationResult, SetupError> {
        tracing::info!(
            "Downloading Java {} ({}) from {} ...",
            release.version,
            self.distribution.display_name(),
            release.download_link
        );

        let work_dir = tempfile::Builder::new()
            .prefix("jdkup-")
            .tempdir()
            .map_err(|e| SetupError::download_or_extract(&release.download_link, e))?;

        let archive = work_dir.path().join(archive_file_name(
            &release.download_link,
            self.platform.archive_extension(),
        ));
        self.transport
            .download(&release.download_link, &archive)
            .await
            .map_err(|e| SetupError::download_or_extract(&release.download_link, e))?;

        let content_root = extract_archive(&archive, &work_dir.path().join("extracted"))?;

        // Cached under the plain version so an exact request finds it again
        let version = clean_version(&release.version);
        let key = CacheKey::new(
            self.distribution,
            request.package_type,
            version.clone(),
            request.architecture.clone(),
        );
        let install_path = self.cache.store(&content_root, &key)?;

        cleanup(work_dir);
        Ok(InstallationResult {
            install_path,
            installed_version: version,
        })
    }

    /// Points the result at the runtime root when the platform nests it
    /// inside the installation (macOS bundles keep it under `Contents/Home`).
    fn finalize(&self, mut result: InstallationResult) -> InstallationResult {
        if let Some(nested) = self.platform.nested_content_dir() {
            let candidate: PathBuf = result.install_path.join(nested);
            if candidate.is_dir() {
                result.install_path = candidate;
            }
        }
        tracing::info!(
            "Java {} installed at {}",
            result.installed_version,
            result.install_path.display()
        );
        result
    }
}

fn cleanup(work_dir: TempDir) {
    let path = work_dir.path().to_path_buf();
    if let Err(e) = work_dir.close() {
        tracing::warn!("Failed to remove temporary directory {}: {}", path.display(), e);
    }
}
