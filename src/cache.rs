//! On-disk tool cache.
//!
//! Layout: `<root>/<tool name>/<version>/<arch>/` holds an installation and
//! `<root>/<tool name>/<version>/<arch>.complete` marks it as finished. The
//! marker is written last, so an interrupted store never becomes visible.

use crate::error::SetupError;
use crate::types::CacheKey;
use crate::version::{parse_version, VersionSpec};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A cache entry located by [`ToolCache::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTool {
    pub path: PathBuf,
    pub version: String,
}

pub trait ToolCache: Send + Sync {
    /// Highest cached version of `tool_name` for `arch` that satisfies `spec`.
    fn find(
        &self,
        tool_name: &str,
        spec: &VersionSpec,
        arch: &str,
    ) -> Result<Option<CachedTool>, SetupError>;

    /// Copies `source_dir` into the cache under `key` and returns the new path.
    fn store(&self, source_dir: &Path, key: &CacheKey) -> Result<PathBuf, SetupError>;
}

/// Entry reported by [`DirToolCache::entries`].
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub tool_name: String,
    pub version: String,
    pub arch: String,
    pub path: PathBuf,
    pub completed_at: Option<DateTime<Utc>>,
}

pub struct DirToolCache {
    root: PathBuf,
}

impl DirToolCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_dir(&self, tool_name: &str, version: &str, arch: &str) -> PathBuf {
        self.root.join(tool_name).join(version).join(arch)
    }

    fn marker(&self, tool_name: &str, version: &str, arch: &str) -> PathBuf {
        self.root
            .join(tool_name)
            .join(version)
            .join(format!("{}.complete", arch))
    }

    fn is_complete(&self, tool_name: &str, version: &str, arch: &str) -> bool {
        self.marker(tool_name, version, arch).is_file()
            && self.entry_dir(tool_name, version, arch).is_dir()
    }

    /// Versions of `tool_name` with a complete installation for `arch`.
    fn cached_versions(&self, tool_name: &str, arch: &str) -> Result<Vec<String>, SetupError> {
        let tool_dir = self.root.join(tool_name);
        if !tool_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&tool_dir).map_err(|e| SetupError::cache(&tool_dir, e))? {
            let entry = entry.map_err(|e| SetupError::cache(&tool_dir, e))?;
            let version = entry.file_name().to_string_lossy().to_string();
            if self.is_complete(tool_name, &version, arch) {
                versions.push(version);
            }
        }
        Ok(versions)
    }

    /// Every complete installation in the cache, sorted by tool name and version.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, SetupError> {
        let mut entries = Vec::new();
        if !self.root.is_dir() {
            return Ok(entries);
        }

        for marker in WalkDir::new(&self.root)
            .min_depth(3)
            .max_depth(3)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let Some(arch) = marker
                .file_name()
                .to_str()
                .and_then(|name| name.strip_suffix(".complete"))
            else {
                continue;
            };
            let version_dir = marker.path().parent().unwrap_or(self.root.as_path());
            let tool_dir = version_dir.parent().unwrap_or(self.root.as_path());
            let name_of = |p: &Path| {
                p.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default()
            };
            let completed_at = fs::read_to_string(marker.path())
                .ok()
                .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
                .map(|t| t.with_timezone(&Utc));

            entries.push(CacheEntry {
                tool_name: name_of(tool_dir),
                version: name_of(version_dir),
                arch: arch.to_string(),
                path: version_dir.join(arch),
                completed_at,
            });
        }

        entries.sort_by(|a, b| {
            a.tool_name.cmp(&b.tool_name).then_with(|| {
                match (parse_version(&a.version), parse_version(&b.version)) {
                    (Some(va), Some(vb)) => va.cmp(&vb),
                    _ => a.version.cmp(&b.version),
                }
            })
        });
        Ok(entries)
    }
}

impl ToolCache for DirToolCache {
    fn find(
        &self,
        tool_name: &str,
        spec: &VersionSpec,
        arch: &str,
    ) -> Result<Option<CachedTool>, SetupError> {
        let found = match spec.exact_version() {
            // exact requests only look at their own directory
            Some(exact) => {
                let version = exact.to_string();
                self.is_complete(tool_name, &version, arch)
                    .then_some(version)
            }
            None => self
                .cached_versions(tool_name, arch)?
                .into_iter()
                .filter(|v| spec.matches_str(v))
                .filter_map(|v| parse_version(&v).map(|parsed| (parsed, v)))
                .max_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(_, v)| v),
        };

        match found {
            Some(version) => {
                let path = self.entry_dir(tool_name, &version, arch);
                tracing::debug!("Found {} {} in tool cache at {}", tool_name, version, path.display());
                Ok(Some(CachedTool { path, version }))
            }
            None => {
                tracing::debug!("{} {} ({}) not found in tool cache", tool_name, spec, arch);
                Ok(None)
            }
        }
    }

    fn store(&self, source_dir: &Path, key: &CacheKey) -> Result<PathBuf, SetupError> {
        let tool_name = key.tool_name();
        let dest = self.entry_dir(&tool_name, &key.version, &key.architecture);
        let marker = self.marker(&tool_name, &key.version, &key.architecture);
        tracing::info!("Caching {} {} to {}", tool_name, key.version, dest.display());

        // invalidate before touching the directory
        if marker.exists() {
            fs::remove_file(&marker).map_err(|e| SetupError::cache(&marker, e))?;
        }
        if dest.exists() {
            fs::remove_dir_all(&dest).map_err(|e| SetupError::cache(&dest, e))?;
        }
        fs::create_dir_all(&dest).map_err(|e| SetupError::cache(&dest, e))?;

        if let Err(e) = copy_dir(source_dir, &dest) {
            let _ = fs::remove_dir_all(&dest);
            return Err(e);
        }

        fs::write(&marker, Utc::now().to_rfc3339()).map_err(|e| SetupError::cache(&marker, e))?;
        Ok(dest)
    }
}

fn copy_dir(source: &Path, dest: &Path) -> Result<(), SetupError> {
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            SetupError::cache(path, e.into())
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| SetupError::cache(entry.path(), std::io::Error::other(e)))?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| SetupError::cache(&target, e))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| SetupError::cache(&target, e))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(source: &Path, target: &Path) -> Result<(), SetupError> {
    let link = fs::read_link(source).map_err(|e| SetupError::cache(source, e))?;
    std::os::unix::fs::symlink(&link, target).map_err(|e| SetupError::cache(target, e))
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, target: &Path) -> Result<(), SetupError> {
    fs::copy(source, target)
        .map(|_| ())
        .map_err(|e| SetupError::cache(target, e))
}

/// Version of a cached installation, read from its path
/// (`<root>/<tool>/<version>/<arch>`).
pub fn version_from_cache_path(path: &Path) -> Option<String> {
    path.parent()?
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
}
