//! Selection of a single release from a catalog listing.
//!
//! The policy is "true maximum": among descriptors whose version satisfies the
//! spec, the highest by semver precedence wins, and equal versions fall back to
//! catalog order. Catalogs may therefore return releases in any order.

use crate::error::SetupError;
use crate::types::ReleaseDescriptor;
use crate::version::{parse_version, VersionSpec};
use semver::Version;
use std::cmp::Ordering;

/// Precedence comparison that ignores build metadata (`11.0.2+9` == `11.0.2+10`).
fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

pub fn resolve(
    spec: &VersionSpec,
    releases: &[ReleaseDescriptor],
) -> Result<ReleaseDescriptor, SetupError> {
    let mut best: Option<(Version, &ReleaseDescriptor)> = None;

    for release in releases {
        let Some(version) = parse_version(&release.version) else {
            tracing::debug!("Ignoring release with non-semver version '{}'", release.version);
            continue;
        };
        if !spec.matches(&version) {
            continue;
        }
        let better = match &best {
            Some((current, _)) => precedence(&version, current) == Ordering::Greater,
            None => true,
        };
        if better {
            best = Some((version, release));
        }
    }

    let Some((_, release)) = best else {
        return Err(SetupError::NoSatisfyingVersion {
            spec: spec.to_string(),
            available: releases.iter().map(|r| r.version.clone()).collect(),
        });
    };

    tracing::debug!("Resolved {} to {}", spec, release.version);
    Ok(release.clone())
}

/// Whether `link` can be handed to the downloader.
pub fn is_usable_link(link: &str) -> bool {
    reqwest::Url::parse(link)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

/// [`resolve`], followed by a check that the chosen release can be downloaded.
pub fn resolve_downloadable(
    spec: &VersionSpec,
    releases: &[ReleaseDescriptor],
    os: &str,
    arch: &str,
) -> Result<ReleaseDescriptor, SetupError> {
    let release = resolve(spec, releases)?;
    if !is_usable_link(&release.download_link) {
        return Err(SetupError::NoBinaryForPlatform {
            version: release.version,
            os: os.to_string(),
            arch: arch.to_string(),
        });
    }
    Ok(release)
}
