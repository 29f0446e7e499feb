use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by an HTTP transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Catalog APIs answer past the last page with a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::Status { status: 404, .. })
    }

    /// Whether another attempt has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Status { status, .. } => *status == 429 || *status >= 500,
            TransportError::Request { .. } => true,
            TransportError::Decode { .. } | TransportError::Io(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(
        "The version '{input}' is not valid semver notation ({reason}). \
         Use a version such as '11', '1.8', '17.0.2', '11.x' or '14-ea'"
    )]
    InvalidVersionSpec { input: String, reason: String },

    #[error("Unable to query the {distribution} release catalog: {source}")]
    CatalogUnavailable {
        distribution: String,
        #[source]
        source: TransportError,
    },

    #[error("Could not find satisfied version for semver {spec}.{}", available_suffix(.available))]
    NoSatisfyingVersion { spec: String, available: Vec<String> },

    #[error("No binaries were found for version {version} on {os}/{arch}")]
    NoBinaryForPlatform {
        version: String,
        os: String,
        arch: String,
    },

    #[error("Failed to download or extract {target}: {reason}")]
    DownloadOrExtractFailure { target: String, reason: String },

    #[error("Tool cache error at {}: {source}", .path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn available_suffix(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!("\nAvailable versions: {}", available.join(", "))
    }
}

impl SetupError {
    pub fn cache(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SetupError::Cache {
            path: path.into(),
            source,
        }
    }

    pub fn download_or_extract(target: impl Into<String>, reason: impl ToString) -> Self {
        SetupError::DownloadOrExtractFailure {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}
