use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Distribution {
    #[serde(rename = "adopt", alias = "adoptopenjdk")]
    #[value(name = "adopt", alias = "adoptopenjdk")]
    #[default]
    Adopt,
    #[serde(rename = "zulu")]
    #[value(name = "zulu")]
    Zulu,
}

impl Distribution {
    /// Vendor name as it appears in tool-cache folder names.
    pub fn display_name(&self) -> &'static str {
        match self {
            Distribution::Adopt => "AdoptOpenJDK",
            Distribution::Zulu => "Azul Systems, Inc.",
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Distribution::Adopt => "adopt",
            Distribution::Zulu => "zulu",
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    #[default]
    Jdk,
    Jre,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Jdk => "jdk",
            PackageType::Jre => "jre",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One installable release, normalized from a vendor catalog record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    pub version: String,
    pub download_link: String,
    #[serde(default)]
    pub major: Option<u64>,
}

impl ReleaseDescriptor {
    pub fn new(version: impl Into<String>, download_link: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            download_link: download_link.into(),
            major: None,
        }
    }

    pub fn with_major(mut self, major: u64) -> Self {
        self.major = Some(major);
        self
    }
}

/// Identity of an installation in the tool cache.
///
/// `version` is compared as a plain string: a key holding a range such as
/// `11.x` never equals one holding `11.0.2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub distribution: Distribution,
    pub package_type: PackageType,
    pub version: String,
    pub architecture: String,
}

impl CacheKey {
    pub fn new(
        distribution: Distribution,
        package_type: PackageType,
        version: impl Into<String>,
        architecture: impl Into<String>,
    ) -> Self {
        Self {
            distribution,
            package_type,
            version: version.into(),
            architecture: architecture.into(),
        }
    }

    /// Folder name shared by every version of this distribution and package type,
    /// e.g. `Java_AdoptOpenJDK_jdk`.
    pub fn tool_name(&self) -> String {
        tool_name(self.distribution, self.package_type)
    }
}

pub fn tool_name(distribution: Distribution, package_type: PackageType) -> String {
    format!(
        "Java_{}_{}",
        distribution.display_name().replace(' ', ""),
        package_type
    )
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstallationResult {
    pub install_path: PathBuf,
    pub installed_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JdkupSettings {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    #[serde(default)]
    pub distribution: Distribution,
    #[serde(default)]
    pub package_type: PackageType,
    #[serde(default = "default_adopt_api_url")]
    pub adopt_api_url: String,
    #[serde(default = "default_zulu_api_url")]
    pub zulu_api_url: String,
    #[serde(default = "default_http_retries")]
    pub http_retries: u32,
}

fn default_cache_dir() -> String {
    if let Ok(runner_cache) = std::env::var("RUNNER_TOOL_CACHE") {
        if !runner_cache.is_empty() {
            return runner_cache;
        }
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jdkup")
        .join("toolcache")
        .to_string_lossy()
        .to_string()
}
fn default_adopt_api_url() -> String {
    "https://api.adoptopenjdk.net/v3".to_string()
}
fn default_zulu_api_url() -> String {
    "https://api.azul.com/zulu/download/community/v1.0".to_string()
}
fn default_http_retries() -> u32 {
    3
}

impl Default for JdkupSettings {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            distribution: Distribution::default(),
            package_type: PackageType::default(),
            adopt_api_url: default_adopt_api_url(),
            zulu_api_url: default_zulu_api_url(),
            http_retries: default_http_retries(),
        }
    }
}
