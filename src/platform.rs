use crate::types::Distribution;
use std::path::Path;

/// The OS and architecture this process runs on, in `std::env::consts` terms.
///
/// Every vendor-specific spelling of the platform is derived from this value,
/// so the installer can be pointed at a different host in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: String,
    pub arch: String,
}

impl HostPlatform {
    pub fn detect() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    pub fn is_macos(&self) -> bool {
        self.os == "macos"
    }

    /// Architecture name used when the user does not pass one.
    pub fn default_arch(&self) -> String {
        match self.arch.as_str() {
            "x86_64" => "x64".to_string(),
            "aarch64" => "aarch64".to_string(),
            "x86" => "x86".to_string(),
            other => other.to_string(),
        }
    }

    /// Operating system name in the vendor's catalog vocabulary.
    pub fn catalog_os(&self, distribution: Distribution) -> String {
        match (distribution, self.os.as_str()) {
            (Distribution::Adopt, "macos") => "mac".to_string(),
            (Distribution::Zulu, "macos") => "macos".to_string(),
            (_, "windows") => "windows".to_string(),
            (_, os) => os.to_string(),
        }
    }

    /// Architecture name and bitness in the vendor's catalog vocabulary.
    pub fn catalog_arch(&self, distribution: Distribution, arch: &str) -> (String, u8) {
        match distribution {
            Distribution::Adopt => match arch {
                "x86" => ("x32".to_string(), 32),
                "x32" | "arm" => (arch.to_string(), 32),
                other => (other.to_string(), 64),
            },
            Distribution::Zulu => match arch {
                "x64" | "x86_64" | "amd64" => ("x86".to_string(), 64),
                "x86" | "x32" => ("x86".to_string(), 32),
                "aarch64" | "arm64" => ("arm".to_string(), 64),
                "arm" => ("arm".to_string(), 32),
                other => (other.to_string(), 64),
            },
        }
    }

    pub fn archive_extension(&self) -> &'static str {
        if self.is_windows() {
            "zip"
        } else {
            "tar.gz"
        }
    }

    /// Directory inside an extracted JDK that holds the actual runtime root.
    pub fn nested_content_dir(&self) -> Option<&'static Path> {
        if self.is_macos() {
            Some(Path::new("Contents/Home"))
        } else {
            None
        }
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::detect()
    }
}
