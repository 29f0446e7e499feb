use crate::config;
use crate::platform::HostPlatform;
use crate::types::{tool_name, Distribution, JdkupSettings, PackageType};

#[test]
fn test_normalize_key() {
    assert_eq!(config::normalize_key("http-retries"), "http_retries");
    assert_eq!(config::normalize_key("cacheDir"), "cache_dir");
    assert_eq!(config::normalize_key("adopt-api-url"), "adopt_api_url");
}

#[test]
fn test_platform_info() {
    let host = HostPlatform::detect();
    assert!(!host.os.is_empty());
    assert!(!host.default_arch().is_empty());
}

#[test]
fn test_settings_default() {
    let settings = JdkupSettings::default();
    assert_eq!(settings.distribution, Distribution::Adopt);
    assert_eq!(settings.package_type, PackageType::Jdk);
    assert_eq!(settings.http_retries, 3);
    assert!(settings.adopt_api_url.starts_with("https://api.adoptopenjdk.net"));
    assert!(!settings.cache_dir.is_empty());
}

#[test]
fn test_settings_fill_missing_fields() {
    let settings: JdkupSettings =
        serde_json::from_str(r#"{ "distribution": "zulu", "http_retries": 1 }"#).unwrap();
    assert_eq!(settings.distribution, Distribution::Zulu);
    assert_eq!(settings.http_retries, 1);
    assert_eq!(settings.zulu_api_url, JdkupSettings::default().zulu_api_url);
}

#[test]
fn test_tool_names() {
    assert_eq!(
        tool_name(Distribution::Adopt, PackageType::Jdk),
        "Java_AdoptOpenJDK_jdk"
    );
    assert_eq!(
        tool_name(Distribution::Zulu, PackageType::Jre),
        "Java_AzulSystems,Inc._jre"
    );
}
