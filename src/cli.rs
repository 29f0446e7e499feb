use crate::types::{Distribution, PackageType};
use clap::{Args, Parser, Subcommand};

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // Release builds are tagged; use the tag as is
    if let Some(tag) = option_env!("JDKUP_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("JDKUP_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("JDKUP_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "jdkup")]
#[command(about = "Resolve, download and cache Java runtimes")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct JavaSelection {
    /// Java version or range (e.g. '11', '1.8', '17.0.2', '11.x', '>=11 <17', '14-ea')
    #[arg(id = "java_version", value_name = "VERSION")]
    pub version: String,

    /// Vendor to install from [default: configured distribution]
    #[arg(short, long, value_enum)]
    pub distribution: Option<Distribution>,

    /// Target architecture (e.g. 'x64', 'x86', 'aarch64') [default: host]
    #[arg(long)]
    pub arch: Option<String>,

    /// Package type [default: configured package type]
    #[arg(long = "package", value_enum)]
    pub package_type: Option<PackageType>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a Java runtime and print its environment
    #[command(
        after_help = "Examples:\n  jdkup install 17\n  jdkup install 1.8 -d zulu --package jre\n  eval \"$(jdkup -q install 11)\""
    )]
    Install {
        #[command(flatten)]
        selection: JavaSelection,

        /// Do not print or write JAVA_HOME/PATH exports
        #[arg(long)]
        no_export: bool,
    },

    /// Show which release a version would resolve to, without installing
    Resolve {
        #[command(flatten)]
        selection: JavaSelection,
    },

    /// List installations in the tool cache
    List,

    /// Manage jdkup's configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show the current version
    Version,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a configuration setting
    Get {
        /// Key to get (if omitted, shows all settings)
        key: Option<String>,
    },
    /// Set a configuration setting
    Set {
        /// Key and value (e.g., 'http-retries=5' or 'http-retries 5')
        #[arg(trailing_var_arg = true, required = true)]
        args: Vec<String>,
    },
    /// Reset a configuration setting to its default
    Unset {
        /// Key to unset (e.g., 'cache-dir')
        key: String,
    },
    /// Show full configuration
    Show {
        /// Output format (json, yaml)
        #[arg(long, default_value = "json")]
        format: String,
    },
}
