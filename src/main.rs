mod cache;
mod catalog;
mod cli;
mod config;
mod download;
mod environment;
mod error;
mod install;
mod platform;
mod resolver;
mod transport;
mod types;
mod version;

#[cfg(test)]
mod tests;

use anyhow::{bail, Context, Result};
use cache::DirToolCache;
use clap::Parser;
use cli::{Cli, Commands, ConfigAction, JavaSelection};
use console::style;
use environment::{ExportSink, Exports};
use install::{InstallRequest, Installer};
use platform::HostPlatform;
use std::io::Write;
use std::sync::Arc;
use transport::ReqwestTransport;
use types::JdkupSettings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(&cli);

    if let Err(e) = run(cli).await {
        tracing::debug!("{:?}", e);
        eprintln!("{} {}", style("error:").red().bold(), describe(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => {
            println!("jdkup v{}", env!("CARGO_PKG_VERSION"));
        }

        Commands::Install {
            selection,
            no_export,
        } => {
            let settings = config::load_settings()?;
            let (installer, request) = build_installer(&settings, &selection)?;
            let result = installer.setup(&request).await?;

            let mut stdout = std::io::stdout().lock();
            if no_export {
                writeln!(stdout, "{}", serde_json::to_string_pretty(&result)?)?;
            } else {
                let exports = Exports::for_installation(&result, &request.architecture);
                ExportSink::from_env().publish(&exports, &mut stdout)?;
            }
        }

        Commands::Resolve { selection } => {
            let settings = config::load_settings()?;
            let (installer, request) = build_installer(&settings, &selection)?;
            let release = installer.resolve_release(&request).await?;
            println!("{} {}", release.version, release.download_link);
        }

        Commands::List => {
            let settings = config::load_settings()?;
            list_cached_installations(&DirToolCache::new(&settings.cache_dir))?;
        }

        Commands::Config { action } => handle_config(action)?,
    }

    Ok(())
}

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout is reserved for export lines
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}

/// Error message with every cause that the outer messages do not already repeat.
fn describe(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    for cause in error.chain().skip(1) {
        let cause = cause.to_string();
        if !message.contains(&cause) {
            message.push_str(": ");
            message.push_str(&cause);
        }
    }
    message
}

fn build_installer(
    settings: &JdkupSettings,
    selection: &JavaSelection,
) -> Result<(Installer, InstallRequest)> {
    let platform = HostPlatform::detect();
    let distribution = selection.distribution.unwrap_or(settings.distribution);
    let request = InstallRequest {
        version: selection.version.clone(),
        architecture: selection
            .arch
            .clone()
            .unwrap_or_else(|| platform.default_arch()),
        package_type: selection.package_type.unwrap_or(settings.package_type),
    };
    tracing::debug!(
        "Installing {} {} for {}/{} into {}",
        distribution,
        request.package_type,
        platform.os,
        request.architecture,
        settings.cache_dir
    );

    let transport = Arc::new(
        ReqwestTransport::new(settings.http_retries).context("Could not create HTTP client")?,
    );
    let cache = Box::new(DirToolCache::new(&settings.cache_dir));
    let installer = Installer::new(distribution, transport, cache, platform, settings);
    Ok((installer, request))
}

fn list_cached_installations(cache: &DirToolCache) -> Result<()> {
    let entries = cache.entries()?;
    println!("--- Cached Java Installations ---");
    if entries.is_empty() {
        println!("  No installations in {}", cache.root().display());
        return Ok(());
    }

    for entry in entries {
        let completed = entry
            .completed_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  - {} {} [{}] (cached {})",
            style(&entry.tool_name).bold(),
            entry.version,
            entry.arch,
            completed
        );
        println!("    Path:    {}\n", entry.path.display());
    }
    println!("---------------------------------");
    Ok(())
}

fn handle_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let settings = config::load_settings()?;
            if let Some(key) = key {
                println!("{}", config::get_setting(&settings, &key)?);
            } else {
                println!("--- jdkup Settings ---");
                for key in config::setting_keys() {
                    println!("  {}: {}", key, config::get_setting(&settings, &key)?);
                }
            }
        }
        ConfigAction::Set { args } => {
            let (key, value) = match args.as_slice() {
                [pair] => match pair.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => bail!("Invalid format. Use 'key=value' or 'key value'."),
                },
                [k, v] => (k.clone(), v.clone()),
                _ => bail!("Invalid format. Use 'key=value' or 'key value'."),
            };
            let settings = config::set_setting(&config::load_stored_settings()?, &key, &value)?;
            config::save_settings(&settings)?;
            tracing::info!("Setting '{}' updated to '{}'", config::normalize_key(&key), value);
        }
        ConfigAction::Unset { key } => {
            let settings = config::unset_setting(&config::load_stored_settings()?, &key)?;
            config::save_settings(&settings)?;
            tracing::info!("Setting '{}' unset", config::normalize_key(&key));
        }
        ConfigAction::Show { format } => {
            let settings = config::load_settings()?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&settings)?),
                "yaml" => print!("{}", serde_yaml::to_string(&settings)?),
                other => bail!("Unsupported format '{}'. Use json or yaml.", other),
            }
        }
    }
    Ok(())
}
