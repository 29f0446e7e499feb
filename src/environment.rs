//! Publishing an installation to the caller's environment.
//!
//! On a CI runner the variables go to the files named by `GITHUB_ENV`,
//! `GITHUB_PATH` and `GITHUB_OUTPUT`. Anywhere else they are printed as
//! `export` lines meant for `eval "$(jdkup install 17)"`.

use crate::types::InstallationResult;
use crate::version::parse_version;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exports {
    pub variables: Vec<(String, String)>,
    pub path_entry: PathBuf,
    pub outputs: Vec<(String, String)>,
}

impl Exports {
    pub fn for_installation(result: &InstallationResult, arch: &str) -> Self {
        let home = result.install_path.to_string_lossy().to_string();
        let mut variables = vec![("JAVA_HOME".to_string(), home.clone())];
        if let Some(version) = parse_version(&result.installed_version) {
            variables.push((
                format!("JAVA_HOME_{}_{}", version.major, arch.to_uppercase()),
                home.clone(),
            ));
        }

        Self {
            variables,
            path_entry: result.install_path.join("bin"),
            outputs: vec![
                ("path".to_string(), home),
                ("version".to_string(), result.installed_version.clone()),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSink {
    Github {
        env_file: PathBuf,
        path_file: PathBuf,
        output_file: PathBuf,
    },
    Shell,
}

impl ExportSink {
    pub fn from_env() -> Self {
        let file = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        match (file("GITHUB_ENV"), file("GITHUB_PATH"), file("GITHUB_OUTPUT")) {
            (Some(env_file), Some(path_file), Some(output_file)) => ExportSink::Github {
                env_file,
                path_file,
                output_file,
            },
            _ => ExportSink::Shell,
        }
    }

    /// Writes `exports`. Shell lines go to `out`.
    pub fn publish(&self, exports: &Exports, out: &mut dyn Write) -> Result<()> {
        match self {
            ExportSink::Github {
                env_file,
                path_file,
                output_file,
            } => {
                let env_lines: Vec<String> = exports
                    .variables
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                append_lines(env_file, &env_lines)?;
                append_lines(
                    path_file,
                    &[exports.path_entry.to_string_lossy().to_string()],
                )?;
                let output_lines: Vec<String> = exports
                    .outputs
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                append_lines(output_file, &output_lines)?;
                tracing::debug!("Exported Java environment to runner files");
            }
            ExportSink::Shell => {
                for (key, value) in &exports.variables {
                    writeln!(out, "export {}={}", key, shell_quote(value))?;
                }
                let bin = exports.path_entry.to_string_lossy();
                writeln!(
                    out,
                    "export PATH={}{}\"$PATH\"",
                    shell_quote(&bin),
                    path_separator()
                )?;
                for (key, value) in &exports.outputs {
                    writeln!(out, "# {}: {}", key, value)?;
                }
            }
        }
        Ok(())
    }
}

fn append_lines(file: &Path, lines: &[String]) -> Result<()> {
    let mut handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| format!("Could not open {}", file.display()))?;
    for line in lines {
        writeln!(handle, "{}", line)
            .with_context(|| format!("Could not write to {}", file.display()))?;
    }
    Ok(())
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

fn path_separator() -> char {
    if cfg!(windows) {
        ';'
    } else {
        ':'
    }
}
