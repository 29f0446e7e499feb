use crate::error::{SetupError, TransportError};
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tar::Archive;

/// Streams a response body to `local_path` with a progress bar on stderr.
pub async fn download_file(
    response: reqwest::Response,
    url: &str,
    local_path: &Path,
) -> Result<(), TransportError> {
    let filename = local_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| url.to_string());
    tracing::info!("Downloading {}...", filename);

    let total_size = response.content_length().unwrap_or(0);
    let pb = ProgressBar::new(total_size);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(format!("Downloading {}", filename));

    let mut file = fs::File::create(local_path)?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }
    file.flush()?;

    pb.finish_with_message("Download complete");
    Ok(())
}

/// File name to save a download under: the last URL segment when it names a
/// known archive, otherwise a generic name with the platform's extension.
pub fn archive_file_name(url: &str, fallback_extension: &str) -> String {
    let last = url
        .split(['?', '#'])
        .next()
        .and_then(|u| u.rsplit('/').next())
        .unwrap_or("");
    if ArchiveFormat::from_path(Path::new(last)).is_some() {
        last.to_string()
    } else {
        format!("java_package.{}", fallback_extension)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    Zip,
    TarGz,
    TarXz,
}

impl ArchiveFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar.xz") {
            Some(ArchiveFormat::TarXz)
        } else {
            None
        }
    }
}

/// Unpacks `archive_path` into `extract_dir` and returns the content root: the
/// archive's single top-level directory if it has one, `extract_dir` otherwise.
pub fn extract_archive(archive_path: &Path, extract_dir: &Path) -> Result<PathBuf, SetupError> {
    let archive_name = archive_path.display().to_string();
    tracing::info!("Extracting Java archive {}...", archive_name);

    let format = ArchiveFormat::from_path(archive_path).ok_or_else(|| {
        SetupError::download_or_extract(&archive_name, "unsupported archive format")
    })?;

    fs::create_dir_all(extract_dir).map_err(|e| SetupError::download_or_extract(&archive_name, e))?;
    match format {
        ArchiveFormat::Zip => extract_zip(archive_path, extract_dir),
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, extract_dir),
        ArchiveFormat::TarXz => extract_tar_xz(archive_path, extract_dir),
    }
    .map_err(|e| SetupError::download_or_extract(&archive_name, e))?;

    content_root(extract_dir).map_err(|e| SetupError::download_or_extract(&archive_name, e))
}

fn extract_zip(archive_path: &Path, extract_dir: &Path) -> anyhow::Result<()> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(relative) = file.enclosed_name().map(Path::to_path_buf) else {
            tracing::warn!("Skipping unsafe path in zip: {}", file.name());
            continue;
        };
        let outpath = extract_dir.join(relative);

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = fs::File::create(&outpath)?;
            io::copy(&mut file, &mut outfile)?;

            #[cfg(unix)]
            if let Some(mode) = file.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(())
}

fn extract_tar_gz(archive_path: &Path, extract_dir: &Path) -> anyhow::Result<()> {
    let file = fs::File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.unpack(extract_dir)?;
    Ok(())
}

fn extract_tar_xz(archive_path: &Path, extract_dir: &Path) -> anyhow::Result<()> {
    let file = fs::File::open(archive_path)?;
    let mut archive = Archive::new(xz2::read::XzDecoder::new(file));
    archive.unpack(extract_dir)?;
    Ok(())
}

fn content_root(extract_dir: &Path) -> io::Result<PathBuf> {
    let entries: Vec<_> = fs::read_dir(extract_dir)?.collect::<Result<_, _>>()?;
    match entries.as_slice() {
        [single] if single.file_type()?.is_dir() => Ok(single.path()),
        _ => Ok(extract_dir.to_path_buf()),
    }
}
