//! Archive extraction: implements `ArchiveExtractor` for zip, tar and tar.gz.
//!
//! The format is sniffed from the leading bytes, never from the file name.
//! Entries whose path would land outside the destination are rejected and
//! the whole extraction fails.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::ArchiveExtractor;
use crate::domain::error::AcquisitionError;
use crate::domain::source::{ArchiveFormat, sniff_archive};

/// Bytes needed to recognise every supported format.
const SNIFF_LEN: usize = 512;

/// Production `ArchiveExtractor`.
pub struct LocalArchiveExtractor;

impl ArchiveExtractor for LocalArchiveExtractor {
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        let archive = archive.to_path_buf();
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || {
            extract_blocking(&archive, &dest).map_err(|reason| {
                anyhow::Error::from(AcquisitionError::InvalidArchive {
                    path: archive.display().to_string(),
                    reason,
                })
            })
        })
        .await
        .context("spawn_blocking for archive extraction")?
    }
}

fn extract_blocking(archive: &Path, dest: &Path) -> std::result::Result<(), String> {
    let mut file = File::open(archive).map_err(|e| e.to_string())?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    (&mut file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut header)
        .map_err(|e| e.to_string())?;
    file.seek(SeekFrom::Start(0)).map_err(|e| e.to_string())?;

    let format = sniff_archive(&header).ok_or_else(|| "unrecognised archive format".to_string())?;
    tracing::debug!(?format, archive = %archive.display(), "extracting");
    match format {
        ArchiveFormat::Zip => extract_zip(file, dest),
        ArchiveFormat::TarGz => extract_tar(flate2::read::GzDecoder::new(file), dest),
        ArchiveFormat::Tar => extract_tar(file, dest),
    }
}

fn extract_zip(file: File, dest: &Path) -> std::result::Result<(), String> {
    let mut zip = zip::ZipArchive::new(file).map_err(|e| e.to_string())?;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| e.to_string())?;
        let rel = entry
            .enclosed_name()
            .ok_or_else(|| format!("entry '{}' escapes the destination", entry.name()))?;
        let out = dest.join(rel);
        if entry.is_dir() {
            std::fs::create_dir_all(&out).map_err(|e| e.to_string())?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let mut target = File::create(&out).map_err(|e| format!("{}: {e}", out.display()))?;
        std::io::copy(&mut entry, &mut target).map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn extract_tar(reader: impl Read, dest: &Path) -> std::result::Result<(), String> {
    let mut tar = tar::Archive::new(reader);
    for entry in tar.entries().map_err(|e| e.to_string())? {
        let mut entry = entry.map_err(|e| e.to_string())?;
        let name = entry
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let inside = entry.unpack_in(dest).map_err(|e| format!("{name}: {e}"))?;
        if !inside {
            return Err(format!("entry '{name}' escapes the destination"));
        }
    }
    Ok(())
}
