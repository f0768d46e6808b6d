//! Downloader module for retrieving ephemeris kernels
//!
//! Files land in a cache directory and are only fetched when missing.

use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};

use crate::{Result, SkytrackError};

/// Where NAIF publishes the DE planetary kernels
const NAIF_PLANETS_URL: &str = "https://naif.jpl.nasa.gov/pub/naif/generic_kernels/spk/planets/";

/// Superseded kernels, moved under `a_old_versions/`
const ARCHIVED_KERNELS: &[&str] = &["de421.bsp"];
const ARCHIVE_DIR: &str = "a_old_versions/";

/// Ephemeris used when none is named
pub const DEFAULT_EPHEMERIS: &str = "de421.bsp";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

fn cache_dir_from(data_dir: Option<String>, home: Option<String>) -> PathBuf {
    match data_dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(home.unwrap_or_else(|| ".".to_string()))
            .join(".cache")
            .join("skytrack"),
    }
}

/// Get the cache directory path: `$SKYTRACK_DATA_DIR`, else `$HOME/.cache/skytrack`
pub fn get_cache_dir() -> PathBuf {
    cache_dir_from(env::var("SKYTRACK_DATA_DIR").ok(), env::var("HOME").ok())
}

/// Ensure that the cache directory exists
pub fn ensure_cache_dir() -> io::Result<PathBuf> {
    let cache_dir = get_cache_dir();
    fs::create_dir_all(&cache_dir)?;
    Ok(cache_dir)
}

/// Check if a file exists and is not empty
fn file_exists_and_not_empty<P: AsRef<Path>>(path: P) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.len() > 0,
        Err(_) => false,
    }
}

/// Download URL for a kernel published under the NAIF planets directory
pub fn ephemeris_url(name: &str) -> Result<String> {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && !name.starts_with('.');
    if !plain {
        return Err(SkytrackError::Data(format!("Invalid ephemeris name: {:?}", name)));
    }
    if ARCHIVED_KERNELS.contains(&name) {
        Ok(format!("{}{}{}", NAIF_PLANETS_URL, ARCHIVE_DIR, name))
    } else {
        Ok(format!("{}{}", NAIF_PLANETS_URL, name))
    }
}

/// The other NAIF location for `url`: current kernels sometimes get archived
fn alternate_url(url: &str) -> Option<String> {
    let name = url.strip_prefix(NAIF_PLANETS_URL)?;
    match name.strip_prefix(ARCHIVE_DIR) {
        Some(current) => Some(format!("{}{}", NAIF_PLANETS_URL, current)),
        None => Some(format!("{}{}{}", NAIF_PLANETS_URL, ARCHIVE_DIR, name)),
    }
}

/// Download a file from URL to a local path
fn download_file<P: AsRef<Path>>(url: &str, path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }

    // Write next to the target first so a failed download leaves nothing behind
    let temp_path = path.as_ref().with_extension("part");
    let result = fetch_into(url, &temp_path);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
        return result;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}

fn fetch_into(url: &str, temp_path: &Path) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| SkytrackError::Data(format!("Failed to create HTTP client: {}", e)))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| SkytrackError::Data(format!("Failed to download file: {}", e)))?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(SkytrackError::Data(format!("Not found: {}", url)));
    }
    if !response.status().is_success() {
        return Err(SkytrackError::Data(format!(
            "Failed to download {}, status: {}",
            url,
            response.status()
        )));
    }

    let mut file = BufWriter::new(File::create(temp_path)?);
    let mut buffer = [0; 8192];
    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| SkytrackError::Data(format!("Failed to read response: {}", e)))?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
    }
    file.flush()?;
    Ok(())
}

/// Path of `name` inside `dir`, downloading it from NAIF when absent
pub fn download_ephemeris_to<P: AsRef<Path>>(dir: P, name: &str) -> Result<PathBuf> {
    let url = ephemeris_url(name)?;
    let path = dir.as_ref().join(name);

    if file_exists_and_not_empty(&path) {
        info!("Using cached ephemeris {}", path.display());
        return Ok(path);
    }

    info!("Downloading {} to {}", url, path.display());
    let mut result = download_file(&url, &path);
    let not_found = matches!(&result, Err(SkytrackError::Data(m)) if m.starts_with("Not found"));
    if let (true, Some(other)) = (not_found, alternate_url(&url)) {
        info!("{} is not on the server; trying {}", url, other);
        result = download_file(&other, &path);
    }
    match result {
        Ok(()) => {
            info!("Ephemeris downloaded to {}", path.display());
            Ok(path)
        }
        Err(e) => {
            warn!("Failed to download {}: {}", url, e);
            Err(e)
        }
    }
}

/// Path of `name` in the cache directory, downloading it when absent
pub fn download_ephemeris(name: &str) -> Result<PathBuf> {
    let cache_dir = ensure_cache_dir()?;
    download_ephemeris_to(cache_dir, name)
}
