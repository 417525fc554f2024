use std::path::Path;

use super::Fingerprint;
use crate::{LandmarkError, Result};

/// Reads the `<audio_path>.fingerprints.json` sidecar for `audio_path`, if present.
///
/// Returns `Ok(None)` on a cache miss (file does not exist). A file that exists
/// but fails to parse is a [`LandmarkError::MalformedCache`], which callers
/// should treat as recoverable: discard it and recompute.
pub fn load_cache(audio_path: &Path) -> Result<Option<Vec<Fingerprint>>> {
    let cache_path = sidecar_path(audio_path);
    if !cache_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&cache_path).map_err(|e| {
        LandmarkError::InputUnavailable(format!(
            "could not read cache {}: {}",
            cache_path.display(),
            e
        ))
    })?;

    let fingerprints: Vec<Fingerprint> = serde_json::from_str(&content).map_err(|e| {
        LandmarkError::MalformedCache(format!(
            "cache {} is not valid: {}",
            cache_path.display(),
            e
        ))
    })?;

    Ok(Some(fingerprints))
}

/// Writes `fingerprints` to the `<audio_path>.fingerprints.json` sidecar.
pub fn save_cache(audio_path: &Path, fingerprints: &[Fingerprint]) -> Result<()> {
    let cache_path = sidecar_path(audio_path);
    let content = serde_json::to_string(fingerprints).map_err(|e| {
        LandmarkError::MalformedCache(format!("could not serialize fingerprints: {}", e))
    })?;
    std::fs::write(&cache_path, content).map_err(|e| {
        LandmarkError::InputUnavailable(format!(
            "could not write cache {}: {}",
            cache_path.display(),
            e
        ))
    })
}

fn sidecar_path(audio_path: &Path) -> std::path::PathBuf {
    let mut name = audio_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".fingerprints.json");
    audio_path.with_file_name(name)
}
