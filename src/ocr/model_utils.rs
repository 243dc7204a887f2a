//! Shared utilities for OCR backends: CLI tool checks and model downloads.

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Model file specification for downloading.
#[cfg(feature = "ocr-paddle")]
pub struct ModelSpec {
    /// URL to download from.
    pub url: &'static str,
    /// Filename to save as.
    pub filename: &'static str,
    /// Human-readable size for progress messages.
    pub size_hint: &'static str,
}

/// Configuration for model directory management.
#[cfg(feature = "ocr-paddle")]
pub struct ModelDirConfig {
    /// Subdirectory name under the data dir (e.g. "paddle-ocr").
    pub subdir: &'static str,
    /// Required model files to check for presence.
    pub required_files: &'static [&'static str],
}

#[cfg(feature = "ocr-paddle")]
impl ModelDirConfig {
    /// Get the default model directory for this backend.
    pub fn default_dir(&self) -> std::path::PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."))
            })
            .join("handscribe")
            .join(self.subdir)
            .join("models")
    }

    /// Get standard candidate directories to search for models.
    pub fn candidate_dirs(&self) -> Vec<std::path::PathBuf> {
        [
            dirs::data_dir().map(|d| d.join("handscribe").join(self.subdir).join("models")),
            dirs::home_dir().map(|d| d.join(".handscribe").join(self.subdir).join("models")),
            Some(std::path::PathBuf::from(format!("./models/{}", self.subdir))),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Check if a directory contains all required model files.
    pub fn has_required_files(&self, dir: &std::path::Path) -> bool {
        self.required_files
            .iter()
            .all(|file| dir.join(file).exists())
    }
}

/// Download a file from a URL to a local path using curl or wget.
#[cfg(feature = "ocr-paddle")]
fn download_file(url: &str, dest: &std::path::Path) -> Result<(), super::backend::OcrError> {
    use std::process::Command;

    use super::backend::OcrError;

    let output = Command::new("curl")
        .args(["-fSL", "--progress-bar", "-o"])
        .arg(dest)
        .arg(url)
        .status();

    match output {
        Ok(status) if status.success() => Ok(()),
        Ok(_) => {
            let _ = std::fs::remove_file(dest);
            Err(OcrError::ModelNotFound(format!("Failed to download {}", url)))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let output = Command::new("wget")
                .args(["-q", "--show-progress", "-O"])
                .arg(dest)
                .arg(url)
                .status();

            match output {
                Ok(status) if status.success() => Ok(()),
                Ok(_) => {
                    let _ = std::fs::remove_file(dest);
                    Err(OcrError::ModelNotFound(format!("Failed to download {}", url)))
                }
                Err(_) => Err(OcrError::BackendUnavailable(
                    "Neither curl nor wget found. Install one to download models.".to_string(),
                )),
            }
        }
        Err(e) => Err(super::backend::OcrError::Io(e)),
    }
}

/// Download a model file if it doesn't exist, with a progress message.
#[cfg(feature = "ocr-paddle")]
pub fn ensure_model_file(
    spec: &ModelSpec,
    model_dir: &std::path::Path,
) -> Result<(), super::backend::OcrError> {
    let dest = model_dir.join(spec.filename);
    if !dest.exists() {
        eprintln!("Downloading {} (~{})...", spec.filename, spec.size_hint);
        download_file(spec.url, &dest)?;
        eprintln!("  downloaded {}", spec.filename);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_binary() {
        assert!(check_binary("sh"));
        assert!(!check_binary("definitely-not-a-real-binary-handscribe"));
    }
}
