//! Text recognition over the preprocessed ROI.
//!
//! `TesseractRecognizer` shells out to the `tesseract` executable with the
//! bitmap written to a temporary PNG.

use std::path::PathBuf;
use std::process::Command;

use image::GrayImage;
use tracing::{debug, warn};

use crate::config::OcrConfig;
use crate::error::AppError;

/// Bitmap in, text out. An empty string means nothing was recognized.
pub trait Recognizer {
    fn recognize(&self, bitmap: &GrayImage) -> Result<String, AppError>;
}

#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    cmd: PathBuf,
    language: String,
    psm: u8,
}

impl TesseractRecognizer {
    pub fn new(cmd: PathBuf, language: String, psm: u8) -> Self {
        Self { cmd, language, psm }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(config.tesseract_cmd.clone(), config.language.clone(), config.psm)
    }

    /// Fails when the executable cannot be started at all.
    pub fn check_available(&self) -> Result<(), AppError> {
        Command::new(&self.cmd)
            .arg("--version")
            .output()
            .map(|_| ())
            .map_err(|e| {
                AppError::Ocr(format!(
                    "cannot run {}: {e} (set TESSERACT_CMD or [ocr].tesseract_cmd)",
                    self.cmd.display()
                ))
            })
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, bitmap: &GrayImage) -> Result<String, AppError> {
        let tmp = tempfile::Builder::new()
            .prefix("icmark-roi-")
            .suffix(".png")
            .tempfile()?;
        bitmap.save_with_format(tmp.path(), image::ImageFormat::Png)?;

        debug!(cmd = %self.cmd.display(), lang = %self.language, psm = self.psm, "running tesseract");
        let output = Command::new(&self.cmd)
            .arg(tmp.path())
            .arg("stdout")
            .args(["-l", self.language.as_str()])
            .arg("--psm")
            .arg(self.psm.to_string())
            .output()
            .map_err(|e| AppError::Ocr(format!("cannot run {}: {e}", self.cmd.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, "tesseract exited with failure");
            return Err(AppError::Ocr(format!(
                "tesseract failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = normalize_lines(&String::from_utf8_lossy(&output.stdout));
        debug!(chars = text.len(), lines = text.lines().count(), "OCR finished");
        Ok(text)
    }
}

/// Trim each line, drop blank ones, join with `\n`.
pub fn normalize_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_blank_lines() {
        let raw = "  ATMEGA328P \n\n\x0c\n  AU 1842 \n";
        // Form feed trims away as whitespace.
        assert_eq!(normalize_lines(raw), "ATMEGA328P\nAU 1842");
    }

    #[test]
    fn normalize_empty() {
        assert_eq!(normalize_lines(""), "");
        assert_eq!(normalize_lines(" \n \n"), "");
    }

    #[test]
    fn missing_executable_reported() {
        let r = TesseractRecognizer::new(
            PathBuf::from("/nonexistent/tesseract-bin"),
            "eng".into(),
            6,
        );
        let err = r.check_available().unwrap_err();
        assert!(err.to_string().contains("ocr error"));

        let img = GrayImage::new(8, 8);
        assert!(r.recognize(&img).is_err());
    }
}
