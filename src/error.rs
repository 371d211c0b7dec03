//! Application-wide error types.
//!
//! Only startup paths fail hard. Once an image is loaded, backend failures are
//! folded into a `WARNING` outcome by the validator and never reach here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("ocr error: {0}")]
    Ocr(String),

    #[error("output error: {0}")]
    Output(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for AppError {
    fn from(e: image::ImageError) -> Self {
        AppError::Image(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("missing field".into());
        assert!(e.to_string().contains("config error"));
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn ocr_error_display() {
        let e = AppError::Ocr("tesseract not found".into());
        assert!(e.to_string().contains("tesseract not found"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        let _: &dyn Error = &e;
    }

    #[test]
    fn image_error_converts() {
        let img_err = image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such image",
        ));
        let e: AppError = img_err.into();
        assert!(e.to_string().starts_with("image error"));
    }
}
