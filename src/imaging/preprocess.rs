//! OCR preprocessing: grayscale, contrast, denoise, binarize.
//!
//! Steps always run in that order. Each enabled step is a single `imageproc`
//! call.

use std::path::Path;

use image::{DynamicImage, GrayImage};
use imageproc::contrast::{adaptive_threshold, equalize_histogram};
use imageproc::filter::median_filter;
use tracing::debug;

use crate::config::PreprocessConfig;
use crate::error::AppError;

/// Median filter radius: 1 gives a 3x3 window.
const MEDIAN_RADIUS: u32 = 1;
/// Adaptive threshold radius: 15 gives a 31x31 block.
const THRESHOLD_BLOCK_RADIUS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessOptions {
    pub contrast: bool,
    pub binarize: bool,
    pub denoise: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self { contrast: true, binarize: true, denoise: true }
    }
}

impl From<PreprocessConfig> for PreprocessOptions {
    fn from(c: PreprocessConfig) -> Self {
        Self { contrast: c.contrast, binarize: c.binarize, denoise: c.denoise }
    }
}

pub fn preprocess_roi(roi: &DynamicImage, opts: PreprocessOptions) -> GrayImage {
    let mut gray = roi.to_luma8();

    if opts.contrast {
        gray = equalize_histogram(&gray);
    }
    if opts.denoise {
        gray = median_filter(&gray, MEDIAN_RADIUS, MEDIAN_RADIUS);
    }
    if opts.binarize {
        gray = adaptive_threshold(&gray, THRESHOLD_BLOCK_RADIUS);
    }

    debug!(
        width = gray.width(),
        height = gray.height(),
        contrast = opts.contrast,
        denoise = opts.denoise,
        binarize = opts.binarize,
        "ROI preprocessed"
    );
    gray
}

/// Write the preprocessed ROI as PNG.
pub fn save_png(img: &GrayImage, path: &Path) -> Result<(), AppError> {
    img.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}
