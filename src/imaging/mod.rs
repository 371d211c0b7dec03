//! Image input: ROI selection and OCR preprocessing.

pub mod preprocess;
pub mod roi;

pub use preprocess::{PreprocessOptions, preprocess_roi};
pub use roi::{CropRect, crop, load_image};
