//! IC marking validation: crop, clean up and read the marking on a chip
//! photo, then judge whether it looks genuine.

pub mod config;
pub mod error;
pub mod imaging;
pub mod llm;
pub mod logger;
pub mod ocr;
pub mod search;
pub mod validation;
