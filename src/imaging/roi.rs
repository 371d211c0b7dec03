//! Region-of-interest selection.
//!
//! The crop rectangle arrives as `X,Y,W,H` on the command line and is clamped
//! into the image, so any rectangle yields a non-empty ROI.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::DynamicImage;
use tracing::debug;

use crate::error::AppError;

/// Pixel rectangle in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Clamp into a `img_w` x `img_h` image. The result is at least 1x1.
    pub fn clamp_to(self, img_w: u32, img_h: u32) -> CropRect {
        let x = self.x.min(img_w.saturating_sub(1));
        let y = self.y.min(img_h.saturating_sub(1));
        let width = self.width.clamp(1, (img_w - x).max(1));
        let height = self.height.clamp(1, (img_h - y).max(1));
        CropRect { x, y, width, height }
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for CropRect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, y, w, h] = parts.as_slice() else {
            return Err(format!("expected X,Y,W,H, got '{s}'"));
        };
        let rect = CropRect {
            x: parse_dim(x, "x")?,
            y: parse_dim(y, "y")?,
            width: parse_dim(w, "width")?,
            height: parse_dim(h, "height")?,
        };
        if rect.width == 0 || rect.height == 0 {
            return Err("crop width and height must be positive".into());
        }
        Ok(rect)
    }
}

fn parse_dim(v: &str, name: &str) -> Result<u32, String> {
    v.parse::<u32>()
        .map_err(|e| format!("invalid {name} '{v}': {e}"))
}

/// Decode an image file and normalize it to RGB8.
pub fn load_image(path: &Path) -> Result<DynamicImage, AppError> {
    let img = image::open(path)
        .map_err(|e| AppError::Image(format!("cannot read {}: {e}", path.display())))?;
    debug!(path = %path.display(), width = img.width(), height = img.height(), "image loaded");
    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

/// Cut the ROI out of `image`. `None` selects the whole image.
pub fn crop(image: &DynamicImage, rect: Option<CropRect>) -> DynamicImage {
    let Some(rect) = rect else {
        return image.clone();
    };
    let r = rect.clamp_to(image.width(), image.height());
    if r != rect {
        debug!(requested = %rect, clamped = %r, "crop clamped to image bounds");
    }
    image.crop_imm(r.x, r.y, r.width, r.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sample(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([10, 20, 30])))
    }

    #[test]
    fn parses_rect() {
        let r: CropRect = "10, 20,200,100".parse().unwrap();
        assert_eq!(r, CropRect { x: 10, y: 20, width: 200, height: 100 });
        assert_eq!(r.to_string(), "10,20,200,100");
    }

    #[test]
    fn rejects_bad_rects() {
        assert!("1,2,3".parse::<CropRect>().is_err());
        assert!("a,2,3,4".parse::<CropRect>().is_err());
        assert!("1,2,0,4".parse::<CropRect>().is_err());
        assert!("-1,2,3,4".parse::<CropRect>().is_err());
    }

    #[test]
    fn none_keeps_whole_image() {
        let img = sample(40, 30);
        let out = crop(&img, None);
        assert_eq!((out.width(), out.height()), (40, 30));
    }

    #[test]
    fn crop_inside_bounds() {
        let img = sample(40, 30);
        let out = crop(&img, Some(CropRect { x: 5, y: 5, width: 10, height: 8 }));
        assert_eq!((out.width(), out.height()), (10, 8));
    }

    #[test]
    fn oversize_crop_is_clamped() {
        let img = sample(40, 30);
        let out = crop(&img, Some(CropRect { x: 30, y: 25, width: 500, height: 500 }));
        assert_eq!((out.width(), out.height()), (10, 5));
    }

    #[test]
    fn origin_past_edge_still_yields_pixel() {
        let r = CropRect { x: 100, y: 100, width: 5, height: 5 }.clamp_to(40, 30);
        assert_eq!(r, CropRect { x: 39, y: 29, width: 1, height: 1 });
    }

    #[test]
    fn load_missing_file_errors() {
        let err = load_image(Path::new("/nonexistent/chip.png")).unwrap_err();
        assert!(err.to_string().contains("image error"));
    }

    #[test]
    fn load_roundtrips_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chip.png");
        sample(12, 9).save(&path).unwrap();
        let img = load_image(&path).unwrap();
        assert_eq!((img.width(), img.height()), (12, 9));
    }
}
