//! # Resize Tool
//!
//! Scales an image by a user-chosen factor with high-quality resampling and
//! lossless PNG output.

use super::{encode_png, ImageTool, ProcessedImage, ToolError};
use image::imageops::FilterType;
use tracing::debug;

/// Minimum accepted scale factor.
pub const MIN_SCALE: f64 = 0.5;
/// Maximum accepted scale factor.
pub const MAX_SCALE: f64 = 4.0;

/// Image resize tool.
///
/// Target dimensions are `(round(W * scale), round(H * scale))`. A scale of
/// exactly 1.0 short-circuits to a pixel-identical re-encode.
#[derive(Debug, Clone, Copy)]
pub struct Resizer {
    scale: f64,
}

impl Resizer {
    /// Create a resizer, validating the scale factor up front.
    pub fn new(scale: f64) -> Result<Self, ToolError> {
        if !scale.is_finite() || scale < MIN_SCALE || scale > MAX_SCALE {
            return Err(ToolError::InvalidScale {
                min: MIN_SCALE,
                max: MAX_SCALE,
                got: scale,
            });
        }
        Ok(Self { scale })
    }

    /// Target dimensions for a source of `(width, height)`.
    pub fn target_dims(&self, width: u32, height: u32) -> (u32, u32) {
        let w = (width as f64 * self.scale).round() as u32;
        let h = (height as f64 * self.scale).round() as u32;
        (w.max(1), h.max(1))
    }
}

impl ImageTool for Resizer {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn process(
        &self,
        input: &[u8],
        progress: &mut dyn FnMut(u8),
    ) -> Result<ProcessedImage, ToolError> {
        progress(0);

        let img = image::load_from_memory(input).map_err(|e| ToolError::Decode(e.to_string()))?;
        progress(20);

        let (src_w, src_h) = (img.width(), img.height());
        let (dst_w, dst_h) = self.target_dims(src_w, src_h);
        debug!(src_w, src_h, dst_w, dst_h, scale = self.scale, "Resizing image");

        // Same dims: re-encode unchanged so scale 1.0 stays pixel-identical
        let result = if (dst_w, dst_h) == (src_w, src_h) {
            img
        } else {
            img.resize_exact(dst_w, dst_h, FilterType::Lanczos3)
        };
        progress(80);

        let png = encode_png(&result)?;
        progress(100);

        Ok(ProcessedImage {
            png,
            width: dst_w,
            height: dst_h,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::test_support::{assert_progress_contract, subject_on_background};

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const RED: [u8; 4] = [200, 30, 30, 255];

    #[test]
    fn test_scale_out_of_range_rejected() {
        assert!(matches!(
            Resizer::new(0.49),
            Err(ToolError::InvalidScale { .. })
        ));
        assert!(matches!(
            Resizer::new(4.01),
            Err(ToolError::InvalidScale { .. })
        ));
        assert!(matches!(
            Resizer::new(f64::NAN),
            Err(ToolError::InvalidScale { .. })
        ));
        assert!(Resizer::new(0.5).is_ok());
        assert!(Resizer::new(4.0).is_ok());
    }

    #[test]
    fn test_target_dims_rounding() {
        let cases = [
            ((100, 50), 2.0, (200, 100)),
            ((100, 50), 0.5, (50, 25)),
            ((33, 21), 1.5, (50, 32)),  // 49.5 -> 50, 31.5 -> 32
            ((7, 7), 0.5, (4, 4)),      // 3.5 rounds away from zero
            ((1, 1), 0.5, (1, 1)),      // floor of 1x1
        ];
        for ((w, h), scale, expected) in cases {
            let resizer = Resizer::new(scale).unwrap();
            assert_eq!(
                resizer.target_dims(w, h),
                expected,
                "dims for {}x{} at {}",
                w,
                h,
                scale
            );
        }
    }

    #[test]
    fn test_output_dims_match_contract() {
        let input = subject_on_background(40, WHITE, RED, 8);
        let resizer = Resizer::new(2.0).unwrap();

        let mut reports = Vec::new();
        let result = resizer
            .process(&input, &mut |p| reports.push(p))
            .expect("Resize should succeed");

        assert_eq!((result.width, result.height), (80, 80));
        assert_progress_contract(&reports);

        let decoded = image::load_from_memory(&result.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 80));
    }

    #[test]
    fn test_scale_one_is_pixel_identical() {
        let input = subject_on_background(24, WHITE, RED, 5);
        let resizer = Resizer::new(1.0).unwrap();

        let result = resizer.process(&input, &mut |_| {}).unwrap();

        let original = image::load_from_memory(&input).unwrap().to_rgba8();
        let roundtripped = image::load_from_memory(&result.png).unwrap().to_rgba8();
        assert_eq!(original.as_raw(), roundtripped.as_raw());
    }

    #[test]
    fn test_garbage_input_is_decode_error() {
        let resizer = Resizer::new(2.0).unwrap();
        let result = resizer.process(b"definitely not an image", &mut |_| {});
        assert!(matches!(result, Err(ToolError::Decode(_))));
    }
}
