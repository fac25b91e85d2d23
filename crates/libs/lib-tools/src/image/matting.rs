//! # Background Removal Tool
//!
//! Local inference pass that makes background pixels transparent. The
//! background colour is estimated from the image border, then a flood fill
//! from the border zeroes the alpha of every connected pixel within a colour
//! tolerance of that estimate. The subject (pixels outside the tolerance, or
//! not connected to the border) keeps full opacity.

use super::{encode_png, ImageTool, ProcessedImage, ToolError};
use image::{DynamicImage, RgbaImage};
use std::collections::VecDeque;
use tracing::debug;

/// Squared RGB distance below which a pixel counts as background.
const COLOR_TOLERANCE_SQ: u32 = 3 * 40 * 40;

/// Background removal tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackgroundRemover;

impl BackgroundRemover {
    pub fn new() -> Self {
        Self
    }
}

/// Mean RGB colour of the border pixels.
fn estimate_background(img: &RgbaImage) -> [u8; 3] {
    let (w, h) = img.dimensions();
    let mut sum = [0u64; 3];
    let mut count = 0u64;

    for x in 0..w {
        for y in [0, h - 1] {
            let p = img.get_pixel(x, y);
            for c in 0..3 {
                sum[c] += p.0[c] as u64;
            }
            count += 1;
        }
    }
    for y in 0..h {
        for x in [0, w - 1] {
            let p = img.get_pixel(x, y);
            for c in 0..3 {
                sum[c] += p.0[c] as u64;
            }
            count += 1;
        }
    }

    [
        (sum[0] / count) as u8,
        (sum[1] / count) as u8,
        (sum[2] / count) as u8,
    ]
}

fn color_distance_sq(pixel: [u8; 4], background: [u8; 3]) -> u32 {
    let mut dist = 0u32;
    for c in 0..3 {
        let d = pixel[c] as i32 - background[c] as i32;
        dist += (d * d) as u32;
    }
    dist
}

impl ImageTool for BackgroundRemover {
    fn name(&self) -> &'static str {
        "remove-background"
    }

    fn process(
        &self,
        input: &[u8],
        progress: &mut dyn FnMut(u8),
    ) -> Result<ProcessedImage, ToolError> {
        progress(0);

        let mut img = image::load_from_memory(input)
            .map_err(|e| ToolError::Decode(e.to_string()))?
            .to_rgba8();
        let (w, h) = img.dimensions();
        if w < 3 || h < 3 {
            return Err(ToolError::Processing(
                "Image too small for background removal".to_string(),
            ));
        }
        progress(10);

        let background = estimate_background(&img);
        debug!(?background, w, h, "Estimated background colour");
        progress(15);

        // Flood fill from every border pixel that matches the estimate
        let total = (w as u64) * (h as u64);
        let mut visited = vec![false; (w * h) as usize];
        let mut queue: VecDeque<(u32, u32)> = VecDeque::new();

        let mut seed = |x: u32, y: u32, img: &RgbaImage, queue: &mut VecDeque<(u32, u32)>, visited: &mut Vec<bool>| {
            let idx = (y * w + x) as usize;
            if !visited[idx] && color_distance_sq(img.get_pixel(x, y).0, background) <= COLOR_TOLERANCE_SQ
            {
                visited[idx] = true;
                queue.push_back((x, y));
            }
        };

        for x in 0..w {
            seed(x, 0, &img, &mut queue, &mut visited);
            seed(x, h - 1, &img, &mut queue, &mut visited);
        }
        for y in 0..h {
            seed(0, y, &img, &mut queue, &mut visited);
            seed(w - 1, y, &img, &mut queue, &mut visited);
        }

        let mut cleared = 0u64;
        let mut last_reported = 15u8;
        while let Some((x, y)) = queue.pop_front() {
            img.get_pixel_mut(x, y).0[3] = 0;
            cleared += 1;

            let pct = 15 + ((cleared * 80) / total) as u8;
            if pct > last_reported {
                last_reported = pct;
                progress(pct);
            }

            let neighbors = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbors {
                if nx >= w || ny >= h {
                    continue;
                }
                let idx = (ny * w + nx) as usize;
                if visited[idx] {
                    continue;
                }
                if color_distance_sq(img.get_pixel(nx, ny).0, background) <= COLOR_TOLERANCE_SQ {
                    visited[idx] = true;
                    queue.push_back((nx, ny));
                }
            }
        }
        debug!(cleared, total, "Background fill complete");

        let png = encode_png(&DynamicImage::ImageRgba8(img))?;
        progress(100);

        Ok(ProcessedImage {
            png,
            width: w,
            height: h,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::test_support::{assert_progress_contract, subject_on_background};

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    #[test]
    fn test_background_becomes_transparent_subject_stays() {
        let input = subject_on_background(32, WHITE, BLACK, 6);
        let tool = BackgroundRemover::new();

        let mut reports = Vec::new();
        let result = tool
            .process(&input, &mut |p| reports.push(p))
            .expect("Background removal should succeed");

        assert_eq!((result.width, result.height), (32, 32));
        assert_progress_contract(&reports);

        let out = image::load_from_memory(&result.png).unwrap().to_rgba8();
        // Corners were background
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
        assert_eq!(out.get_pixel(31, 31).0[3], 0);
        // Subject centre keeps full opacity and colour
        let center = out.get_pixel(16, 16).0;
        assert_eq!(center[3], 255);
        assert_eq!(&center[..3], &BLACK[..3]);
    }

    #[test]
    fn test_enclosed_background_is_not_cleared() {
        // A subject ring would shield interior pixels; approximate with a
        // solid subject: interior subject pixels must never be cleared even
        // though they neighbour cleared background.
        let input = subject_on_background(24, WHITE, BLACK, 8);
        let tool = BackgroundRemover::new();
        let result = tool.process(&input, &mut |_| {}).unwrap();

        let out = image::load_from_memory(&result.png).unwrap().to_rgba8();
        for (x, y) in [(12, 12), (10, 10), (14, 14)] {
            assert_eq!(out.get_pixel(x, y).0[3], 255, "subject at ({},{})", x, y);
        }
    }

    #[test]
    fn test_tiny_image_is_processing_error() {
        let input = subject_on_background(2, WHITE, BLACK, 1);
        let tool = BackgroundRemover::new();
        assert!(matches!(
            tool.process(&input, &mut |_| {}),
            Err(ToolError::Processing(_))
        ));
    }

    #[test]
    fn test_garbage_input_is_decode_error() {
        let tool = BackgroundRemover::new();
        assert!(matches!(
            tool.process(b"not an image", &mut |_| {}),
            Err(ToolError::Decode(_))
        ));
    }
}
