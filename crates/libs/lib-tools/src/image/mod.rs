//! # Image Pipeline
//!
//! Local, CPU-bound image tools sharing one shape: input bytes in, PNG bytes
//! out, with a progress callback reporting 0-100.
//!
//! Two implementations exist: [`Resizer`] (Lanczos3 resampling to a scaled
//! size) and [`BackgroundRemover`] (border-seeded flood fill that makes
//! background pixels transparent). Neither touches the network.

// region: --- Modules
mod matting;
mod resize;

pub use matting::BackgroundRemover;
pub use resize::Resizer;
// endregion: --- Modules

use thiserror::Error;

/// Image pipeline error type.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Scale must be between {min} and {max}, got {got}")]
    InvalidScale { min: f64, max: f64, got: f64 },

    #[error("Processing failed: {0}")]
    Processing(String),
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Lossless PNG encoding of the result
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Common shape of every image tool.
///
/// `progress` receives a monotonically non-decreasing percentage and is
/// always called with 100 exactly once, at the end of a successful run.
pub trait ImageTool {
    /// Stable tool name used as the asset type discriminator.
    fn name(&self) -> &'static str;

    /// Run the tool over raw input bytes.
    fn process(
        &self,
        input: &[u8],
        progress: &mut dyn FnMut(u8),
    ) -> Result<ProcessedImage, ToolError>;
}

/// Pixel dimensions of an encoded image, without a full decode.
pub fn dimensions(input: &[u8]) -> Result<(u32, u32), ToolError> {
    let reader = ::image::ImageReader::new(std::io::Cursor::new(input))
        .with_guessed_format()
        .map_err(|e| ToolError::Decode(e.to_string()))?;
    reader
        .into_dimensions()
        .map_err(|e| ToolError::Decode(e.to_string()))
}

/// Encode a decoded image as PNG bytes.
pub(crate) fn encode_png(img: &::image::DynamicImage) -> Result<Vec<u8>, ToolError> {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, ::image::ImageFormat::Png)
        .map_err(|e| ToolError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}
