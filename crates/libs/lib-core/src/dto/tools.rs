//! Tool run and asset promotion DTOs.

use serde::{Deserialize, Serialize};

/// Resize tool request: base64 image plus a scale factor in [0.5, 4.0].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResizeRequest {
    /// Base64-encoded source image
    pub image: String,
    pub scale: f64,
}

/// Background removal tool request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveBackgroundRequest {
    /// Base64-encoded source image
    pub image: String,
}

/// Successful tool run: result as a data URL plus accounting info.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolRunResponse {
    /// `data:image/png;base64,` URL of the processed image
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    /// Coins charged for this run
    pub charged: i64,
    /// Balance after the charge
    pub balance: i64,
}

/// Explicit promotion of a processed result to persistent storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveAssetRequest {
    /// Base64-encoded PNG produced by a tool run
    pub image: String,
    /// Type discriminator ("remove-background", "resize")
    pub kind: String,
    /// Original tool settings (arbitrary JSON)
    #[serde(default)]
    pub settings: serde_json::Value,
}
