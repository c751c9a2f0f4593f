//! Scannable rendering of token strings.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

use super::AssignmentError;

/// Turns a payload into image bytes a bedside camera can scan.
pub trait QrEncoder: Send + Sync {
    fn encode(&self, payload: &str) -> Result<Vec<u8>, AssignmentError>;

    /// MIME type of the bytes `encode` returns.
    fn mime_type(&self) -> &'static str;
}

/// PNG QR code renderer.
#[derive(Debug, Clone, Copy)]
pub struct PngQrEncoder {
    /// Minimum edge length of the rendered image in pixels.
    pub min_size: u32,
}

impl Default for PngQrEncoder {
    fn default() -> Self {
        Self { min_size: 256 }
    }
}

impl QrEncoder for PngQrEncoder {
    fn encode(&self, payload: &str) -> Result<Vec<u8>, AssignmentError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
            .map_err(|e| AssignmentError::QrEncoding(e.to_string()))?;
        let image = code
            .render::<Luma<u8>>()
            .min_dimensions(self.min_size, self.min_size)
            .build();

        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| AssignmentError::QrEncoding(e.to_string()))?;
        Ok(bytes)
    }

    fn mime_type(&self) -> &'static str {
        "image/png"
    }
}
