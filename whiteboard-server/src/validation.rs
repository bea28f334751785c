//! Input validation for untrusted data.
//!
//! Drawing payloads come straight from browsers; everything is bounded
//! before it reaches the engine.

use thiserror::Error;
use whiteboard_core::{DrawOperation, OpKind};

/// Maximum WebSocket message size.
pub const MAX_WS_MESSAGE_SIZE: usize = 65_536; // 64KB
/// Maximum length for color descriptors.
pub const MAX_COLOR_LEN: usize = 64;
/// Maximum length for font descriptors.
pub const MAX_FONT_LEN: usize = 128;
/// Maximum text content length for text primitives.
pub const MAX_TEXT_LEN: usize = 4_096;
/// Maximum stroke size / eraser footprint in pixels.
pub const MAX_STROKE_SIZE: f64 = 512.0;
/// Coordinate magnitude bound; anything beyond this is off any canvas.
pub const MAX_COORDINATE: f64 = 1.0e7;

/// Validation error types.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// WebSocket message exceeds maximum size.
    #[error("message too large (max {MAX_WS_MESSAGE_SIZE} bytes)")]
    MessageTooLarge,
    /// A coordinate is non-finite or out of range.
    #[error("coordinate out of range")]
    CoordinateOutOfRange,
    /// Stroke size is non-finite or out of range.
    #[error("stroke size out of range (max {MAX_STROKE_SIZE})")]
    StrokeSizeOutOfRange,
    /// Color descriptor exceeds maximum length.
    #[error("color too long (max {MAX_COLOR_LEN} chars)")]
    ColorTooLong,
    /// Font descriptor exceeds maximum length.
    #[error("font too long (max {MAX_FONT_LEN} chars)")]
    FontTooLong,
    /// Text content exceeds maximum length.
    #[error("text too long (max {MAX_TEXT_LEN} bytes)")]
    TextTooLong,
    /// Text primitive without text content.
    #[error("text primitive missing text content")]
    MissingText,
}

impl ValidationError {
    /// Short label for metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::MessageTooLarge => "message_size",
            Self::CoordinateOutOfRange => "coordinate",
            Self::StrokeSizeOutOfRange => "stroke_size",
            Self::ColorTooLong => "color",
            Self::FontTooLong => "font",
            Self::TextTooLong | Self::MissingText => "text",
        }
    }
}

fn in_range(value: f64) -> bool {
    value.is_finite() && value.abs() <= MAX_COORDINATE
}

/// Validate an inbound WebSocket message size.
///
/// # Errors
///
/// Returns [`ValidationError::MessageTooLarge`] if `len` exceeds
/// [`MAX_WS_MESSAGE_SIZE`].
pub fn validate_message_size(len: usize) -> Result<(), ValidationError> {
    if len > MAX_WS_MESSAGE_SIZE {
        return Err(ValidationError::MessageTooLarge);
    }
    Ok(())
}

/// Validate a drawing operation before it reaches the engine.
///
/// # Errors
///
/// Returns the first bound the operation violates.
pub fn validate_operation(op: &DrawOperation) -> Result<(), ValidationError> {
    let coordinates = [
        Some(op.x),
        Some(op.y),
        op.prev_x,
        op.prev_y,
        op.width,
        op.height,
        op.radius,
    ];
    if coordinates.iter().flatten().any(|v| !in_range(*v)) {
        return Err(ValidationError::CoordinateOutOfRange);
    }
    if !op.stroke_size.is_finite() || op.stroke_size < 0.0 || op.stroke_size > MAX_STROKE_SIZE {
        return Err(ValidationError::StrokeSizeOutOfRange);
    }
    if op.color.len() > MAX_COLOR_LEN {
        return Err(ValidationError::ColorTooLong);
    }
    if op.font.as_ref().is_some_and(|f| f.len() > MAX_FONT_LEN) {
        return Err(ValidationError::FontTooLong);
    }
    if op.text.as_ref().is_some_and(|t| t.len() > MAX_TEXT_LEN) {
        return Err(ValidationError::TextTooLong);
    }
    if op.kind == OpKind::Text && op.text.is_none() {
        return Err(ValidationError::MissingText);
    }
    Ok(())
}
