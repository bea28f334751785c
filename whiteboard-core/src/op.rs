//! Drawing primitives that make up the shared canvas history.

use serde::{Deserialize, Serialize};

/// Kind of drawing primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Straight line from the previous point to the current one.
    Line,
    /// Axis-aligned rectangle anchored at `(x, y)`.
    Rectangle,
    /// Circle centered at `(x, y)`.
    Circle,
    /// Freehand pen segment.
    Pen,
    /// Eraser footprint.
    Eraser,
    /// Text placed at `(x, y)`.
    Text,
}

/// One immutable drawing primitive applied to the shared canvas.
///
/// Wire field names follow the client contract the frontend renders
/// from (`prevX`, `createdAt`, `size`). Geometric fields are populated
/// per variant; the rest are omitted from the payload. An operation is
/// never updated after persistence, only appended or bulk-deleted by a
/// canvas clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawOperation {
    /// Primitive variant.
    #[serde(rename = "type")]
    pub kind: OpKind,
    /// Terminal or anchor X coordinate.
    pub x: f64,
    /// Terminal or anchor Y coordinate.
    pub y: f64,
    /// Origin X for line/pen segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_x: Option<f64>,
    /// Origin Y for line/pen segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_y: Option<f64>,
    /// Rectangle width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Rectangle height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Circle radius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// CSS-compatible stroke/fill color.
    pub color: String,
    /// Line width / eraser footprint in pixels.
    #[serde(rename = "size")]
    pub stroke_size: f64,
    /// Font descriptor for the text variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Text content for the text variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Server-assigned persistence timestamp in milliseconds since the
    /// Unix epoch. `None` until the store accepts the operation. Not
    /// guaranteed monotonic across nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
}

impl DrawOperation {
    /// Build a line segment from `(prev_x, prev_y)` to `(x, y)`.
    #[must_use]
    pub fn line(prev_x: f64, prev_y: f64, x: f64, y: f64, color: &str, stroke_size: f64) -> Self {
        Self {
            kind: OpKind::Line,
            x,
            y,
            prev_x: Some(prev_x),
            prev_y: Some(prev_y),
            width: None,
            height: None,
            radius: None,
            color: color.to_string(),
            stroke_size,
            font: None,
            text: None,
            created_at: None,
        }
    }

    /// Build a circle centered at `(x, y)`.
    #[must_use]
    pub fn circle(x: f64, y: f64, radius: f64, color: &str, stroke_size: f64) -> Self {
        Self {
            kind: OpKind::Circle,
            x,
            y,
            prev_x: None,
            prev_y: None,
            width: None,
            height: None,
            radius: Some(radius),
            color: color.to_string(),
            stroke_size,
            font: None,
            text: None,
            created_at: None,
        }
    }

    /// Build a text primitive placed at `(x, y)`.
    #[must_use]
    pub fn text(x: f64, y: f64, text: &str, font: &str, color: &str) -> Self {
        Self {
            kind: OpKind::Text,
            x,
            y,
            prev_x: None,
            prev_y: None,
            width: None,
            height: None,
            radius: None,
            color: color.to_string(),
            stroke_size: 1.0,
            font: Some(font.to_string()),
            text: Some(text.to_string()),
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_wire_format() {
        let op = DrawOperation::line(0.0, 0.0, 10.0, 10.0, "red", 2.0);
        let json = serde_json::to_string(&op).expect("should serialize");
        assert!(json.contains(r#""type":"line""#));
        assert!(json.contains(r#""prevX":0.0"#));
        assert!(json.contains(r#""size":2.0"#));
        // Unset per-variant fields are omitted entirely
        assert!(!json.contains("radius"));
        assert!(!json.contains("createdAt"));
    }

    #[test]
    fn test_parse_client_payload() {
        let json = r##"{"type":"rectangle","x":5,"y":6,"width":40,"height":20,"color":"#00ff00","size":3}"##;
        let op: DrawOperation = serde_json::from_str(json).expect("should parse");
        assert_eq!(op.kind, OpKind::Rectangle);
        assert_eq!(op.width, Some(40.0));
        assert_eq!(op.stroke_size, 3.0);
        assert_eq!(op.created_at, None);
    }

    #[test]
    fn test_created_at_round_trip() {
        let mut op = DrawOperation::circle(1.0, 2.0, 3.0, "blue", 1.5);
        op.created_at = Some(1_700_000_000_000);
        let json = serde_json::to_string(&op).expect("should serialize");
        assert!(json.contains(r#""createdAt":1700000000000"#));
        let back: DrawOperation = serde_json::from_str(&json).expect("should parse");
        assert_eq!(back, op);
    }

    #[test]
    fn test_text_variant_fields() {
        let op = DrawOperation::text(10.0, 20.0, "hello", "16px sans-serif", "#000");
        let json = serde_json::to_string(&op).expect("should serialize");
        assert!(json.contains(r#""text":"hello""#));
        assert!(json.contains(r#""font":"16px sans-serif""#));
    }
}
