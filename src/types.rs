//! Core types for the detection bridge
//!
//! These types are used internally and converted to C-compatible
//! types in the FFI layer.

/// Axis-aligned rectangle in source-image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Four-corner boundary of a detected code, in the fixed corner order the
/// detector emits (corner 0 top-left, proceeding around the quad).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quad {
    pub corners: [(f32, f32); 4],
}

impl Quad {
    pub fn new(corners: [(f32, f32); 4]) -> Self {
        Self { corners }
    }

    /// Reduce the quad to an axis-aligned rectangle from corner 0 (top-left)
    /// and corner 2 (bottom-right). Corner order is part of the detector's
    /// contract and is not re-validated here.
    pub fn bounding_rect(&self) -> Rect {
        Rect {
            left: self.corners[0].0 as i32,
            top: self.corners[0].1 as i32,
            right: self.corners[2].0 as i32,
            bottom: self.corners[2].1 as i32,
        }
    }
}

/// One decoded QR code paired with its bounding rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCode {
    /// Decoded payload (UTF-8)
    pub text: String,
    /// Bounding rectangle in source-image coordinates
    pub rect: Rect,
}

impl DecodedCode {
    pub fn new(text: impl Into<String>, rect: Rect) -> Self {
        Self {
            text: text.into(),
            rect,
        }
    }
}

/// Model file paths for one detector instance
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Detector network definition (prototxt)
    pub detect_proto: String,
    /// Detector network weights (caffemodel)
    pub detect_model: String,
    /// Super-resolution network definition (prototxt)
    pub sr_proto: String,
    /// Super-resolution network weights (caffemodel)
    pub sr_model: String,
}

impl DetectorConfig {
    pub fn new(
        detect_proto: impl Into<String>,
        detect_model: impl Into<String>,
        sr_proto: impl Into<String>,
        sr_model: impl Into<String>,
    ) -> Self {
        Self {
            detect_proto: detect_proto.into(),
            detect_model: detect_model.into(),
            sr_proto: sr_proto.into(),
            sr_model: sr_model.into(),
        }
    }

    /// All four model paths in construction order
    pub fn model_paths(&self) -> [&str; 4] {
        [
            &self.detect_proto,
            &self.detect_model,
            &self.sr_proto,
            &self.sr_model,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_to_rect_uses_opposite_corners() {
        let quad = Quad::new([(10.4, 20.6), (90.0, 21.0), (91.2, 80.9), (11.0, 79.0)]);
        let rect = quad.bounding_rect();
        assert_eq!(rect, Rect::new(10, 20, 91, 80));
    }

    #[test]
    fn test_rect_dimensions() {
        let rect = Rect::new(10, 20, 110, 70);
        assert_eq!(rect.width(), 100);
        assert_eq!(rect.height(), 50);
    }
}
