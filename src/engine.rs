//! Detector engine wrapping the external QR detection backend
//!
//! One `ScanEngine` owns one detector instance. The detection algorithm
//! itself (CNN localization, super-resolution, decoding) lives in OpenCV's
//! WeChat QR module and is consumed as a black box behind the `opencv`
//! feature; without the feature a no-op backend validates configuration and
//! returns no detections, so the registry, conversion, and FFI layers build
//! and test without native OpenCV installed.

use std::time::Instant;

use crate::error::BridgeError;
use crate::frame::FrameBuffer;
use crate::types::{DecodedCode, DetectorConfig, Quad};

/// One live detector instance
pub struct ScanEngine {
    backend: backend::Backend,
}

impl ScanEngine {
    /// Construct a detector from the four model file paths.
    ///
    /// # Returns
    /// * `Ok(ScanEngine)` - models loaded, detector ready
    /// * `Err(BridgeError)` - empty/missing model path or backend failure
    pub fn new(config: DetectorConfig) -> Result<Self, BridgeError> {
        for path in config.model_paths() {
            if path.is_empty() {
                return Err(BridgeError::Config("empty model path".to_string()));
            }
        }

        debug!(
            "opening detector: detect=({}, {}), sr=({}, {})",
            config.detect_proto, config.detect_model, config.sr_proto, config.sr_model
        );

        let backend = backend::Backend::open(&config)?;
        Ok(Self { backend })
    }

    /// Run detect-and-decode on a converted frame.
    ///
    /// The backend returns decoded strings and one 4-point quadrilateral per
    /// string, equal length and positionally corresponding; the pairing is
    /// preserved, with each quad reduced to its axis-aligned rectangle.
    pub fn detect_and_decode(&self, frame: &FrameBuffer) -> Result<Vec<DecodedCode>, BridgeError> {
        let start = Instant::now();

        let (texts, quads) = self.backend.detect(frame)?;
        let codes = pair_results(texts, quads);

        debug!(
            "decoded {} code(s) in {:.2} ms",
            codes.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(codes)
    }
}

/// Zip the Nth decoded string with the Nth quadrilateral
fn pair_results(texts: Vec<String>, quads: Vec<Quad>) -> Vec<DecodedCode> {
    texts
        .into_iter()
        .zip(quads)
        .map(|(text, quad)| DecodedCode {
            text,
            rect: quad.bounding_rect(),
        })
        .collect()
}

#[cfg(feature = "opencv")]
mod backend {
    //! OpenCV-backed detection via the WeChat QR module

    use opencv::core::{Mat, Vector};
    use opencv::prelude::*;
    use opencv::wechat_qrcode::WeChatQRCode;
    use parking_lot::Mutex;

    use crate::error::BridgeError;
    use crate::frame::FrameBuffer;
    use crate::types::{DetectorConfig, Quad};

    pub(super) struct Backend {
        // detect_and_decode takes &mut self, the engine API is &self
        detector: Mutex<WeChatQRCode>,
    }

    impl Backend {
        pub(super) fn open(config: &DetectorConfig) -> Result<Self, BridgeError> {
            let detector = WeChatQRCode::new(
                &config.detect_proto,
                &config.detect_model,
                &config.sr_proto,
                &config.sr_model,
            )
            .map_err(|e| BridgeError::Detector(e.to_string()))?;

            Ok(Self {
                detector: Mutex::new(detector),
            })
        }

        pub(super) fn detect(
            &self,
            frame: &FrameBuffer,
        ) -> Result<(Vec<String>, Vec<Quad>), BridgeError> {
            let mat = frame_to_mat(frame)?;

            let mut points = Vector::<Mat>::new();
            let texts = self
                .detector
                .lock()
                .detect_and_decode(&mat, &mut points)
                .map_err(|e| BridgeError::Detector(e.to_string()))?;

            let mut quads = Vec::with_capacity(points.len());
            for p in points.iter() {
                quads.push(mat_to_quad(&p)?);
            }

            Ok((texts.into_iter().collect(), quads))
        }
    }

    fn frame_to_mat(frame: &FrameBuffer) -> Result<Mat, BridgeError> {
        Mat::from_slice(frame.data())
            .and_then(|m| m.reshape(i32::from(frame.channels()), frame.rows() as i32)?.try_clone())
            .map_err(|e| BridgeError::Detector(e.to_string()))
    }

    /// Each point matrix is 4x2 CV_32F, one row per corner
    fn mat_to_quad(points: &Mat) -> Result<Quad, BridgeError> {
        let mut corners = [(0.0f32, 0.0f32); 4];
        for (i, corner) in corners.iter_mut().enumerate() {
            corner.0 = *points
                .at_2d::<f32>(i as i32, 0)
                .map_err(|e| BridgeError::Detector(e.to_string()))?;
            corner.1 = *points
                .at_2d::<f32>(i as i32, 1)
                .map_err(|e| BridgeError::Detector(e.to_string()))?;
        }
        Ok(Quad::new(corners))
    }
}

#[cfg(not(feature = "opencv"))]
mod backend {
    //! No-op backend used when the `opencv` feature is disabled
    //!
    //! Validates the model paths the same way the real backend would fail on
    //! them, then reports no detections for every frame. Keeps the handle
    //! registry, converters, and FFI surface testable without native OpenCV.

    use std::path::Path;

    use crate::error::BridgeError;
    use crate::frame::FrameBuffer;
    use crate::types::{DetectorConfig, Quad};

    pub(super) struct Backend;

    impl Backend {
        pub(super) fn open(config: &DetectorConfig) -> Result<Self, BridgeError> {
            for path in config.model_paths() {
                if !Path::new(path).is_file() {
                    return Err(BridgeError::Config(format!("model file not found: {path}")));
                }
            }
            Ok(Self)
        }

        pub(super) fn detect(
            &self,
            _frame: &FrameBuffer,
        ) -> Result<(Vec<String>, Vec<Quad>), BridgeError> {
            Ok((Vec::new(), Vec::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rect;

    #[test]
    fn test_pair_results_preserves_order() {
        let texts = vec!["first".to_string(), "second".to_string()];
        let quads = vec![
            Quad::new([(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            Quad::new([(50.0, 60.0), (90.0, 60.0), (90.0, 100.0), (50.0, 100.0)]),
        ];

        let codes = pair_results(texts, quads);

        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].text, "first");
        assert_eq!(codes[0].rect, Rect::new(0, 0, 10, 10));
        assert_eq!(codes[1].text, "second");
        assert_eq!(codes[1].rect, Rect::new(50, 60, 90, 100));
    }

    #[test]
    fn test_pair_results_empty() {
        assert!(pair_results(Vec::new(), Vec::new()).is_empty());
    }

    #[cfg(not(feature = "opencv"))]
    mod stub {
        use super::super::*;

        fn temp_models() -> (tempfile::TempDir, DetectorConfig) {
            let dir = tempfile::tempdir().unwrap();
            let mut paths = Vec::new();
            for name in [
                "detect.prototxt",
                "detect.caffemodel",
                "sr.prototxt",
                "sr.caffemodel",
            ] {
                let path = dir.path().join(name);
                std::fs::write(&path, b"model").unwrap();
                paths.push(path.to_str().unwrap().to_string());
            }
            let config = DetectorConfig::new(&paths[0], &paths[1], &paths[2], &paths[3]);
            (dir, config)
        }

        #[test]
        fn test_engine_creation() {
            let (_dir, config) = temp_models();
            assert!(ScanEngine::new(config).is_ok());
        }

        #[test]
        fn test_empty_model_path_rejected() {
            let (_dir, mut config) = temp_models();
            config.sr_model = String::new();
            assert!(matches!(
                ScanEngine::new(config),
                Err(BridgeError::Config(_))
            ));
        }

        #[test]
        fn test_missing_model_file_rejected() {
            let (_dir, mut config) = temp_models();
            config.detect_model = "/nonexistent/detect.caffemodel".to_string();
            assert!(matches!(
                ScanEngine::new(config),
                Err(BridgeError::Config(_))
            ));
        }

        #[test]
        fn test_detect_returns_empty() {
            let (_dir, config) = temp_models();
            let engine = ScanEngine::new(config).unwrap();
            let frame = FrameBuffer::from_packed_rgb(&[0; 4], 2, 2).unwrap();
            assert!(engine.detect_and_decode(&frame).unwrap().is_empty());
        }
    }
}
