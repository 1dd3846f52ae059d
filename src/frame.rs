//! Owned frame buffers in the layout the detector consumes
//!
//! The bridge accepts two caller-side pixel formats: packed-RGB 32-bit words
//! and NV21 (YUV 4:2:0 semi-planar) bytes. Both are converted into a single
//! owned byte buffer whose row/column/channel layout matches what the
//! detector expects for that format.

use crate::error::BridgeError;

/// Single-plane byte buffer with explicit geometry
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    data: Vec<u8>,
    cols: u32,
    rows: u32,
    channels: u8,
}

impl FrameBuffer {
    /// Convert packed 32-bit pixels into a `width x height` 3-channel buffer.
    ///
    /// Output byte 0 is the low byte of the packed word, byte 1 the middle,
    /// byte 2 the high byte: `0xRRGGBB` words come out as B,G,R bytes, the
    /// channel order the detector consumes. Changing this mapping silently
    /// swaps red and blue in every downstream frame.
    pub fn from_packed_rgb(pixels: &[i32], width: u32, height: u32) -> Result<Self, BridgeError> {
        let expected = Self::expected_rgb_len(width, height);
        if expected == 0 {
            return Err(BridgeError::BadFrame(format!(
                "zero-area frame {}x{}",
                width, height
            )));
        }
        if pixels.len() != expected {
            return Err(BridgeError::BadFrame(format!(
                "packed-RGB buffer holds {} words, {}x{} needs {}",
                pixels.len(),
                width,
                height,
                expected
            )));
        }

        let mut data = Vec::with_capacity(expected * 3);
        for &word in pixels {
            let word = word as u32;
            data.push((word & 0xFF) as u8);
            data.push(((word >> 8) & 0xFF) as u8);
            data.push(((word >> 16) & 0xFF) as u8);
        }

        Ok(Self {
            data,
            cols: width,
            rows: height,
            channels: 3,
        })
    }

    /// Copy an NV21 buffer byte-for-byte into a single-channel buffer with
    /// `height * 3/2` rows (full-resolution luma plane followed by the
    /// interleaved half-resolution chroma plane).
    pub fn from_nv21(data: &[u8], width: u32, height: u32) -> Result<Self, BridgeError> {
        let expected = Self::expected_nv21_len(width, height);
        if expected == 0 {
            return Err(BridgeError::BadFrame(format!(
                "zero-area frame {}x{}",
                width, height
            )));
        }
        if data.len() != expected {
            return Err(BridgeError::BadFrame(format!(
                "NV21 buffer holds {} bytes, {}x{} needs {}",
                data.len(),
                width,
                height,
                expected
            )));
        }

        Ok(Self {
            data: data.to_vec(),
            cols: width,
            rows: 3 * height / 2,
            channels: 1,
        })
    }

    /// Expected packed-RGB length in 32-bit words
    pub fn expected_rgb_len(width: u32, height: u32) -> usize {
        (width as usize) * (height as usize)
    }

    /// Expected NV21 length in bytes (Y plane + interleaved VU plane)
    pub fn expected_nv21_len(width: u32, height: u32) -> usize {
        let pixels = (width as usize) * (height as usize);
        pixels + pixels / 2
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_rgb_byte_order() {
        // Low byte lands first: 0x00112233 -> B,G,R = 0x33, 0x22, 0x11
        let frame = FrameBuffer::from_packed_rgb(&[0x0011_2233], 1, 1).unwrap();
        assert_eq!(frame.data(), &[0x33, 0x22, 0x11]);
        assert_eq!(frame.cols(), 1);
        assert_eq!(frame.rows(), 1);
        assert_eq!(frame.channels(), 3);
    }

    #[test]
    fn test_packed_rgb_ignores_alpha_byte() {
        let frame = FrameBuffer::from_packed_rgb(&[u32::MAX as i32], 1, 1).unwrap();
        assert_eq!(frame.data(), &[0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_packed_rgb_multi_pixel_stride() {
        let pixels = [0x00FF_0000, 0x0000_FF00, 0x0000_00FF];
        let frame = FrameBuffer::from_packed_rgb(&pixels, 3, 1).unwrap();
        // Three bytes per pixel, no overlap between pixels
        assert_eq!(
            frame.data(),
            &[0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0x00]
        );
    }

    #[test]
    fn test_packed_rgb_length_mismatch() {
        let err = FrameBuffer::from_packed_rgb(&[0; 5], 2, 3).unwrap_err();
        assert!(matches!(err, BridgeError::BadFrame(_)));
    }

    #[test]
    fn test_packed_rgb_zero_area() {
        assert!(FrameBuffer::from_packed_rgb(&[], 0, 4).is_err());
    }

    #[test]
    fn test_nv21_raw_copy() {
        let data: Vec<u8> = (0..24).collect(); // 4x4 -> 16 + 8 bytes
        let frame = FrameBuffer::from_nv21(&data, 4, 4).unwrap();
        assert_eq!(frame.data(), data.as_slice());
        assert_eq!(frame.cols(), 4);
        assert_eq!(frame.rows(), 6); // height * 3/2
        assert_eq!(frame.channels(), 1);
    }

    #[test]
    fn test_nv21_length_mismatch() {
        let err = FrameBuffer::from_nv21(&[0; 23], 4, 4).unwrap_err();
        assert!(matches!(err, BridgeError::BadFrame(_)));
    }

    #[test]
    fn test_expected_lengths() {
        assert_eq!(FrameBuffer::expected_rgb_len(640, 480), 640 * 480);
        assert_eq!(FrameBuffer::expected_nv21_len(640, 480), 640 * 480 * 3 / 2);
    }
}
