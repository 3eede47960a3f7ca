//! Frame type and pixel-format conversion.

use thiserror::Error;

/// A captured RGB camera frame.
#[derive(Clone)]
pub struct Frame {
    /// Packed RGB24 pixel data (width * height * 3 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: std::time::Instant,
    /// Driver frame sequence number.
    pub sequence: u32,
}

impl Frame {
    /// Average luma (0.0–255.0), BT.601 weights.
    pub fn avg_brightness(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: f32 = self
            .data
            .chunks_exact(3)
            .map(|px| 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32)
            .sum();
        sum / (self.data.len() / 3) as f32
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("buffer too short: expected {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },
}

/// Convert packed YUYV 4:2:2 to packed RGB24.
///
/// YUYV carries two pixels per 4 bytes: [Y0, U, Y1, V]; both pixels share
/// the chroma pair. Uses the integer BT.601 conversion.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::BufferTooShort {
            expected,
            actual: yuyv.len(),
        });
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for quad in yuyv[..expected].chunks_exact(4) {
        let (y0, u, y1, v) = (quad[0], quad[1], quad[2], quad[3]);
        rgb.extend_from_slice(&yuv_pixel(y0, u, v));
        rgb.extend_from_slice(&yuv_pixel(y1, u, v));
    }
    Ok(rgb)
}

fn yuv_pixel(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let clamp = |x: i32| x.clamp(0, 255) as u8;
    [
        clamp((298 * c + 409 * e + 128) >> 8),
        clamp((298 * c - 100 * d - 208 * e + 128) >> 8),
        clamp((298 * c + 516 * d + 128) >> 8),
    ]
}

/// Expand 8-bit grayscale to packed RGB24 by channel replication.
pub fn gray_to_rgb(gray: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height) as usize;
    if gray.len() < expected {
        return Err(FrameError::BufferTooShort {
            expected,
            actual: gray.len(),
        });
    }

    let mut rgb = Vec::with_capacity(expected * 3);
    for &luma in &gray[..expected] {
        rgb.extend_from_slice(&[luma, luma, luma]);
    }
    Ok(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_neutral_chroma_is_gray() {
        // Y=128, U=V=128 → c=112, chroma terms vanish: (298*112+128)>>8 = 130.
        let yuyv = vec![128, 128, 128, 128];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        assert_eq!(rgb.len(), 6);
        assert_eq!(&rgb[0..3], &rgb[3..6]);
        let px = &rgb[0..3];
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert_eq!(px[0], 130);
    }

    #[test]
    fn test_yuyv_black_and_white() {
        // Y=16 is black, Y=235 is white in BT.601 range.
        let yuyv = vec![16, 128, 235, 128];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        assert_eq!(&rgb[0..3], &[0, 0, 0]);
        assert_eq!(&rgb[3..6], &[255, 255, 255]);
    }

    #[test]
    fn test_yuyv_red_chroma() {
        // Strong V pushes red up and green down.
        let yuyv = vec![128, 128, 128, 255];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        assert_eq!(rgb[0], 255);
        assert!(rgb[1] < 80);
        assert_eq!(rgb[2], 130);
    }

    #[test]
    fn test_yuyv_buffer_too_short() {
        let result = yuyv_to_rgb(&[128, 128], 2, 1);
        assert!(matches!(result, Err(FrameError::BufferTooShort { .. })));
    }

    #[test]
    fn test_gray_to_rgb_replicates() {
        let rgb = gray_to_rgb(&[0, 100, 255], 3, 1).unwrap();
        assert_eq!(rgb, vec![0, 0, 0, 100, 100, 100, 255, 255, 255]);
    }

    #[test]
    fn test_gray_buffer_too_short() {
        assert!(gray_to_rgb(&[1, 2], 2, 2).is_err());
    }

    #[test]
    fn test_avg_brightness_uniform() {
        let frame = Frame {
            data: vec![128; 4 * 3],
            width: 2,
            height: 2,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        };
        assert!((frame.avg_brightness() - 128.0).abs() < 0.5);
    }

    #[test]
    fn test_avg_brightness_empty() {
        let frame = Frame {
            data: vec![],
            width: 0,
            height: 0,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        };
        assert_eq!(frame.avg_brightness(), 0.0);
    }
}
