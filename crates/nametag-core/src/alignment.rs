//! Face alignment via a 4-DOF similarity transform.
//!
//! Maps the detector's five landmarks onto the canonical ArcFace positions
//! for a 112×112 crop, estimated by least squares, then warps the RGB frame
//! through the transform with bilinear sampling.

use image::RgbImage;

/// Canonical ArcFace landmark positions for a 112×112 crop:
/// [left_eye, right_eye, nose, left_mouth, right_mouth].
const CANONICAL_LANDMARKS: [(f32, f32); 5] = [
    (38.2946, 51.6963),
    (73.5318, 51.5014),
    (56.0252, 71.7366),
    (41.5493, 92.3655),
    (70.7299, 92.2041),
];

/// Side length of the aligned output crop.
pub const ALIGNED_SIZE: u32 = 112;

/// Align a detected face to the canonical 112×112 ArcFace position.
pub fn align_face(frame: &RgbImage, landmarks: &[(f32, f32); 5]) -> RgbImage {
    let forward = similarity_transform(landmarks, &CANONICAL_LANDMARKS);
    warp_into_crop(frame, &forward)
}

/// Estimate the 2×3 similarity matrix (scale + rotation + translation)
/// taking `src` points onto `dst` points, as [a, -b, tx, b, a, ty]:
///
/// ```text
/// | a  -b  tx |
/// | b   a  ty |
/// ```
fn similarity_transform(src: &[(f32, f32); 5], dst: &[(f32, f32); 5]) -> [f32; 6] {
    // Each correspondence contributes two equations in (a, b, tx, ty):
    //   sx*a - sy*b + tx = dx
    //   sy*a + sx*b + ty = dy
    // Accumulate the normal equations A^T A x = A^T b for the stacked system.
    let mut lhs = [[0.0f32; 4]; 4];
    let mut rhs = [0.0f32; 4];

    for (&(sx, sy), &(dx, dy)) in src.iter().zip(dst.iter()) {
        let rows = [([sx, -sy, 1.0, 0.0], dx), ([sy, sx, 0.0, 1.0], dy)];
        for (row, target) in rows {
            for j in 0..4 {
                for k in 0..4 {
                    lhs[j][k] += row[j] * row[k];
                }
                rhs[j] += row[j] * target;
            }
        }
    }

    let [a, b, tx, ty] = solve_4x4(lhs, rhs);
    [a, -b, tx, b, a, ty]
}

/// Gaussian elimination with partial pivoting for the 4×4 normal equations.
/// Degenerate systems fall back to the identity transform.
fn solve_4x4(lhs: [[f32; 4]; 4], rhs: [f32; 4]) -> [f32; 4] {
    let mut m = [[0.0f32; 5]; 4];
    for i in 0..4 {
        m[i][..4].copy_from_slice(&lhs[i]);
        m[i][4] = rhs[i];
    }

    for col in 0..4 {
        let pivot_row = (col..4)
            .max_by(|&a, &b| {
                m[a][col]
                    .abs()
                    .partial_cmp(&m[b][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        m.swap(col, pivot_row);

        let pivot = m[col][col];
        if pivot.abs() < 1e-12 {
            return [1.0, 0.0, 0.0, 0.0];
        }
        for row in (col + 1)..4 {
            let factor = m[row][col] / pivot;
            for j in col..5 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let mut x = [0.0f32; 4];
    for i in (0..4).rev() {
        x[i] = m[i][4];
        for j in (i + 1)..4 {
            x[i] -= m[i][j] * x[j];
        }
        x[i] /= m[i][i];
    }
    x
}

/// Produce the 112×112 crop by sampling the source frame through the inverse
/// of `forward`. Out-of-frame samples are black.
fn warp_into_crop(frame: &RgbImage, forward: &[f32; 6]) -> RgbImage {
    let inverse = invert_similarity(forward);
    let (fw, fh) = (frame.width() as i32, frame.height() as i32);

    RgbImage::from_fn(ALIGNED_SIZE, ALIGNED_SIZE, |ox, oy| {
        let (sx, sy) = apply(&inverse, ox as f32, oy as f32);

        let x0 = sx.floor() as i32;
        let y0 = sy.floor() as i32;
        if x0 < -1 || y0 < -1 || x0 > fw - 1 || y0 > fh - 1 {
            return image::Rgb([0, 0, 0]);
        }
        let fx = sx - x0 as f32;
        let fy = sy - y0 as f32;

        let sample = |px: i32, py: i32| -> [f32; 3] {
            let cx = px.clamp(0, fw - 1) as u32;
            let cy = py.clamp(0, fh - 1) as u32;
            let p = frame.get_pixel(cx, cy);
            [p[0] as f32, p[1] as f32, p[2] as f32]
        };

        let tl = sample(x0, y0);
        let tr = sample(x0 + 1, y0);
        let bl = sample(x0, y0 + 1);
        let br = sample(x0 + 1, y0 + 1);

        let mut out = [0u8; 3];
        for c in 0..3 {
            let top = tl[c] * (1.0 - fx) + tr[c] * fx;
            let bottom = bl[c] * (1.0 - fx) + br[c] * fx;
            out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
        }
        image::Rgb(out)
    })
}

/// Invert a similarity matrix [a, -b, tx, b, a, ty].
fn invert_similarity(m: &[f32; 6]) -> [f32; 6] {
    let (a, b) = (m[0], m[3]);
    let (tx, ty) = (m[2], m[5]);
    let det = a * a + b * b;
    if det.abs() < 1e-12 {
        return [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    }
    let ia = a / det;
    let ib = -b / det;
    // Inverse rotation applied to the negated translation.
    let itx = -(ia * tx - ib * ty);
    let ity = -(ib * tx + ia * ty);
    [ia, -ib, itx, ib, ia, ity]
}

fn apply(m: &[f32; 6], x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[1] * y + m[2], m[3] * x + m[4] * y + m[5])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_when_landmarks_canonical() {
        let m = similarity_transform(&CANONICAL_LANDMARKS, &CANONICAL_LANDMARKS);
        assert!((m[0] - 1.0).abs() < 1e-3, "a = {}", m[0]);
        assert!(m[1].abs() < 1e-3);
        assert!(m[2].abs() < 1e-2);
        assert!(m[3].abs() < 1e-3);
        assert!(m[5].abs() < 1e-2);
    }

    #[test]
    fn test_pure_translation() {
        let shifted = CANONICAL_LANDMARKS.map(|(x, y)| (x + 10.0, y - 5.0));
        let m = similarity_transform(&shifted, &CANONICAL_LANDMARKS);
        assert!((m[0] - 1.0).abs() < 1e-3);
        assert!((m[2] + 10.0).abs() < 1e-2, "tx = {}", m[2]);
        assert!((m[5] - 5.0).abs() < 1e-2, "ty = {}", m[5]);
    }

    #[test]
    fn test_pure_scale() {
        let doubled = CANONICAL_LANDMARKS.map(|(x, y)| (x * 2.0, y * 2.0));
        let m = similarity_transform(&doubled, &CANONICAL_LANDMARKS);
        assert!((m[0] - 0.5).abs() < 1e-3, "a = {}", m[0]);
        assert!(m[1].abs() < 1e-3);
    }

    #[test]
    fn test_transform_roundtrip_through_inverse() {
        let shifted = CANONICAL_LANDMARKS.map(|(x, y)| (x * 1.5 + 20.0, y * 1.5 + 7.0));
        let forward = similarity_transform(&shifted, &CANONICAL_LANDMARKS);
        let inverse = invert_similarity(&forward);

        for &(x, y) in shifted.iter() {
            let (cx, cy) = apply(&forward, x, y);
            let (rx, ry) = apply(&inverse, cx, cy);
            assert!((rx - x).abs() < 0.05, "x: {rx} vs {x}");
            assert!((ry - y).abs() < 0.05, "y: {ry} vs {y}");
        }
    }

    #[test]
    fn test_warp_output_dimensions() {
        let frame = RgbImage::from_pixel(64, 48, image::Rgb([90, 120, 150]));
        let landmarks = CANONICAL_LANDMARKS.map(|(x, y)| (x * 0.4, y * 0.4));
        let crop = align_face(&frame, &landmarks);
        assert_eq!(crop.dimensions(), (ALIGNED_SIZE, ALIGNED_SIZE));
        // Uniform source stays uniform where samples land inside the frame.
        let center = crop.get_pixel(ALIGNED_SIZE / 2, ALIGNED_SIZE / 2);
        assert_eq!(center.0, [90, 120, 150]);
    }
}
