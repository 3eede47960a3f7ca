use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, with optional facial landmarks.
///
/// Coordinates are in pixels of whatever frame the face was detected in;
/// [`BoundingBox::scaled`] maps between downsampled and full resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

impl BoundingBox {
    /// Return a copy with every coordinate (and landmark) multiplied by
    /// `factor`. Confidence is unchanged.
    pub fn scaled(&self, factor: f32) -> BoundingBox {
        BoundingBox {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
            confidence: self.confidence,
            landmarks: self
                .landmarks
                .map(|lms| lms.map(|(lx, ly)| (lx * factor, ly * factor))),
        }
    }
}

/// Face encoding vector (512-dimensional for ArcFace), L2-normalized at
/// extraction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoding {
    pub values: Vec<f32>,
}

impl Encoding {
    /// Euclidean distance to another encoding. On L2-normalized vectors this
    /// is monotonic with cosine similarity, so one threshold covers both.
    pub fn distance(&self, other: &Encoding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }
}

/// Outcome of comparing one probe encoding against the gallery.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// Label of the minimum-distance entry, if that entry passed the match
    /// predicate. `None` means "Unknown" (or an empty gallery).
    pub label: Option<String>,
    /// Distance of the minimum-distance entry. `None` only when the gallery
    /// is empty.
    pub best_distance: Option<f32>,
}

/// The in-memory gallery of known faces: two parallel sequences in strict
/// positional correspondence. Entries are appended only; the pair of vectors
/// always has equal length.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    names: Vec<String>,
    encodings: Vec<Encoding>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: String, encoding: Encoding) {
        self.names.push(name);
        self.encodings.push(encoding);
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.names.len(), self.encodings.len());
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.encodings.clear();
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolve a probe encoding against the gallery.
    ///
    /// Two steps, kept deliberately distinct: first every entry is tested
    /// against the match predicate (`distance <= threshold`), then the
    /// minimum-distance entry is selected. The label is taken only when the
    /// minimum-distance entry itself passed the predicate — a smaller
    /// distance never overrides a failed predicate at the argmin.
    pub fn best_match(&self, probe: &Encoding, threshold: f32) -> MatchOutcome {
        let distances: Vec<f32> = self.encodings.iter().map(|e| e.distance(probe)).collect();
        let matches: Vec<bool> = distances.iter().map(|&d| d <= threshold).collect();

        let best = (0..distances.len()).min_by(|&a, &b| {
            distances[a]
                .partial_cmp(&distances[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        match best {
            Some(idx) => MatchOutcome {
                label: matches[idx].then(|| self.names[idx].clone()),
                best_distance: Some(distances[idx]),
            },
            None => MatchOutcome {
                label: None,
                best_distance: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(values: &[f32]) -> Encoding {
        Encoding {
            values: values.to_vec(),
        }
    }

    #[test]
    fn test_distance_identical() {
        let a = enc(&[1.0, 0.0, 0.0]);
        assert!(a.distance(&a).abs() < 1e-6);
    }

    #[test]
    fn test_distance_unit_axes() {
        let a = enc(&[1.0, 0.0]);
        let b = enc(&[0.0, 1.0]);
        assert!((a.distance(&b) - std::f32::consts::SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_scaled_maps_all_coordinates() {
        let bbox = BoundingBox {
            x: 12.5,
            y: 7.75,
            width: 30.0,
            height: 40.25,
            confidence: 0.9,
            landmarks: Some([(1.0, 2.0); 5]),
        };
        let up = bbox.scaled(4.0);
        assert_eq!(up.x, 50.0);
        assert_eq!(up.y, 31.0);
        assert_eq!(up.width, 120.0);
        assert_eq!(up.height, 161.0);
        assert_eq!(up.confidence, 0.9);
        assert_eq!(up.landmarks.unwrap()[0], (4.0, 8.0));
    }

    #[test]
    fn test_gallery_push_keeps_parallel_lengths() {
        let mut gallery = Gallery::new();
        gallery.push("alice".into(), enc(&[1.0, 0.0]));
        gallery.push("bob".into(), enc(&[0.0, 1.0]));
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.names(), ["alice", "bob"]);
    }

    #[test]
    fn test_best_match_empty_gallery() {
        let gallery = Gallery::new();
        let outcome = gallery.best_match(&enc(&[1.0, 0.0]), 0.6);
        assert_eq!(outcome.label, None);
        assert_eq!(outcome.best_distance, None);
    }

    #[test]
    fn test_best_match_picks_minimum_distance() {
        let mut gallery = Gallery::new();
        gallery.push("far".into(), enc(&[0.0, 1.0]));
        gallery.push("near".into(), enc(&[0.9, 0.1]));
        let outcome = gallery.best_match(&enc(&[1.0, 0.0]), 1.0);
        assert_eq!(outcome.label.as_deref(), Some("near"));
    }

    #[test]
    fn test_best_match_argmin_below_threshold_required() {
        // The minimum-distance entry fails the predicate, so the probe is
        // unmatched even though a distance value exists.
        let mut gallery = Gallery::new();
        gallery.push("alice".into(), enc(&[0.0, 1.0]));
        let probe = enc(&[1.0, 0.0]);
        let outcome = gallery.best_match(&probe, 0.5);
        assert_eq!(outcome.label, None);
        let d = outcome.best_distance.unwrap();
        assert!((d - std::f32::consts::SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_best_match_all_entries_compared() {
        // Best match is the last entry: the whole gallery must be scanned.
        let mut gallery = Gallery::new();
        gallery.push("decoy1".into(), enc(&[0.0, 1.0, 0.0]));
        gallery.push("decoy2".into(), enc(&[0.0, 0.0, 1.0]));
        gallery.push("match".into(), enc(&[1.0, 0.0, 0.0]));
        let outcome = gallery.best_match(&enc(&[1.0, 0.0, 0.0]), 0.6);
        assert_eq!(outcome.label.as_deref(), Some("match"));
        assert!(outcome.best_distance.unwrap().abs() < 1e-6);
    }
}
