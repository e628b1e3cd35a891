//! Run-length codec for binary alpha masks.
//!
//! Counts alternate background/foreground over the row-major alpha channel and
//! always start with a background run (possibly zero long). On the wire the counts
//! are followed by the inclusive `[left, top, right, bottom]` box in image space.

use crate::error::{CanvasError, Result};

/// Encode an alpha channel of `width * height` bytes. Any non-zero alpha is foreground.
pub fn encode(alpha: &[u8]) -> Vec<u32> {
    let mut counts = Vec::new();
    let mut foreground = false;
    let mut run = 0u32;
    for &a in alpha {
        if (a != 0) != foreground {
            counts.push(run);
            run = 0;
            foreground = !foreground;
        }
        run += 1;
    }
    counts.push(run);
    counts
}

/// Expand `counts` back into a `width * height` alpha channel of 0/255 bytes.
pub fn decode(counts: &[u32], width: usize, height: usize) -> Result<Vec<u8>> {
    let total = width
        .checked_mul(height)
        .ok_or_else(|| CanvasError::InvalidData(format!("mask of {}x{} pixels is too large", width, height)))?;
    let sum: u64 = counts.iter().map(|&c| c as u64).sum();
    if sum != total as u64 {
        return Err(CanvasError::InvalidData(format!(
            "mask runs cover {} pixels, expected {}x{}",
            sum, width, height
        )));
    }
    let mut alpha = Vec::with_capacity(total);
    for (i, &count) in counts.iter().enumerate() {
        let value = if i % 2 == 0 { 0 } else { 255 };
        alpha.extend(std::iter::repeat(value).take(count as usize));
    }
    Ok(alpha)
}

/// Inclusive extent of `[from, to]`, widened so `[0, u32::MAX]` does not wrap.
fn span(from: u32, to: u32) -> u64 {
    u64::from(to).saturating_sub(u64::from(from)) + 1
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RleMask {
    pub counts: Vec<u32>,
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl RleMask {
    pub fn width(&self) -> usize {
        span(self.left, self.right) as usize
    }

    pub fn height(&self) -> usize {
        span(self.top, self.bottom) as usize
    }

    pub fn has_foreground(&self) -> bool {
        self.counts.iter().skip(1).step_by(2).any(|&c| c > 0)
    }

    pub fn foreground_pixels(&self) -> u64 {
        self.counts.iter().skip(1).step_by(2).map(|&c| c as u64).sum()
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        decode(&self.counts, self.width(), self.height())
    }

    pub fn to_points(&self) -> Vec<f64> {
        let mut points: Vec<f64> = self.counts.iter().map(|&c| c as f64).collect();
        points.extend([self.left, self.top, self.right, self.bottom].map(|v| v as f64));
        points
    }

    pub fn from_points(points: &[f64]) -> Result<Self> {
        if points.len() < 5 {
            return Err(CanvasError::InvalidData("mask needs runs and a bounding box".into()));
        }
        let (runs, bbox) = points.split_at(points.len() - 4);
        let as_u32 = |v: f64| -> Result<u32> {
            if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
                Ok(v as u32)
            } else {
                Err(CanvasError::InvalidData(format!("bad mask value {}", v)))
            }
        };
        let counts = runs.iter().map(|&v| as_u32(v)).collect::<Result<Vec<_>>>()?;
        let mask = RleMask {
            counts,
            left: as_u32(bbox[0])?,
            top: as_u32(bbox[1])?,
            right: as_u32(bbox[2])?,
            bottom: as_u32(bbox[3])?,
        };
        if mask.right < mask.left || mask.bottom < mask.top {
            return Err(CanvasError::InvalidData("inverted mask bounding box".into()));
        }
        let area = span(mask.left, mask.right)
            .checked_mul(span(mask.top, mask.bottom))
            .filter(|&area| usize::try_from(area).is_ok())
            .ok_or_else(|| CanvasError::InvalidData("mask bounding box is too large".into()))?;
        let sum: u64 = mask.counts.iter().map(|&c| c as u64).sum();
        if sum != area {
            return Err(CanvasError::InvalidData("mask runs do not cover the bounding box".into()));
        }
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_run_is_background() {
        assert_eq!(encode(&[255, 255, 0, 255]), vec![0, 2, 1, 1]);
        assert_eq!(encode(&[0, 0, 0]), vec![3]);
    }

    #[test]
    fn wire_form_carries_box() {
        let mask = RleMask { counts: vec![1, 2, 1], left: 4, top: 6, right: 5, bottom: 7 };
        let points = mask.to_points();
        assert_eq!(points, vec![1.0, 2.0, 1.0, 4.0, 6.0, 5.0, 7.0]);
        assert_eq!(RleMask::from_points(&points).unwrap(), mask);
        assert_eq!(mask.foreground_pixels(), 2);
        assert_eq!(mask.decode().unwrap(), vec![0, 255, 255, 0]);
    }

    #[test]
    fn mismatched_runs_are_rejected() {
        assert!(RleMask::from_points(&[1.0, 2.0, 0.0, 0.0, 1.0, 1.0]).is_err());
        assert!(decode(&[3, 2], 2, 2).is_err());
        assert!(RleMask::from_points(&[4.0, 0.5, 0.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn oversized_boxes_are_invalid_data() {
        let max = u32::MAX as f64;
        let wide = RleMask::from_points(&[1.0, 0.0, 0.0, max, 0.0]);
        assert!(matches!(wide, Err(CanvasError::InvalidData(_))));
        let huge = RleMask::from_points(&[1.0, 0.0, 0.0, max, max]);
        assert!(matches!(huge, Err(CanvasError::InvalidData(_))));
        assert!(matches!(decode(&[1], usize::MAX, 2), Err(CanvasError::InvalidData(_))));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(
            (width, height, bits) in (1usize..24, 1usize..24)
                .prop_flat_map(|(w, h)| (Just(w), Just(h), prop::collection::vec(any::<bool>(), w * h)))
        ) {
            let alpha: Vec<u8> = bits.iter().map(|&b| if b { 255 } else { 0 }).collect();
            let counts = encode(&alpha);
            prop_assert_eq!(decode(&counts, width, height).unwrap(), alpha);
        }
    }
}
