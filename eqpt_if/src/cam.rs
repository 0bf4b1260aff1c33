//! # Vision Provider Interface
//!
//! The vision provider hides image acquisition and colour segmentation. It reports how much
//! of the frame the target colour occupies and where it sits in the frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Verdict of a per-cell grid analysis of the lower part of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridVerdict {
    /// Nothing detected.
    None,

    /// Target colour in the bottom left cell.
    Left,

    /// Target colour in the bottom right cell.
    Right,

    /// Target colour in the bottom centre cell.
    CentreBottom,

    /// The target colour covers a large part of the whole frame.
    HighOverall,

    /// The frame could not be captured or processed.
    Error,
}

/// Lateral position of the largest target blob across the frame width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LateralBucket {
    FarLeft,
    Left,
    Centre,
    Right,
    FarRight,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A camera pipeline able to locate the target colour.
pub trait VisionProvider {
    /// Fraction of the frame (0..=1) covered by the target colour, or `None` on capture error.
    fn capture_overall_percentage(&mut self) -> Option<f64>;

    /// Grid analysis of the frame.
    fn capture_grid_verdict(&mut self) -> GridVerdict;

    /// Lateral bucket of the target, or `None` if no target is visible.
    fn capture_lateral_bucket(&mut self) -> Option<LateralBucket>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LateralBucket {
    /// Build a bucket from its 1-based index, left to right.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(LateralBucket::FarLeft),
            2 => Some(LateralBucket::Left),
            3 => Some(LateralBucket::Centre),
            4 => Some(LateralBucket::Right),
            5 => Some(LateralBucket::FarRight),
            _ => None,
        }
    }

    /// 1-based index of the bucket, left to right.
    pub fn index(&self) -> u8 {
        match self {
            LateralBucket::FarLeft => 1,
            LateralBucket::Left => 2,
            LateralBucket::Centre => 3,
            LateralBucket::Right => 4,
            LateralBucket::FarRight => 5,
        }
    }

    /// Signed offset from the centre bucket, negative to the left.
    pub fn offset(&self) -> i8 {
        self.index() as i8 - 3
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bucket_index() {
        for i in 1..=5 {
            let b = LateralBucket::from_index(i).unwrap();
            assert_eq!(b.index(), i);
        }
        assert_eq!(LateralBucket::from_index(0), None);
        assert_eq!(LateralBucket::from_index(6), None);
        assert_eq!(LateralBucket::FarLeft.offset(), -2);
        assert_eq!(LateralBucket::Right.offset(), 1);
    }
}
