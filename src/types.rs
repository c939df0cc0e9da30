//! Core data types for stack cropping

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sample types a TIFF stack can carry; passed through unchanged by cropping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleType {
    /// Unsigned 8-bit integer
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// Unsigned 32-bit integer
    U32,
    /// Unsigned 64-bit integer
    U64,
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
}

impl SampleType {
    /// Size in bytes of this sample type
    pub fn size_in_bytes(&self) -> usize {
        match self {
            SampleType::U8 | SampleType::I8 => 1,
            SampleType::U16 | SampleType::I16 => 2,
            SampleType::U32 | SampleType::I32 | SampleType::F32 => 4,
            SampleType::U64 | SampleType::I64 | SampleType::F64 => 8,
        }
    }

    /// Check if this is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(self, SampleType::F32 | SampleType::F64)
    }

    /// Check if this is an integer type
    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Declared order of the leading axes of a 4D stack.
///
/// The last two axes are always (Y, X). A 4D stack carries depth and channel
/// in its two leading axes, and upstream files disagree on which comes first,
/// so the caller must declare the order; the planner, crop apply, writer and
/// decoder all consume the same declaration and the emitted axes tag is
/// derived from it. Rank-3 stacks have a single leading axis, always depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadingAxes {
    /// Leading axes are (Z, C): depth-major, the tifffile default reading
    #[default]
    DepthMajor,
    /// Leading axes are (C, Z): channel-major
    ChannelMajor,
}

impl LeadingAxes {
    /// Index of the depth axis for a stack of the given rank
    pub fn depth_axis(&self, rank: usize) -> usize {
        if rank == 4 && *self == LeadingAxes::ChannelMajor {
            1
        } else {
            0
        }
    }

    /// Index of the channel axis, present only for rank-4 stacks
    pub fn channel_axis(&self, rank: usize) -> Option<usize> {
        if rank != 4 {
            return None;
        }
        match self {
            LeadingAxes::DepthMajor => Some(1),
            LeadingAxes::ChannelMajor => Some(0),
        }
    }
}

/// Output compression applied when re-serializing cropped stacks.
///
/// Input compression is whatever the decoder finds and is not preserved;
/// the output codec is an explicit choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputCompression {
    /// No compression
    #[default]
    Uncompressed,
    /// LZW, the common lossless default for microscopy
    Lzw,
    /// Deflate (zip)
    Deflate,
    /// PackBits run-length encoding
    Packbits,
}

/// Finite value range of a volume's samples, used as the viewer display range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_type_sizes() {
        assert_eq!(SampleType::U8.size_in_bytes(), 1);
        assert_eq!(SampleType::U16.size_in_bytes(), 2);
        assert_eq!(SampleType::F32.size_in_bytes(), 4);
        assert_eq!(SampleType::F64.size_in_bytes(), 8);
        assert!(SampleType::F32.is_float());
        assert!(SampleType::I16.is_integer());
    }

    #[test]
    fn test_leading_axes_indices() {
        assert_eq!(LeadingAxes::DepthMajor.depth_axis(3), 0);
        assert_eq!(LeadingAxes::DepthMajor.depth_axis(4), 0);
        assert_eq!(LeadingAxes::ChannelMajor.depth_axis(4), 1);

        assert_eq!(LeadingAxes::DepthMajor.channel_axis(3), None);
        assert_eq!(LeadingAxes::DepthMajor.channel_axis(4), Some(1));
        assert_eq!(LeadingAxes::ChannelMajor.channel_axis(4), Some(0));
    }

    #[test]
    fn test_value_range_validity() {
        assert!(ValueRange::new(0.0, 255.0).is_valid());
        assert!(!ValueRange::new(1.0, 0.0).is_valid());
        assert!(!ValueRange::new(f64::NAN, 1.0).is_valid());
    }
}
