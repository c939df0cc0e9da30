//! In-memory volume model: a dtype-tagged sample array with shape helpers
//! and the crop-apply slice operation

use crate::error::{CropError, Result};
use crate::plan::CropBounds;
use crate::types::{LeadingAxes, SampleType, ValueRange};
use ndarray::{ArrayViewD, Axis, IxDyn, Slice};
use num_traits::ToPrimitive;

/// Sample storage, one variant per TIFF sample type
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Run `$body` with `$data` bound to the variant's slice, producing a value
/// whose type does not depend on the sample type.
macro_rules! with_samples {
    ($samples:expr, $data:ident => $body:expr) => {
        match $samples {
            Samples::U8($data) => $body,
            Samples::U16($data) => $body,
            Samples::U32($data) => $body,
            Samples::U64($data) => $body,
            Samples::I8($data) => $body,
            Samples::I16($data) => $body,
            Samples::I32($data) => $body,
            Samples::I64($data) => $body,
            Samples::F32($data) => $body,
            Samples::F64($data) => $body,
        }
    };
}

/// Run `$body` per variant and rewrap the resulting vector in the same variant.
macro_rules! map_samples {
    ($samples:expr, $data:ident => $body:expr) => {
        match $samples {
            Samples::U8($data) => Samples::U8($body),
            Samples::U16($data) => Samples::U16($body),
            Samples::U32($data) => Samples::U32($body),
            Samples::U64($data) => Samples::U64($body),
            Samples::I8($data) => Samples::I8($body),
            Samples::I16($data) => Samples::I16($body),
            Samples::I32($data) => Samples::I32($body),
            Samples::I64($data) => Samples::I64($body),
            Samples::F32($data) => Samples::F32($body),
            Samples::F64($data) => Samples::F64($body),
        }
    };
}

impl Samples {
    /// Number of samples stored
    pub fn len(&self) -> usize {
        with_samples!(self, data => data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample type tag of this storage
    pub fn sample_type(&self) -> SampleType {
        match self {
            Samples::U8(_) => SampleType::U8,
            Samples::U16(_) => SampleType::U16,
            Samples::U32(_) => SampleType::U32,
            Samples::U64(_) => SampleType::U64,
            Samples::I8(_) => SampleType::I8,
            Samples::I16(_) => SampleType::I16,
            Samples::I32(_) => SampleType::I32,
            Samples::I64(_) => SampleType::I64,
            Samples::F32(_) => SampleType::F32,
            Samples::F64(_) => SampleType::F64,
        }
    }

    /// Move `other`'s samples onto the end of `self`. Returns false (leaving
    /// both unchanged) when the sample types differ.
    pub fn append(&mut self, other: &mut Samples) -> bool {
        match (self, other) {
            (Samples::U8(a), Samples::U8(b)) => a.append(b),
            (Samples::U16(a), Samples::U16(b)) => a.append(b),
            (Samples::U32(a), Samples::U32(b)) => a.append(b),
            (Samples::U64(a), Samples::U64(b)) => a.append(b),
            (Samples::I8(a), Samples::I8(b)) => a.append(b),
            (Samples::I16(a), Samples::I16(b)) => a.append(b),
            (Samples::I32(a), Samples::I32(b)) => a.append(b),
            (Samples::I64(a), Samples::I64(b)) => a.append(b),
            (Samples::F32(a), Samples::F32(b)) => a.append(b),
            (Samples::F64(a), Samples::F64(b)) => a.append(b),
            _ => return false,
        }
        true
    }
}

/// A row-major multi-dimensional sample array. Rank-3 axes are (Z, Y, X);
/// rank-4 leading axes follow a caller-declared [`LeadingAxes`] order. The
/// last two axes are always (Y, X).
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    shape: Vec<usize>,
    samples: Samples,
}

impl Volume {
    /// Create a volume, validating that the sample count matches the shape
    pub fn new(shape: Vec<usize>, samples: Samples) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if samples.len() != expected {
            return Err(CropError::Shape(format!(
                "sample count {} does not match shape {:?} ({} expected)",
                samples.len(),
                shape,
                expected
            )));
        }
        Ok(Self { shape, samples })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Extent along one axis
    pub fn dim(&self, axis: usize) -> usize {
        self.shape[axis]
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn sample_type(&self) -> SampleType {
        self.samples.sample_type()
    }

    pub fn into_parts(self) -> (Vec<usize>, Samples) {
        (self.shape, self.samples)
    }

    /// Shape rendered as "12 x 3 x 400 x 400"
    pub fn summary(&self) -> String {
        self.shape
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" x ")
    }

    /// Apply resolved crop bounds, producing an owned row-major volume of the
    /// same rank and sample type. Y/X windows land on the last two axes; the
    /// Z window, when present, lands on the declared depth axis. Channel axes
    /// are never cropped.
    pub fn crop(&self, bounds: &CropBounds, leading: LeadingAxes) -> Result<Volume> {
        let rank = self.rank();
        if !(3..=4).contains(&rank) {
            return Err(CropError::UnsupportedRank { stage: "crop", rank });
        }

        let mut windows: Vec<(usize, usize)> =
            self.shape.iter().map(|&d| (0, d)).collect();
        windows[rank - 2] = (bounds.y_start, bounds.y_len);
        windows[rank - 1] = (bounds.x_start, bounds.x_len);
        if let Some(z) = bounds.z {
            windows[leading.depth_axis(rank)] = (z.start, z.len);
        }

        for (axis, &(start, len)) in windows.iter().enumerate() {
            if start + len > self.shape[axis] {
                return Err(CropError::CropTooLarge(format!(
                    "window {}..{} exceeds axis {} extent {}",
                    start,
                    start + len,
                    axis,
                    self.shape[axis]
                )));
            }
        }

        let shape: Vec<usize> = windows.iter().map(|&(_, len)| len).collect();
        let samples =
            map_samples!(&self.samples, data => slice_windows(data, &self.shape, &windows)?);
        Volume::new(shape, samples)
    }

    /// Swap the two leading axes of a rank-4 volume, converting between
    /// depth-major and channel-major layouts
    pub fn swap_leading(&self) -> Result<Volume> {
        let rank = self.rank();
        if rank != 4 {
            return Err(CropError::UnsupportedRank {
                stage: "axis swap",
                rank,
            });
        }
        let mut shape = self.shape.clone();
        shape.swap(0, 1);
        let samples = map_samples!(&self.samples, data => swap_leading_pair(data, &self.shape)?);
        Volume::new(shape, samples)
    }

    /// Reinterpret the same samples under a new shape of equal element count
    pub fn into_shape(self, shape: Vec<usize>) -> Result<Volume> {
        Volume::new(shape, self.samples)
    }

    /// Finite min/max of the samples, used as the viewer display range.
    /// None when the volume is empty or holds no finite values.
    pub fn value_range(&self) -> Option<ValueRange> {
        with_samples!(&self.samples, data => finite_range(data))
    }
}

fn slice_windows<T: Copy>(
    data: &[T],
    shape: &[usize],
    windows: &[(usize, usize)],
) -> Result<Vec<T>> {
    let mut view = ArrayViewD::from_shape(IxDyn(shape), data)?;
    for (axis, &(start, len)) in windows.iter().enumerate() {
        view.slice_axis_inplace(Axis(axis), Slice::from(start..start + len));
    }
    Ok(view.iter().copied().collect())
}

fn swap_leading_pair<T: Copy>(data: &[T], shape: &[usize]) -> Result<Vec<T>> {
    let mut view = ArrayViewD::from_shape(IxDyn(shape), data)?;
    view.swap_axes(0, 1);
    Ok(view.iter().copied().collect())
}

fn finite_range<T: Copy + ToPrimitive>(data: &[T]) -> Option<ValueRange> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in data {
        let Some(value) = value.to_f64() else { continue };
        if !value.is_finite() {
            continue;
        }
        min = min.min(value);
        max = max.max(value);
    }
    if min <= max {
        Some(ValueRange::new(min, max))
    } else {
        None
    }
}
