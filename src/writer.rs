//! Output formatting: axis tags, photometric interpretation, and the
//! hyperstack expansion strict viewers expect

use crate::error::{CropError, Result};
use crate::meta::{Axes, AxisMetadata, ImageJDescription, Photometric};
use crate::types::LeadingAxes;
use crate::volume::Volume;

/// Formats cropped volumes for serialization.
///
/// In hyperstack mode (the default) rank-4 volumes are normalized to
/// depth-major order and wrapped with singleton time and sample axes as
/// (T=1, Z, C, Y, X, S=1), and an ImageJ description block is attached.
/// Native mode leaves shapes untouched and tags the axes truthfully.
#[derive(Debug, Clone, Copy)]
pub struct VolumeWriter {
    leading_axes: LeadingAxes,
    hyperstack: bool,
}

impl Default for VolumeWriter {
    fn default() -> Self {
        Self {
            leading_axes: LeadingAxes::default(),
            hyperstack: true,
        }
    }
}

impl VolumeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the leading-axis order of rank-4 inputs; must match the
    /// planner's declaration
    pub fn with_leading_axes(mut self, leading_axes: LeadingAxes) -> Self {
        self.leading_axes = leading_axes;
        self
    }

    /// Enable or disable the viewer-compatible hyperstack form
    pub fn with_hyperstack(mut self, hyperstack: bool) -> Self {
        self.hyperstack = hyperstack;
        self
    }

    /// Produce the output volume and its axis metadata.
    ///
    /// Fails fast on unsupported ranks before touching any samples.
    pub fn format(&self, volume: Volume) -> Result<(Volume, AxisMetadata)> {
        match volume.rank() {
            3 => self.format_rank3(volume),
            4 => self.format_rank4(volume),
            rank => Err(CropError::UnsupportedRank {
                stage: "writer",
                rank,
            }),
        }
    }

    fn format_rank3(&self, volume: Volume) -> Result<(Volume, AxisMetadata)> {
        let mut metadata = AxisMetadata::new(Axes::Zyx, Photometric::MinIsBlack);
        if self.hyperstack {
            // Plain Z-stacks keep their shape; viewers only need the block
            let mut description = ImageJDescription::new(volume.dim(0), 1);
            if let Some(range) = volume.value_range() {
                description = description.with_range(range);
            }
            metadata = metadata.with_description(description);
        }
        Ok((volume, metadata))
    }

    fn format_rank4(&self, volume: Volume) -> Result<(Volume, AxisMetadata)> {
        let depth_axis = self.leading_axes.depth_axis(4);
        let slices = volume.dim(depth_axis);
        let channels = volume.dim(1 - depth_axis);
        let photometric = if channels > 1 {
            Photometric::Composite
        } else {
            Photometric::MinIsBlack
        };

        if !self.hyperstack {
            let axes = match self.leading_axes {
                LeadingAxes::DepthMajor => Axes::Zcyx,
                LeadingAxes::ChannelMajor => Axes::Czyx,
            };
            return Ok((volume, AxisMetadata::new(axes, photometric)));
        }

        // Hyperstack files are always Z-major between the T and S axes
        let normalized = match self.leading_axes {
            LeadingAxes::DepthMajor => volume,
            LeadingAxes::ChannelMajor => volume.swap_leading()?,
        };

        let mut description = ImageJDescription::new(slices, channels);
        if let Some(range) = normalized.value_range() {
            description = description.with_range(range);
        }

        let height = normalized.dim(2);
        let width = normalized.dim(3);
        let wrapped = normalized.into_shape(vec![1, slices, channels, height, width, 1])?;
        let metadata = AxisMetadata::new(Axes::Tzcyxs, photometric).with_description(description);
        Ok((wrapped, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::Samples;

    fn volume(shape: &[usize]) -> Volume {
        let len: usize = shape.iter().product();
        let data: Vec<u16> = (0..len).map(|v| v as u16).collect();
        Volume::new(shape.to_vec(), Samples::U16(data)).unwrap()
    }

    #[test]
    fn test_rank3_axes_and_photometric() {
        let writer = VolumeWriter::new().with_hyperstack(false);
        let (out, metadata) = writer.format(volume(&[12, 40, 40])).unwrap();
        assert_eq!(out.shape(), &[12, 40, 40]);
        assert_eq!(metadata.axes, Axes::Zyx);
        assert_eq!(metadata.photometric, Photometric::MinIsBlack);
        assert!(metadata.description.is_none());
    }

    #[test]
    fn test_rank3_hyperstack_keeps_shape() {
        let writer = VolumeWriter::new();
        let (out, metadata) = writer.format(volume(&[12, 40, 40])).unwrap();
        assert_eq!(out.shape(), &[12, 40, 40]);
        let desc = metadata.description.unwrap();
        assert_eq!(desc.images, 12);
        assert_eq!(desc.slices, 12);
        assert_eq!(desc.channels, 1);
        assert_eq!(desc.frames, 1);
    }

    #[test]
    fn test_rank4_hyperstack_expansion() {
        let writer = VolumeWriter::new();
        let (out, metadata) = writer.format(volume(&[12, 3, 40, 40])).unwrap();
        assert_eq!(out.shape(), &[1, 12, 3, 40, 40, 1]);
        assert_eq!(metadata.axes, Axes::Tzcyxs);
        assert_eq!(metadata.photometric, Photometric::Composite);

        let desc = metadata.description.unwrap();
        assert_eq!(desc.images, 36);
        assert_eq!(desc.channels, 3);
        assert_eq!(desc.slices, 12);
        assert_eq!(desc.frames, 1);
    }

    #[test]
    fn test_rank4_channel_major_is_normalized() {
        let writer = VolumeWriter::new().with_leading_axes(LeadingAxes::ChannelMajor);
        // (C=3, Z=12, Y, X) must come out as (1, 12, 3, Y, X, 1)
        let (out, metadata) = writer.format(volume(&[3, 12, 40, 40])).unwrap();
        assert_eq!(out.shape(), &[1, 12, 3, 40, 40, 1]);
        let desc = metadata.description.unwrap();
        assert_eq!(desc.slices, 12);
        assert_eq!(desc.channels, 3);
    }

    #[test]
    fn test_rank4_native_tags() {
        let writer = VolumeWriter::new().with_hyperstack(false);
        let (_, metadata) = writer.format(volume(&[12, 3, 40, 40])).unwrap();
        assert_eq!(metadata.axes, Axes::Zcyx);

        let writer = writer.with_leading_axes(LeadingAxes::ChannelMajor);
        let (out, metadata) = writer.format(volume(&[3, 12, 40, 40])).unwrap();
        assert_eq!(out.shape(), &[3, 12, 40, 40]);
        assert_eq!(metadata.axes, Axes::Czyx);
    }

    #[test]
    fn test_unsupported_rank_fails_fast() {
        let writer = VolumeWriter::new();
        let err = writer.format(volume(&[2, 2, 2, 40, 40])).unwrap_err();
        assert!(matches!(
            err,
            CropError::UnsupportedRank {
                stage: "writer",
                rank: 5
            }
        ));
    }

    #[test]
    fn test_display_range_attached() {
        let writer = VolumeWriter::new();
        let (_, metadata) = writer.format(volume(&[2, 4, 4])).unwrap();
        let range = metadata.description.unwrap().range.unwrap();
        assert_eq!(range.min, 0.0);
        assert_eq!(range.max, 31.0);
    }
}
