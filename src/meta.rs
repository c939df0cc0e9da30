//! Axis metadata attached to serialized stacks

use crate::types::ValueRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ImageJ version string written into description blocks
pub const IMAGEJ_VERSION: &str = "1.54f";

/// Axes tag enumerating which logical axis each array dimension represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axes {
    /// Rank 3: depth, row, column
    #[serde(rename = "ZYX")]
    Zyx,
    /// Rank 4, depth-major leading axes
    #[serde(rename = "ZCYX")]
    Zcyx,
    /// Rank 4, channel-major leading axes
    #[serde(rename = "CZYX")]
    Czyx,
    /// Rank 6 hyperstack with singleton time and sample axes
    #[serde(rename = "TZCYXS")]
    Tzcyxs,
}

impl Axes {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axes::Zyx => "ZYX",
            Axes::Zcyx => "ZCYX",
            Axes::Czyx => "CZYX",
            Axes::Tzcyxs => "TZCYXS",
        }
    }

    /// Rank of an array carrying these axes
    pub fn rank(&self) -> usize {
        self.as_str().len()
    }

    /// Indices of the (Y, X) axes within an array carrying these axes
    pub fn spatial_axes(&self) -> (usize, usize) {
        match self {
            Axes::Zyx => (1, 2),
            Axes::Zcyx | Axes::Czyx => (2, 3),
            // The trailing S axis sits after X
            Axes::Tzcyxs => (3, 4),
        }
    }
}

impl fmt::Display for Axes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Photometric interpretation of the emitted pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Photometric {
    /// Single grayscale intensity channel, zero is black
    MinIsBlack,
    /// Multi-channel stack displayed as a composite; pages themselves stay
    /// single-sample grayscale, the composite interpretation lives in the
    /// ImageJ description
    Composite,
}

/// Display mode hint inside an ImageJ description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Grayscale,
    Composite,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Grayscale => "grayscale",
            DisplayMode::Composite => "composite",
        }
    }
}

/// The ImageJ-style descriptive text block embedded in a hyperstack's
/// ImageDescription tag. Metadata only, never alters pixel data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageJDescription {
    /// Total page count, Z x C
    pub images: usize,
    /// Channel count
    pub channels: usize,
    /// Depth slice count
    pub slices: usize,
    /// Time frame count, always 1 for cropped stacks
    pub frames: usize,
    /// Hyperstack flag for strict viewers
    pub hyperstack: bool,
    /// Composite-display hint
    pub mode: DisplayMode,
    /// Display range of the sample data, omitted when no finite samples exist
    pub range: Option<ValueRange>,
}

impl ImageJDescription {
    /// Build the block for a stack of `slices` Z planes and `channels` channels
    pub fn new(slices: usize, channels: usize) -> Self {
        Self {
            images: slices * channels,
            channels,
            slices,
            frames: 1,
            hyperstack: true,
            mode: if channels > 1 {
                DisplayMode::Composite
            } else {
                DisplayMode::Grayscale
            },
            range: None,
        }
    }

    /// Set the display range
    pub fn with_range(mut self, range: ValueRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Render the key=value text ImageJ expects in the description tag
    pub fn to_text(&self) -> String {
        let mut text = format!(
            "ImageJ={}\nimages={}\nchannels={}\nslices={}\nframes={}\nhyperstack={}\nmode={}\n",
            IMAGEJ_VERSION,
            self.images,
            self.channels,
            self.slices,
            self.frames,
            self.hyperstack,
            self.mode.as_str()
        );
        if let Some(range) = self.range {
            text.push_str(&format!("min={}\nmax={}\n", range.min, range.max));
        }
        text
    }

    /// Parse a description tag. Returns None when the text is not an ImageJ
    /// block; missing keys fall back to single-channel defaults.
    pub fn parse(text: &str) -> Option<Self> {
        if !text.starts_with("ImageJ=") {
            return None;
        }

        let mut desc = Self {
            images: 1,
            channels: 1,
            slices: 1,
            frames: 1,
            hyperstack: false,
            mode: DisplayMode::Grayscale,
            range: None,
        };
        let mut min = None;
        let mut max = None;

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "images" => desc.images = value.trim().parse().ok()?,
                "channels" => desc.channels = value.trim().parse().ok()?,
                "slices" => desc.slices = value.trim().parse().ok()?,
                "frames" => desc.frames = value.trim().parse().ok()?,
                "hyperstack" => desc.hyperstack = value.trim() == "true",
                "mode" => {
                    desc.mode = match value.trim() {
                        "composite" => DisplayMode::Composite,
                        _ => DisplayMode::Grayscale,
                    }
                }
                "min" => min = value.trim().parse().ok(),
                "max" => max = value.trim().parse().ok(),
                _ => {}
            }
        }

        if let (Some(min), Some(max)) = (min, max) {
            desc.range = Some(ValueRange::new(min, max));
        }
        Some(desc)
    }
}

/// Axis metadata attached to one serialized output volume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisMetadata {
    /// Axes tag matching the output array's dimension order
    pub axes: Axes,
    /// Photometric interpretation of the pages
    pub photometric: Photometric,
    /// ImageJ description, present in viewer-compatible mode
    pub description: Option<ImageJDescription>,
}

impl AxisMetadata {
    pub fn new(axes: Axes, photometric: Photometric) -> Self {
        Self {
            axes,
            photometric,
            description: None,
        }
    }

    pub fn with_description(mut self, description: ImageJDescription) -> Self {
        self.description = Some(description);
        self
    }
}
