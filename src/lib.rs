//! Stackcrop - batch random cropping of microscopy TIFF stacks
//!
//! Reads every 3D/4D TIFF Z-stack in a directory, crops a random fixed
//! height/width window out of each one, and re-serializes the result with
//! axis metadata that downstream hyperstack viewers reconstruct correctly.
//!
//! # Features
//!
//! - Floor-then-cap crop clamping with an optional centered Z window
//! - Explicit leading-axis declaration for 4D stacks (depth- or channel-major)
//! - Viewer-compatible hyperstack output (TZCYXS with an ImageJ description)
//! - Injected random source, so seeded runs reproduce their crop offsets
//! - Skip-and-continue batch processing with a JSON run report
//!
//! # Example
//!
//! ```rust,ignore
//! use stackcrop::{BatchCropper, CropRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cropper = BatchCropper::new(CropRequest::new(300, 300)).with_z_window(10);
//! let report = cropper.run("raw/".as_ref(), "cropped/".as_ref()).await?;
//! println!("{} processed, {} skipped", report.processed, report.skipped);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod io;
pub mod meta;
pub mod pipeline;
pub mod plan;
pub mod types;
pub mod volume;
pub mod writer;

// Re-exports
pub use error::{CropError, Result};
pub use io::{FileSystemStore, StackStore};
pub use meta::{Axes, AxisMetadata, ImageJDescription, Photometric};
pub use pipeline::{BatchCropper, BatchReport, FileOutcome};
pub use plan::{CropBounds, CropPlanner, CropRequest, DepthWindow};
pub use types::{LeadingAxes, OutputCompression, SampleType, ValueRange};
pub use volume::{Samples, Volume};
pub use writer::VolumeWriter;

/// Version of the stackcrop implementation
pub const STACKCROP_VERSION: &str = env!("CARGO_PKG_VERSION");
