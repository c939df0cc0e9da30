//! Batch pipeline: load, plan, crop, format, encode and write every stack in
//! a directory, skipping files whose geometry is incompatible

use crate::codec;
use crate::error::Result;
use crate::io::{derived_output_path, FileSystemStore, StackStore};
use crate::meta::Axes;
use crate::plan::{CropPlanner, CropRequest};
use crate::types::{LeadingAxes, OutputCompression};
use crate::writer::VolumeWriter;
use chrono::{DateTime, Utc};
use log::{info, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name of the machine-readable report written into the output directory
pub const REPORT_FILE_NAME: &str = "crop_report.json";

/// Outcome of a single input file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    /// Written output path; None when the file was skipped
    pub output: Option<PathBuf>,
    pub input_shape: Option<Vec<usize>>,
    pub output_shape: Option<Vec<usize>>,
    pub axes: Option<Axes>,
    pub skip_reason: Option<String>,
}

impl FileOutcome {
    pub fn is_processed(&self) -> bool {
        self.skip_reason.is_none()
    }

    fn skipped(input: &Path, reason: String) -> Self {
        Self {
            input: input.to_path_buf(),
            output: None,
            input_shape: None,
            output_shape: None,
            axes: None,
            skip_reason: Some(reason),
        }
    }
}

/// Machine-readable summary of one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub request: CropRequest,
    pub processed: usize,
    pub skipped: usize,
    pub files: Vec<FileOutcome>,
}

/// Sequential batch driver over a directory of TIFF stacks.
///
/// One random source serves the whole run; seeding it makes the run's crop
/// offsets reproducible for a fixed input listing, though no reproducibility
/// is promised across versions or platforms. The leading-axis declaration is
/// applied to the planner, crop apply, writer and decoder together so the
/// stages can never disagree.
pub struct BatchCropper {
    request: CropRequest,
    planner: CropPlanner,
    writer: VolumeWriter,
    compression: OutputCompression,
    store: Box<dyn StackStore>,
    rng: Mutex<StdRng>,
}

impl BatchCropper {
    pub fn new(request: CropRequest) -> Self {
        Self {
            request,
            planner: CropPlanner::new(),
            writer: VolumeWriter::new(),
            compression: OutputCompression::default(),
            store: Box::new(FileSystemStore::new()),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seed the run's random source for reproducible offsets
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Set the minimum Y/X crop footprint
    pub fn with_min_floor(mut self, min_floor: usize) -> Self {
        self.planner = self.planner.with_min_floor(min_floor);
        self
    }

    /// Enable the centered Z window
    pub fn with_z_window(mut self, depth: usize) -> Self {
        self.planner = self.planner.with_z_window(depth);
        self
    }

    /// Declare the leading-axis order of 4D inputs for every stage at once
    pub fn with_leading_axes(mut self, leading_axes: LeadingAxes) -> Self {
        self.planner = self.planner.with_leading_axes(leading_axes);
        self.writer = self.writer.with_leading_axes(leading_axes);
        self
    }

    /// Enable or disable the viewer-compatible hyperstack output form
    pub fn with_hyperstack(mut self, hyperstack: bool) -> Self {
        self.writer = self.writer.with_hyperstack(hyperstack);
        self
    }

    /// Choose the output compression
    pub fn with_compression(mut self, compression: OutputCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Swap in a different storage backend
    pub fn with_store(mut self, store: Box<dyn StackStore>) -> Self {
        self.store = store;
        self
    }

    /// Crop every TIFF in `input_dir` into `output_dir`.
    ///
    /// Per-file errors are logged, recorded in the report, and skipped; only
    /// batch-level failures (unreadable input directory, unwritable output)
    /// abort the run. The report is also written to `crop_report.json` in
    /// the output directory.
    pub async fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        self.store.create_dir(output_dir).await?;
        let inputs = self.store.list_stacks(input_dir).await?;
        info!(
            "run {}: {} candidate stacks in {}",
            run_id,
            inputs.len(),
            input_dir.display()
        );

        let mut files = Vec::with_capacity(inputs.len());
        for input in &inputs {
            match self.process_file(input, output_dir).await {
                Ok(outcome) => {
                    info!(
                        "processed {} -> {}",
                        input.display(),
                        outcome
                            .output
                            .as_deref()
                            .unwrap_or_else(|| Path::new("?"))
                            .display()
                    );
                    files.push(outcome);
                }
                Err(err) => {
                    warn!("skipping {}: {}", input.display(), err);
                    files.push(FileOutcome::skipped(input, err.to_string()));
                }
            }
        }

        let processed = files.iter().filter(|f| f.is_processed()).count();
        let report = BatchReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            request: self.request,
            processed,
            skipped: files.len() - processed,
            files,
        };

        let json = serde_json::to_vec_pretty(&report)?;
        self.store
            .write(&output_dir.join(REPORT_FILE_NAME), &json)
            .await?;
        info!(
            "run {}: {} processed, {} skipped",
            run_id, report.processed, report.skipped
        );
        Ok(report)
    }

    async fn process_file(&self, input: &Path, output_dir: &Path) -> Result<FileOutcome> {
        let leading_axes = self.planner.leading_axes();
        let bytes = self.store.read(input).await?;
        let volume = codec::decode(&bytes, leading_axes)?;
        let input_shape = volume.shape().to_vec();

        let bounds = {
            let mut rng = self.rng.lock();
            self.planner.plan(volume.shape(), self.request, &mut *rng)?
        };
        let cropped = volume.crop(&bounds, leading_axes)?;
        let (formatted, metadata) = self.writer.format(cropped)?;
        let encoded = codec::encode(&formatted, &metadata, self.compression)?;

        let output = derived_output_path(input, output_dir);
        self.store.write(&output, &encoded).await?;

        Ok(FileOutcome {
            input: input.to_path_buf(),
            output: Some(output),
            input_shape: Some(input_shape),
            output_shape: Some(formatted.shape().to_vec()),
            axes: Some(metadata.axes),
            skip_reason: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{AxisMetadata, Photometric};
    use crate::volume::{Samples, Volume};
    use tempfile::TempDir;

    async fn seed_input(dir: &Path, name: &str, shape: &[usize]) {
        let len: usize = shape.iter().product();
        let data: Vec<u16> = (0..len).map(|v| v as u16).collect();
        let volume = Volume::new(shape.to_vec(), Samples::U16(data)).unwrap();
        let metadata = AxisMetadata::new(Axes::Zyx, Photometric::MinIsBlack);
        let bytes =
            codec::encode(&volume, &metadata, OutputCompression::Uncompressed).unwrap();
        FileSystemStore::new()
            .write(&dir.join(name), &bytes)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_skip_and_continue() {
        let temp_dir = TempDir::new().unwrap();
        let input_dir = temp_dir.path().join("in");
        let output_dir = temp_dir.path().join("out");
        let store = FileSystemStore::new();
        store.create_dir(&input_dir).await.unwrap();

        seed_input(&input_dir, "good.tif", &[3, 64, 64]).await;
        store
            .write(&input_dir.join("broken.tif"), b"not a tiff")
            .await
            .unwrap();

        let cropper = BatchCropper::new(CropRequest::new(32, 32))
            .with_min_floor(16)
            .with_seed(1);
        let report = cropper.run(&input_dir, &output_dir).await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.files.len(), 2);

        let skipped = report
            .files
            .iter()
            .find(|f| !f.is_processed())
            .unwrap();
        assert!(skipped.input.ends_with("broken.tif"));

        // Report lands next to the outputs
        let report_bytes = store
            .read(&output_dir.join(REPORT_FILE_NAME))
            .await
            .unwrap();
        let parsed: BatchReport = serde_json::from_slice(&report_bytes).unwrap();
        assert_eq!(parsed.processed, 1);
    }

    #[tokio::test]
    async fn test_derived_names_and_shapes() {
        let temp_dir = TempDir::new().unwrap();
        let input_dir = temp_dir.path().join("in");
        let output_dir = temp_dir.path().join("out");
        FileSystemStore::new().create_dir(&input_dir).await.unwrap();

        seed_input(&input_dir, "embryo.tif", &[4, 80, 80]).await;

        let cropper = BatchCropper::new(CropRequest::new(48, 48))
            .with_min_floor(16)
            .with_seed(9);
        let report = cropper.run(&input_dir, &output_dir).await.unwrap();

        let outcome = &report.files[0];
        assert!(outcome
            .output
            .as_ref()
            .unwrap()
            .ends_with("embryo_cropped.tif"));
        assert_eq!(outcome.input_shape.as_deref(), Some(&[4, 80, 80][..]));
        assert_eq!(outcome.output_shape.as_deref(), Some(&[4, 48, 48][..]));
        assert_eq!(outcome.axes, Some(Axes::Zyx));
    }
}
