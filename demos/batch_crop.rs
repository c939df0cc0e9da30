//! Example: generate a few synthetic stacks and run a batch crop over them
//!
//! Run with: cargo run --example batch_crop

use anyhow::Result;
use env_logger::{Builder, Env};
use stackcrop::{
    codec, Axes, AxisMetadata, BatchCropper, CropRequest, FileSystemStore, ImageJDescription,
    OutputCompression, Photometric, Samples, StackStore, Volume,
};

#[tokio::main]
async fn main() -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();
    builder.init();

    println!("Stackcrop Example: Batch Crop");
    println!("=============================\n");

    let temp_dir = tempfile::tempdir()?;
    let input_dir = temp_dir.path().join("raw");
    let output_dir = temp_dir.path().join("cropped");
    let store = FileSystemStore::new();
    store.create_dir(&input_dir).await?;

    // A plain Z-stack and a 2-channel hyperstack
    let zstack = ramp(&[12, 480, 480]);
    let bytes = codec::encode(
        &zstack,
        &AxisMetadata::new(Axes::Zyx, Photometric::MinIsBlack),
        OutputCompression::Uncompressed,
    )?;
    store.write(&input_dir.join("nucleus.tif"), &bytes).await?;

    let dual = ramp(&[12 * 2, 400, 400]);
    let metadata = AxisMetadata::new(Axes::Zyx, Photometric::MinIsBlack)
        .with_description(ImageJDescription::new(12, 2));
    let bytes = codec::encode(&dual, &metadata, OutputCompression::Uncompressed)?;
    store.write(&input_dir.join("membrane.tif"), &bytes).await?;

    println!("Inputs in {}:", input_dir.display());
    for path in store.list_stacks(&input_dir).await? {
        println!("  {}", path.file_name().unwrap_or_default().to_string_lossy());
    }
    println!();

    let cropper = BatchCropper::new(CropRequest::new(300, 300))
        .with_z_window(10)
        .with_compression(OutputCompression::Lzw);
    let report = cropper.run(&input_dir, &output_dir).await?;

    println!("Run {} finished:", report.run_id);
    println!("  processed: {}", report.processed);
    println!("  skipped:   {}", report.skipped);
    for outcome in &report.files {
        match (&outcome.output, &outcome.skip_reason) {
            (Some(output), _) => println!(
                "  {} -> {} {:?} axes={}",
                outcome.input.file_name().unwrap_or_default().to_string_lossy(),
                output.file_name().unwrap_or_default().to_string_lossy(),
                outcome.output_shape.as_deref().unwrap_or(&[]),
                outcome.axes.map(|a| a.as_str()).unwrap_or("?"),
            ),
            (None, Some(reason)) => println!(
                "  {} skipped: {}",
                outcome.input.file_name().unwrap_or_default().to_string_lossy(),
                reason
            ),
            (None, None) => {}
        }
    }

    Ok(())
}

fn ramp(shape: &[usize]) -> Volume {
    let len: usize = shape.iter().product();
    let data: Vec<u16> = (0..len).map(|v| (v % 4096) as u16).collect();
    Volume::new(shape.to_vec(), Samples::U16(data)).expect("valid shape")
}
