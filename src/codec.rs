//! TIFF codec: multi-page byte streams in, volumes out, and back

use crate::error::{CropError, Result};
use crate::meta::{AxisMetadata, ImageJDescription};
use crate::types::{LeadingAxes, OutputCompression};
use crate::volume::{Samples, Volume};
use bytes::Bytes;
use std::io::Cursor;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{compression, TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tiff::TiffError;

fn dec_err(err: TiffError) -> CropError {
    CropError::Decode(err.to_string())
}

fn enc_err(err: TiffError) -> CropError {
    CropError::Encode(err.to_string())
}

/// Decode a multi-page TIFF byte stream into a volume.
///
/// Pages must be single-sample grayscale and mutually consistent in
/// dimensions and sample type; bit depth and input compression are whatever
/// the decoder finds. An embedded ImageJ description declaring more than one
/// channel promotes the stack to rank 4 in the declared leading-axis order,
/// but only when channels x slices exactly accounts for the page count;
/// anything else degrades to the conservative rank-3 reading. A single page
/// yields a rank-2 volume, which downstream stages reject.
pub fn decode(bytes: &[u8], leading_axes: LeadingAxes) -> Result<Volume> {
    let mut decoder = Decoder::new(Cursor::new(bytes))
        .map_err(dec_err)?
        .with_limits(Limits::unlimited());

    let description = decoder.get_tag_ascii_string(Tag::ImageDescription).ok();

    let mut pages = 0usize;
    let mut page_dims: Option<(u32, u32)> = None;
    let mut samples: Option<Samples> = None;

    loop {
        let color = decoder.colortype().map_err(dec_err)?;
        if !matches!(color, tiff::ColorType::Gray(_)) {
            return Err(CropError::Decode(format!(
                "page {} is not single-sample grayscale: {:?}",
                pages, color
            )));
        }

        let dims = decoder.dimensions().map_err(dec_err)?;
        match page_dims {
            None => page_dims = Some(dims),
            Some(first) if first != dims => {
                return Err(CropError::Decode(format!(
                    "page {} dimensions {:?} differ from first page {:?}",
                    pages, dims, first
                )));
            }
            Some(_) => {}
        }

        let mut page = page_samples(decoder.read_image().map_err(dec_err)?);
        match samples.as_mut() {
            None => samples = Some(page),
            Some(all) => {
                if !all.append(&mut page) {
                    return Err(CropError::Decode(format!(
                        "page {} sample type {} differs from earlier pages",
                        pages,
                        page.sample_type()
                    )));
                }
            }
        }
        pages += 1;

        if !decoder.more_images() {
            break;
        }
        decoder.next_image().map_err(dec_err)?;
    }

    let (width, height) = match page_dims {
        Some(dims) => dims,
        None => return Err(CropError::Decode("no pages in file".to_string())),
    };
    let (y, x) = (height as usize, width as usize);
    let samples = match samples {
        Some(samples) => samples,
        None => return Err(CropError::Decode("no pages in file".to_string())),
    };

    if pages == 1 {
        return Volume::new(vec![y, x], samples);
    }

    let imagej = description.as_deref().and_then(ImageJDescription::parse);
    let volume = Volume::new(vec![pages, y, x], samples)?;
    match imagej {
        Some(desc) if desc.channels > 1 && desc.channels * desc.slices == pages => {
            // ImageJ page order is channel-fastest, which is exactly the
            // row-major plane order of a (Z, C, Y, X) array
            let depth_major = volume.into_shape(vec![desc.slices, desc.channels, y, x])?;
            match leading_axes {
                LeadingAxes::DepthMajor => Ok(depth_major),
                LeadingAxes::ChannelMajor => depth_major.swap_leading(),
            }
        }
        _ => Ok(volume),
    }
}

fn page_samples(result: DecodingResult) -> Samples {
    match result {
        DecodingResult::U8(data) => Samples::U8(data),
        DecodingResult::U16(data) => Samples::U16(data),
        DecodingResult::U32(data) => Samples::U32(data),
        DecodingResult::U64(data) => Samples::U64(data),
        DecodingResult::I8(data) => Samples::I8(data),
        DecodingResult::I16(data) => Samples::I16(data),
        DecodingResult::I32(data) => Samples::I32(data),
        DecodingResult::I64(data) => Samples::I64(data),
        DecodingResult::F32(data) => Samples::F32(data),
        DecodingResult::F64(data) => Samples::F64(data),
    }
}

/// Encode a formatted volume and its metadata into a TIFF byte stream.
///
/// One grayscale page is written per leading-product plane in row-major
/// order, so a hyperstack's (T, Z, C, Y, X, S) layout lands in ImageJ's
/// channel-fastest page order. The ImageJ description goes into the first
/// page's ImageDescription tag; the Software tag names this crate.
pub fn encode(
    volume: &Volume,
    metadata: &AxisMetadata,
    output_compression: OutputCompression,
) -> Result<Bytes> {
    let rank = volume.rank();
    if rank != metadata.axes.rank() {
        return Err(CropError::Encode(format!(
            "axes tag {} does not match volume rank {}",
            metadata.axes, rank
        )));
    }

    let (y_axis, x_axis) = metadata.axes.spatial_axes();
    let height = volume.dim(y_axis);
    let width = volume.dim(x_axis);
    if height == 0 || width == 0 {
        return Err(CropError::Encode(format!(
            "degenerate page extent {} x {}",
            height, width
        )));
    }
    let (width, height) = (width as u32, height as u32);

    let description = metadata.description.as_ref().map(|d| d.to_text());
    let software = format!("stackcrop {}", crate::STACKCROP_VERSION);

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut cursor).map_err(enc_err)?;
        let desc = description.as_deref();
        match volume.samples() {
            Samples::U8(data) => write_pages::<colortype::Gray8>(
                &mut encoder, width, height, data, desc, &software, output_compression,
            ),
            Samples::U16(data) => write_pages::<colortype::Gray16>(
                &mut encoder, width, height, data, desc, &software, output_compression,
            ),
            Samples::U32(data) => write_pages::<colortype::Gray32>(
                &mut encoder, width, height, data, desc, &software, output_compression,
            ),
            Samples::U64(data) => write_pages::<colortype::Gray64>(
                &mut encoder, width, height, data, desc, &software, output_compression,
            ),
            Samples::I8(data) => write_pages::<colortype::GrayI8>(
                &mut encoder, width, height, data, desc, &software, output_compression,
            ),
            Samples::I16(data) => write_pages::<colortype::GrayI16>(
                &mut encoder, width, height, data, desc, &software, output_compression,
            ),
            Samples::I32(data) => write_pages::<colortype::GrayI32>(
                &mut encoder, width, height, data, desc, &software, output_compression,
            ),
            Samples::I64(data) => write_pages::<colortype::GrayI64>(
                &mut encoder, width, height, data, desc, &software, output_compression,
            ),
            Samples::F32(data) => write_pages::<colortype::Gray32Float>(
                &mut encoder, width, height, data, desc, &software, output_compression,
            ),
            Samples::F64(data) => write_pages::<colortype::Gray64Float>(
                &mut encoder, width, height, data, desc, &software, output_compression,
            ),
        }?;
    }
    Ok(Bytes::from(cursor.into_inner()))
}

fn write_pages<C>(
    encoder: &mut TiffEncoder<&mut Cursor<Vec<u8>>>,
    width: u32,
    height: u32,
    data: &[C::Inner],
    description: Option<&str>,
    software: &str,
    output_compression: OutputCompression,
) -> Result<()>
where
    C: ColorType,
    [C::Inner]: TiffValue,
{
    let plane_len = (width as usize) * (height as usize);
    for (index, plane) in data.chunks_exact(plane_len).enumerate() {
        macro_rules! emit_page {
            ($comp:expr) => {{
                let mut image = encoder
                    .new_image_with_compression::<C, _>(width, height, $comp)
                    .map_err(enc_err)?;
                if index == 0 {
                    if let Some(text) = description {
                        image
                            .encoder()
                            .write_tag(Tag::ImageDescription, text)
                            .map_err(enc_err)?;
                    }
                    image
                        .encoder()
                        .write_tag(Tag::Software, software)
                        .map_err(enc_err)?;
                }
                image.write_data(plane).map_err(enc_err)?;
            }};
        }
        match output_compression {
            OutputCompression::Uncompressed => emit_page!(compression::Uncompressed),
            OutputCompression::Lzw => emit_page!(compression::Lzw),
            OutputCompression::Deflate => emit_page!(compression::Deflate::default()),
            OutputCompression::Packbits => emit_page!(compression::Packbits),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{Axes, Photometric};
    use crate::writer::VolumeWriter;

    fn ramp_volume(shape: &[usize]) -> Volume {
        let len: usize = shape.iter().product();
        let data: Vec<u16> = (0..len).map(|v| v as u16).collect();
        Volume::new(shape.to_vec(), Samples::U16(data)).unwrap()
    }

    #[test]
    fn test_rank3_round_trip() {
        let volume = ramp_volume(&[4, 8, 6]);
        let metadata = AxisMetadata::new(Axes::Zyx, Photometric::MinIsBlack);
        let bytes = encode(&volume, &metadata, OutputCompression::Uncompressed).unwrap();

        let decoded = decode(&bytes, LeadingAxes::DepthMajor).unwrap();
        assert_eq!(decoded, volume);
    }

    #[test]
    fn test_hyperstack_round_trip_recovers_rank4() {
        let writer = VolumeWriter::new();
        let (wrapped, metadata) = writer.format(ramp_volume(&[2, 3, 8, 8])).unwrap();
        assert_eq!(wrapped.shape(), &[1, 2, 3, 8, 8, 1]);

        let bytes = encode(&wrapped, &metadata, OutputCompression::Uncompressed).unwrap();
        let decoded = decode(&bytes, LeadingAxes::DepthMajor).unwrap();
        assert_eq!(decoded.shape(), &[2, 3, 8, 8]);

        let channel_major = decode(&bytes, LeadingAxes::ChannelMajor).unwrap();
        assert_eq!(channel_major.shape(), &[3, 2, 8, 8]);
        assert_eq!(channel_major, decoded.swap_leading().unwrap());
    }

    #[test]
    fn test_compressed_round_trip() {
        let volume = ramp_volume(&[3, 16, 16]);
        let metadata = AxisMetadata::new(Axes::Zyx, Photometric::MinIsBlack);
        for method in [OutputCompression::Lzw, OutputCompression::Deflate] {
            let bytes = encode(&volume, &metadata, method).unwrap();
            assert_eq!(decode(&bytes, LeadingAxes::DepthMajor).unwrap(), volume);
        }
    }

    #[test]
    fn test_plain_multipage_stays_rank3() {
        // No ImageJ block on the file: page count must not be factored
        let volume = ramp_volume(&[6, 8, 8]);
        let metadata = AxisMetadata::new(Axes::Zyx, Photometric::MinIsBlack);
        let bytes = encode(&volume, &metadata, OutputCompression::Uncompressed).unwrap();
        let decoded = decode(&bytes, LeadingAxes::DepthMajor).unwrap();
        assert_eq!(decoded.rank(), 3);
    }

    #[test]
    fn test_inconsistent_description_degrades_to_rank3() {
        // 6 pages but the block claims 4 channels x 2 slices = 8
        let volume = ramp_volume(&[6, 8, 8]);
        let metadata = AxisMetadata::new(Axes::Zyx, Photometric::MinIsBlack)
            .with_description(ImageJDescription::new(2, 4));
        let bytes = encode(&volume, &metadata, OutputCompression::Uncompressed).unwrap();
        let decoded = decode(&bytes, LeadingAxes::DepthMajor).unwrap();
        assert_eq!(decoded.shape(), &[6, 8, 8]);
    }

    #[test]
    fn test_single_page_decodes_to_rank2() {
        let volume = ramp_volume(&[1, 8, 8]);
        let metadata = AxisMetadata::new(Axes::Zyx, Photometric::MinIsBlack);
        let bytes = encode(&volume, &metadata, OutputCompression::Uncompressed).unwrap();
        let decoded = decode(&bytes, LeadingAxes::DepthMajor).unwrap();
        assert_eq!(decoded.shape(), &[8, 8]);
    }

    #[test]
    fn test_garbage_input_is_a_decode_error() {
        let err = decode(b"not a tiff at all", LeadingAxes::DepthMajor).unwrap_err();
        assert!(matches!(err, CropError::Decode(_)));
    }

    #[test]
    fn test_float_samples_pass_through() {
        let data: Vec<f32> = (0..2 * 4 * 4).map(|v| v as f32 * 0.5).collect();
        let volume = Volume::new(vec![2, 4, 4], Samples::F32(data)).unwrap();
        let metadata = AxisMetadata::new(Axes::Zyx, Photometric::MinIsBlack);
        let bytes = encode(&volume, &metadata, OutputCompression::Uncompressed).unwrap();
        let decoded = decode(&bytes, LeadingAxes::DepthMajor).unwrap();
        assert_eq!(decoded, volume);
    }
}
