//! Multi-resolution icon container packing.

use image::codecs::ico::{IcoEncoder, IcoFrame};
use image::{ExtendedColorType, RgbaImage};

use crate::error::{FaviconError, Result};

/// Packs rendered images into a single ICO container.
///
/// Each image is embedded at its native resolution as a PNG frame, in the
/// order given. Frames larger than 256 pixels on a side are rejected by the
/// container format.
pub fn pack_ico(filename: &str, images: &[RgbaImage]) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(FaviconError::InvalidInput(format!(
            "`{filename}` has no images to pack"
        )));
    }

    let encode_error = |source| FaviconError::Encode {
        filename: filename.to_string(),
        source,
    };

    let frames = images
        .iter()
        .map(|img| {
            IcoFrame::as_png(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8)
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(encode_error)?;

    let mut contents = Vec::new();
    IcoEncoder::new(&mut contents)
        .encode_images(&frames)
        .map_err(encode_error)?;

    Ok(contents)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgba;

    /// Reads `(width, height)` of every directory entry of an ICO file.
    pub(crate) fn ico_entries(bytes: &[u8]) -> Vec<(u32, u32)> {
        assert_eq!(&bytes[0..4], &[0, 0, 1, 0], "not an icon container");
        let count = u16::from_le_bytes([bytes[4], bytes[5]]) as usize;
        (0..count)
            .map(|i| {
                let entry = &bytes[6 + i * 16..6 + (i + 1) * 16];
                let side = |b: u8| if b == 0 { 256 } else { b as u32 };
                (side(entry[0]), side(entry[1]))
            })
            .collect()
    }

    #[test]
    fn pack_keeps_order_and_sizes() {
        let images: Vec<_> = [16, 24, 32, 48, 64]
            .into_iter()
            .map(|s| RgbaImage::from_pixel(s, s, Rgba([255, 0, 0, 255])))
            .collect();

        let ico = pack_ico("favicon.ico", &images).unwrap();
        assert_eq!(
            ico_entries(&ico),
            vec![(16, 16), (24, 24), (32, 32), (48, 48), (64, 64)]
        );
    }

    #[test]
    fn packed_container_decodes() {
        let images = vec![
            RgbaImage::from_pixel(16, 16, Rgba([0, 0, 255, 255])),
            RgbaImage::from_pixel(32, 32, Rgba([0, 0, 255, 255])),
        ];
        let ico = pack_ico("favicon.ico", &images).unwrap();

        let decoded = image::load_from_memory_with_format(&ico, image::ImageFormat::Ico).unwrap();
        // The decoder picks the largest entry
        assert_eq!((decoded.width(), decoded.height()), (32, 32));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = pack_ico("favicon.ico", &[]).unwrap_err();
        assert!(matches!(err, FaviconError::InvalidInput(_)));
    }

    #[test]
    fn oversized_frame_is_an_encode_error() {
        let images = vec![RgbaImage::new(300, 300)];
        let err = pack_ico("big.ico", &images).unwrap_err();
        assert!(matches!(err, FaviconError::Encode { .. }));
    }
}
