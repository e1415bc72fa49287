//! Raster source adapter (C3) — the boundary between the core pipeline and
//! whatever produces raw printable rows.
//!
//! The core never sees fonts, strings, or alignment enums; it only consumes
//! `RasterSource::next_row`, one `printable_pins`-wide MSB-first bit row at
//! a time. Text rendering is a Non-goal; the one concrete adapter shipped
//! here is image-backed, grounded on the same `png` decoding and grayscale
//! averaging the original image path used.

use crate::error::{Error, Result};
use png::ColorType;

/// A producer of fixed-width raster rows. `printable_pins` must match the
/// model/media pin window the caller resolved; `next_row` yields `None` once
/// the source is exhausted.
pub trait RasterSource {
    fn printable_pins(&self) -> u16;
    fn height(&self) -> usize;
    fn next_row(&mut self) -> Option<Vec<u8>>;
}

/// Decodes a grayscale/RGB/RGBA PNG into raster rows, one per column of the
/// source image (the image is stored with the long axis as width and the
/// short axis, matching `printable_pins`, as height).
pub struct PngRasterSource {
    gray: Vec<u8>,
    width: usize,
    height: usize,
    printable_pins: u16,
    next_col: usize,
}

impl PngRasterSource {
    pub fn from_bytes(data: &[u8], printable_pins: u16) -> Result<Self> {
        let decoder = png::Decoder::new(data);
        let mut reader = decoder
            .read_info()
            .map_err(|e| Error::ValidationError(format!("invalid PNG: {e}")))?;
        let mut buf = vec![0u8; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e| Error::ValidationError(format!("invalid PNG: {e}")))?;

        if info.height != printable_pins as u32 {
            return Err(Error::ValidationError(format!(
                "PNG height is {} pixels, but the printable pin count is {printable_pins}",
                info.height
            )));
        }

        let gray = to_grayscale(&buf[..info.buffer_size()], info.color_type)?;

        Ok(PngRasterSource {
            gray,
            width: info.width as usize,
            height: info.height as usize,
            printable_pins,
            next_col: 0,
        })
    }
}

impl RasterSource for PngRasterSource {
    fn printable_pins(&self) -> u16 {
        self.printable_pins
    }

    fn height(&self) -> usize {
        self.width
    }

    fn next_row(&mut self) -> Option<Vec<u8>> {
        if self.next_col >= self.width {
            return None;
        }
        let col = self.next_col;
        self.next_col += 1;

        let bytes_per_row = self.printable_pins.div_ceil(8) as usize;
        let mut row = vec![0u8; bytes_per_row];
        for pin in 0..self.height {
            let pixel = self.gray[pin * self.width + col];
            if pixel < 127 {
                let byte = pin / 8;
                let bit = 7 - (pin % 8);
                row[byte] |= 1 << bit;
            }
        }
        Some(row)
    }
}

fn to_grayscale(buf: &[u8], color_type: ColorType) -> Result<Vec<u8>> {
    match color_type {
        ColorType::Grayscale => Ok(buf.to_vec()),
        ColorType::Rgb => Ok(buf
            .chunks_exact(3)
            .map(|rgb| ((rgb[0] as u32 + rgb[1] as u32 + rgb[2] as u32) / 3) as u8)
            .collect()),
        ColorType::Rgba => Ok(buf
            .chunks_exact(4)
            .map(|rgba| {
                let alpha = rgba[3] as f32 / 255.0;
                let r = rgba[0] as f32 * alpha + 255.0 * (1.0 - alpha);
                let g = rgba[1] as f32 * alpha + 255.0 * (1.0 - alpha);
                let b = rgba[2] as f32 * alpha + 255.0 * (1.0 - alpha);
                ((r + g + b) / 3.0) as u8
            })
            .collect()),
        other => Err(Error::ValidationError(format!(
            "unsupported PNG color type {other:?}, expected grayscale, RGB, or RGBA"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(pixels).unwrap();
        }
        out
    }

    #[test]
    fn rejects_mismatched_height() {
        let png = encode_png(2, 3, &[0; 6]);
        let err = PngRasterSource::from_bytes(&png, 70).unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[test]
    fn all_black_column_sets_every_bit() {
        let png = encode_png(1, 8, &[0u8; 8]);
        let mut source = PngRasterSource::from_bytes(&png, 8).unwrap();
        let row = source.next_row().unwrap();
        assert_eq!(row, vec![0xFF]);
        assert!(source.next_row().is_none());
    }

    #[test]
    fn all_white_column_clears_every_bit() {
        let png = encode_png(1, 8, &[255u8; 8]);
        let mut source = PngRasterSource::from_bytes(&png, 8).unwrap();
        let row = source.next_row().unwrap();
        assert_eq!(row, vec![0x00]);
    }

    #[test]
    fn height_reports_column_count() {
        let png = encode_png(3, 8, &[0u8; 24]);
        let source = PngRasterSource::from_bytes(&png, 8).unwrap();
        assert_eq!(source.height(), 3);
        assert_eq!(source.printable_pins(), 8);
    }
}
