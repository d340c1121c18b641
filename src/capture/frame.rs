//! Frame buffer primitives — pure pixel plumbing, no OS calls.
//!
//! Mirrored displays hand us buffers with alignment padding: the byte
//! distance between rows (`row_stride`) and between pixels (`pixel_stride`)
//! can exceed the logical geometry. Everything downstream works on a
//! tightly packed `RasterImage`, so the conversion here is the one place
//! that knows about padding.

use super::CaptureError;
use image::RgbaImage;

/// Bytes per pixel for the fixed RGBA8 layout used throughout the crate.
pub const BYTES_PER_PIXEL: usize = 4;

/// An owned, tightly packed RGBA8 raster.
///
/// The buffer length is always exactly `width * height * 4`; the
/// constructor rejects anything else, so holders never re-check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wrap a packed RGBA8 buffer, validating its length against the
    /// declared dimensions with overflow-checked arithmetic.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| {
                CaptureError::MalformedFrame(format!(
                    "dimensions {}x{} overflow the addressable buffer size",
                    width, height
                ))
            })?;

        if data.len() != expected {
            return Err(CaptureError::MalformedFrame(format!(
                "buffer holds {} bytes, expected {} for {}x{} RGBA",
                data.len(),
                expected,
                width,
                height
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Packed RGBA8 bytes, row-major, no padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Convert into an `image` crate buffer for encoding.
    pub fn into_rgba8(self) -> RgbaImage {
        // Cannot fail: the length invariant is enforced at construction.
        RgbaImage::from_raw(self.width, self.height, self.data)
            .expect("RasterImage length invariant")
    }

    pub fn from_rgba8(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }
}

/// A raw frame as delivered by the mirroring backend, padding included.
///
/// `row_stride` and `pixel_stride` are in bytes. Backends that already
/// deliver packed buffers set `row_stride = width * 4` and
/// `pixel_stride = 4`.
#[derive(Clone, Debug)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub pixel_stride: usize,
    pub row_stride: usize,
    pub bytes: Vec<u8>,
}

impl RawFrame {
    /// Build a frame from an already packed RGBA buffer.
    pub fn packed(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixel_stride: BYTES_PER_PIXEL,
            row_stride: width as usize * BYTES_PER_PIXEL,
            bytes,
        }
    }

    /// Copy the logical `width × height` rectangle out of the padded
    /// buffer, yielding a packed raster.
    ///
    /// Assuming the buffer is exactly `width * height * 4` bytes is the
    /// classic mistake here: devices pad rows for alignment and the last
    /// column of the image comes out shifted. The copy below trusts only
    /// the strides. The final row is allowed to omit its trailing padding,
    /// which some backends do.
    pub fn into_raster(self) -> Result<RasterImage, CaptureError> {
        let width = self.width as usize;
        let height = self.height as usize;
        let row_bytes = width
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or_else(|| CaptureError::MalformedFrame("row length overflow".into()))?;

        if width == 0 || height == 0 {
            return Err(CaptureError::MalformedFrame(format!(
                "empty frame geometry {}x{}",
                self.width, self.height
            )));
        }
        if self.pixel_stride < BYTES_PER_PIXEL {
            return Err(CaptureError::MalformedFrame(format!(
                "pixel stride {} below pixel size {}",
                self.pixel_stride, BYTES_PER_PIXEL
            )));
        }
        let stride_row_bytes = width
            .checked_mul(self.pixel_stride)
            .ok_or_else(|| CaptureError::MalformedFrame("row stride overflow".into()))?;
        if self.row_stride < stride_row_bytes {
            return Err(CaptureError::MalformedFrame(format!(
                "row stride {} cannot hold {} pixels of stride {}",
                self.row_stride, width, self.pixel_stride
            )));
        }

        // The last row only needs its payload, not its padding.
        let needed = self
            .row_stride
            .checked_mul(height - 1)
            .and_then(|n| n.checked_add(stride_row_bytes))
            .ok_or_else(|| CaptureError::MalformedFrame("frame size overflow".into()))?;
        if self.bytes.len() < needed {
            return Err(CaptureError::MalformedFrame(format!(
                "buffer holds {} bytes, geometry requires at least {}",
                self.bytes.len(),
                needed
            )));
        }

        // Fast path: already packed.
        if self.pixel_stride == BYTES_PER_PIXEL && self.row_stride == row_bytes {
            let mut bytes = self.bytes;
            bytes.truncate(row_bytes * height);
            return RasterImage::from_raw(self.width, self.height, bytes);
        }

        let mut out = Vec::with_capacity(row_bytes * height);
        if self.pixel_stride == BYTES_PER_PIXEL {
            // Row padding only: one slice copy per row.
            for row in 0..height {
                let start = row * self.row_stride;
                out.extend_from_slice(&self.bytes[start..start + row_bytes]);
            }
        } else {
            // Sparse pixels: copy pixel by pixel.
            for row in 0..height {
                let row_start = row * self.row_stride;
                for col in 0..width {
                    let px = row_start + col * self.pixel_stride;
                    out.extend_from_slice(&self.bytes[px..px + BYTES_PER_PIXEL]);
                }
            }
        }

        RasterImage::from_raw(self.width, self.height, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTINEL: u8 = 0xEE;

    /// Build a padded buffer where every payload byte is a row/column
    /// marker and every padding byte is the sentinel.
    fn padded_frame(width: u32, height: u32, pad_bytes: usize) -> RawFrame {
        let row_stride = width as usize * BYTES_PER_PIXEL + pad_bytes;
        let mut bytes = vec![SENTINEL; row_stride * height as usize];
        for row in 0..height as usize {
            for col in 0..width as usize {
                let base = row * row_stride + col * BYTES_PER_PIXEL;
                for ch in 0..BYTES_PER_PIXEL {
                    bytes[base + ch] = ((row * 7 + col * 3 + ch) % 0xE0) as u8;
                }
            }
        }
        RawFrame {
            width,
            height,
            pixel_stride: BYTES_PER_PIXEL,
            row_stride,
            bytes,
        }
    }

    #[test]
    fn packed_buffer_passes_through() {
        let bytes: Vec<u8> = (0..2 * 2 * 4).map(|i| i as u8).collect();
        let raster = RawFrame::packed(2, 2, bytes.clone())
            .into_raster()
            .expect("packed frame");
        assert_eq!(raster.data(), &bytes[..]);
        assert_eq!(raster.dimensions(), (2, 2));
    }

    #[test]
    fn row_padding_is_dropped() {
        let frame = padded_frame(5, 4, 16);
        let raster = frame.into_raster().expect("padded frame");
        assert_eq!(raster.data().len(), 5 * 4 * 4);
        assert!(
            raster.data().iter().all(|&b| b != SENTINEL),
            "padding bytes leaked into the cropped raster"
        );
    }

    #[test]
    fn sparse_pixel_stride_is_compacted() {
        // 2x1 frame, 6 bytes per pixel: RGBA followed by two junk bytes.
        let bytes = vec![
            1, 2, 3, 4, SENTINEL, SENTINEL, // pixel 0
            5, 6, 7, 8, SENTINEL, SENTINEL, // pixel 1
        ];
        let frame = RawFrame {
            width: 2,
            height: 1,
            pixel_stride: 6,
            row_stride: 12,
            bytes,
        };
        let raster = frame.into_raster().expect("sparse frame");
        assert_eq!(raster.data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn last_row_may_omit_padding() {
        let mut frame = padded_frame(3, 3, 8);
        let keep = frame.row_stride * 2 + 3 * BYTES_PER_PIXEL;
        frame.bytes.truncate(keep);
        let raster = frame.into_raster().expect("trimmed final row");
        assert_eq!(raster.data().len(), 3 * 3 * 4);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let mut frame = padded_frame(4, 4, 4);
        frame.bytes.truncate(frame.bytes.len() / 2);
        let err = frame.into_raster().expect_err("short buffer");
        assert!(matches!(err, CaptureError::MalformedFrame(_)));
    }

    #[test]
    fn undersized_row_stride_is_rejected() {
        let frame = RawFrame {
            width: 4,
            height: 2,
            pixel_stride: BYTES_PER_PIXEL,
            row_stride: 8, // holds 2 pixels, not 4
            bytes: vec![0; 64],
        };
        assert!(matches!(
            frame.into_raster(),
            Err(CaptureError::MalformedFrame(_))
        ));
    }

    #[test]
    fn empty_geometry_is_rejected() {
        let frame = RawFrame::packed(0, 4, Vec::new());
        assert!(matches!(
            frame.into_raster(),
            Err(CaptureError::MalformedFrame(_))
        ));
    }

    #[test]
    fn raster_length_mismatch_is_rejected() {
        let err = RasterImage::from_raw(2, 2, vec![0; 15]).expect_err("bad length");
        assert!(matches!(err, CaptureError::MalformedFrame(_)));
    }

    #[test]
    fn raster_roundtrips_through_image_buffer() {
        let data: Vec<u8> = (0..3 * 2 * 4).map(|i| i as u8).collect();
        let raster = RasterImage::from_raw(3, 2, data.clone()).expect("raster");
        let img = raster.into_rgba8();
        let back = RasterImage::from_rgba8(img);
        assert_eq!(back.data(), &data[..]);
        assert_eq!(back.dimensions(), (3, 2));
    }
}
