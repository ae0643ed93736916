//! The scanline reconstructor: filter reversal, sub-byte sample unpacking,
//! 16-bit endian swap, palette expansion, and Adam7 pass assembly.
//!
//! Each pass's scanlines are unfiltered in place against the previous row,
//! then unpacked into the caller-facing pixel format and written straight
//! into an owned [`ImageData`] buffer at a position computed through
//! [`interlaced_pos_to_full_pos`].

use alloc::vec;
use alloc::vec::Vec;

use crate::adam7::{interlaced_pos_to_full_pos, reduced_image_dimensions};
use crate::byte_source::ByteSource;
use crate::deflate::Deflate;
use crate::error::{PngError, PngResult};
use crate::ihdr::{InterlaceMethod, PngColorType, PngHeader};
use crate::palette::Palette;
use crate::pixel_format::{Dimensions, ImageData, PixelFormat};

/// Widens a sub-8-bit sample to a full byte by replicating its high-order
/// bits into the low-order bits (e.g. a 1-bit sample `1` becomes `0xFF`).
#[inline]
#[must_use]
const fn widen_sample(raw: u8, bit_depth: u8) -> u8 {
  match bit_depth {
    1 => {
      if raw != 0 {
        0xFF
      } else {
        0
      }
    }
    2 => raw.wrapping_mul(0x55),
    4 => raw.wrapping_mul(0x11),
    8 => raw,
    _ => panic!("widen_sample only handles sub-byte and byte depths"),
  }
}

#[inline]
#[must_use]
const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // The PNG spec requires these comparisons in exactly this order.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Reverses one scanline's filter in place. `stride` is the byte distance
/// to the pixel's left neighbor (`ceil(bits_per_pixel / 8)`), `prev_row` is
/// the previous scanline's already-unfiltered bytes (all zero on a pass's
/// first row).
fn unfilter_scanline(filter_type: u8, scanline: &mut [u8], prev_row: &[u8], stride: usize) -> PngResult<()> {
  match filter_type {
    0 => {}
    1 => {
      for i in 0..scanline.len() {
        let a = if i >= stride { scanline[i - stride] } else { 0 };
        scanline[i] = scanline[i].wrapping_add(a);
      }
    }
    2 => {
      for i in 0..scanline.len() {
        scanline[i] = scanline[i].wrapping_add(prev_row[i]);
      }
    }
    3 => {
      for i in 0..scanline.len() {
        let a = if i >= stride { scanline[i - stride] as u16 } else { 0 };
        let b = prev_row[i] as u16;
        scanline[i] = scanline[i].wrapping_add(((a + b) / 2) as u8);
      }
    }
    4 => {
      for i in 0..scanline.len() {
        let a = if i >= stride { scanline[i - stride] } else { 0 };
        let b = prev_row[i];
        let c = if i >= stride { prev_row[i - stride] } else { 0 };
        scanline[i] = scanline[i].wrapping_add(paeth_predict(a, b, c));
      }
    }
    _ => return Err(PngError::IllegalAdaptiveFilterType),
  }
  Ok(())
}

/// Drives a [`Deflate`] stream through filter reversal, sample unpacking,
/// and Adam7 assembly, accumulating pixels into an owned [`ImageData`].
pub struct Reconstructor<S: ByteSource> {
  deflate: Deflate<S>,
  header: PngHeader,
  palette: Option<Palette>,
  format: PixelFormat,
  image: ImageData,
  next_pass: u8,
  finished: bool,
}

impl<S: ByteSource> Reconstructor<S> {
  /// `palette` must be `Some` if `header.color_type` is `Indexed` — the
  /// caller (the chunk-driven decoder) is responsible for having already
  /// rejected a missing-`PLTE`-before-`IDAT` stream.
  #[must_use]
  pub fn new(deflate: Deflate<S>, header: PngHeader, palette: Option<Palette>) -> Self {
    let format = PixelFormat::for_header(&header);
    let image = ImageData::new_zeroed(Dimensions { width: header.width, height: header.height }, format);
    let next_pass = match header.interlace_method {
      InterlaceMethod::None => 0,
      InterlaceMethod::Adam7 => 1,
    };
    Self { deflate, header, palette, format, image, next_pass, finished: false }
  }

  #[inline]
  #[must_use]
  pub fn is_finished(&self) -> bool {
    self.finished
  }

  #[inline]
  #[must_use]
  pub fn image(&self) -> &ImageData {
    &self.image
  }

  #[must_use]
  pub fn into_image(self) -> ImageData {
    self.image
  }

  /// Consumes the reconstructor, handing back the decompressor's
  /// underlying byte source alongside the image assembled so far. Used by
  /// the top-level decoder once a pass (or, for non-interlaced images, the
  /// whole image) is complete and it needs to keep reading chunks past the
  /// IDAT sequence.
  #[must_use]
  pub fn into_parts(self) -> (S, ImageData) {
    (self.deflate.into_source(), self.image)
  }

  /// Decodes the next pending Adam7 pass (or the single full image, for a
  /// non-interlaced stream), returning `true` iff this was the final pass.
  ///
  /// Calling this again after it has returned `true` is a no-op that
  /// returns `true` immediately, matching the idempotent-after-`final`
  /// contract of the top-level decoder.
  pub fn process_next_pass(&mut self) -> PngResult<bool> {
    if self.finished {
      return Ok(true);
    }
    let level = self.next_pass;
    let dims = reduced_image_dimensions(self.header.width, self.header.height);
    let (reduced_w, reduced_h) = dims[level as usize];
    let is_last = match self.header.interlace_method {
      InterlaceMethod::None => true,
      InterlaceMethod::Adam7 => level == 7,
    };

    if reduced_w > 0 && reduced_h > 0 {
      self.decode_pass(level as usize, reduced_w, reduced_h)?;
    }

    if is_last {
      self.finished = true;
    } else {
      self.next_pass += 1;
    }
    Ok(is_last)
  }

  fn decode_pass(&mut self, level: usize, reduced_w: u32, reduced_h: u32) -> PngResult<()> {
    let bytes_per_scanline = self.header.bytes_per_scanline(reduced_w);
    let stride = self.header.filter_stride();
    let mut prev_row: Vec<u8> = vec![0u8; bytes_per_scanline];
    let mut scanline: Vec<u8> = vec![0u8; bytes_per_scanline];

    for y in 0..reduced_h {
      let mut filter_byte = [0u8; 1];
      if self.deflate.read(&mut filter_byte)? != 1 {
        return Err(PngError::InsufficientImageData);
      }
      if self.deflate.read(&mut scanline)? != scanline.len() {
        return Err(PngError::InsufficientImageData);
      }
      unfilter_scanline(filter_byte[0], &mut scanline, &prev_row, stride)?;
      self.place_row(level, y, reduced_w, &scanline)?;
      prev_row.copy_from_slice(&scanline);
    }
    Ok(())
  }

  fn place_row(&mut self, level: usize, reduced_y: u32, reduced_w: u32, scanline: &[u8]) -> PngResult<()> {
    let bpp_out = self.format.bytes_per_pixel();
    let width = self.header.width as usize;

    match self.header.bit_depth {
      1 | 2 | 4 => {
        let bit_depth = self.header.bit_depth;
        let samples_per_byte = 8 / bit_depth as usize;
        let mask = (1u16 << bit_depth) as u8 - 1;
        for x in 0..reduced_w {
          let xi = x as usize;
          let byte = scanline[xi / samples_per_byte];
          let shift = (samples_per_byte - 1 - (xi % samples_per_byte)) * bit_depth as usize;
          let raw = (byte >> shift) & mask;
          let (fx, fy) = interlaced_pos_to_full_pos(level, x, reduced_y);
          let out_offset = (fy as usize * width + fx as usize) * bpp_out;
          match self.header.color_type {
            PngColorType::Indexed => {
              let palette = self.palette.as_ref().ok_or(PngError::MissingPalette)?;
              let rgb = palette.lookup(raw)?;
              self.image.pixels[out_offset..out_offset + 3].copy_from_slice(&rgb);
            }
            PngColorType::Greyscale => {
              self.image.pixels[out_offset] = widen_sample(raw, bit_depth);
            }
            _ => unreachable!("only Greyscale and Indexed permit sub-byte depths"),
          }
        }
      }
      8 => {
        let channels = self.header.color_type.channel_count();
        for x in 0..reduced_w {
          let xi = x as usize;
          let px = &scanline[xi * channels..xi * channels + channels];
          let (fx, fy) = interlaced_pos_to_full_pos(level, x, reduced_y);
          let out_offset = (fy as usize * width + fx as usize) * bpp_out;
          if self.header.color_type == PngColorType::Indexed {
            let palette = self.palette.as_ref().ok_or(PngError::MissingPalette)?;
            let rgb = palette.lookup(px[0])?;
            self.image.pixels[out_offset..out_offset + 3].copy_from_slice(&rgb);
          } else {
            self.image.pixels[out_offset..out_offset + channels].copy_from_slice(px);
          }
        }
      }
      16 => {
        let channels = self.header.color_type.channel_count();
        for x in 0..reduced_w {
          let xi = x as usize;
          let (fx, fy) = interlaced_pos_to_full_pos(level, x, reduced_y);
          let out_offset = (fy as usize * width + fx as usize) * bpp_out;
          for c in 0..channels {
            let hi = scanline[xi * channels * 2 + c * 2];
            let lo = scanline[xi * channels * 2 + c * 2 + 1];
            let value = u16::from_be_bytes([hi, lo]);
            self.image.pixels[out_offset + c * 2..out_offset + c * 2 + 2]
              .copy_from_slice(&value.to_le_bytes());
          }
        }
      }
      _ => unreachable!("IHDR validation already rejects other bit depths"),
    }
    Ok(())
  }
}
