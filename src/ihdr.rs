//! The PNG image header (`IHDR`) and the color-type / bit-depth rules that
//! flow from it.

use crate::chunk::{ChunkType, RawChunk};
use crate::error::{PngError, PngResult};

/// PNG's five color types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale, 1 channel.
  Greyscale = 0,
  /// Red, Green, Blue.
  Truecolor = 2,
  /// Index into a [`Palette`](crate::palette::Palette); the palette stores RGB8.
  Indexed = 3,
  /// Greyscale + Alpha.
  GreyscaleAlpha = 4,
  /// Red, Green, Blue, Alpha.
  TruecolorAlpha = 6,
}

impl PngColorType {
  /// Number of samples per pixel for this color type (before any palette
  /// expansion).
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Greyscale | Self::Indexed => 1,
      Self::Truecolor => 3,
      Self::GreyscaleAlpha => 2,
      Self::TruecolorAlpha => 4,
    }
  }

  #[inline]
  #[must_use]
  const fn permits_bit_depth(self, bit_depth: u8) -> bool {
    match self {
      Self::Greyscale => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
      Self::Truecolor | Self::GreyscaleAlpha | Self::TruecolorAlpha => matches!(bit_depth, 8 | 16),
      Self::Indexed => matches!(bit_depth, 1 | 2 | 4 | 8),
    }
  }

  #[inline]
  const fn from_wire(value: u8) -> Option<Self> {
    Some(match value {
      0 => Self::Greyscale,
      2 => Self::Truecolor,
      3 => Self::Indexed,
      4 => Self::GreyscaleAlpha,
      6 => Self::TruecolorAlpha,
      _ => return None,
    })
  }
}

/// The PNG interlace methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterlaceMethod {
  /// Scanlines appear in top-to-bottom row order.
  None,
  /// Adam7, 7-pass interlacing.
  Adam7,
}

/// The parsed and validated `IHDR` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngHeader {
  pub width: u32,
  pub height: u32,
  pub bit_depth: u8,
  pub color_type: PngColorType,
  pub interlace_method: InterlaceMethod,
}

impl PngHeader {
  /// Bits per pixel before any sub-byte widening or palette expansion.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    self.color_type.channel_count() * self.bit_depth as usize
  }

  /// Bytes of filtered scanline data (not counting the filter-type byte) for
  /// a pass with the given reduced width.
  #[inline]
  #[must_use]
  pub const fn bytes_per_scanline(&self, reduced_width: u32) -> usize {
    let bits = self.bits_per_pixel() * reduced_width as usize;
    (bits + 7) / 8
  }

  /// Bytes of one filter-tagged scanline (the filter-type byte plus the
  /// scanline's sample bytes) for a pass with the given reduced width.
  #[inline]
  #[must_use]
  pub const fn bytes_per_filterline(&self, reduced_width: u32) -> usize {
    1 + self.bytes_per_scanline(reduced_width)
  }

  /// Byte stride between consecutive samples within a decoded (post-filter)
  /// scanline. This is `ceil(bits_per_pixel / 8)`, i.e. `1` for every
  /// sub-byte depth, matching the filter's "distance to neighbor `a`"
  /// definition in the PNG spec.
  #[inline]
  #[must_use]
  pub const fn filter_stride(&self) -> usize {
    (self.bits_per_pixel() + 7) / 8
  }

  /// Total decompressed byte count the DEFLATE stream must produce, summed
  /// over every interlace pass (or just the one full image, if not
  /// interlaced).
  #[must_use]
  pub fn decompressed_size(&self) -> usize {
    let dims = crate::adam7::reduced_image_dimensions(self.width, self.height);
    match self.interlace_method {
      InterlaceMethod::None => {
        let (w, h) = dims[0];
        self.bytes_per_filterline(w).saturating_mul(h as usize)
      }
      InterlaceMethod::Adam7 => dims[1..]
        .iter()
        .map(|&(w, h)| {
          if w == 0 || h == 0 {
            0
          } else {
            self.bytes_per_filterline(w).saturating_mul(h as usize)
          }
        })
        .fold(0usize, |acc, n| acc.saturating_add(n)),
    }
  }

  /// Parses and validates an `IHDR` chunk's raw payload.
  pub fn from_ihdr_chunk(chunk: &RawChunk) -> PngResult<Self> {
    if chunk.ty != ChunkType::IHDR {
      return Err(PngError::NotAnIhdrChunk);
    }
    let data = &chunk.data[..];
    let [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] =
      *data
    else {
      return Err(PngError::NotAnIhdrChunk);
    };

    let width = u32::from_be_bytes([w0, w1, w2, w3]);
    let height = u32::from_be_bytes([h0, h1, h2, h3]);
    if width == 0 {
      return Err(PngError::IllegalWidthZero);
    }
    if height == 0 {
      return Err(PngError::IllegalHeightZero);
    }

    let color_type = PngColorType::from_wire(color_type)
      .ok_or(PngError::IllegalColorTypeBitDepthCombination)?;
    if !color_type.permits_bit_depth(bit_depth) {
      return Err(PngError::IllegalColorTypeBitDepthCombination);
    }

    if compression_method != 0 {
      return Err(PngError::IllegalCompressionMethod);
    }
    if filter_method != 0 {
      return Err(PngError::IllegalFilterMethod);
    }
    let interlace_method = match interlace_method {
      0 => InterlaceMethod::None,
      1 => InterlaceMethod::Adam7,
      _ => return Err(PngError::IllegalInterlaceMethod),
    };

    Ok(Self { width, height, bit_depth, color_type, interlace_method })
  }
}
