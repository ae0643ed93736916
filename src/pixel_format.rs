//! The canonical pixel format this crate emits, and the output record that
//! carries decoded pixels back to the caller.

use alloc::vec::Vec;

/// Which channels a decoded pixel carries, independent of sample width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
  Gray,
  GrayAlpha,
  Rgb,
  Rgba,
}

impl ChannelLayout {
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Gray => 1,
      Self::GrayAlpha => 2,
      Self::Rgb => 3,
      Self::Rgba => 4,
    }
  }
}

/// The canonical format descriptor attached to every [`ImageData`] this
/// crate emits.
///
/// `sample_bits` reports the *logical* bit depth from `IHDR` (so a 1-bit
/// greyscale image reports `1`, not `8`), while the byte stream in
/// `ImageData::pixels` is always one byte per sample for 1/2/4/8-bit depths
/// and two (little-endian) bytes per sample for 16-bit depth. Indexed color
/// is always reported as `Rgb` at `sample_bits == 8` since palette
/// expansion happens before the caller ever sees the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
  pub channel_layout: ChannelLayout,
  pub sample_bits: u8,
}

impl PixelFormat {
  /// Bytes occupied by one pixel in the emitted (post sub-byte-widening,
  /// post-palette-expansion) byte stream.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(self) -> usize {
    let sample_bytes = if self.sample_bits == 16 { 2 } else { 1 };
    self.channel_layout.channel_count() * sample_bytes
  }

  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(self) -> usize {
    self.channel_layout.channel_count() * self.sample_bits as usize
  }

  /// The canonical output format for a given PNG header. Indexed color is
  /// always reported as 8-bit RGB, since palette expansion happens before
  /// the caller ever sees pixel bytes.
  #[must_use]
  pub fn for_header(header: &crate::ihdr::PngHeader) -> Self {
    use crate::ihdr::PngColorType;
    match header.color_type {
      PngColorType::Greyscale => {
        Self { channel_layout: ChannelLayout::Gray, sample_bits: header.bit_depth }
      }
      PngColorType::Truecolor => {
        Self { channel_layout: ChannelLayout::Rgb, sample_bits: header.bit_depth }
      }
      PngColorType::Indexed => Self { channel_layout: ChannelLayout::Rgb, sample_bits: 8 },
      PngColorType::GreyscaleAlpha => {
        Self { channel_layout: ChannelLayout::GrayAlpha, sample_bits: header.bit_depth }
      }
      PngColorType::TruecolorAlpha => {
        Self { channel_layout: ChannelLayout::Rgba, sample_bits: header.bit_depth }
      }
    }
  }
}

/// Image pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
  pub width: u32,
  pub height: u32,
}

/// The top-level decoded-image output record.
///
/// `pixels` is row-major, top-to-bottom, left-to-right, one pixel format's
/// worth of bytes per pixel (see [`PixelFormat::bytes_per_pixel`]) with no
/// padding between rows. 16-bit samples are emitted little-endian; see
/// [`PixelFormat`] docs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
  pub pixels: Vec<u8>,
  pub dimensions: Dimensions,
  pub format: PixelFormat,
}

impl ImageData {
  #[must_use]
  pub(crate) fn new_zeroed(dimensions: Dimensions, format: PixelFormat) -> Self {
    let len = dimensions.width as usize * dimensions.height as usize * format.bytes_per_pixel();
    Self { pixels: alloc::vec![0u8; len], dimensions, format }
  }
}
