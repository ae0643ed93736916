use crate::byte_source::ByteSource;
use crate::error::{PngError, PngResult};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const CRC_TABLE: [u32; 256] = make_crc_table();
const fn make_crc_table() -> [u32; 256] {
  let mut table = [0u32; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
      k += 1;
    }
    table[n] = c;
    n += 1;
  }
  table
}

/// Computes the PNG CRC-32 over a chunk's type tag followed by its data.
pub fn png_crc(type_and_data: impl Iterator<Item = u8>) -> u32 {
  let mut crc = u32::MAX;
  for byte in type_and_data {
    crc = CRC_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
  }
  crc ^ u32::MAX
}

/// A chunk's 4-byte type tag, stored as raw ASCII.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");

  /// Bit 5 (0x20) of the first type byte is clear for critical chunks.
  #[inline]
  #[must_use]
  pub const fn is_critical(self) -> bool {
    self.0[0] & 0x20 == 0
  }

  #[inline]
  #[must_use]
  pub const fn is_known_ancillary(self) -> bool {
    matches!(
      &self.0,
      b"tRNS" | b"gAMA" | b"cHRM" | b"sRGB" | b"iCCP" | b"sBIT" | b"bKGD" | b"hIST" | b"pHYs"
        | b"sPLT" | b"tIME" | b"tEXt" | b"zTXt" | b"iTXt"
    )
  }
}

impl core::fmt::Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    core::fmt::Debug::fmt(core::str::from_utf8(&self.0).unwrap_or("????"), f)
  }
}

/// A single parsed chunk: its type, its payload, and whether the trailing
/// CRC matched a freshly computed one (always `true` if verification was
/// not requested).
#[derive(Debug, Clone)]
pub struct RawChunk {
  pub ty: ChunkType,
  #[cfg(feature = "alloc")]
  pub data: alloc::vec::Vec<u8>,
  pub crc_ok: bool,
}

/// Reads a chunk's payload and trailing CRC, given a header already
/// consumed from `source` by [`read_chunk_header`].
///
/// Checks `header.length` against `source.remaining()` before allocating: a
/// forged chunk claiming a length up to ~4 GiB must fail with
/// `UnexpectedEndOfInput` rather than attempt an unbounded allocation.
#[cfg(feature = "alloc")]
pub fn read_chunk_payload<S: ByteSource>(
  source: &mut S, header: ChunkHeader, verify_crc: bool,
) -> PngResult<RawChunk> {
  let length = header.length as usize;
  if length > source.remaining() {
    return Err(PngError::UnexpectedEndOfInput);
  }
  let mut data = alloc::vec![0u8; length];
  source.read(&mut data)?;

  let mut crc_bytes = [0u8; 4];
  source.read(&mut crc_bytes)?;
  let declared_crc = u32::from_be_bytes(crc_bytes);

  let crc_ok = if verify_crc {
    png_crc(header.ty.0.iter().copied().chain(data.iter().copied())) == declared_crc
  } else {
    true
  };

  Ok(RawChunk { ty: header.ty, data, crc_ok })
}

/// Verifies the 8-byte PNG signature, advancing `source` past it.
pub fn read_signature<S: ByteSource>(source: &mut S) -> PngResult<()> {
  let mut sig = [0u8; 8];
  source.read(&mut sig)?;
  if sig == PNG_SIGNATURE {
    Ok(())
  } else {
    Err(PngError::NoPngSignature)
  }
}

/// A chunk's length + type, without its payload — used when the payload is
/// going to be streamed elsewhere (IDAT) rather than buffered wholesale.
#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
  pub length: u32,
  pub ty: ChunkType,
}

/// Reads just the 4-byte length and 4-byte type of the next chunk.
pub fn read_chunk_header<S: ByteSource>(source: &mut S) -> PngResult<ChunkHeader> {
  let mut len_bytes = [0u8; 4];
  source.read(&mut len_bytes)?;
  let mut ty_bytes = [0u8; 4];
  source.read(&mut ty_bytes)?;
  Ok(ChunkHeader { length: u32::from_be_bytes(len_bytes), ty: ChunkType(ty_bytes) })
}

fn crc_init(ty: ChunkType) -> u32 {
  let mut crc = u32::MAX;
  for byte in ty.0 {
    crc = CRC_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
  }
  crc
}

fn crc_update(mut crc: u32, bytes: impl Iterator<Item = u8>) -> u32 {
  for byte in bytes {
    crc = CRC_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
  }
  crc
}

/// Presents the concatenation of one or more consecutive IDAT chunks'
/// payloads as a single linear [`ByteSource`], so the DEFLATE decompressor
/// never needs to know about chunk framing. Transparently skips past
/// intervening chunk boundaries (length, type, CRC) and stops once a
/// non-IDAT chunk header is encountered, rewinding the source so the driver
/// can read that header again normally.
///
/// Owns the underlying source by value rather than borrowing it, so that a
/// driver juggling "source" and "source wrapped for IDAT streaming" as two
/// states of one field can move ownership back and forth with
/// [`Self::into_inner`] instead of fighting the borrow checker over a
/// self-referential struct.
pub struct IdatSource<S: ByteSource> {
  source: S,
  remaining_in_chunk: u32,
  running_crc: u32,
  verify_crc: bool,
  ended: bool,
}

impl<S: ByteSource> IdatSource<S> {
  /// `header` must be the header of the first IDAT chunk, already consumed
  /// from `source` (so `source`'s cursor sits at the start of its payload).
  #[must_use]
  pub fn new(source: S, header: ChunkHeader, verify_crc: bool) -> Self {
    Self {
      running_crc: crc_init(header.ty),
      remaining_in_chunk: header.length,
      source,
      verify_crc,
      ended: false,
    }
  }

  /// Whether the IDAT sequence has ended (a non-IDAT chunk header was
  /// encountered). The driver should resume chunk parsing from the
  /// recovered source at this point; the ending chunk's header has been
  /// rewound back onto it so it can be read again normally.
  #[inline]
  #[must_use]
  pub fn ended(&self) -> bool {
    self.ended && self.remaining_in_chunk == 0
  }

  /// Drains any unread bytes of the current IDAT chunk and advances past
  /// chunk boundaries until the IDAT sequence ends, handing back the
  /// underlying source positioned at the start of the chunk that ended it
  /// (already rewound past that chunk's header so it can be read again
  /// normally).
  pub fn finish(mut self) -> PngResult<S> {
    let mut discard = [0u8; 256];
    while !self.ended() {
      if self.remaining_in_chunk == 0 {
        self.advance_past_chunk_boundary()?;
        continue;
      }
      let want = (self.remaining_in_chunk as usize).min(discard.len());
      self.source.read(&mut discard[..want])?;
      self.running_crc = crc_update(self.running_crc, discard[..want].iter().copied());
      self.remaining_in_chunk -= want as u32;
    }
    Ok(self.source)
  }

  fn advance_past_chunk_boundary(&mut self) -> PngResult<()> {
    let mut crc_bytes = [0u8; 4];
    self.source.read(&mut crc_bytes)?;
    let declared = u32::from_be_bytes(crc_bytes);
    if self.verify_crc && (self.running_crc ^ u32::MAX) != declared {
      return Err(PngError::CrcMismatch);
    }

    let header = read_chunk_header(self.source)?;
    if header.ty == ChunkType::IDAT {
      self.remaining_in_chunk = header.length;
      self.running_crc = crc_init(header.ty);
    } else {
      self.source.seek_back(8)?;
      self.ended = true;
    }
    Ok(())
  }
}

impl<S: ByteSource> ByteSource for IdatSource<S> {
  fn read(&mut self, out: &mut [u8]) -> PngResult<()> {
    let mut written = 0;
    while written < out.len() {
      if self.remaining_in_chunk == 0 {
        if self.ended {
          return Err(PngError::InsufficientImageData);
        }
        self.advance_past_chunk_boundary()?;
        if self.ended {
          return Err(PngError::InsufficientImageData);
        }
        continue;
      }
      let want = (out.len() - written).min(self.remaining_in_chunk as usize);
      self.source.read(&mut out[written..written + want])?;
      self.running_crc = crc_update(self.running_crc, out[written..written + want].iter().copied());
      self.remaining_in_chunk -= want as u32;
      written += want;
    }
    Ok(())
  }

  fn try_read(&mut self, out: &mut [u8]) -> usize {
    match self.read(out) {
      Ok(()) => out.len(),
      Err(_) => 0,
    }
  }

  fn peek(&self) -> Option<u8> {
    if self.remaining_in_chunk > 0 {
      self.source.peek()
    } else {
      None
    }
  }

  fn seek_forward(&mut self, _amount: usize) -> PngResult<()> {
    Err(PngError::UnexpectedEndOfInput)
  }

  fn seek_back(&mut self, _amount: usize) -> PngResult<()> {
    Err(PngError::UnexpectedEndOfInput)
  }

  fn remaining(&self) -> usize {
    self.remaining_in_chunk as usize
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn critical_bit_test_matches_spec() {
    assert!(ChunkType::IHDR.is_critical());
    assert!(ChunkType::IDAT.is_critical());
    assert!(!ChunkType(*b"tEXt").is_critical());
    assert!(!ChunkType(*b"gAMA").is_critical());
  }

  #[test]
  fn crc_of_iend_matches_well_known_value() {
    // IEND always has an empty payload; its CRC is a widely documented
    // constant, independent of any particular image.
    let crc = png_crc(b"IEND".iter().copied());
    assert_eq!(crc, 0xAE42_6082);
  }
}
