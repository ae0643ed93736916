use crate::bit_reader::BitReader;
use crate::byte_source::ByteSource;
use crate::error::{PngError, PngResult};

/// A canonical Huffman table built from a vector of per-symbol code lengths.
///
/// `MAXBITS` is the longest code length the table can hold (inclusive) and
/// `MAXSYMBOLS` bounds how many symbols it can encode. DEFLATE uses three
/// instantiations: the code-length alphabet (7, 19), the literal/length
/// alphabet (15, 288), and the distance alphabet (15, 30).
#[derive(Debug, Clone, Copy)]
pub struct HuffmanTable<const MAXBITS: usize, const MAXSYMBOLS: usize> {
  /// `count[l]` = number of symbols whose code length is `l`, `l` in `1..=MAXBITS`.
  count: [u16; MAXBITS],
  /// Symbols sorted by (length ascending, symbol ascending).
  symbol: [u16; MAXSYMBOLS],
  /// How many live entries `symbol` has (== number of nonzero lengths).
  symbol_len: usize,
}

impl<const MAXBITS: usize, const MAXSYMBOLS: usize> HuffmanTable<MAXBITS, MAXSYMBOLS> {
  /// Builds a table from `lengths`, one entry per symbol (0 meaning absent).
  ///
  /// Rejects over-subscribed code sets. An incomplete set (unused code space
  /// remaining at the longest length) is accepted only in the degenerate
  /// case of at most a single length-1 code, matching what real dynamic
  /// block encoders occasionally emit for single-literal distance tables.
  pub fn construct(lengths: &[u16]) -> PngResult<Self> {
    assert!(lengths.len() <= MAXSYMBOLS);
    let mut count = [0u16; MAXBITS];
    for &len in lengths {
      if len > 0 {
        count[(len - 1) as usize] += 1;
      }
    }

    let mut left: i32 = 1;
    for len in 1..=MAXBITS {
      left = 2 * left - i32::from(count[len - 1]);
      if left < 0 {
        return Err(PngError::HuffmanOverSubscribed);
      }
    }
    if left > 0 {
      let total_codes: u16 = count.iter().sum();
      if !(total_codes <= 1) {
        return Err(PngError::HuffmanIncomplete);
      }
    }

    let mut offs = [0u16; MAXBITS + 1];
    for len in 1..=MAXBITS {
      offs[len] = offs[len - 1] + count[len - 1];
    }

    let mut symbol = [0u16; MAXSYMBOLS];
    let mut running_offs = offs;
    for (sym, &len) in lengths.iter().enumerate() {
      if len > 0 {
        let idx = &mut running_offs[(len - 1) as usize];
        symbol[*idx as usize] = sym as u16;
        *idx += 1;
      }
    }

    let symbol_len = offs[MAXBITS] as usize;
    Ok(Self { count, symbol, symbol_len })
  }

  /// An empty table: legal only where the spec allows a degenerate,
  /// never-consulted distance table (a block whose literal data contains no
  /// back-references).
  #[must_use]
  pub fn empty() -> Self {
    Self { count: [0; MAXBITS], symbol: [0; MAXSYMBOLS], symbol_len: 0 }
  }

  /// Decodes one symbol, reading one bit at a time via `reader` from `source`.
  pub fn decode<S: ByteSource>(
    &self, reader: &mut BitReader, source: &mut S,
  ) -> PngResult<u16> {
    let mut code: i32 = 0;
    let mut first: i32 = 0;
    let mut index: i32 = 0;
    for len in 1..=MAXBITS {
      code |= reader.read_bits(source, 1)? as i32;
      let count_l = i32::from(self.count[len - 1]);
      if code - first < count_l {
        return Ok(self.symbol[(index + (code - first)) as usize]);
      }
      index += count_l;
      first += count_l;
      first <<= 1;
      code <<= 1;
    }
    Err(PngError::CouldNotFindLitLenSymbol)
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.symbol_len == 0
  }
}

/// The code-length alphabet (RFC 1951 §3.2.7): 19 symbols, lengths up to 7 bits.
pub type CodeLengthTable = HuffmanTable<7, 19>;
/// The literal/length alphabet: 288 symbols, lengths up to 15 bits.
pub type LitLenTable = HuffmanTable<15, 288>;
/// The distance alphabet: 30 symbols, lengths up to 15 bits.
pub type DistTable = HuffmanTable<15, 30>;

/// Order in which the 19 code-length-alphabet lengths are transmitted for a
/// dynamic block (RFC 1951 §3.2.7).
pub const CODE_LENGTH_ORDER: [usize; 19] =
  [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

#[cfg(test)]
mod tests {
  use super::*;
  use crate::byte_source::SliceSource;

  /// RFC 1951's own worked example: symbols A,B,C,D,E,F,G,H with lengths
  /// 3,3,3,3,3,2,4,4 produce codes 010,011,100,101,110,00,1110,1111.
  #[test]
  fn construct_matches_rfc_example() {
    let lengths: [u16; 8] = [3, 3, 3, 3, 3, 2, 4, 4];
    let table = HuffmanTable::<4, 8>::construct(&lengths).unwrap();
    assert_eq!(table.count[1], 1); // one length-2 code (F)
    assert_eq!(table.count[2], 5); // five length-3 codes
    assert_eq!(table.count[3], 2); // two length-4 codes
  }

  #[test]
  fn over_subscribed_is_rejected() {
    // Two length-1 codes is already too many.
    let lengths: [u16; 2] = [1, 1];
    // with only 1 bit of code space, a second length-1 code overflows it
    // once combined with a third below
    let lengths3: [u16; 3] = [1, 1, 1];
    assert!(HuffmanTable::<4, 2>::construct(&lengths).is_ok());
    assert_eq!(
      HuffmanTable::<1, 3>::construct(&lengths3),
      Err(PngError::HuffmanOverSubscribed)
    );
  }

  #[test]
  fn decode_roundtrips_single_symbol_table() {
    // One symbol (index 0) with length 1: its code is "0".
    let lengths: [u16; 1] = [1];
    let table = HuffmanTable::<1, 1>::construct(&lengths).unwrap();
    let mut src = SliceSource::new(&[0b0000_0000]);
    let mut reader = BitReader::new();
    assert_eq!(table.decode(&mut reader, &mut src).unwrap(), 0);
  }
}
