//! End-to-end fixtures driving `Decoder` against hand-built minimal PNG byte
//! streams, exercising the scenarios named in the specification's testable
//! properties: a handful of tiny, hand-assembled files rather than a corpus
//! of real-world images, since this crate carries no test-asset directory.

use pngstream::{
  ChunkType, Decoder, DecoderOptions, ImageReturnInfo, PngError, SliceSource,
};

fn be_chunk(ty: &[u8; 4], data: &[u8]) -> Vec<u8> {
  let mut out = Vec::new();
  out.extend_from_slice(&(data.len() as u32).to_be_bytes());
  out.extend_from_slice(ty);
  out.extend_from_slice(data);
  let crc = pngstream::png_crc(ty.iter().copied().chain(data.iter().copied()));
  out.extend_from_slice(&crc.to_be_bytes());
  out
}

fn ihdr_data(width: u32, height: u32, bit_depth: u8, color_type: u8, interlace: u8) -> Vec<u8> {
  let mut data = Vec::new();
  data.extend_from_slice(&width.to_be_bytes());
  data.extend_from_slice(&height.to_be_bytes());
  data.push(bit_depth);
  data.push(color_type);
  data.push(0); // compression method
  data.push(0); // filter method
  data.push(interlace);
  data
}

/// Wraps `payload` as a single zlib-framed, single stored (uncompressed)
/// DEFLATE block, final. This is enough to drive every reconstruction path
/// without needing a Huffman-encoding test helper at the integration level.
fn zlib_stored(payload: &[u8]) -> Vec<u8> {
  let mut out = vec![0x78, 0x01];
  out.push(0b001); // BFINAL=1, BTYPE=00 (stored)
  out.push(payload.len() as u8);
  out.push((payload.len() >> 8) as u8);
  out.push(!(payload.len() as u8));
  out.push(!((payload.len() >> 8) as u8));
  out.extend_from_slice(payload);
  out
}

fn png_bytes(ihdr: &[u8], extra_chunks: &[Vec<u8>], idat_payload: &[u8]) -> Vec<u8> {
  let mut bytes = pngstream::PNG_SIGNATURE.to_vec();
  bytes.extend(be_chunk(b"IHDR", ihdr));
  for chunk in extra_chunks {
    bytes.extend_from_slice(chunk);
  }
  bytes.extend(be_chunk(b"IDAT", &zlib_stored(idat_payload)));
  bytes.extend(be_chunk(b"IEND", &[]));
  bytes
}

fn decode_once(bytes: &[u8]) -> (ImageReturnInfo, Decoder<SliceSource<'_>>) {
  let mut decoder = Decoder::new(SliceSource::new(bytes), DecoderOptions::default());
  let info = decoder.read_data();
  (info, decoder)
}

#[test]
fn minimal_1x1_grey8_decodes_one_replicated_sample() {
  let ihdr = ihdr_data(1, 1, 8, 0, 0);
  let bytes = png_bytes(&ihdr, &[], &[0, 42]);
  let (info, decoder) = decode_once(&bytes);
  assert!(info.valid);
  assert!(info.is_final);
  assert!(!info.is_interlaced);
  let image = decoder.image().unwrap();
  assert_eq!(image.dimensions.width, 1);
  assert_eq!(image.dimensions.height, 1);
  assert_eq!(image.format.bits_per_pixel(), 8);
  assert_eq!(image.pixels, vec![42]);
}

#[test]
fn two_by_two_rgb8_none_filter_round_trips() {
  let ihdr = ihdr_data(2, 2, 8, 2, 0);
  let payload = [
    0, 10, 20, 30, 40, 50, 60, // row 0: filter None, two RGB pixels
    0, 70, 80, 90, 100, 110, 120, // row 1: filter None, two RGB pixels
  ];
  let bytes = png_bytes(&ihdr, &[], &payload);
  let (info, decoder) = decode_once(&bytes);
  assert!(info.valid);
  assert_eq!(
    decoder.image().unwrap().pixels,
    vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120]
  );
}

#[test]
fn sub_filter_recovers_original_row() {
  // One RGB8 row, 3x1: unfiltered [10,20,30,40,50,60,70,80,90], Sub-filtered
  // against a stride of 3 gives deltas [10,20,30, 10,10,10, 10,10,10].
  let ihdr = ihdr_data(3, 1, 8, 2, 0);
  let payload = [1u8, 10, 20, 30, 10, 10, 10, 10, 10, 10];
  let bytes = png_bytes(&ihdr, &[], &payload);
  let (info, decoder) = decode_once(&bytes);
  assert!(info.valid);
  assert_eq!(
    decoder.image().unwrap().pixels,
    vec![10, 20, 30, 20, 30, 40, 30, 40, 50]
  );
}

#[test]
fn indexed_2bit_4x1_expands_through_palette() {
  let ihdr = ihdr_data(4, 1, 2, 3, 0);
  let plte = be_chunk(b"PLTE", &[0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255]);
  // filter None, indices packed MSB-first: 11 10 01 00 -> 3,2,1,0
  let payload = [0u8, 0b1110_0100];
  let bytes = png_bytes(&ihdr, &[plte], &payload);
  let (info, decoder) = decode_once(&bytes);
  assert!(info.valid);
  assert_eq!(
    decoder.image().unwrap().pixels,
    vec![0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255]
  );
}

#[test]
fn sixteen_bit_grey_emits_little_endian_samples() {
  let ihdr = ihdr_data(2, 1, 16, 0, 0);
  // wire order (big-endian): 0x00FF, 0xFF00
  let payload = [0u8, 0x00, 0xFF, 0xFF, 0x00];
  let bytes = png_bytes(&ihdr, &[], &payload);
  let (info, decoder) = decode_once(&bytes);
  assert!(info.valid);
  assert_eq!(decoder.image().unwrap().pixels, vec![0xFF, 0x00, 0x00, 0xFF]);
}

#[test]
fn adam7_3x3_one_shot_matches_non_interlaced_equivalent() {
  // Image: pixel(x, y) = y*3 + x, Grey8, delivered as a single call (the
  // default `receive_interlaced: false`).
  let ihdr = ihdr_data(3, 3, 8, 0, 1);
  let payload = [
    0, 0, // pass 1: (0,0) -> pixel 0
    0, 2, // pass 4: (2,0) -> pixel 2
    0, 6, 8, // pass 5: (0,2),(2,2) -> pixels 6,8
    0, 1, // pass 6 row0: (1,0) -> pixel 1
    0, 7, // pass 6 row1: (1,2) -> pixel 7
    0, 3, 4, 5, // pass 7: (0,1),(1,1),(2,1) -> pixels 3,4,5
  ];
  let bytes = png_bytes(&ihdr, &[], &payload);
  let (info, decoder) = decode_once(&bytes);
  assert!(info.valid);
  assert!(info.is_interlaced);
  assert!(info.is_final);
  assert_eq!(decoder.image().unwrap().pixels, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn adam7_3x3_delivered_pass_by_pass_is_cumulative_and_terminates() {
  let ihdr = ihdr_data(3, 3, 8, 0, 1);
  let payload = [
    0, 0, 0, 2, 0, 6, 8, 0, 1, 0, 7, 0, 3, 4, 5,
  ];
  let bytes = png_bytes(&ihdr, &[], &payload);
  let mut decoder = Decoder::new(
    SliceSource::new(&bytes),
    DecoderOptions { receive_interlaced: true, ..DecoderOptions::default() },
  );

  let mut pass_count = 0;
  loop {
    let info = decoder.read_data();
    assert!(info.valid);
    assert!(info.is_interlaced);
    pass_count += 1;
    if info.is_final {
      break;
    }
    assert!(pass_count <= 7, "must not exceed the 7 Adam7 passes");
  }
  assert_eq!(pass_count, 7);
  assert_eq!(decoder.image().unwrap().pixels, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);

  // The final pass's own `is_final` call only finishes IDAT streaming; one
  // more call threads through the trailing IEND chunk. From there, further
  // re-entry is a pure no-op per the idempotence-after-`final` contract.
  let info = decoder.read_data();
  assert!(info.is_final);
  let info_again = decoder.read_data();
  assert!(info_again.is_final);
  assert_eq!(decoder.image().unwrap().pixels, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn corrupted_signature_is_rejected() {
  let ihdr = ihdr_data(1, 1, 8, 0, 0);
  let mut bytes = png_bytes(&ihdr, &[], &[0, 42]);
  bytes[1] = 0; // corrupt one signature byte
  let (info, decoder) = decode_once(&bytes);
  assert!(!info.valid);
  assert_eq!(decoder.query_state().err, Some(PngError::NoPngSignature));
  assert!(decoder.query_state().is_fatal_error);
}

#[test]
fn duplicate_ihdr_is_rejected() {
  let ihdr = ihdr_data(1, 1, 8, 0, 0);
  let mut bytes = pngstream::PNG_SIGNATURE.to_vec();
  bytes.extend(be_chunk(b"IHDR", &ihdr));
  bytes.extend(be_chunk(b"IHDR", &ihdr));
  bytes.extend(be_chunk(b"IEND", &[]));
  let (info, decoder) = decode_once(&bytes);
  assert!(!info.valid);
  assert_eq!(decoder.query_state().err, Some(PngError::DuplicateCriticalChunk));
}

#[test]
fn reserved_deflate_block_type_is_rejected() {
  let ihdr = ihdr_data(1, 1, 8, 0, 0);
  let mut bytes = pngstream::PNG_SIGNATURE.to_vec();
  bytes.extend(be_chunk(b"IHDR", &ihdr));
  // zlib header followed by one block header byte: BFINAL=1, BTYPE=11 (reserved).
  let idat_payload = vec![0x78, 0x01, 0b111];
  bytes.extend(be_chunk(b"IDAT", &idat_payload));
  bytes.extend(be_chunk(b"IEND", &[]));
  let (info, decoder) = decode_once(&bytes);
  assert!(!info.valid);
  assert_eq!(decoder.query_state().err, Some(PngError::IllegalBlockType));
}

#[test]
fn palette_index_out_of_range_is_rejected() {
  let ihdr = ihdr_data(1, 1, 8, 3, 0);
  let plte = be_chunk(b"PLTE", &[0, 0, 0]); // one entry, index 0 only
  let payload = [0u8, 1]; // filter None, index 1: out of range
  let bytes = png_bytes(&ihdr, &[plte], &payload);
  let (info, decoder) = decode_once(&bytes);
  assert!(!info.valid);
  assert_eq!(decoder.query_state().err, Some(PngError::PaletteIndexOutOfRange));
}

#[test]
fn unknown_critical_chunk_is_rejected() {
  let ihdr = ihdr_data(1, 1, 8, 0, 0);
  let mut bytes = pngstream::PNG_SIGNATURE.to_vec();
  bytes.extend(be_chunk(b"IHDR", &ihdr));
  bytes.extend(be_chunk(b"XYZw", &[1, 2, 3])); // first byte 'X' = 0x58, bit 5 clear -> critical
  bytes.extend(be_chunk(b"IDAT", &zlib_stored(&[0, 42])));
  bytes.extend(be_chunk(b"IEND", &[]));
  let (info, decoder) = decode_once(&bytes);
  assert!(!info.valid);
  assert_eq!(decoder.query_state().err, Some(PngError::UnknownCriticalChunk));
}

#[test]
fn unknown_ancillary_chunk_is_recorded_and_skipped() {
  let ihdr = ihdr_data(1, 1, 8, 0, 0);
  let extra = be_chunk(b"zzAB", &[9, 9]); // bit 5 of 'z' (0x7A) is set -> ancillary
  let bytes = png_bytes(&ihdr, &[extra], &[0, 42]);
  let (info, decoder) = decode_once(&bytes);
  assert!(info.valid);
  assert_eq!(decoder.image().unwrap().pixels, vec![42]);
  assert!(decoder.chunk_log().processed.contains(&ChunkType(*b"zzAB")));
}
