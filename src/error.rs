/// An error from the `pngstream` crate.
///
/// Errors arising from a critical chunk or from the DEFLATE core are always
/// fatal. Errors arising from an ancillary chunk are recoverable: the chunk
/// is skipped and a flag is recorded instead (see `ChunkErrors`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
#[allow(missing_docs)]
pub enum PngError {
  // byte source / framing
  UnexpectedEndOfInput,
  NoPngSignature,
  CrcMismatch,
  DuplicateCriticalChunk,
  UnknownCriticalChunk,
  ChunkOrderViolation,

  // IHDR / PLTE
  IllegalColorTypeBitDepthCombination,
  IllegalWidthZero,
  IllegalHeightZero,
  IllegalCompressionMethod,
  IllegalFilterMethod,
  IllegalInterlaceMethod,
  NotAnIhdrChunk,
  InvalidPlteLength,
  PaletteIndexOutOfRange,
  MissingPalette,

  // DEFLATE
  IllegalFlagCheck,
  IllegalBlockType,
  LenAndNLenDidNotMatch,
  BadDynamicHuffmanTreeData,
  HuffmanOverSubscribed,
  HuffmanIncomplete,
  CouldNotFindLitLenSymbol,
  CouldNotFindDistSymbol,
  BackRefDistanceOutOfRange,

  // reconstruction
  IllegalAdaptiveFilterType,
  InsufficientImageData,
}

impl PngError {
  /// Whether this error, if it occurred while processing a non-required
  /// ancillary chunk, would still be survivable by skipping that chunk.
  ///
  /// Errors that can only ever arise from a critical chunk or from the
  /// DEFLATE core return `false` here; the driver never calls this for
  /// those because it already knows they are fatal unconditionally.
  #[inline]
  #[must_use]
  pub const fn is_recoverable_in_ancillary_chunk(self) -> bool {
    matches!(self, Self::CrcMismatch | Self::InvalidPlteLength)
  }
}

pub type PngResult<T> = Result<T, PngError>;
