//! The top-level decoder driver: a small state machine wiring together
//! signature verification, chunk parsing, DEFLATE decompression, and
//! scanline reconstruction behind one `read_data` entry point.

use alloc::vec::Vec;

use crate::ancillary::Ancillary;
use crate::byte_source::ByteSource;
use crate::chunk::{read_chunk_header, read_chunk_payload, read_signature, ChunkType, IdatSource};
use crate::deflate::Deflate;
use crate::error::{PngError, PngResult};
use crate::ihdr::{InterlaceMethod, PngHeader};
use crate::palette::Palette;
use crate::pixel_format::ImageData;
use crate::reconstruct::Reconstructor;

/// Caller-configurable knobs for a [`Decoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
  /// Deliver interlaced images one Adam7 pass at a time: each `read_data`
  /// call returns as soon as a pass completes, with a cumulative image so
  /// far. When `false`, all passes (or, for a non-interlaced image, the
  /// single pass) are assembled before `read_data` returns.
  pub receive_interlaced: bool,
  /// Reserved for animated PNG support. Non-animated streams ignore it.
  pub receive_animation: bool,
  /// Verify each chunk's trailing CRC-32 against the computed value.
  /// Mismatches on critical chunks are always fatal when this is enabled;
  /// disabling it trades conformance checking for speed on trusted input.
  pub verify_crc: bool,
}

impl Default for DecoderOptions {
  fn default() -> Self {
    Self { receive_interlaced: false, receive_animation: false, verify_crc: true }
  }
}

/// The outcome of one `read_data` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageReturnInfo {
  pub valid: bool,
  pub is_interlaced: bool,
  pub is_final: bool,
}

/// A snapshot of the decoder's error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryState {
  pub has_error: bool,
  pub is_fatal_error: bool,
  pub err: Option<PngError>,
}

/// Which chunk types were seen during a decode, and which of those failed
/// CRC verification or some other recoverable check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkLog {
  pub processed: Vec<ChunkType>,
  pub crc_errors: Vec<ChunkType>,
  /// Chunks skipped after a non-fatal error (e.g. a malformed `PLTE` on a
  /// non-indexed image, which is merely a suggested palette).
  pub chunk_errors: Vec<ChunkType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
  ReadSignature,
  ReadChunks,
  ReadFromDeflate,
  ResumeDeflate,
  Finished,
  FatalError,
}

/// Drives a [`ByteSource`] through a full PNG decode.
pub struct Decoder<S: ByteSource> {
  state: DriverState,
  options: DecoderOptions,
  source: Option<S>,
  reconstructor: Option<Reconstructor<IdatSource<S>>>,
  header: Option<PngHeader>,
  palette: Option<Palette>,
  ancillary: Vec<Ancillary>,
  seen_critical: Vec<ChunkType>,
  idat_done: bool,
  chunk_log: ChunkLog,
  image: Option<ImageData>,
  error: Option<PngError>,
}

impl<S: ByteSource> Decoder<S> {
  #[must_use]
  pub fn new(source: S, options: DecoderOptions) -> Self {
    Self {
      state: DriverState::ReadSignature,
      options,
      source: Some(source),
      reconstructor: None,
      header: None,
      palette: None,
      ancillary: Vec::new(),
      seen_critical: Vec::new(),
      idat_done: false,
      chunk_log: ChunkLog::default(),
      image: None,
      error: None,
    }
  }

  #[inline]
  #[must_use]
  pub fn header(&self) -> Option<&PngHeader> {
    self.header.as_ref()
  }

  #[inline]
  #[must_use]
  pub fn palette(&self) -> Option<&Palette> {
    self.palette.as_ref()
  }

  #[inline]
  #[must_use]
  pub fn ancillary_chunks(&self) -> &[Ancillary] {
    &self.ancillary
  }

  #[inline]
  #[must_use]
  pub fn chunk_log(&self) -> &ChunkLog {
    &self.chunk_log
  }

  #[inline]
  #[must_use]
  pub fn image(&self) -> Option<&ImageData> {
    self.image.as_ref()
  }

  #[must_use]
  pub fn into_image(self) -> Option<ImageData> {
    self.image
  }

  #[must_use]
  pub fn query_state(&self) -> QueryState {
    QueryState {
      has_error: self.error.is_some(),
      is_fatal_error: matches!(self.state, DriverState::FatalError),
      err: self.error,
    }
  }

  #[inline]
  #[must_use]
  fn is_interlaced(&self) -> bool {
    matches!(self.header.map(|h| h.interlace_method), Some(InterlaceMethod::Adam7))
  }

  fn fail(&mut self, err: PngError) {
    crate::trace!("fatal error in state {:?}: {:?}", self.state, err);
    self.state = DriverState::FatalError;
    self.error = Some(err);
  }

  /// `false` whenever a fatal error has occurred, or a recoverable one has
  /// been skipped along the way — a skipped chunk still means the caller got
  /// less than a perfectly conformant stream would have given them.
  #[inline]
  #[must_use]
  fn no_recoverable_errors_yet(&self) -> bool {
    self.chunk_log.crc_errors.is_empty() && self.chunk_log.chunk_errors.is_empty()
  }

  /// Runs the driver until the current image is (at least partially)
  /// available, the stream is finished, or a fatal error occurs.
  pub fn read_data(&mut self) -> ImageReturnInfo {
    loop {
      match self.state {
        DriverState::Finished => {
          return ImageReturnInfo {
            valid: self.no_recoverable_errors_yet(),
            is_interlaced: self.is_interlaced(),
            is_final: true,
          };
        }
        DriverState::FatalError => {
          return ImageReturnInfo { valid: false, is_interlaced: self.is_interlaced(), is_final: false };
        }
        DriverState::ReadSignature => self.step_signature(),
        DriverState::ResumeDeflate => {
          crate::trace!("resuming deflate for the next interlace pass");
          self.state = DriverState::ReadFromDeflate;
        }
        DriverState::ReadChunks => self.step_chunks(),
        DriverState::ReadFromDeflate => {
          if let Some(info) = self.step_deflate() {
            return info;
          }
        }
      }
    }
  }

  fn step_signature(&mut self) {
    let mut source = self.source.take().expect("source present outside IDAT streaming");
    match read_signature(&mut source) {
      Ok(()) => {
        crate::trace!("PNG signature verified");
        self.source = Some(source);
        self.state = DriverState::ReadChunks;
      }
      Err(e) => {
        self.source = Some(source);
        self.fail(e);
      }
    }
  }

  fn step_chunks(&mut self) {
    let mut source = self.source.take().expect("source present outside IDAT streaming");
    let header = match read_chunk_header(&mut source) {
      Ok(h) => h,
      Err(e) => {
        self.source = Some(source);
        self.fail(e);
        return;
      }
    };
    crate::trace!("chunk header: {:?}, length={}", header.ty, header.length);

    if header.ty == ChunkType::IDAT {
      if self.header.is_none() || self.idat_done {
        self.source = Some(source);
        self.fail(PngError::ChunkOrderViolation);
        return;
      }
      if self.header.unwrap().color_type == crate::ihdr::PngColorType::Indexed && self.palette.is_none() {
        self.source = Some(source);
        self.fail(PngError::MissingPalette);
        return;
      }
      crate::trace!("entering IDAT stream, starting DEFLATE decompressor");
      self.chunk_log.processed.push(ChunkType::IDAT);
      let idat_source = IdatSource::new(source, header, self.options.verify_crc);
      let deflate = match Deflate::new(idat_source) {
        Ok(d) => d,
        Err(e) => {
          self.fail(e);
          return;
        }
      };
      self.reconstructor =
        Some(Reconstructor::new(deflate, self.header.unwrap(), self.palette.clone()));
      self.state = DriverState::ReadFromDeflate;
      return;
    }

    let chunk = match read_chunk_payload(&mut source, header, self.options.verify_crc) {
      Ok(c) => c,
      Err(e) => {
        self.source = Some(source);
        self.fail(e);
        return;
      }
    };
    self.source = Some(source);

    self.chunk_log.processed.push(chunk.ty);
    if !chunk.crc_ok {
      self.chunk_log.crc_errors.push(chunk.ty);
      if chunk.ty.is_critical() {
        self.fail(PngError::CrcMismatch);
        return;
      }
      debug_assert!(PngError::CrcMismatch.is_recoverable_in_ancillary_chunk());
    }

    match chunk.ty {
      ChunkType::IHDR => {
        if self.header.is_some() {
          self.fail(PngError::DuplicateCriticalChunk);
          return;
        }
        match PngHeader::from_ihdr_chunk(&chunk) {
          Ok(h) => {
            self.header = Some(h);
            self.seen_critical.push(chunk.ty);
          }
          Err(e) => self.fail(e),
        }
      }
      ChunkType::PLTE => {
        if self.header.is_none() {
          self.fail(PngError::ChunkOrderViolation);
          return;
        }
        if self.seen_critical.contains(&ChunkType::PLTE) {
          self.fail(PngError::DuplicateCriticalChunk);
          return;
        }
        match Palette::from_plte_data(&chunk.data) {
          Ok(p) => {
            self.palette = Some(p);
            self.seen_critical.push(chunk.ty);
          }
          Err(e) => {
            // A malformed PLTE is only load-bearing for Indexed color; on
            // Truecolor/TruecolorAlpha it is merely a suggested palette, so
            // the stream can still be decoded by skipping it.
            if self.header.unwrap().color_type == crate::ihdr::PngColorType::Indexed {
              self.fail(e);
            } else {
              self.chunk_log.chunk_errors.push(chunk.ty);
            }
          }
        }
      }
      ChunkType::IEND => {
        if self.header.is_none() {
          self.fail(PngError::ChunkOrderViolation);
          return;
        }
        crate::trace!("IEND reached, decode finished");
        self.state = DriverState::Finished;
      }
      other => {
        if self.header.is_none() {
          self.fail(PngError::ChunkOrderViolation);
          return;
        }
        if other.is_critical() {
          self.fail(PngError::UnknownCriticalChunk);
          return;
        }
        self.ancillary.push(Ancillary::parse(&chunk));
      }
    }
  }

  fn step_deflate(&mut self) -> Option<ImageReturnInfo> {
    let is_interlaced = self.is_interlaced();
    let is_last_pass = {
      let reconstructor =
        self.reconstructor.as_mut().expect("reconstructor present while streaming IDAT");
      match reconstructor.process_next_pass() {
        Ok(done) => done,
        Err(e) => {
          self.fail(e);
          return Some(ImageReturnInfo { valid: false, is_interlaced, is_final: false });
        }
      }
    };

    if !is_last_pass {
      crate::trace!("interlace pass complete, more passes remain");
      if self.options.receive_interlaced {
        self.state = DriverState::ResumeDeflate;
        let valid = self.no_recoverable_errors_yet();
        return Some(ImageReturnInfo { valid, is_interlaced, is_final: false });
      }
      return None;
    }
    crate::trace!("final pass complete, leaving the IDAT stream");

    let reconstructor = self.reconstructor.take().expect("checked above");
    let (idat_source, image) = reconstructor.into_parts();
    let source = match idat_source.finish() {
      Ok(source) => source,
      Err(e) => {
        self.fail(e);
        return Some(ImageReturnInfo { valid: false, is_interlaced, is_final: false });
      }
    };
    self.source = Some(source);
    self.image = Some(image);
    self.idat_done = true;
    self.state = DriverState::ReadChunks;

    if self.options.receive_interlaced {
      let valid = self.no_recoverable_errors_yet();
      Some(ImageReturnInfo { valid, is_interlaced, is_final: true })
    } else {
      None
    }
  }
}
