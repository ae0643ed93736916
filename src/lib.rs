#![cfg_attr(not(feature = "trace"), no_std)]
#![forbid(unsafe_code)]
//#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "trace")]
extern crate std;

#[macro_export]
macro_rules! trace {
  ($($arg:tt)*) => {
    #[cfg(feature = "trace")] {
      ::std::print!("{file}:{line}> ", file = file!(), line = line!());
      ::std::println!($($arg)*);
    }
  }
}

mod error;
pub use error::*;

mod byte_source;
pub use byte_source::*;

mod bit_reader;
pub use bit_reader::BitReader;

mod huffman;
pub use huffman::{CodeLengthTable, DistTable, HuffmanTable, LitLenTable};

mod deflate;
pub use deflate::Deflate;

mod chunk;
pub use chunk::*;

mod adam7;
pub use adam7::{interlaced_pos_to_full_pos, reduced_image_dimensions};

mod ihdr;
pub use ihdr::*;

mod palette;
pub use palette::Palette;

mod ancillary;
pub use ancillary::*;

mod pixel_format;
pub use pixel_format::*;

mod reconstruct;
pub use reconstruct::Reconstructor;

mod decoder;
pub use decoder::*;
