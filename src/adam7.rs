//! Adam7 interlace pass geometry: reduced per-pass dimensions and the
//! mapping from a pass-local pixel position back to its position in the
//! full image.

/// Ceiling division for the Adam7 reduced-dimension formulas, which all take
/// the shape `ceil((full - offset) / stride)` with `full - offset` clamped to
/// zero when the subtraction would otherwise go negative (an image narrower
/// or shorter than a pass's starting offset simply contributes no pixels to
/// that pass).
#[inline]
const fn ceil_div_after_offset(full: u32, offset: u32, stride: u32) -> u32 {
  let numerator = full.saturating_sub(offset);
  (numerator + stride - 1) / stride
}

/// The reduced `(width, height)` of each of the 8 "images" Adam7 divides a
/// full image into: index 0 is the full image itself (used when the image is
/// not interlaced), indices 1..=7 are the seven interlace passes.
#[must_use]
pub const fn reduced_image_dimensions(full_width: u32, full_height: u32) -> [(u32, u32); 8] {
  // ```
  // 1 6 4 6 2 6 4 6
  // 7 7 7 7 7 7 7 7
  // 5 6 5 6 5 6 5 6
  // 7 7 7 7 7 7 7 7
  // 3 6 4 6 3 6 4 6
  // 7 7 7 7 7 7 7 7
  // 5 6 5 6 5 6 5 6
  // 7 7 7 7 7 7 7 7
  // ```
  let zero = (full_width, full_height);
  let first = (ceil_div_after_offset(full_width, 0, 8), ceil_div_after_offset(full_height, 0, 8));
  let second = (ceil_div_after_offset(full_width, 4, 8), ceil_div_after_offset(full_height, 0, 8));
  let third = (ceil_div_after_offset(full_width, 0, 4), ceil_div_after_offset(full_height, 4, 8));
  let fourth = (ceil_div_after_offset(full_width, 2, 4), ceil_div_after_offset(full_height, 0, 4));
  let fifth = (ceil_div_after_offset(full_width, 0, 2), ceil_div_after_offset(full_height, 2, 4));
  let sixth = (ceil_div_after_offset(full_width, 1, 2), ceil_div_after_offset(full_height, 0, 2));
  let seventh = (full_width, ceil_div_after_offset(full_height, 1, 2));

  [zero, first, second, third, fourth, fifth, sixth, seventh]
}

/// Maps a pixel position within interlace pass `image_level` (1..=7) back to
/// its position in the full image. `image_level == 0` is the identity
/// mapping, used when the image is not interlaced.
#[inline]
#[must_use]
pub const fn interlaced_pos_to_full_pos(
  image_level: usize, reduced_x: u32, reduced_y: u32,
) -> (u32, u32) {
  #[allow(clippy::identity_op)]
  match image_level {
    0 => (reduced_x, reduced_y),
    1 => (reduced_x * 8 + 0, reduced_y * 8 + 0),
    2 => (reduced_x * 8 + 4, reduced_y * 8 + 0),
    3 => (reduced_x * 4 + 0, reduced_y * 8 + 4),
    4 => (reduced_x * 4 + 2, reduced_y * 4 + 0),
    5 => (reduced_x * 2 + 0, reduced_y * 4 + 2),
    6 => (reduced_x * 2 + 1, reduced_y * 2 + 0),
    7 => (reduced_x * 1 + 0, reduced_y * 2 + 1),
    _ => panic!("interlace pass level must be 0 through 7"),
  }
}
