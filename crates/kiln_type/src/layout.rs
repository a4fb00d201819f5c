//! Size and alignment rules for the 64-bit target.

/// Size of a machine word (pointers, `size`, slice/string header fields).
pub const WORD_SIZE: u64 = 8;

/// Marks a type whose size is not known (functions, unbounded arrays).
pub const SIZE_UNDEFINED: u64 = u64::MAX;

/// Marks a type whose alignment is not known.
pub const ALIGN_UNDEFINED: u64 = u64::MAX;

/// Size of a tagged union discriminant (`u32`).
pub const TAG_SIZE: u64 = 4;

/// Offsets inside the three-word header shared by slices and strings.
pub const SLICE_LENGTH_OFFSET: u64 = 0;
pub const SLICE_CAPACITY_OFFSET: u64 = WORD_SIZE;
pub const SLICE_DATA_OFFSET: u64 = 2 * WORD_SIZE;

/// Size and alignment of a type, as computed at canonicalization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
  pub size: u64,
  pub align: u64,
}

impl Layout {
  pub const UNDEFINED: Layout = Layout {
    size: SIZE_UNDEFINED,
    align: ALIGN_UNDEFINED,
  };

  pub const fn new(
    size: u64,
    align: u64,
  ) -> Self {
    Self { size, align }
  }

  pub fn is_sized(&self) -> bool {
    self.size != SIZE_UNDEFINED
  }
}

/// Round `offset` up to the next multiple of `align`.
pub fn align_up(
  offset: u64,
  align: u64,
) -> u64 {
  if align == 0 || align == ALIGN_UNDEFINED {
    return offset;
  }
  offset.div_ceil(align) * align
}

/// Lay out members left to right, inserting padding before each member so it
/// sits at a multiple of its own alignment. Returns the aggregate layout and
/// the offset of every member.
pub fn sequential(members: &[Layout]) -> (Layout, Vec<u64>) {
  let mut offsets = Vec::with_capacity(members.len());
  let mut align = 1;
  let mut end = 0;

  for member in members {
    if !member.is_sized() {
      offsets.push(align_up(end, member.align));
      return (Layout::UNDEFINED, fill_offsets(offsets, members.len()));
    }
    let offset = align_up(end, member.align);
    offsets.push(offset);
    end = end.max(offset + member.size);
    align = align.max(member.align);
  }

  (Layout::new(align_up(end, align), align), offsets)
}

fn fill_offsets(
  mut offsets: Vec<u64>,
  len: usize,
) -> Vec<u64> {
  offsets.resize(len, SIZE_UNDEFINED);
  offsets
}

/// Overlapping members: widest member wins, no trailing padding.
pub fn overlapping(members: &[Layout]) -> Layout {
  let mut size = 0;
  let mut align = 1;
  for member in members {
    if !member.is_sized() {
      return Layout::UNDEFINED;
    }
    size = size.max(member.size);
    align = align.max(member.align);
  }
  Layout::new(size, align)
}

/// A `u32` discriminant followed by the widest member.
pub fn tagged(members: &[Layout]) -> Layout {
  let payload = overlapping(members);
  if !payload.is_sized() {
    return Layout::UNDEFINED;
  }
  let align = payload.align.max(TAG_SIZE);
  let size = align_up(tagged_payload_offset(payload.align) + payload.size, align);
  Layout::new(size, align)
}

/// Offset of the payload inside a tagged union whose widest member alignment is `member_align`.
pub fn tagged_payload_offset(member_align: u64) -> u64 {
  align_up(TAG_SIZE, member_align)
}

/// Array of `length` members. Unbounded arrays, and arrays whose size does not
/// fit in a `u64`, are unsized.
pub fn array(
  member: Layout,
  length: Option<u64>,
) -> Layout {
  let size = length
    .filter(|_| member.is_sized())
    .and_then(|len| member.size.checked_mul(len))
    .filter(|size| *size != SIZE_UNDEFINED)
    .unwrap_or(SIZE_UNDEFINED);
  Layout::new(size, member.align)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align_up() {
    assert_eq!(align_up(0, 8), 0);
    assert_eq!(align_up(1, 8), 8);
    assert_eq!(align_up(8, 8), 8);
    assert_eq!(align_up(9, 4), 12);
    assert_eq!(align_up(5, 1), 5);
  }

  #[test]
  fn test_sequential_inserts_padding() {
    // { a: u8, b: u32, c: u16 }
    let (layout, offsets) = sequential(&[Layout::new(1, 1), Layout::new(4, 4), Layout::new(2, 2)]);
    assert_eq!(offsets, vec![0, 4, 8]);
    assert_eq!(layout, Layout::new(12, 4));
  }

  #[test]
  fn test_sequential_empty_is_zero_sized() {
    let (layout, offsets) = sequential(&[]);
    assert!(offsets.is_empty());
    assert_eq!(layout, Layout::new(0, 1));
  }

  #[test]
  fn test_overlapping_takes_widest() {
    let layout = overlapping(&[Layout::new(3, 1), Layout::new(2, 2)]);
    assert_eq!(layout, Layout::new(3, 2));
  }

  #[test]
  fn test_tagged_layout() {
    // (u8 | u64): tag at 0, payload at 8
    assert_eq!(tagged(&[Layout::new(1, 1), Layout::new(8, 8)]), Layout::new(16, 8));
    // (u8 | u16): tag at 0, payload at 4
    assert_eq!(tagged(&[Layout::new(1, 1), Layout::new(2, 2)]), Layout::new(8, 4));
  }

  #[test]
  fn test_unbounded_array_is_unsized() {
    let layout = array(Layout::new(4, 4), None);
    assert!(!layout.is_sized());
    assert_eq!(layout.align, 4);
  }

  #[test]
  fn test_overflowing_array_is_unsized() {
    assert!(!array(Layout::new(8, 8), Some(u64::MAX / 4)).is_sized());
    assert!(!array(Layout::new(1, 1), Some(u64::MAX)).is_sized());
    assert_eq!(array(Layout::new(8, 8), Some(u64::MAX / 8)).size, u64::MAX / 8 * 8);
  }
}
