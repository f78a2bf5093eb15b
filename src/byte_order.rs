//! Helpers for reading network byte-order integers out of header buffers.
//!
//! Header parsing works on borrowed slices that may be shorter than a full
//! header, so each reader takes an offset and returns `None` when the field
//! would run past the end of the slice. Writers live on [`bytes::BufMut`],
//! whose `put_u16`/`put_u32` already emit big-endian bytes.

/// Read a network-order `u16` starting at `offset`.
///
/// # Examples
///
/// ```
/// use serp::byte_order::read_network_u16_at;
///
/// assert_eq!(read_network_u16_at(&[0xff, 0x12, 0x34], 1), Some(0x1234));
/// assert_eq!(read_network_u16_at(&[0x12], 0), None);
/// ```
#[must_use]
pub fn read_network_u16_at(bytes: &[u8], offset: usize) -> Option<u16> {
    let field = bytes.get(offset..offset.checked_add(2)?)?;
    let array = <[u8; 2]>::try_from(field).ok()?;
    Some(u16::from_be_bytes(array))
}

/// Read a network-order `u32` starting at `offset`.
///
/// # Examples
///
/// ```
/// use serp::byte_order::read_network_u32_at;
///
/// assert_eq!(
///     read_network_u32_at(&[0x12, 0x34, 0x56, 0x78], 0),
///     Some(0x1234_5678)
/// );
/// assert_eq!(read_network_u32_at(&[0x12, 0x34, 0x56, 0x78], 1), None);
/// ```
#[must_use]
pub fn read_network_u32_at(bytes: &[u8], offset: usize) -> Option<u32> {
    let field = bytes.get(offset..offset.checked_add(4)?)?;
    let array = <[u8; 4]>::try_from(field).ok()?;
    Some(u32::from_be_bytes(array))
}

/// Read a single byte starting at `offset`.
#[must_use]
pub fn read_u8_at(bytes: &[u8], offset: usize) -> Option<u8> { bytes.get(offset).copied() }
