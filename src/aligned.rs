//! Fixed-size page buffer.
//!
//! A `repr(align)` byte array that derefs to `[u8]` so callers can slice
//! into it directly. No checksum or page-type tag is carried alongside it;
//! this page format has no checksum field.

use std::ops::{Deref, DerefMut};

use crate::PAGESIZE;

/// One page's worth of bytes, aligned generously enough for direct I/O on
/// common block sizes even though `PAGESIZE` itself may be smaller.
#[repr(C, align(4096))]
#[derive(Clone)]
pub struct Buffer {
    data: [u8; PAGESIZE],
}

impl Buffer {
    pub fn new() -> Box<Buffer> {
        Box::new(Buffer::zeroed())
    }

    pub fn zeroed() -> Buffer {
        Buffer { data: [0u8; PAGESIZE] }
    }
}

impl Default for Buffer {
    fn default() -> Buffer {
        Buffer::zeroed()
    }
}

impl Deref for Buffer {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_buffer_is_all_zero() {
        let buf = Buffer::zeroed();
        assert!(buf.iter().all(|&b| b == 0));
        assert_eq!(buf.len(), PAGESIZE);
    }

    #[test]
    fn deref_mut_writes_through() {
        let mut buf = Buffer::new();
        buf[0] = 42;
        assert_eq!(buf[0], 42);
    }
}
