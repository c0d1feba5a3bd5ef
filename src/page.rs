//! Bucket pages: a small header followed by a packed, `\0`-terminated
//! sequence of tuple strings.

use crate::aligned::Buffer;
use crate::error::PageFull;
use crate::PAGESIZE;

/// A page id, either in the data file or in the overflow file, depending
/// on context (a bucket id vs. an `ovflow` link).
pub type PageId = u32;

/// Sentinel meaning "no page", terminates an overflow chain.
pub const NO_PAGE: PageId = u32::MAX;

const OFF_FREE: usize = 0;
const OFF_OVFLOW: usize = 2;
const OFF_NTUPLES: usize = 6;

/// Byte size of the page header (`free: u16`, `ovflow: u32`, `ntuples: u16`).
pub const HEADER_SIZE: usize = 8;

/// A single `PAGESIZE` bucket or overflow page.
#[derive(Clone)]
pub struct Page {
    buffer: Box<Buffer>,
}

impl Page {
    pub fn new() -> Page {
        let mut buffer = Buffer::new();
        write_u16(&mut buffer, OFF_FREE, 0);
        write_u32(&mut buffer, OFF_OVFLOW, NO_PAGE);
        write_u16(&mut buffer, OFF_NTUPLES, 0);
        Page { buffer }
    }

    pub(crate) fn from_buffer(buffer: Box<Buffer>) -> Page {
        Page { buffer }
    }

    pub(crate) fn buffer_ref(&self) -> &Buffer {
        &self.buffer
    }

    /// Bytes of packed tuple data currently in use.
    pub fn free(&self) -> usize {
        read_u16(&self.buffer, OFF_FREE) as usize
    }

    fn set_free(&mut self, value: usize) {
        write_u16(&mut self.buffer, OFF_FREE, value as u16);
    }

    pub fn ovflow(&self) -> PageId {
        read_u32(&self.buffer, OFF_OVFLOW)
    }

    pub fn set_ovflow(&mut self, page_id: PageId) {
        write_u32(&mut self.buffer, OFF_OVFLOW, page_id);
    }

    pub fn ntuples(&self) -> u16 {
        read_u16(&self.buffer, OFF_NTUPLES)
    }

    fn set_ntuples(&mut self, value: u16) {
        write_u16(&mut self.buffer, OFF_NTUPLES, value);
    }

    /// Bytes still available for more tuple data.
    pub fn free_space(&self) -> usize {
        PAGESIZE - HEADER_SIZE - self.free()
    }

    fn data(&self) -> &[u8] {
        &self.buffer[HEADER_SIZE..HEADER_SIZE + self.free()]
    }

    /// Appends `tuple` plus a `\0` terminator. Fails with [`PageFull`] (and
    /// leaves the page unchanged) if there isn't enough free space.
    pub fn add(&mut self, tuple: &str) -> Result<(), PageFull> {
        let needed = tuple.len() + 1;
        if needed > self.free_space() {
            return Err(PageFull);
        }
        let start = HEADER_SIZE + self.free();
        self.buffer[start..start + tuple.len()].copy_from_slice(tuple.as_bytes());
        self.buffer[start + tuple.len()] = 0;
        self.set_free(self.free() + needed);
        self.set_ntuples(self.ntuples() + 1);
        Ok(())
    }

    /// Empties this page's tuple data but preserves its `ovflow` link, used
    /// mid-split, when a bucket's pages are rebuilt in place.
    pub fn clear_keep_ovflow(&mut self) {
        let ovflow = self.ovflow();
        for b in self.buffer[HEADER_SIZE..].iter_mut() {
            *b = 0;
        }
        self.set_free(0);
        self.set_ntuples(0);
        self.set_ovflow(ovflow);
    }

    /// Iterates the tuples packed into this page, starting at byte offset
    /// `from` within the data region (not the whole page).
    pub fn tuples_from(&self, from: usize) -> PageTupleIter<'_> {
        PageTupleIter { data: self.data(), offset: from }
    }

    pub fn tuples(&self) -> PageTupleIter<'_> {
        self.tuples_from(0)
    }
}

impl Default for Page {
    fn default() -> Page {
        Page::new()
    }
}

/// Yields `(tuple text, byte offset of the next tuple)` pairs, letting a
/// caller resume a scan from wherever it left off.
pub struct PageTupleIter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for PageTupleIter<'a> {
    type Item = (&'a str, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }
        let start = self.offset;
        let rel_end = self.data[start..].iter().position(|&b| b == 0)?;
        let end = start + rel_end;
        let text = std::str::from_utf8(&self.data[start..end]).expect("page tuple data is valid utf8");
        self.offset = end + 1;
        Some((text, self.offset))
    }
}

fn read_u16(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes(buf[off..off + 2].try_into().unwrap())
}

fn write_u16(buf: &mut [u8], off: usize, val: u16) {
    buf[off..off + 2].copy_from_slice(&val.to_le_bytes());
}

fn read_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}

fn write_u32(buf: &mut [u8], off: usize, val: u32) {
    buf[off..off + 4].copy_from_slice(&val.to_le_bytes());
}
