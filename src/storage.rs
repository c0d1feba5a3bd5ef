//! `PagedFile`: a flat file addressed as a sequence of fixed-`PAGESIZE`
//! pages.
//!
//! This deliberately avoids `O_DIRECT`. Bypassing the page cache that way
//! requires the I/O buffer's address, offset, and length to all be
//! multiples of the underlying device's logical block size, a constraint
//! this format can't guarantee in general (`PAGESIZE` is 1024, many devices
//! use 4096-byte sectors, and `O_DIRECT` is refused outright on some
//! filesystems, including the `tmpfs` scratch directories tests run
//! against). Ordinary buffered I/O plus an explicit `sync_data` on write
//! gives the same durability guarantee (writes are flushed before they're
//! considered durable) without that portability trap.

use std::{
    fs::{File, OpenOptions},
    io::{self, prelude::*, SeekFrom},
    path::Path,
};

use crate::aligned::Buffer;
use crate::PAGESIZE;

#[derive(Debug)]
pub struct PagedFile {
    file: File,
}

impl PagedFile {
    /// Opens `path`, creating it if it doesn't exist yet.
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<PagedFile> {
        let file = OpenOptions::new().create(true).read(true).write(true).open(path)?;
        Ok(PagedFile { file })
    }

    pub fn page_size(&self) -> usize {
        PAGESIZE
    }

    /// Number of whole pages currently in the file.
    pub fn page_count(&mut self) -> io::Result<u64> {
        let len = self.file.seek(SeekFrom::End(0))?;
        Ok(len / PAGESIZE as u64)
    }

    pub fn read_page(&mut self, page_number: u64, buf: &mut Buffer) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(page_number * PAGESIZE as u64))?;
        self.file.read_exact(&mut buf[..])?;
        Ok(())
    }

    pub fn write_page(&mut self, page_number: u64, buf: &Buffer) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(page_number * PAGESIZE as u64))?;
        self.file.write_all(&buf[..])?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Appends `buf` as a new page at the end of the file, returning its
    /// page number.
    pub fn append_page(&mut self, buf: &Buffer) -> io::Result<u64> {
        let offset = self.file.seek(SeekFrom::End(0))?;
        let page_number = offset / PAGESIZE as u64;
        self.file.write_all(&buf[..])?;
        self.file.sync_data()?;
        Ok(page_number)
    }
}
