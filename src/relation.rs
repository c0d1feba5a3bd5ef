//! `Relation`: the three-file (`.info`/`.data`/`.ovflow`) container that
//! owns a multi-attribute linear-hashed file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::choicevec::{ChoiceVector, ChoiceVectorItem, MAXCHVEC};
use crate::error::Error;
use crate::page::{Page, PageId, NO_PAGE};
use crate::storage::PagedFile;
use crate::tuple::Tuple;

const INFO_HEADER_INTS: usize = 5; // nattrs, depth, sp, npages, ntups

fn with_ext(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// An open multi-attribute linear-hashed relation.
pub struct Relation {
    nattrs: u32,
    depth: u32,
    sp: u32,
    npages: u32,
    ntups: u32,
    cv: ChoiceVector,
    writable: bool,
    closed: bool,
    info_path: PathBuf,
    data: PagedFile,
    ovflow: PagedFile,
}

impl Relation {
    /// Creates a brand-new relation named `base` (writes `<base>.info`,
    /// `<base>.data`, `<base>.ovflow`) with `npages` empty primary pages and
    /// the given initial linear-hashing depth and choice vector.
    pub fn create<P: AsRef<Path>>(
        base: P,
        nattrs: u32,
        npages: u32,
        depth: u32,
        choice_vector_spec: &str,
    ) -> Result<Relation, Error> {
        let cv = ChoiceVector::parse(choice_vector_spec, nattrs as u8)?;
        let base = base.as_ref();
        let info_path = with_ext(base, "info");
        let data_path = with_ext(base, "data");
        let ovflow_path = with_ext(base, "ovflow");

        File::create(&info_path)?;
        let mut data = PagedFile::from_path(&data_path)?;
        let ovflow = PagedFile::from_path(&ovflow_path)?;

        let empty = Page::new();
        for _ in 0..npages {
            data.append_page(empty.buffer_ref())?;
        }

        let mut rel = Relation {
            nattrs,
            depth,
            sp: 0,
            npages,
            ntups: 0,
            cv,
            writable: true,
            closed: false,
            info_path,
            data,
            ovflow,
        };
        rel.write_header()?;
        log::info!("created relation {:?}: nattrs={nattrs} npages={npages} depth={depth}", base);
        Ok(rel)
    }

    /// Opens an existing relation. `writable` governs whether `insert` is
    /// allowed and whether the header gets rewritten on close/drop.
    pub fn open<P: AsRef<Path>>(base: P, writable: bool) -> Result<Relation, Error> {
        let base = base.as_ref();
        let info_path = with_ext(base, "info");
        let data_path = with_ext(base, "data");
        let ovflow_path = with_ext(base, "ovflow");

        let (nattrs, depth, sp, npages, ntups, cv) = read_header(&info_path)?;
        let data = PagedFile::from_path(&data_path)?;
        let ovflow = PagedFile::from_path(&ovflow_path)?;

        log::info!("opened relation {:?} ({})", base, if writable { "read-write" } else { "read-only" });
        Ok(Relation {
            nattrs,
            depth,
            sp,
            npages,
            ntups,
            cv,
            writable,
            closed: false,
            info_path,
            data,
            ovflow,
        })
    }

    /// Flushes the header (if writable) and consumes the relation.
    pub fn close(mut self) -> Result<(), Error> {
        if self.writable {
            self.write_header()?;
        }
        self.closed = true;
        log::info!("closed relation {:?}", self.info_path);
        Ok(())
    }

    pub fn nattrs(&self) -> u32 {
        self.nattrs
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn sp(&self) -> u32 {
        self.sp
    }

    pub fn npages(&self) -> u32 {
        self.npages
    }

    pub fn ntups(&self) -> u32 {
        self.ntups
    }

    pub fn choice_vector(&self) -> &ChoiceVector {
        &self.cv
    }

    /// Maximum tuples a bucket's primary page holds before a split is
    /// triggered, `floor(102.4 / nattrs)`, preserved verbatim from the
    /// reference implementation rather than re-derived from `PAGESIZE`
    /// (see DESIGN.md's Open Question notes).
    fn capacity(nattrs: u32) -> u32 {
        ((102.4 / nattrs as f64).floor() as u32).max(1)
    }

    fn bucket_of(&self, hash: crate::bits::Bits) -> PageId {
        if self.depth == 0 {
            return 0;
        }
        let candidate = hash.low(self.depth).as_u32();
        if candidate < self.sp {
            hash.low(self.depth + 1).as_u32()
        } else {
            candidate
        }
    }

    /// Inserts `tuple`, splitting a bucket first if the insert would push
    /// the relation's tuple count across a capacity threshold.
    pub fn insert(&mut self, tuple: &Tuple) -> Result<PageId, Error> {
        if !self.writable {
            return Err(Error::ReadOnly);
        }
        if tuple.len() + 1 > crate::PAGESIZE - crate::page::HEADER_SIZE {
            return Err(Error::TupleTooLarge { len: tuple.len() });
        }

        let cap = Self::capacity(self.nattrs);
        if self.ntups > 0 && self.ntups % cap == 0 {
            self.split()?;
        }

        let values = tuple.values();
        let hash = self.cv.tuple_hash(&values);
        let bucket = self.bucket_of(hash);

        let mut primary = self.get_data_page(bucket)?;
        if primary.add(tuple.as_str()).is_ok() {
            self.put_data_page(bucket, &primary)?;
            self.ntups += 1;
            return Ok(bucket);
        }

        log::warn!("bucket {bucket} primary page full, falling through to overflow chain");
        if primary.ovflow() == NO_PAGE {
            let mut fresh = Page::new();
            fresh.add(tuple.as_str()).expect("a fresh page always fits one validated tuple");
            let new_id = self.append_ovflow_page(&fresh)?;
            primary.set_ovflow(new_id);
            self.put_data_page(bucket, &primary)?;
            self.ntups += 1;
            return Ok(bucket);
        }

        let mut cur = primary.ovflow();
        loop {
            let mut page = self.get_ovflow_page(cur)?;
            if page.add(tuple.as_str()).is_ok() {
                self.put_ovflow_page(cur, &page)?;
                self.ntups += 1;
                return Ok(bucket);
            }
            if page.ovflow() == NO_PAGE {
                let mut fresh = Page::new();
                fresh.add(tuple.as_str()).expect("a fresh page always fits one validated tuple");
                let new_id = self.append_ovflow_page(&fresh)?;
                page.set_ovflow(new_id);
                self.put_ovflow_page(cur, &page)?;
                self.ntups += 1;
                return Ok(bucket);
            }
            cur = page.ovflow();
        }
    }

    /// Splits the bucket at the current split pointer, redistributing its
    /// tuples between itself and a freshly appended bucket, then advances
    /// `sp`/`depth`.
    fn split(&mut self) -> Result<(), Error> {
        if self.depth as usize >= MAXCHVEC {
            return Err(Error::CapacityExceeded);
        }

        let sp = self.sp;
        let new_bid = self.append_data_page(&Page::new())?;
        self.npages += 1;
        log::debug!("splitting bucket {sp} into {new_bid} at depth {}", self.depth);

        let mut stay = Page::new();
        let mut moved = Page::new();

        let mut cur_id = sp;
        let mut in_ovflow = false;
        loop {
            let mut page = if in_ovflow { self.get_ovflow_page(cur_id)? } else { self.get_data_page(cur_id)? };

            let tuples: Vec<String> = page.tuples().map(|(t, _)| t.to_string()).collect();
            for raw in tuples {
                let tuple = Tuple::from_raw(raw);
                let hash = self.cv.tuple_hash(&tuple.values());
                if hash.test(self.depth) {
                    if moved.add(tuple.as_str()).is_err() {
                        self.flush_to_bucket(new_bid, &moved)?;
                        moved = Page::new();
                        moved.add(tuple.as_str()).expect("fresh page fits one validated tuple");
                    }
                } else if stay.add(tuple.as_str()).is_err() {
                    self.flush_to_bucket(sp, &stay)?;
                    stay = Page::new();
                    stay.add(tuple.as_str()).expect("fresh page fits one validated tuple");
                }
            }

            let next = page.ovflow();
            page.clear_keep_ovflow();
            if in_ovflow {
                self.put_ovflow_page(cur_id, &page)?;
            } else {
                self.put_data_page(cur_id, &page)?;
            }

            if next == NO_PAGE {
                break;
            }
            cur_id = next;
            in_ovflow = true;
        }

        if stay.ntuples() > 0 {
            self.flush_to_bucket(sp, &stay)?;
        }
        if moved.ntuples() > 0 {
            self.flush_to_bucket(new_bid, &moved)?;
        }

        if self.sp < (1u32 << self.depth) - 1 {
            self.sp += 1;
        } else {
            self.sp = 0;
            self.depth += 1;
        }

        Ok(())
    }

    /// Writes `buf`'s tuples into the first page of `bucket`'s chain with
    /// room (an emptied-by-split page, detected via `ntuples() == 0`), or
    /// appends `buf` as a new overflow page at the chain's tail.
    fn flush_to_bucket(&mut self, bucket: PageId, buf: &Page) -> Result<(), Error> {
        let mut cur_id = bucket;
        let mut in_ovflow = false;
        loop {
            let page = if in_ovflow { self.get_ovflow_page(cur_id)? } else { self.get_data_page(cur_id)? };
            if page.ntuples() == 0 {
                let mut out = buf.clone();
                out.set_ovflow(page.ovflow());
                if in_ovflow {
                    self.put_ovflow_page(cur_id, &out)?;
                } else {
                    self.put_data_page(cur_id, &out)?;
                }
                return Ok(());
            }
            let next = page.ovflow();
            if next == NO_PAGE {
                let new_id = self.append_ovflow_page(buf)?;
                let mut tail = page;
                tail.set_ovflow(new_id);
                if in_ovflow {
                    self.put_ovflow_page(cur_id, &tail)?;
                } else {
                    self.put_data_page(cur_id, &tail)?;
                }
                return Ok(());
            }
            cur_id = next;
            in_ovflow = true;
        }
    }

    pub(crate) fn get_data_page(&mut self, id: PageId) -> Result<Page, Error> {
        log::trace!("reading data page {id}");
        let mut buf = crate::aligned::Buffer::new();
        self.data.read_page(id as u64, &mut buf)?;
        Ok(Page::from_buffer(buf))
    }

    pub(crate) fn get_ovflow_page(&mut self, id: PageId) -> Result<Page, Error> {
        log::trace!("reading overflow page {id}");
        let mut buf = crate::aligned::Buffer::new();
        self.ovflow.read_page(id as u64, &mut buf)?;
        Ok(Page::from_buffer(buf))
    }

    fn put_data_page(&mut self, id: PageId, page: &Page) -> Result<(), Error> {
        log::trace!("writing data page {id}");
        self.data.write_page(id as u64, page.buffer_ref())?;
        Ok(())
    }

    fn put_ovflow_page(&mut self, id: PageId, page: &Page) -> Result<(), Error> {
        log::trace!("writing overflow page {id}");
        self.ovflow.write_page(id as u64, page.buffer_ref())?;
        Ok(())
    }

    fn append_data_page(&mut self, page: &Page) -> Result<PageId, Error> {
        Ok(self.data.append_page(page.buffer_ref())? as PageId)
    }

    fn append_ovflow_page(&mut self, page: &Page) -> Result<PageId, Error> {
        Ok(self.ovflow.append_page(page.buffer_ref())? as PageId)
    }

    fn write_header(&mut self) -> Result<(), Error> {
        write_header_to(&self.info_path, self.nattrs, self.depth, self.sp, self.npages, self.ntups, &self.cv)
    }

    /// Collects a snapshot of global and per-bucket statistics.
    pub fn stats(&mut self) -> Result<RelationStats, Error> {
        let mut buckets = Vec::with_capacity(self.npages as usize);
        for bid in 0..self.npages {
            let page = self.get_data_page(bid)?;
            let mut chain = vec![PageSummary::from_page(bid, &page)];
            let mut ovf = page.ovflow();
            while ovf != NO_PAGE {
                let cur = ovf;
                let p = self.get_ovflow_page(cur)?;
                ovf = p.ovflow();
                chain.push(PageSummary::from_page(cur, &p));
            }
            buckets.push(BucketSummary { bucket_id: bid, chain });
        }
        Ok(RelationStats {
            nattrs: self.nattrs,
            npages: self.npages,
            ntups: self.ntups,
            depth: self.depth,
            sp: self.sp,
            choice_vector: self.cv.to_spec_string(),
            buckets,
        })
    }
}

impl Drop for Relation {
    fn drop(&mut self) {
        if self.writable && !self.closed {
            if let Err(e) = self.write_header() {
                log::warn!("failed to flush relation header for {:?} on drop: {e}", self.info_path);
            }
        }
    }
}

fn read_header(path: &Path) -> Result<(u32, u32, u32, u32, u32, ChoiceVector), Error> {
    let mut f = File::open(path)?;
    let mut ints = [0u8; INFO_HEADER_INTS * 4];
    f.read_exact(&mut ints)?;
    let nattrs = u32::from_le_bytes(ints[0..4].try_into().unwrap());
    let depth = u32::from_le_bytes(ints[4..8].try_into().unwrap());
    let sp = u32::from_le_bytes(ints[8..12].try_into().unwrap());
    let npages = u32::from_le_bytes(ints[12..16].try_into().unwrap());
    let ntups = u32::from_le_bytes(ints[16..20].try_into().unwrap());

    let mut cv_bytes = [0u8; MAXCHVEC * 2];
    f.read_exact(&mut cv_bytes)?;
    let mut items = [ChoiceVectorItem::default(); MAXCHVEC];
    for (i, item) in items.iter_mut().enumerate() {
        *item = ChoiceVectorItem { att: cv_bytes[i * 2], bit: cv_bytes[i * 2 + 1] };
    }

    Ok((nattrs, depth, sp, npages, ntups, ChoiceVector::from_items(items)))
}

fn write_header_to(
    path: &Path,
    nattrs: u32,
    depth: u32,
    sp: u32,
    npages: u32,
    ntups: u32,
    cv: &ChoiceVector,
) -> Result<(), Error> {
    let mut f = OpenOptions::new().write(true).open(path)?;
    f.write_all(&nattrs.to_le_bytes())?;
    f.write_all(&depth.to_le_bytes())?;
    f.write_all(&sp.to_le_bytes())?;
    f.write_all(&npages.to_le_bytes())?;
    f.write_all(&ntups.to_le_bytes())?;
    for item in cv.items() {
        f.write_all(&[item.att, item.bit])?;
    }
    f.sync_data()?;
    Ok(())
}

/// Per-page facts reported by [`Relation::stats`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct PageSummary {
    pub page_id: PageId,
    pub ntuples: u16,
    pub free_bytes: usize,
    pub ovflow: Option<PageId>,
}

impl PageSummary {
    fn from_page(page_id: PageId, page: &Page) -> PageSummary {
        let ovflow = page.ovflow();
        PageSummary {
            page_id,
            ntuples: page.ntuples(),
            free_bytes: page.free_space(),
            ovflow: if ovflow == NO_PAGE { None } else { Some(ovflow) },
        }
    }
}

/// A bucket's primary page plus its overflow chain.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BucketSummary {
    pub bucket_id: PageId,
    pub chain: Vec<PageSummary>,
}

/// A full statistics snapshot of a relation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RelationStats {
    pub nattrs: u32,
    pub npages: u32,
    pub ntups: u32,
    pub depth: u32,
    pub sp: u32,
    pub choice_vector: String,
    pub buckets: Vec<BucketSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::scratch_relation;

    fn flat_choice_vector(nattrs: u8) -> String {
        // cycles bit j through attribute (j % nattrs), bit (j / nattrs).
        // any valid MAXCHVEC-wide vector works for these tests.
        (0..MAXCHVEC)
            .map(|j| format!("{}:{}", (j as u8) % nattrs, j / nattrs as usize))
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn create_then_reopen_roundtrips_header() {
        let path = scratch_relation("relation-roundtrip");
        let cv = flat_choice_vector(3);
        let rel = Relation::create(&path, 3, 1, 0, &cv).unwrap();
        rel.close().unwrap();

        let reopened = Relation::open(&path, false).unwrap();
        assert_eq!(reopened.nattrs(), 3);
        assert_eq!(reopened.npages(), 1);
        assert_eq!(reopened.depth(), 0);
        assert_eq!(reopened.sp(), 0);
        assert_eq!(reopened.ntups(), 0);
    }

    #[test]
    fn insert_and_find_round_trip() {
        let path = scratch_relation("relation-insert");
        let cv = flat_choice_vector(2);
        let mut rel = Relation::create(&path, 2, 1, 0, &cv).unwrap();

        let tuple = Tuple::parse("alice,30", 2).unwrap();
        rel.insert(&tuple).unwrap();
        assert_eq!(rel.ntups(), 1);

        let bucket_id = rel.bucket_of(rel.choice_vector().tuple_hash(&tuple.values()));
        let page = rel.get_data_page(bucket_id).unwrap();
        let found: Vec<&str> = page.tuples().map(|(t, _)| t).collect();
        assert!(found.contains(&"alice,30"));
    }

    #[test]
    fn read_only_relation_rejects_insert() {
        let path = scratch_relation("relation-readonly");
        let cv = flat_choice_vector(1);
        Relation::create(&path, 1, 1, 0, &cv).unwrap().close().unwrap();

        let mut rel = Relation::open(&path, false).unwrap();
        let tuple = Tuple::parse("x", 1).unwrap();
        assert!(matches!(rel.insert(&tuple), Err(Error::ReadOnly)));
    }

    #[test]
    fn splitting_preserves_all_tuples() {
        let path = scratch_relation("relation-split");
        let cv = flat_choice_vector(1);
        let mut rel = Relation::create(&path, 1, 1, 0, &cv).unwrap();

        let cap = Relation::capacity(1) as usize;
        let n = cap * 4 + 3;
        for i in 0..n {
            let tuple = Tuple::parse(&format!("row-{i}"), 1).unwrap();
            rel.insert(&tuple).unwrap();
        }
        assert_eq!(rel.ntups() as usize, n);
        assert!(rel.npages() > 1, "inserting past capacity should have triggered at least one split");

        let mut seen = std::collections::HashSet::new();
        for bid in 0..rel.npages() {
            let mut ovf = {
                let page = rel.get_data_page(bid).unwrap();
                for (t, _) in page.tuples() {
                    seen.insert(t.to_string());
                }
                page.ovflow()
            };
            while ovf != NO_PAGE {
                let page = rel.get_ovflow_page(ovf).unwrap();
                for (t, _) in page.tuples() {
                    seen.insert(t.to_string());
                }
                ovf = page.ovflow();
            }
        }
        assert_eq!(seen.len(), n);
    }
}
