//! `Selection`: partial-match candidate-bucket enumeration and intra-page
//! tuple scanning, exposed as a Rust iterator.

use crate::bits::Bits;
use crate::error::Error;
use crate::page::{Page, PageId, NO_PAGE};
use crate::relation::Relation;
use crate::tuple::{Pattern, Tuple};

/// An in-progress partial-match query over a relation.
///
/// Borrows the relation mutably for its lifetime (page reads go through the
/// relation's own I/O handles); construct and fully drain one selection at a
/// time, matching the single-writer/no-concurrent-readers model.
pub struct Selection<'r> {
    rel: &'r mut Relation,
    pattern: Pattern,
    q_hash: Bits,
    known: Bits,
    cur_bid: PageId,
    max_bid: PageId,
    cur_page: Page,
    cur_offset: usize,
}

impl<'r> Selection<'r> {
    /// Starts a selection for `pattern` against `rel` (`setup` +
    /// `startSelection`).
    pub fn new(rel: &'r mut Relation, pattern: Pattern) -> Result<Selection<'r>, Error> {
        let known_attrs = pattern.known_attrs();
        let known = rel.choice_vector().known_mask(&known_attrs);
        let q_hash = rel.choice_vector().tuple_hash(&pattern.raw_values()) & known;

        let depth = rel.depth();
        let (cur_bid, max_bid) = if depth == 0 {
            (0, 0)
        } else {
            let cur = q_hash.low(depth).as_u32();
            let mut max = (q_hash | !known).low(depth + 1).as_u32();
            if max >= rel.npages() {
                max = rel.npages() - 1;
            }
            (cur, max)
        };

        let cur_page = rel.get_data_page(cur_bid)?;
        Ok(Selection { rel, pattern, q_hash, known, cur_bid, max_bid, cur_page, cur_offset: 0 })
    }

    /// Whether bucket `bid` could hold tuples matching `q_hash`/`known`,
    /// accounting for buckets not yet split off the low-order range (the
    /// two-term predicate).
    fn is_candidate(&self, bid: PageId) -> bool {
        let masked = (self.known & Bits::new(bid)) ^ self.q_hash;
        let depth = self.rel.depth();
        masked.low(depth + 1).as_u32() == 0 || (bid >= self.rel.sp() && masked.low(depth).as_u32() == 0)
    }

    /// Advances to the next page worth scanning: either the current
    /// bucket's next overflow page, or the next candidate bucket's primary
    /// page. Returns `false` once the scan is exhausted.
    fn move_to_next_page(&mut self) -> bool {
        let next_ovflow = self.cur_page.ovflow();
        if next_ovflow != NO_PAGE {
            if let Ok(page) = self.rel.get_ovflow_page(next_ovflow) {
                self.cur_page = page;
                self.cur_offset = 0;
                return true;
            }
            return false;
        }

        for bid in (self.cur_bid + 1)..=self.max_bid {
            if self.is_candidate(bid) {
                if let Ok(page) = self.rel.get_data_page(bid) {
                    self.cur_bid = bid;
                    self.cur_page = page;
                    self.cur_offset = 0;
                    return true;
                }
                return false;
            }
        }
        false
    }

    /// Scans the remainder of the current page for the next tuple matching
    /// the pattern, if any.
    fn next_match_in_page(&mut self) -> Option<Tuple> {
        loop {
            let mut iter = self.cur_page.tuples_from(self.cur_offset);
            let (text, next_offset) = iter.next()?;
            self.cur_offset = next_offset;
            let tuple = Tuple::from_raw(text.to_string());
            if self.pattern.matches(&tuple) {
                return Some(tuple);
            }
        }
    }
}

impl<'r> Iterator for Selection<'r> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        if let Some(tuple) = self.next_match_in_page() {
            return Some(tuple);
        }
        while self.move_to_next_page() {
            if let Some(tuple) = self.next_match_in_page() {
                return Some(tuple);
            }
        }
        None
    }
}
