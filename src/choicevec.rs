//! Choice vector: the ordered `(attribute, bit)` list that defines how a
//! tuple's composite hash is assembled.

use crate::bits::Bits;
use crate::error::Error;
use crate::hash::hash_any;

/// Width of the composite hash / choice vector, in bits.
pub const MAXCHVEC: usize = 32;

/// One entry of a choice vector: "bit `bit` of attribute `att`'s hash becomes
/// this composite-hash bit".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct ChoiceVectorItem {
    pub att: u8,
    pub bit: u8,
}

/// A fixed `MAXCHVEC`-entry choice vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceVector {
    items: [ChoiceVectorItem; MAXCHVEC],
}

impl ChoiceVector {
    /// Parses a `"att:bit,att:bit,..."` spec, requiring exactly `MAXCHVEC`
    /// entries and in-range attribute/bit indices.
    pub fn parse(spec: &str, nattrs: u8) -> Result<ChoiceVector, Error> {
        let mut items = [ChoiceVectorItem::default(); MAXCHVEC];
        let mut count = 0usize;
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (a, b) = part
                .split_once(':')
                .ok_or_else(|| Error::malformed(format!("bad choice-vector entry {part:?}")))?;
            let att: u8 = a
                .trim()
                .parse()
                .map_err(|_| Error::malformed(format!("bad attribute index {a:?}")))?;
            let bit: u8 = b
                .trim()
                .parse()
                .map_err(|_| Error::malformed(format!("bad bit index {b:?}")))?;
            if att >= nattrs {
                return Err(Error::malformed(format!(
                    "choice-vector attribute index {att} out of range for {nattrs} attributes"
                )));
            }
            if bit as usize >= MAXCHVEC {
                return Err(Error::malformed(format!("choice-vector bit index {bit} out of range")));
            }
            if count >= MAXCHVEC {
                return Err(Error::malformed(format!("choice vector has more than {MAXCHVEC} entries")));
            }
            items[count] = ChoiceVectorItem { att, bit };
            count += 1;
        }
        if count != MAXCHVEC {
            return Err(Error::malformed(format!(
                "choice vector must have exactly {MAXCHVEC} entries, found {count}"
            )));
        }
        Ok(ChoiceVector { items })
    }

    /// Reconstructs a choice vector from entries already validated once
    /// (used when reading a relation's info file back off disk).
    pub(crate) fn from_items(items: [ChoiceVectorItem; MAXCHVEC]) -> ChoiceVector {
        ChoiceVector { items }
    }

    pub fn items(&self) -> &[ChoiceVectorItem; MAXCHVEC] {
        &self.items
    }

    pub fn to_spec_string(&self) -> String {
        self.items
            .iter()
            .map(|it| format!("{}:{}", it.att, it.bit))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Composite hash of `values` (one string per attribute): each
    /// referenced attribute's `hash_any` is computed once, then each
    /// choice-vector entry copies one bit of its attribute's hash into the
    /// matching composite-hash bit.
    pub fn tuple_hash(&self, values: &[&str]) -> Bits {
        let mut attr_hashes: Vec<Option<u32>> = vec![None; values.len()];
        for item in &self.items {
            let i = item.att as usize;
            if attr_hashes[i].is_none() {
                attr_hashes[i] = Some(hash_any(values[i].as_bytes()));
            }
        }
        let mut composite = Bits::ZERO;
        for (j, item) in self.items.iter().enumerate() {
            let attr_hash = attr_hashes[item.att as usize].expect("computed above for every referenced attribute");
            if Bits::new(attr_hash).test(item.bit as u32) {
                composite = composite.set(j as u32);
            }
        }
        composite
    }

    /// Composite-hash bitmask of the entries whose attribute is marked known
    /// in `known_attrs` (indexed by attribute number).
    pub fn known_mask(&self, known_attrs: &[bool]) -> Bits {
        let mut mask = Bits::ZERO;
        for (j, item) in self.items.iter().enumerate() {
            if known_attrs[item.att as usize] {
                mask = mask.set(j as u32);
            }
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with(mapping: &[(u8, u8)]) -> String {
        mapping
            .iter()
            .cycle()
            .take(MAXCHVEC)
            .map(|(a, b)| format!("{a}:{b}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn parse_requires_exact_width() {
        let short = "0:0,1:0";
        assert!(ChoiceVector::parse(short, 2).is_err());
    }

    #[test]
    fn parse_rejects_out_of_range_attribute() {
        let spec = spec_with(&[(5, 0)]);
        assert!(ChoiceVector::parse(&spec, 2).is_err());
    }

    #[test]
    fn tuple_hash_is_deterministic() {
        let spec = spec_with(&[(0, 0), (1, 1), (0, 2)]);
        let cv = ChoiceVector::parse(&spec, 2).unwrap();
        let h1 = cv.tuple_hash(&["alice", "30"]);
        let h2 = cv.tuple_hash(&["alice", "30"]);
        assert_eq!(h1, h2);
    }

    #[test]
    fn known_mask_only_covers_known_attributes() {
        let spec = spec_with(&[(0, 0), (1, 1)]);
        let cv = ChoiceVector::parse(&spec, 2).unwrap();
        // every entry references attribute 0 or 1, so if both are known every
        // composite bit is known, and if neither is known, none are.
        let all_known = cv.known_mask(&[true, true]);
        assert_eq!(all_known.as_u32(), u32::MAX);
        let none_known = cv.known_mask(&[false, false]);
        assert_eq!(none_known.as_u32(), 0);
    }
}
