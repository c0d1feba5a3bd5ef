//! Attribute-subset projection.

use crate::error::Error;
use crate::tuple::Tuple;

/// A projection spec: either every attribute (`*`) or an ordered list of
/// 1-based attribute indices, which may repeat or reorder attributes.
#[derive(Clone, Debug)]
pub enum Projection {
    All,
    Attrs(Vec<usize>),
}

impl Projection {
    pub fn parse(spec: &str) -> Result<Projection, Error> {
        let spec = spec.trim();
        if spec == "*" {
            return Ok(Projection::All);
        }
        let mut attrs = Vec::new();
        for part in spec.split(',') {
            let part = part.trim();
            let idx: usize = part
                .parse()
                .map_err(|_| Error::malformed(format!("bad projection attribute index {part:?}")))?;
            if idx == 0 {
                return Err(Error::malformed("projection attribute indices are 1-based"));
            }
            attrs.push(idx - 1);
        }
        Ok(Projection::Attrs(attrs))
    }

    /// Renders `tuple` through this projection as a comma-separated string.
    pub fn project(&self, tuple: &Tuple) -> Result<String, Error> {
        match self {
            Projection::All => Ok(tuple.as_str().to_string()),
            Projection::Attrs(idxs) => {
                let values = tuple.values();
                let mut out = Vec::with_capacity(idxs.len());
                for &i in idxs {
                    let v = values
                        .get(i)
                        .ok_or_else(|| Error::malformed(format!("projection index {} out of range", i + 1)))?;
                    out.push(*v);
                }
                Ok(out.join(","))
            }
        }
    }
}
