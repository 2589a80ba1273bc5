//! Memo table of search results, keyed by position
//!
//! A key combines the board fingerprint with the remaining search depth and
//! the side to move, so a result is only reused by a search that would have
//! computed exactly the same thing. Entries remember whether their score is
//! exact or only a bound produced by an alpha-beta cutoff.

use anyhow::{anyhow, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use std::collections::HashMap;
use std::io::{Read, Write};

use crate::WIDTH;

/// 2 bits per cell encoding of a full grid, see [`crate::BoardState::fingerprint`]
pub type Fingerprint = u128;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct CacheKey {
    pub fingerprint: Fingerprint,
    /// remaining search depth the result was produced with
    pub depth: usize,
    pub maximizing: bool,
}

impl CacheKey {
    pub fn new(fingerprint: Fingerprint, depth: usize, maximizing: bool) -> Self {
        Self {
            fingerprint,
            depth,
            maximizing,
        }
    }
}

/// The chosen column (if any) and the score of a position on player one's axis
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SearchResult {
    pub column: Option<usize>,
    pub score: i32,
}

impl SearchResult {
    pub fn new(column: Option<usize>, score: i32) -> Self {
        Self { column, score }
    }

    /// A result with no move attached, for terminal and depth-limited positions
    pub fn leaf(score: i32) -> Self {
        Self {
            column: None,
            score,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Bound {
    Exact,
    /// the true score is at least the stored score
    Lower,
    /// the true score is at most the stored score
    Upper,
}

impl Bound {
    fn to_byte(self) -> u8 {
        match self {
            Bound::Exact => 0,
            Bound::Lower => 1,
            Bound::Upper => 2,
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(Bound::Exact),
            1 => Ok(Bound::Lower),
            2 => Ok(Bound::Upper),
            _ => Err(anyhow!("invalid bound marker {} in cache data", byte)),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Entry {
    pub result: SearchResult,
    pub bound: Bound,
}

impl Entry {
    pub fn exact(result: SearchResult) -> Self {
        Self {
            result,
            bound: Bound::Exact,
        }
    }

    /// Tags a fail-soft search result with the window it was searched in
    pub fn classify(result: SearchResult, alpha: i32, beta: i32) -> Self {
        let bound = if result.score <= alpha {
            Bound::Upper
        } else if result.score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        Self { result, bound }
    }

    /// Whether this entry settles a node searched in the window (alpha, beta)
    pub fn decides(&self, alpha: i32, beta: i32) -> bool {
        match self.bound {
            Bound::Exact => true,
            Bound::Lower => self.result.score >= beta,
            Bound::Upper => self.result.score <= alpha,
        }
    }
}

/// Unbounded map from position to previously computed search results
#[derive(Clone, Default, Debug)]
pub struct TranspositionCache {
    entries: HashMap<CacheKey, Entry>,
}

impl TranspositionCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn lookup(&self, key: &CacheKey) -> Option<Entry> {
        self.entries.get(key).copied()
    }

    /// Stores an entry, replacing anything already stored for the key
    pub fn store(&mut self, key: CacheKey, entry: Entry) {
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CacheKey, &Entry)> {
        self.entries.iter()
    }

    /// Adds every entry of `other`, which wins where both have a key
    pub fn merge(&mut self, other: &TranspositionCache) {
        self.entries
            .extend(other.entries.iter().map(|(key, entry)| (*key, *entry)));
    }

    /// Writes the cache as a big-endian entry count followed by fixed size records
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        // sorted so the same cache always produces the same bytes
        let mut keys: Vec<&CacheKey> = self.entries.keys().collect();
        keys.sort_unstable();

        writer.write_u64::<BigEndian>(keys.len() as u64)?;
        for key in keys {
            let entry = &self.entries[key];
            writer.write_u128::<BigEndian>(key.fingerprint)?;
            writer.write_u32::<BigEndian>(key.depth as u32)?;
            writer.write_u8(key.maximizing as u8)?;
            writer.write_u8(entry.bound.to_byte())?;
            // WIDTH is never a valid column
            writer.write_u8(entry.result.column.unwrap_or(WIDTH) as u8)?;
            writer.write_i32::<BigEndian>(entry.result.score)?;
        }
        Ok(())
    }

    /// Reads a cache written by [`TranspositionCache::write_to`]
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let count = reader.read_u64::<BigEndian>()?;
        let mut cache = Self::new();

        for _ in 0..count {
            let fingerprint = reader.read_u128::<BigEndian>()?;
            let depth = reader.read_u32::<BigEndian>()? as usize;
            let maximizing = match reader.read_u8()? {
                0 => false,
                1 => true,
                other => return Err(anyhow!("invalid side marker {} in cache data", other)),
            };
            let bound = Bound::from_byte(reader.read_u8()?)?;
            let column = match reader.read_u8()? as usize {
                WIDTH => None,
                column if column < WIDTH => Some(column),
                other => return Err(anyhow!("invalid column {} in cache data", other)),
            };
            let score = reader.read_i32::<BigEndian>()?;

            cache.store(
                CacheKey::new(fingerprint, depth, maximizing),
                Entry {
                    result: SearchResult::new(column, score),
                    bound,
                },
            );
        }
        Ok(cache)
    }
}
