//! Interned strings
//!
//! Strings are immutable byte arrays with a precomputed, seeded hash.
//! Short strings (at most [`SHORT_LIMIT`] bytes) are canonicalized through
//! the runtime's intern table, so id equality implies value equality and a
//! table lookup never compares their bytes. Long strings are created fresh
//! and hash lazily the first time they are used as a table key.

use std::cell::Cell;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tern_gc::{Arena, GcHeader, GcObject, kinds};

use crate::error::VmResult;
use crate::gc::GcState;
use crate::heap::StrId;
use crate::memory::MemoryManager;
use crate::value::Value;

/// Strings up to this many bytes are interned.
pub const SHORT_LIMIT: usize = 40;

/// Initial capacity of the intern index.
pub const MIN_INTERN_CAPACITY: usize = 32;

/// Seeded string hash.
///
/// Long inputs are sampled rather than walked byte-by-byte: the step grows
/// with the length so hashing stays O(32) regardless of size.
pub fn str_hash(bytes: &[u8], seed: u32) -> u32 {
    let len = bytes.len();
    let mut h = seed ^ len as u32;
    let step = (len >> 5) + 1;
    let mut l1 = len;
    while l1 >= step {
        h ^= (h << 5)
            .wrapping_add(h >> 2)
            .wrapping_add(bytes[l1 - 1] as u32);
        l1 -= step;
    }
    h
}

/// An immutable runtime string.
#[repr(C)]
pub struct LStr {
    header: GcHeader,
    /// For short strings: the hash, valid from construction. For long
    /// strings: the seed until the first use as a key, then the hash.
    hash: Cell<u32>,
    /// "hash is valid"; always true for short strings.
    has_hash: Cell<bool>,
    bytes: Box<[u8]>,
}

impl LStr {
    fn short(bytes: Box<[u8]>, hash: u32, white: u8) -> Self {
        Self {
            header: GcHeader::new(kinds::SHORT_STRING, white),
            hash: Cell::new(hash),
            has_hash: Cell::new(true),
            bytes,
        }
    }

    fn long(bytes: Box<[u8]>, seed: u32, white: u8) -> Self {
        Self {
            header: GcHeader::new(kinds::LONG_STRING, white),
            hash: Cell::new(seed),
            has_hash: Cell::new(false),
            bytes,
        }
    }

    /// Raw bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The bytes as UTF-8, if they are.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for the empty string.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True if this is an interned short string.
    #[inline]
    pub fn is_short(&self) -> bool {
        self.header.tag() == kinds::SHORT_STRING
    }

    /// The string's hash, computing and caching it on first use for long
    /// strings.
    pub fn hash(&self) -> u32 {
        if !self.has_hash.get() {
            self.hash.set(str_hash(&self.bytes, self.hash.get()));
            self.has_hash.set(true);
        }
        self.hash.get()
    }

    /// Bytes this object accounts for in the memory manager.
    pub(crate) fn footprint(&self) -> usize {
        std::mem::size_of::<Self>() + self.bytes.len()
    }
}

impl GcObject for LStr {
    fn header(&self) -> &GcHeader {
        &self.header
    }
}

impl std::fmt::Debug for LStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "LStr({s:?})"),
            None => write!(f, "LStr({} bytes)", self.bytes.len()),
        }
    }
}

/// Canonicalization index for short strings: seeded hash to collision
/// bucket. The arena owns the strings; the table only indexes them.
pub struct StringTable {
    buckets: FxHashMap<u32, SmallVec<[StrId; 2]>>,
    nuse: usize,
}

impl StringTable {
    /// Empty table.
    pub fn new() -> Self {
        Self {
            buckets: FxHashMap::default(),
            nuse: 0,
        }
    }

    /// Pre-size the index for at least `n` strings.
    pub fn resize(&mut self, n: usize) {
        self.buckets.reserve(n);
    }

    /// Number of interned strings.
    #[inline]
    pub fn len(&self) -> usize {
        self.nuse
    }

    /// True if nothing is interned.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nuse == 0
    }

    /// Intern a short byte string, returning the canonical id.
    pub(crate) fn intern(
        &mut self,
        strings: &mut Arena<StrId, LStr>,
        mem: &mut MemoryManager,
        gc: &mut GcState,
        seed: u32,
        bytes: &[u8],
    ) -> VmResult<StrId> {
        debug_assert!(bytes.len() <= SHORT_LIMIT);
        let hash = str_hash(bytes, seed);
        if let Some(bucket) = self.buckets.get(&hash)
            && let Some(&id) = bucket
                .iter()
                .find(|&&id| strings[id].as_bytes() == bytes)
        {
            return Ok(id);
        }
        let white = gc.white();
        let s = LStr::short(bytes.into(), hash, white);
        mem.realloc(gc, 0, s.footprint())?;
        let id = strings.alloc(s);
        self.buckets.entry(hash).or_default().push(id);
        self.nuse += 1;
        Ok(id)
    }

    /// Drop the index; used at teardown after the arena is drained.
    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
        self.nuse = 0;
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a long string without interning.
pub(crate) fn new_long(
    strings: &mut Arena<StrId, LStr>,
    mem: &mut MemoryManager,
    gc: &mut GcState,
    seed: u32,
    bytes: &[u8],
) -> VmResult<StrId> {
    let white = gc.white();
    let s = LStr::long(bytes.into(), seed, white);
    mem.realloc(gc, 0, s.footprint())?;
    Ok(strings.alloc(s))
}

/// Create a string value, interning it when short.
pub(crate) fn new_string(
    table: &mut StringTable,
    strings: &mut Arena<StrId, LStr>,
    mem: &mut MemoryManager,
    gc: &mut GcState,
    seed: u32,
    bytes: &[u8],
) -> VmResult<Value> {
    if bytes.len() <= SHORT_LIMIT {
        let id = table.intern(strings, mem, gc, seed, bytes)?;
        Ok(Value::ShortStr(id))
    } else {
        let id = new_long(strings, mem, gc, seed, bytes)?;
        Ok(Value::LongStr(id))
    }
}

/// Mark a string as never collectable (pre-built infrastructure strings).
pub(crate) fn fix(strings: &Arena<StrId, LStr>, id: StrId) {
    strings[id].header().fix();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (StringTable, Arena<StrId, LStr>, MemoryManager, GcState) {
        (
            StringTable::new(),
            Arena::new(),
            MemoryManager::unlimited(),
            GcState::new(),
        )
    }

    #[test]
    fn hash_is_seeded_and_deterministic() {
        let h1 = str_hash(b"hello", 1);
        let h2 = str_hash(b"hello", 1);
        let h3 = str_hash(b"hello", 2);
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }

    #[test]
    fn interning_canonicalizes() {
        let (mut t, mut strings, mut mem, mut gc) = fixture();
        let a = t.intern(&mut strings, &mut mem, &mut gc, 7, b"key").unwrap();
        let b = t.intern(&mut strings, &mut mem, &mut gc, 7, b"key").unwrap();
        let c = t.intern(&mut strings, &mut mem, &mut gc, 7, b"other").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn long_strings_hash_lazily() {
        let (_, mut strings, mut mem, mut gc) = fixture();
        let bytes = vec![b'x'; SHORT_LIMIT + 10];
        let id = new_long(&mut strings, &mut mem, &mut gc, 99, &bytes).unwrap();
        let s = &strings[id];
        assert!(!s.is_short());
        assert!(!s.has_hash.get());
        let h = s.hash();
        assert!(s.has_hash.get());
        assert_eq!(h, str_hash(&bytes, 99));
        assert_eq!(s.hash(), h); // cached
    }

    #[test]
    fn fix_pins_string() {
        let (mut t, mut strings, mut mem, mut gc) = fixture();
        let id = t
            .intern(&mut strings, &mut mem, &mut gc, 0, b"not enough memory")
            .unwrap();
        fix(&strings, id);
        assert!(strings[id].header().is_fixed());
    }

    #[test]
    fn interning_accounts_bytes() {
        let (mut t, mut strings, mut mem, mut gc) = fixture();
        let before = mem.total_bytes();
        t.intern(&mut strings, &mut mem, &mut gc, 0, b"abc").unwrap();
        let after = mem.total_bytes();
        assert_eq!(after - before, std::mem::size_of::<LStr>() + 3);
        // interning the same string again allocates nothing
        t.intern(&mut strings, &mut mem, &mut gc, 0, b"abc").unwrap();
        assert_eq!(mem.total_bytes(), after);
    }
}
