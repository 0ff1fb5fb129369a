//! Tables
//!
//! The language's sole structured aggregate. A table keeps its entries in
//! two parts: a dense *array part* for positive integer keys `1..=n`, and a
//! *hash part* of chained scatter nodes with Brent's variation. The array
//! part's size is the largest `n` such that at least half the slots between
//! 1 and `n` are in use. The main invariant of the hash part: if an entry
//! is not in its main position (the slot its hash points at), then the
//! colliding entry *is* in its own main position. Probe chains therefore
//! stay short even at 100% load.

use tern_gc::{Arena, GcHeader, GcObject, kinds};

use crate::error::{VmError, VmResult};
use crate::global::Global;
use crate::heap::{GcRef, Heap, StrId, TableId};
use crate::memory::checked_bytes;
use crate::string::LStr;
use crate::value::{Value, ceil_log2};

/// Max size of the array part is `2^MAX_BITS`.
pub const MAX_BITS: u32 = 30;

/// Largest integer key eligible for the array part.
pub const MAX_ARRAY_SIZE: usize = 1 << MAX_BITS;

/// One slot of the hash part. `next` chains colliding entries by node
/// index; an empty slot has a nil key and a nil value.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub(crate) key: Value,
    pub(crate) val: Value,
    pub(crate) next: Option<u32>,
}

const EMPTY_NODE: Node = Node {
    key: Value::Nil,
    val: Value::Nil,
    next: None,
};

/// Location of an entry inside a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Index into the array part (0-based).
    Array(usize),
    /// Index into the hash part.
    Hash(usize),
}

/// The hybrid array/hash aggregate.
pub struct Table {
    header: GcHeader,
    /// Bit `1 << m` set means tag method `m` is known absent (cache).
    pub(crate) flags: u8,
    /// Metatable, if any.
    pub(crate) metatable: Option<TableId>,
    array: Vec<Value>,
    /// Empty slice stands in for a zero-sized hash part.
    node: Box<[Node]>,
    /// Any free position is before this cursor; it only moves down.
    last_free: usize,
}

impl GcObject for Table {
    fn header(&self) -> &GcHeader {
        &self.header
    }
}

/// The index `k` would have in the array part, if it is an integer key in
/// range; the key did not match some condition otherwise.
pub(crate) fn array_index(key: &Value) -> Option<usize> {
    if let Value::Number(n) = key {
        let k = *n as i64;
        if k as f64 == *n && k > 0 && k as usize <= MAX_ARRAY_SIZE {
            return Some(k as usize);
        }
    }
    None
}

/// Raw key equality: numbers by value, short strings by id, long strings
/// by content, booleans by payload, everything else by object identity.
pub(crate) fn raw_equal(strings: &Arena<StrId, LStr>, a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::LightUserdata(x), Value::LightUserdata(y)) => x == y,
        (Value::LightFunction(x), Value::LightFunction(y)) => std::ptr::fn_addr_eq(*x, *y),
        (Value::ShortStr(x), Value::ShortStr(y)) => x == y,
        (Value::LongStr(x), Value::LongStr(y)) => {
            x == y || strings[*x].as_bytes() == strings[*y].as_bytes()
        }
        _ => a.tag_eq(b) && a.gc_ref() == b.gc_ref(),
    }
}

impl Table {
    /// Fresh empty table; both parts start at size zero.
    pub(crate) fn new(white: u8) -> Self {
        Self {
            header: GcHeader::new(kinds::TABLE, white),
            flags: !0,
            metatable: None,
            array: Vec::new(),
            node: Box::new([]),
            last_free: 0,
        }
    }

    /// Size of the array part.
    #[inline]
    pub fn array_size(&self) -> usize {
        self.array.len()
    }

    /// Size of the hash part (0 while it is the shared empty stand-in).
    #[inline]
    pub fn hash_size(&self) -> usize {
        self.node.len()
    }

    /// The metatable, if any.
    #[inline]
    pub fn metatable(&self) -> Option<TableId> {
        self.metatable
    }

    /// True once a failed lookup recorded tag method `tm` as absent.
    /// Any fresh key or metatable change clears the cache.
    #[inline]
    pub fn tag_method_absent(&self, tm: u8) -> bool {
        debug_assert!(tm < 8);
        self.flags & (1 << tm) != 0
    }

    /// Record that tag method `tm` is absent.
    #[inline]
    pub fn mark_tag_method_absent(&mut self, tm: u8) {
        debug_assert!(tm < 8);
        self.flags |= 1 << tm;
    }

    /// Key and value stored at a hash slot. Test and audit hook.
    #[doc(hidden)]
    pub fn node_entry(&self, i: usize) -> (Value, Value) {
        (self.node[i].key, self.node[i].val)
    }

    /// Bytes this table accounts for in the memory manager.
    pub(crate) fn footprint(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.array.len() * std::mem::size_of::<Value>()
            + self.node.len() * std::mem::size_of::<Node>()
    }

    /// Enumerate children for the mark phase. Dead keys are deliberately
    /// not visited: retaining their payload must not keep it alive.
    pub(crate) fn trace(&self, visit: &mut dyn FnMut(GcRef)) {
        if let Some(mt) = self.metatable {
            visit(GcRef::Table(mt));
        }
        for v in &self.array {
            if v.is_collectable()
                && let Some(r) = v.gc_ref()
            {
                visit(r);
            }
        }
        for n in &self.node {
            for v in [&n.key, &n.val] {
                if v.is_collectable()
                    && let Some(r) = v.gc_ref()
                {
                    visit(r);
                }
            }
        }
    }

    #[inline]
    fn hash_pow2(n: u64, size: usize) -> usize {
        n as usize & (size - 1)
    }

    /// For types whose bit patterns cluster (aligned pointers, object
    /// ids), avoid modulus by a power of 2; the `| 1` forces an odd
    /// divisor.
    #[inline]
    fn hash_mod(n: u64, size: usize) -> usize {
        (n % ((size - 1) | 1) as u64) as usize
    }

    fn hash_num(n: f64, size: usize) -> usize {
        let n = if n == 0.0 { 0.0 } else { n }; // -0 and +0 hash alike
        Self::hash_mod(n.to_bits(), size)
    }

    /// The main position of a key: the node index its hash selects.
    pub(crate) fn main_position(&self, strings: &Arena<StrId, LStr>, key: &Value) -> usize {
        debug_assert!(!self.node.is_empty());
        let size = self.node.len();
        match key {
            Value::Number(n) => Self::hash_num(*n, size),
            Value::ShortStr(id) | Value::LongStr(id) => {
                Self::hash_pow2(strings[*id].hash() as u64, size)
            }
            Value::Boolean(b) => Self::hash_pow2(*b as u64, size),
            Value::LightUserdata(p) => Self::hash_mod(*p as u64, size),
            Value::LightFunction(f) => Self::hash_mod(*f as usize as u64, size),
            other => {
                let r = other.gc_ref().expect("hashable key");
                Self::hash_mod(r.bits(), size)
            }
        }
    }

    /// Main position, or `None` while the table has no hash part.
    /// Test and audit hook.
    #[doc(hidden)]
    pub fn main_position_of(&self, strings: &Arena<StrId, LStr>, key: &Value) -> Option<usize> {
        if self.node.is_empty() {
            None
        } else {
            Some(self.main_position(strings, key))
        }
    }

    /// Locate an existing entry for `key` (its value may be nil).
    pub(crate) fn find(&self, strings: &Arena<StrId, LStr>, key: &Value) -> Option<Slot> {
        if key.is_nil() {
            return None;
        }
        if let Some(k) = array_index(key)
            && k <= self.array.len()
        {
            return Some(Slot::Array(k - 1));
        }
        if self.node.is_empty() {
            return None;
        }
        let mut i = self.main_position(strings, key);
        loop {
            let n = &self.node[i];
            if raw_equal(strings, &n.key, key) {
                return Some(Slot::Hash(i));
            }
            i = n.next? as usize;
        }
    }

    /// Lookup; missing keys yield nil, never an error.
    pub(crate) fn get(&self, strings: &Arena<StrId, LStr>, key: &Value) -> Value {
        match self.find(strings, key) {
            Some(Slot::Array(i)) => self.array[i],
            Some(Slot::Hash(i)) => self.node[i].val,
            None => Value::Nil,
        }
    }

    /// Specialized lookup for integer keys; used by the boundary search.
    pub(crate) fn get_int(&self, key: i64) -> Value {
        if key >= 1 && key as usize <= self.array.len() {
            return self.array[key as usize - 1];
        }
        if self.node.is_empty() {
            return Value::Nil;
        }
        let nk = key as f64;
        let mut i = Self::hash_num(nk, self.node.len());
        loop {
            let n = &self.node[i];
            if let Value::Number(m) = n.key
                && m == nk
            {
                return n.val;
            }
            match n.next {
                Some(nx) => i = nx as usize,
                None => return Value::Nil,
            }
        }
    }

    /// Scan the free cursor down to an empty slot (nil key).
    fn free_pos(&mut self) -> Option<usize> {
        while self.last_free > 0 {
            self.last_free -= 1;
            if self.node[self.last_free].key.is_nil() {
                return Some(self.last_free);
            }
        }
        None // could not find a free place
    }

    /// Insert a new key into the hash part. `Ok(Some(i))` is the node the
    /// key now owns (value still nil); `Ok(None)` means no free slot was
    /// found and the table must be rehashed, after which the whole insert
    /// is retried.
    pub(crate) fn insert_key(
        &mut self,
        strings: &Arena<StrId, LStr>,
        key: Value,
    ) -> VmResult<Option<usize>> {
        if key.is_nil() {
            return Err(VmError::runtime("table index is nil"));
        }
        if let Value::Number(n) = key
            && n.is_nan()
        {
            return Err(VmError::runtime("table index is NaN"));
        }
        if self.node.is_empty() {
            return Ok(None); // no hash part yet
        }
        let mp = self.main_position(strings, &key);
        if !self.node[mp].val.is_nil() {
            // main position is taken
            let Some(free) = self.free_pos() else {
                return Ok(None);
            };
            let other = self.main_position(strings, &self.node[mp].key);
            if other != mp {
                // colliding node is out of its main position; move it into
                // the free slot and put the new key at its main position
                let mut prev = other;
                while self.node[prev].next != Some(mp as u32) {
                    match self.node[prev].next {
                        Some(nx) => prev = nx as usize,
                        None => unreachable!("chain must pass through the disputed position"),
                    }
                }
                self.node[prev].next = Some(free as u32);
                self.node[free] = self.node[mp]; // next link moves along
                self.node[mp] = Node {
                    key,
                    val: Value::Nil,
                    next: None,
                };
                return Ok(Some(mp));
            }
            // colliding node owns its main position: the new key goes to
            // the free slot, chained right after it
            self.node[free].next = self.node[mp].next;
            self.node[mp].next = Some(free as u32);
            self.node[free].key = key;
            debug_assert!(self.node[free].val.is_nil());
            Ok(Some(free))
        } else {
            // main position is free (its key may be a stale leftover; the
            // chain through it stays intact)
            self.node[mp].key = key;
            debug_assert!(self.node[mp].val.is_nil());
            Ok(Some(mp))
        }
    }

    /// Count array-part keys per magnitude bucket: `nums[i]` gets the keys
    /// in `(2^(i-1), 2^i]`. Returns the total counted.
    fn count_array(&self, nums: &mut [usize; MAX_BITS as usize + 1]) -> usize {
        let mut ause = 0;
        let mut i = 1usize; // key under consideration
        let mut ttlg = 1usize; // 2^lg
        for lg in 0..=MAX_BITS as usize {
            let mut lc = 0;
            let mut lim = ttlg;
            if lim > self.array.len() {
                lim = self.array.len();
                if i > lim {
                    break; // no more elements to count
                }
            }
            while i <= lim {
                if !self.array[i - 1].is_nil() {
                    lc += 1;
                }
                i += 1;
            }
            nums[lg] += lc;
            ause += lc;
            ttlg = ttlg.saturating_mul(2);
        }
        ause
    }

    /// Count hash-part keys, adding integer keys to `nums` and to
    /// `*narray`. Returns the total number of live hash entries.
    fn count_hash(&self, nums: &mut [usize; MAX_BITS as usize + 1], narray: &mut usize) -> usize {
        let mut total = 0;
        for n in &self.node {
            if !n.val.is_nil() {
                *narray += count_int(&n.key, nums);
                total += 1;
            }
        }
        total
    }

    /// Some boundary of the table: an `i` where `t[i]` is non-nil and
    /// `t[i+1]` is nil (0 if `t[1]` is nil). On tables with holes any
    /// boundary is a valid answer.
    pub(crate) fn length(&self) -> i64 {
        let mut j = self.array.len();
        if j > 0 && self.array[j - 1].is_nil() {
            // there is a boundary in the array part: binary search for it
            let mut i = 0usize;
            while j - i > 1 {
                let m = (i + j) / 2;
                if self.array[m - 1].is_nil() {
                    j = m;
                } else {
                    i = m;
                }
            }
            i as i64
        } else if self.node.is_empty() {
            j as i64 // that is easy
        } else {
            self.unbound_search(j as u64)
        }
    }

    fn unbound_search(&self, mut i: u64) -> i64 {
        // i is zero or a present index
        let mut j = i + 1;
        // find i and j such that i is present and j is not
        while !self.get_int(j as i64).is_nil() {
            i = j;
            if j > i32::MAX as u64 / 2 {
                // table was built with bad purposes: resort to linear search
                let mut k = 1i64;
                while !self.get_int(k).is_nil() {
                    k += 1;
                }
                return k - 1;
            }
            j *= 2;
        }
        // binary search between them
        while j - i > 1 {
            let m = (i + j) / 2;
            if self.get_int(m as i64).is_nil() {
                j = m;
            } else {
                i = m;
            }
        }
        i as i64
    }

    /// Traversal index of `key`: array entries first, then hash entries.
    /// `-1` signals the beginning. A key that was since reclaimed to a
    /// dead key still resolves through its retained payload.
    fn find_index(&self, strings: &Arena<StrId, LStr>, key: &Value) -> VmResult<i64> {
        if key.is_nil() {
            return Ok(-1); // first iteration
        }
        if let Some(k) = array_index(key)
            && k <= self.array.len()
        {
            return Ok(k as i64 - 1);
        }
        if !self.node.is_empty() {
            let mut i = self.main_position(strings, key);
            loop {
                let n = &self.node[i];
                // the key may be dead already, but it is ok to use it in `next`
                let found = raw_equal(strings, &n.key, key)
                    || (matches!(n.key, Value::DeadKey(_))
                        && key.is_collectable()
                        && n.key.gc_ref() == key.gc_ref());
                if found {
                    // hash elements are numbered after array ones
                    return Ok(self.array.len() as i64 + i as i64);
                }
                match n.next {
                    Some(nx) => i = nx as usize,
                    None => break,
                }
            }
        }
        Err(VmError::runtime("invalid key to 'next'"))
    }

    /// The successor of `key` in traversal order, or `None` when done.
    pub(crate) fn next(
        &self,
        strings: &Arena<StrId, LStr>,
        key: &Value,
    ) -> VmResult<Option<(Value, Value)>> {
        let mut i = self.find_index(strings, key)? + 1;
        while (i as usize) < self.array.len() {
            let v = self.array[i as usize];
            if !v.is_nil() {
                return Ok(Some((Value::Number(i as f64 + 1.0), v)));
            }
            i += 1;
        }
        let mut i = i as usize - self.array.len();
        while i < self.node.len() {
            let n = &self.node[i];
            if !n.val.is_nil() {
                return Ok(Some((n.key, n.val)));
            }
            i += 1;
        }
        Ok(None)
    }
}

fn count_int(key: &Value, nums: &mut [usize; MAX_BITS as usize + 1]) -> usize {
    match array_index(key) {
        Some(k) => {
            nums[ceil_log2(k as u32) as usize] += 1;
            1
        }
        None => 0,
    }
}

/// New array size: the largest `2^i` such that more than half of the slots
/// in `1..=2^i` are in use. Returns `(size, keys_that_fit)`.
fn compute_sizes(nums: &[usize; MAX_BITS as usize + 1], narray: usize) -> (usize, usize) {
    let mut a = 0; // elements smaller than 2^i
    let mut na = 0; // elements that go to the array part
    let mut n = 0; // optimal size so far
    let mut twotoi = 1usize;
    for count in nums {
        if twotoi / 2 >= narray {
            break;
        }
        if *count > 0 {
            a += *count;
            if a > twotoi / 2 {
                // more than half the elements present?
                n = twotoi;
                na = a;
            }
        }
        if a == narray {
            break; // all elements counted
        }
        twotoi = twotoi.saturating_mul(2);
    }
    debug_assert!(n / 2 <= na && na <= n);
    (n, na)
}

impl Global {
    /// Create an empty table.
    pub fn new_table(&mut self) -> VmResult<TableId> {
        let white = self.gc.white();
        self.mem.alloc(&mut self.gc, std::mem::size_of::<Table>())?;
        Ok(self.heap.tables.alloc(Table::new(white)))
    }

    /// Lookup. Missing keys yield nil.
    pub fn table_get(&self, t: TableId, key: &Value) -> Value {
        self.heap.tables[t].get(&self.heap.strings, key)
    }

    /// Integer-key lookup.
    pub fn table_get_int(&self, t: TableId, key: i64) -> Value {
        self.heap.tables[t].get_int(key)
    }

    /// Store `key -> val`. Inserting a fresh key may rehash the table; a
    /// nil or NaN key is a runtime error.
    pub fn table_set(&mut self, t: TableId, key: &Value, val: Value) -> VmResult<()> {
        self.table_set_impl(t, key, val, true)
    }

    /// Store under an integer key.
    pub fn table_set_int(&mut self, t: TableId, key: i64, val: Value) -> VmResult<()> {
        self.table_set(t, &Value::Number(key as f64), val)
    }

    fn table_set_impl(&mut self, t: TableId, key: &Value, val: Value, barrier: bool) -> VmResult<()> {
        self.check_liveness(key);
        self.check_liveness(&val);
        loop {
            let Heap {
                tables, strings, ..
            } = &mut self.heap;
            let tbl = &mut tables[t];
            if let Some(slot) = tbl.find(strings, key) {
                match slot {
                    Slot::Array(i) => tbl.array[i] = val,
                    Slot::Hash(i) => tbl.node[i].val = val,
                }
            } else {
                match tbl.insert_key(strings, *key)? {
                    Some(n) => {
                        tbl.flags = 0; // a fresh key invalidates the tag-method cache
                        tbl.node[n].val = val;
                    }
                    None => {
                        // no free slot: grow, then retry the whole insert
                        self.table_rehash(t, key)?;
                        continue;
                    }
                }
            }
            if barrier {
                self.table_barrier(t, key);
                self.table_barrier(t, &val);
            }
            return Ok(());
        }
    }

    /// Backward barrier for a value just written into `t`.
    fn table_barrier(&mut self, t: TableId, v: &Value) {
        if !self.gc.running {
            return;
        }
        if v.is_collectable()
            && let Some(r) = v.gc_ref()
        {
            let Global { gc, heap, .. } = self;
            // the running thread is out of its arena slot; it is a root and
            // needs no barrier
            if heap.try_header(r).is_some_and(GcHeader::is_white) {
                gc.barrier_back(t, heap.tables[t].header());
            }
        }
    }

    /// Some boundary of the table (see [`Table::length`]).
    pub fn table_len(&self, t: TableId) -> i64 {
        self.heap.tables[t].length()
    }

    /// Traversal: the entry after `key` (nil key starts), or `None` at the
    /// end. Deleted entries are skipped; their keys remain traversable.
    pub fn table_next(&self, t: TableId, key: &Value) -> VmResult<Option<(Value, Value)>> {
        self.heap.tables[t].next(&self.heap.strings, key)
    }

    /// The table's metatable.
    pub fn table_metatable(&self, t: TableId) -> Option<TableId> {
        self.heap.tables[t].metatable
    }

    /// Replace the metatable, resetting the tag-method-absent cache.
    pub fn table_set_metatable(&mut self, t: TableId, mt: Option<TableId>) {
        let tbl = &mut self.heap.tables[t];
        tbl.metatable = mt;
        tbl.flags = !0;
        if let Some(m) = mt {
            self.table_barrier(t, &Value::Table(m));
        }
    }

    /// Grow to the computed optimal sizes, counting the pending `extra`
    /// key. Called when an insert finds no free hash slot.
    fn table_rehash(&mut self, t: TableId, extra: &Value) -> VmResult<()> {
        let mut nums = [0usize; MAX_BITS as usize + 1];
        let tbl = &self.heap.tables[t];
        let mut nasize = tbl.count_array(&mut nums); // keys in the array part
        let mut total = nasize; // all those keys are integer keys
        total += tbl.count_hash(&mut nums, &mut nasize); // plus keys in the hash part
        // count the extra key being inserted
        nasize += count_int(extra, &mut nums);
        total += 1;
        let (asize, na) = compute_sizes(&nums, nasize);
        tracing::trace!(
            old_array = tbl.array_size(),
            old_hash = tbl.hash_size(),
            new_array = asize,
            new_hash = total - na,
            "table rehash"
        );
        self.table_resize(t, asize, total - na)
    }

    /// Resize both parts. Storage for the new sizes is approved before any
    /// mutation, so a refused allocation leaves the table untouched; the
    /// old hash storage is released only after its entries have been
    /// re-inserted into the committed new storage.
    pub fn table_resize(&mut self, t: TableId, nasize: usize, nhsize: usize) -> VmResult<()> {
        let old_asize = self.heap.tables[t].array.len();
        // approve the new hash part first
        let node_real = if nhsize == 0 {
            0
        } else {
            let lsize = ceil_log2(nhsize as u32);
            if lsize > MAX_BITS {
                return Err(VmError::runtime("table overflow"));
            }
            1usize << lsize
        };
        let node_bytes = checked_bytes(node_real, std::mem::size_of::<Node>())?;
        self.mem.alloc(&mut self.gc, node_bytes)?;
        // then the array growth, rolling the approval back on failure
        if nasize > old_asize {
            let grow = self.mem.realloc(
                &mut self.gc,
                checked_bytes(old_asize, std::mem::size_of::<Value>())?,
                checked_bytes(nasize, std::mem::size_of::<Value>())?,
            );
            if let Err(e) = grow {
                self.mem.free(&mut self.gc, node_bytes);
                return Err(e);
            }
            self.heap.tables[t].array.resize(nasize, Value::Nil);
        }
        // commit the new hash part, keeping the old for re-insertion
        let old_nodes = {
            let tbl = &mut self.heap.tables[t];
            tbl.last_free = node_real; // all positions are free
            std::mem::replace(
                &mut tbl.node,
                vec![EMPTY_NODE; node_real].into_boxed_slice(),
            )
        };
        if nasize < old_asize {
            // re-insert the elements of the vanishing slice
            let tbl = &mut self.heap.tables[t];
            let evicted: Vec<(i64, Value)> = tbl.array[nasize..]
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_nil())
                .map(|(i, v)| ((nasize + i + 1) as i64, *v))
                .collect();
            tbl.array.truncate(nasize);
            tbl.array.shrink_to_fit();
            self.mem.realloc(
                &mut self.gc,
                checked_bytes(old_asize, std::mem::size_of::<Value>())?,
                checked_bytes(nasize, std::mem::size_of::<Value>())?,
            )?;
            for (k, v) in evicted {
                self.table_set_impl(t, &Value::Number(k as f64), v, false)?;
            }
        }
        // re-insert the elements of the old hash part; no barrier needed,
        // they were already present in the table
        for n in old_nodes.iter().rev() {
            if !n.val.is_nil() {
                self.table_set_impl(t, &n.key, n.val, false)?;
            }
        }
        if !old_nodes.is_empty() {
            let bytes = checked_bytes(old_nodes.len(), std::mem::size_of::<Node>())?;
            self.mem.free(&mut self.gc, bytes);
        }
        Ok(())
    }

    /// Resize only the array part, keeping the hash part's size.
    pub fn table_resize_array(&mut self, t: TableId, nasize: usize) -> VmResult<()> {
        let nhsize = self.heap.tables[t].hash_size();
        self.table_resize(t, nasize, nhsize)
    }

    /// Release a table's storage and accounting. Used by the collector and
    /// at teardown.
    pub fn free_table(&mut self, t: TableId) {
        let tbl = self.heap.tables.free(t);
        self.mem.free(&mut self.gc, tbl.footprint());
    }
}
