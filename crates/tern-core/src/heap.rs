//! Heap objects and their arenas
//!
//! Every collectable object lives in a per-kind arena and is addressed by a
//! typed id; [`GcRef`] is the uniform reference the collector traffics in.
//! Walking the arenas replaces the all-objects list of a pointer-based
//! design, and `trace` enumerates an object's children for the mark phase.

use smallvec::SmallVec;
use tern_gc::{Arena, GcHeader, GcObject, Id, kinds};

use crate::string::LStr;
use crate::table::Table;
use crate::thread::ThreadState;
use crate::value::{NativeFn, Value};

tern_gc::id_type! {
    /// String id.
    pub struct StrId;
}
tern_gc::id_type! {
    /// Table id.
    pub struct TableId;
}
tern_gc::id_type! {
    /// Full-userdata id.
    pub struct UserdataId;
}
tern_gc::id_type! {
    /// Thread id.
    pub struct ThreadId;
}
tern_gc::id_type! {
    /// Function-template id.
    pub struct ProtoId;
}
tern_gc::id_type! {
    /// Closure id (interpreted or native).
    pub struct ClosureId;
}
tern_gc::id_type! {
    /// Upvalue id.
    pub struct UpvalId;
}

/// A reference to any collectable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GcRef {
    /// String.
    Str(StrId),
    /// Table.
    Table(TableId),
    /// Full userdata.
    Userdata(UserdataId),
    /// Thread.
    Thread(ThreadId),
    /// Function template.
    Proto(ProtoId),
    /// Closure.
    Closure(ClosureId),
    /// Upvalue.
    Upvalue(UpvalId),
}

impl GcRef {
    /// Identity bits, used to hash a collectable table key: the kind in
    /// the high word, the arena slot in the low word.
    pub fn bits(self) -> u64 {
        let (kind, raw) = match self {
            GcRef::Str(id) => (kinds::STRING, id.as_u32()),
            GcRef::Table(id) => (kinds::TABLE, id.as_u32()),
            GcRef::Userdata(id) => (kinds::USERDATA, id.as_u32()),
            GcRef::Thread(id) => (kinds::THREAD, id.as_u32()),
            GcRef::Proto(id) => (kinds::PROTO, id.as_u32()),
            GcRef::Closure(id) => (kinds::FUNCTION, id.as_u32()),
            GcRef::Upvalue(id) => (kinds::UPVALUE, id.as_u32()),
        };
        ((kind as u64) << 32) | raw as u64
    }
}

/// A host-owned memory block with optional metatable and environment.
pub struct Userdata {
    header: GcHeader,
    /// Metatable, if any.
    pub metatable: Option<TableId>,
    /// Environment table, if any.
    pub env: Option<TableId>,
    /// The block itself; opaque to the runtime.
    pub data: Box<[u8]>,
}

impl Userdata {
    pub(crate) fn new(data: Box<[u8]>, white: u8) -> Self {
        Self {
            header: GcHeader::new(kinds::USERDATA, white),
            metatable: None,
            env: None,
            data,
        }
    }

    pub(crate) fn footprint(&self) -> usize {
        std::mem::size_of::<Self>() + self.data.len()
    }
}

impl GcObject for Userdata {
    fn header(&self) -> &GcHeader {
        &self.header
    }
}

/// A compiled function template: the immutable part shared by all closures
/// of one function.
pub struct Proto {
    header: GcHeader,
    /// Number of fixed parameters.
    pub num_params: u8,
    /// Accepts extra arguments.
    pub is_vararg: bool,
    /// Maximum stack slots the function uses.
    pub max_stack: u8,
    /// Upvalues a closure of this template carries.
    pub num_upvalues: u8,
    /// Constants referenced by the code.
    pub constants: Vec<Value>,
    /// Instruction stream.
    pub code: Vec<u32>,
    /// Templates of functions defined inside this one.
    pub inner: Vec<ProtoId>,
    /// Source name for diagnostics.
    pub source: Option<StrId>,
}

impl Proto {
    pub(crate) fn new(white: u8) -> Self {
        Self {
            header: GcHeader::new(kinds::PROTO, white),
            num_params: 0,
            is_vararg: false,
            max_stack: 2,
            num_upvalues: 0,
            constants: Vec::new(),
            code: Vec::new(),
            inner: Vec::new(),
            source: None,
        }
    }

    pub(crate) fn footprint(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.constants.len() * std::mem::size_of::<Value>()
            + self.code.len() * std::mem::size_of::<u32>()
            + self.inner.len() * std::mem::size_of::<ProtoId>()
    }
}

impl GcObject for Proto {
    fn header(&self) -> &GcHeader {
        &self.header
    }
}

/// An interpreted closure: template plus captured upvalue cells.
pub struct InterpClosure {
    header: GcHeader,
    /// The function template.
    pub proto: ProtoId,
    /// Captured upvalues.
    pub upvalues: SmallVec<[UpvalId; 4]>,
}

/// A native closure: host function plus bound values.
pub struct NativeClosure {
    header: GcHeader,
    /// The host function.
    pub func: NativeFn,
    /// Bound upvalues, owned directly.
    pub upvalues: SmallVec<[Value; 2]>,
}

/// Either closure variant; both share a [`ClosureId`].
pub enum Closure {
    /// Interpreted.
    Interp(InterpClosure),
    /// Native.
    Native(NativeClosure),
}

impl Closure {
    pub(crate) fn interp(proto: ProtoId, white: u8) -> Self {
        Closure::Interp(InterpClosure {
            header: GcHeader::new(kinds::CLOSURE, white),
            proto,
            upvalues: SmallVec::new(),
        })
    }

    pub(crate) fn native(func: NativeFn, upvalues: SmallVec<[Value; 2]>, white: u8) -> Self {
        Closure::Native(NativeClosure {
            header: GcHeader::new(kinds::NATIVE_CLOSURE, white),
            func,
            upvalues,
        })
    }

    pub(crate) fn footprint(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

impl GcObject for Closure {
    fn header(&self) -> &GcHeader {
        match self {
            Closure::Interp(c) => &c.header,
            Closure::Native(c) => &c.header,
        }
    }
}

/// Where an upvalue's value currently lives.
pub enum UpvalueState {
    /// Still on the owning thread's stack, at this index.
    Open(usize),
    /// Moved into the cell when the frame left the stack.
    Closed(Value),
}

/// A variable captured by one or more closures.
pub struct Upvalue {
    header: GcHeader,
    /// Open (stack index) or closed (owned value).
    pub state: UpvalueState,
}

impl Upvalue {
    pub(crate) fn open(index: usize, white: u8) -> Self {
        Self {
            header: GcHeader::new(kinds::UPVALUE, white),
            state: UpvalueState::Open(index),
        }
    }

    pub(crate) fn footprint(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

impl GcObject for Upvalue {
    fn header(&self) -> &GcHeader {
        &self.header
    }
}

/// The arenas holding every collectable object of one runtime.
pub struct Heap {
    /// Strings.
    pub strings: Arena<StrId, LStr>,
    /// Tables.
    pub tables: Arena<TableId, Table>,
    /// Full userdata.
    pub userdata: Arena<UserdataId, Userdata>,
    /// Threads (the main thread included).
    pub threads: Arena<ThreadId, ThreadState>,
    /// Function templates.
    pub protos: Arena<ProtoId, Proto>,
    /// Closures.
    pub closures: Arena<ClosureId, Closure>,
    /// Upvalues.
    pub upvalues: Arena<UpvalId, Upvalue>,
}

impl Heap {
    /// Empty heap.
    pub fn new() -> Self {
        Self {
            strings: Arena::new(),
            tables: Arena::new(),
            userdata: Arena::new(),
            threads: Arena::new(),
            protos: Arena::new(),
            closures: Arena::new(),
            upvalues: Arena::new(),
        }
    }

    /// Header of any object, looked up through its reference.
    pub fn header(&self, r: GcRef) -> &GcHeader {
        match r {
            GcRef::Str(id) => self.strings[id].header(),
            GcRef::Table(id) => self.tables[id].header(),
            GcRef::Userdata(id) => self.userdata[id].header(),
            GcRef::Thread(id) => self.threads[id].header(),
            GcRef::Proto(id) => self.protos[id].header(),
            GcRef::Closure(id) => self.closures[id].header(),
            GcRef::Upvalue(id) => self.upvalues[id].header(),
        }
    }

    /// Header lookup that tolerates an object temporarily out of its slot
    /// (the running thread is moved out of the arena while it executes).
    pub fn try_header(&self, r: GcRef) -> Option<&GcHeader> {
        match r {
            GcRef::Str(id) => self.strings.get_opt(id).map(GcObject::header),
            GcRef::Table(id) => self.tables.get_opt(id).map(GcObject::header),
            GcRef::Userdata(id) => self.userdata.get_opt(id).map(GcObject::header),
            GcRef::Thread(id) => self.threads.get_opt(id).map(GcObject::header),
            GcRef::Proto(id) => self.protos.get_opt(id).map(GcObject::header),
            GcRef::Closure(id) => self.closures.get_opt(id).map(GcObject::header),
            GcRef::Upvalue(id) => self.upvalues.get_opt(id).map(GcObject::header),
        }
    }

    /// Enumerate the children of an object for the mark phase.
    pub fn trace(&self, r: GcRef, visit: &mut dyn FnMut(GcRef)) {
        let visit_value = |v: &Value, visit: &mut dyn FnMut(GcRef)| {
            if v.is_collectable()
                && let Some(child) = v.gc_ref()
            {
                visit(child);
            }
        };
        match r {
            GcRef::Str(_) => {} // strings hold no references
            GcRef::Table(id) => self.tables[id].trace(visit),
            GcRef::Userdata(id) => {
                let u = &self.userdata[id];
                if let Some(mt) = u.metatable {
                    visit(GcRef::Table(mt));
                }
                if let Some(env) = u.env {
                    visit(GcRef::Table(env));
                }
            }
            GcRef::Thread(id) => self.threads[id].trace(visit),
            GcRef::Proto(id) => {
                let p = &self.protos[id];
                for k in &p.constants {
                    visit_value(k, visit);
                }
                for &inner in &p.inner {
                    visit(GcRef::Proto(inner));
                }
                if let Some(src) = p.source {
                    visit(GcRef::Str(src));
                }
            }
            GcRef::Closure(id) => match &self.closures[id] {
                Closure::Interp(c) => {
                    visit(GcRef::Proto(c.proto));
                    for &uv in &c.upvalues {
                        visit(GcRef::Upvalue(uv));
                    }
                }
                Closure::Native(c) => {
                    for v in &c.upvalues {
                        visit_value(v, visit);
                    }
                }
            },
            GcRef::Upvalue(id) => {
                if let UpvalueState::Closed(v) = &self.upvalues[id].state {
                    visit_value(v, visit);
                }
                // open upvalues are traced through their owning thread's stack
            }
        }
    }

    /// Total live objects across all arenas.
    pub fn live_objects(&self) -> usize {
        self.strings.len()
            + self.tables.len()
            + self.userdata.len()
            + self.threads.len()
            + self.protos.len()
            + self.closures.len()
            + self.upvalues.len()
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_headers_carry_variant_tags() {
        let c = Closure::interp(ProtoId::from_u32(0), tern_gc::marks::WHITE0);
        assert_eq!(c.header().tag(), kinds::CLOSURE);
        fn stub(
            _: &mut crate::global::Global,
            _: &mut ThreadState,
        ) -> crate::error::VmResult<i32> {
            Ok(0)
        }
        let n = Closure::native(stub, SmallVec::new(), tern_gc::marks::WHITE0);
        assert_eq!(n.header().tag(), kinds::NATIVE_CLOSURE);
    }

    #[test]
    fn gc_ref_bits_are_distinct_per_kind() {
        let a = GcRef::Str(StrId::from_u32(1)).bits();
        let b = GcRef::Table(TableId::from_u32(1)).bits();
        let c = GcRef::Str(StrId::from_u32(2)).bits();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn proto_traces_children() {
        let mut heap = Heap::new();
        let inner = heap.protos.alloc(Proto::new(tern_gc::marks::WHITE0));
        let mut outer = Proto::new(tern_gc::marks::WHITE0);
        outer.inner.push(inner);
        let outer = heap.protos.alloc(outer);
        let mut seen = Vec::new();
        heap.trace(GcRef::Proto(outer), &mut |r| seen.push(r));
        assert_eq!(seen, vec![GcRef::Proto(inner)]);
    }
}
