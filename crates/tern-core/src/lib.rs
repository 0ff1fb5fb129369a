//! # Tern runtime core
//!
//! The in-memory heart of the Tern scripting language: tagged values, the
//! hybrid array/hash table, interned strings, the thread/global state
//! split, the reallocatable value stack with its call-frame chain, and the
//! memory manager every allocation funnels through. The lexer, compiler,
//! dispatcher, collector and standard library all sit on top of these
//! types.
//!
//! ## Design principles
//!
//! - **Indices, not pointers**: the value stack can relocate and tables
//!   rehash; everything that crosses such an operation is an index or a
//!   typed arena id
//! - **One allocation choke point**: every size change reports to the
//!   memory manager, whose debt counter paces the incremental collector
//! - **Single-threaded cooperative**: one thread of one runtime runs at a
//!   time; `&mut Runtime` is the host lock

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod gc;
pub mod global;
pub mod heap;
pub mod memory;
pub mod stream;
pub mod string;
pub mod table;
pub mod thread;
pub mod value;

pub use error::{ThreadStatus, VmError, VmResult};
pub use gc::{GcKind, GcPhase, GcState};
pub use global::{Config, Global, KEYWORDS, PanicFn, RIDX_GLOBALS, RIDX_MAIN_THREAD, Runtime, Tm};
pub use heap::{
    Closure, ClosureId, GcRef, Heap, Proto, ProtoId, StrId, TableId, ThreadId, Upvalue, UpvalId,
    UpvalueState, Userdata, UserdataId,
};
pub use memory::{Allocator, MemoryManager, SystemAllocator};
pub use stream::{Buffer, MIN_BUFFER, Reader, Stream};
pub use string::{LStr, SHORT_LIMIT, StringTable, str_hash};
pub use table::{MAX_ARRAY_SIZE, MAX_BITS, Table};
pub use thread::{
    BASIC_STACK_SIZE, CallInfo, CallKind, EXTRA_STACK, FrameKind, HookEvent, HookFn, MAX_STACK,
    MIN_STACK, MULTRET, ThreadState, call, check_stack, close_upvalues, count_hook, find_upvalue,
    pcall, postcall, precall, raw_run_protected, run_hook, set_continuation, suspend, yieldable,
};
pub use value::{
    ArithOp, Kind, NativeFn, Value, arith, ceil_log2, chunk_id, float_byte_to_int, hex_value,
    int_to_float_byte, str_to_number,
};
