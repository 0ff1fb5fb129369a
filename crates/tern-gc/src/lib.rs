//! # Tern GC substrate
//!
//! The layer below the Tern runtime core: the header embedded in every
//! collectable object, the mark-bit discipline of the incremental collector,
//! and the arena + stable-id storage that stands in for intrusive object
//! lists.
//!
//! ## Design
//!
//! - **Header-first layout**: every heap object starts with a [`GcHeader`]
//!   so the collector can walk any object uniformly
//! - **Arenas over pointers**: objects are addressed by typed 32-bit ids
//!   that survive reallocation of the backing storage
//! - **Single-threaded**: the runtime is cooperatively scheduled; mark bits
//!   use `Cell`, not atomics

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod arena;
pub mod object;

pub use arena::{Arena, Id};
pub use object::{GcHeader, GcObject, kinds, marks};
