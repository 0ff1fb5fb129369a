//! Collector-facing state
//!
//! The incremental collector itself lives outside the core; this module
//! declares the state it owns (colors, phase, worklists, pacing knobs) and
//! the hooks the core calls into it: the write barrier on table stores and
//! the emergency collection requested by the memory manager when an
//! allocation is refused.

use tern_gc::{GcHeader, marks};

use crate::heap::{GcRef, TableId};

/// Collection phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcPhase {
    /// Between cycles.
    Pause,
    /// Tracing gray objects.
    Propagate,
    /// The stop-the-world flip at the end of tracing.
    Atomic,
    /// Reclaiming dead objects.
    Sweep,
    /// Running pending finalizers.
    Finalize,
}

/// Why a collection cycle is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcKind {
    /// Scheduled by allocation debt.
    Normal,
    /// Forced by an allocation failure.
    Emergency,
}

/// State shared between the core and the external collector.
pub struct GcState {
    current_white: u8,
    /// Current phase.
    pub phase: GcPhase,
    /// Kind of the running cycle.
    pub kind: GcKind,
    /// False while the runtime is being built or torn down.
    pub running: bool,
    /// Estimate of non-garbage bytes in use.
    pub estimate: usize,
    /// Pause between cycles, percent of the estimate.
    pub pause: u32,
    /// Collector speed relative to allocation, percent.
    pub step_mul: u32,
    /// Objects known reachable but not yet traversed.
    pub gray: Vec<GcRef>,
    /// Objects to re-traverse in the atomic phase.
    pub gray_again: Vec<GcRef>,
    /// Tables with weak values.
    pub weak: Vec<TableId>,
    /// Tables with weak keys.
    pub ephemeron: Vec<TableId>,
    /// Fully weak tables.
    pub all_weak: Vec<TableId>,
    /// Objects whose finalizer is pending.
    pub to_finalize: Vec<GcRef>,
    emergency_hook: Option<Box<dyn FnMut()>>,
    emergency_runs: usize,
}

impl GcState {
    /// Fresh state: collection disabled, default pacing.
    pub fn new() -> Self {
        Self {
            current_white: marks::WHITE0,
            phase: GcPhase::Pause,
            kind: GcKind::Normal,
            running: false,
            estimate: 0,
            pause: 200,
            step_mul: 200,
            gray: Vec::new(),
            gray_again: Vec::new(),
            weak: Vec::new(),
            ephemeron: Vec::new(),
            all_weak: Vec::new(),
            to_finalize: Vec::new(),
            emergency_hook: None,
            emergency_runs: 0,
        }
    }

    /// The white new objects are painted with.
    #[inline]
    pub fn white(&self) -> u8 {
        self.current_white
    }

    /// The white of the previous cycle.
    #[inline]
    pub fn other_white(&self) -> u8 {
        self.current_white ^ marks::WHITE_BITS
    }

    /// Swap whites; called by the collector in its atomic phase.
    pub fn flip_white(&mut self) {
        self.current_white = self.other_white();
    }

    /// An object is dead if it wears only the previous cycle's white.
    #[inline]
    pub fn is_dead(&self, header: &GcHeader) -> bool {
        header.is_dead(self.other_white())
    }

    /// Backward write barrier: a black table just gained a reference to a
    /// white object, so the table must be traversed again. The caller that
    /// wrote the slot invokes this, per the insert contract.
    pub fn barrier_back(&mut self, table: TableId, header: &GcHeader) {
        if self.running && header.is_black() {
            header.make_gray();
            self.gray_again.push(GcRef::Table(table));
        }
    }

    /// Install the host/collector hook run on emergency collections.
    pub fn set_emergency_hook(&mut self, hook: Box<dyn FnMut()>) {
        self.emergency_hook = Some(hook);
    }

    /// Full collection forced by an allocation failure. Runs the installed
    /// hook, if any; the memory manager retries the allocation afterwards.
    pub(crate) fn emergency_collection(&mut self) {
        self.emergency_runs += 1;
        self.kind = GcKind::Emergency;
        tracing::debug!(runs = self.emergency_runs, "emergency collection");
        if let Some(hook) = self.emergency_hook.as_mut() {
            hook();
        }
        self.kind = GcKind::Normal;
    }

    /// How many emergency collections have run.
    pub fn emergency_runs(&self) -> usize {
        self.emergency_runs
    }
}

impl Default for GcState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_gc::Id;

    #[test]
    fn whites_alternate() {
        let mut gc = GcState::new();
        let w = gc.white();
        assert_eq!(gc.other_white(), w ^ marks::WHITE_BITS);
        gc.flip_white();
        assert_eq!(gc.white(), w ^ marks::WHITE_BITS);
    }

    #[test]
    fn barrier_regrays_black_tables() {
        let mut gc = GcState::new();
        gc.running = true;
        let t = TableId::from_u32(3);
        let header = GcHeader::new(tern_gc::kinds::TABLE, gc.white());
        header.make_black();
        gc.barrier_back(t, &header);
        assert!(header.is_gray());
        assert_eq!(gc.gray_again.len(), 1);
    }

    #[test]
    fn barrier_ignores_white_tables() {
        let mut gc = GcState::new();
        gc.running = true;
        let t = TableId::from_u32(0);
        let header = GcHeader::new(tern_gc::kinds::TABLE, gc.white());
        gc.barrier_back(t, &header);
        assert!(gc.gray_again.is_empty());
    }

    #[test]
    fn emergency_runs_hook() {
        let mut gc = GcState::new();
        let ran = std::rc::Rc::new(std::cell::Cell::new(0));
        let ran2 = ran.clone();
        gc.set_emergency_hook(Box::new(move || ran2.set(ran2.get() + 1)));
        gc.emergency_collection();
        assert_eq!(ran.get(), 1);
        assert_eq!(gc.emergency_runs(), 1);
    }
}
