//! Thread state and the call stack
//!
//! Each thread owns a contiguous value stack and a chain of call frames.
//! Stack positions are always *indices*: any operation that may allocate
//! can relocate the stack, and indices (unlike interior pointers) survive
//! relocation, so frames and open upvalues never need fixups. Frames are
//! allocated once and reused as a free list; they are only released at
//! thread teardown.

use smallvec::SmallVec;
use tern_gc::{Arena, GcHeader, GcObject, kinds};

use crate::error::{ThreadStatus, VmError, VmResult};
use crate::gc::GcState;
use crate::global::{Global, Runtime};
use crate::heap::{Closure, GcRef, ThreadId, UpvalId, Upvalue, UpvalueState};
use crate::memory::{MemoryManager, checked_bytes};
use crate::value::Value;

/// Extra stack slots reserved past `stack_last` for metamethod calls and
/// error handling.
pub const EXTRA_STACK: usize = 5;

/// Minimum free slots a native function may assume.
pub const MIN_STACK: usize = 20;

/// Initial stack size of a fresh thread.
pub const BASIC_STACK_SIZE: usize = 2 * MIN_STACK;

/// Hard cap on stack growth.
pub const MAX_STACK: usize = 1_000_000;

/// Room granted to run the error handler after a stack overflow.
const ERROR_STACK_SIZE: usize = MAX_STACK + 200;

/// Maximum nesting of native calls.
pub const MAX_NATIVE_CALLS: u16 = 200;

/// Ask for all results of a call.
pub const MULTRET: i32 = -1;

/// Bits in a frame's status byte.
pub mod callstatus {
    /// Frame is running an interpreted function.
    pub const INTERP: u8 = 1 << 0;
    /// Frame is running a debug hook.
    pub const HOOKED: u8 = 1 << 1;
    /// Frame reuses the dispatcher invocation of the previous frame.
    pub const REENTRY: u8 = 1 << 2;
    /// Frame was re-entered after a suspension.
    pub const YIELDED: u8 = 1 << 3;
    /// Frame is a yieldable protected call.
    pub const YIELDABLE_PCALL: u8 = 1 << 4;
    /// Frame carries an error status.
    pub const ERROR_STATUS: u8 = 1 << 5;
    /// Frame was entered by a tail call.
    pub const TAIL: u8 = 1 << 6;
    /// The last hook this frame ran yielded.
    pub const HOOK_YIELD: u8 = 1 << 7;
}

/// Hook events delivered to a configured hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    /// A call was entered.
    Call,
    /// A call is returning.
    Return,
    /// A new source line was reached.
    Line,
    /// The instruction-count budget elapsed.
    Count,
}

/// Hook mask bits.
pub mod hookmask {
    /// Report calls.
    pub const CALL: u8 = 1 << 0;
    /// Report returns.
    pub const RET: u8 = 1 << 1;
    /// Report line changes.
    pub const LINE: u8 = 1 << 2;
    /// Report every N instructions.
    pub const COUNT: u8 = 1 << 3;
}

/// A configured debug hook. The dispatcher checks it at every instruction
/// boundary while a mask is set; a hook may raise an error to interrupt
/// execution.
pub type HookFn = fn(&mut Global, &mut ThreadState, HookEvent, i32) -> VmResult<()>;

/// Frame payload that differs between interpreted and native callees.
#[derive(Debug, Clone, Copy)]
pub enum FrameKind {
    /// Interpreted function: its base and saved instruction pointer.
    Interp {
        /// Stack index of the frame's register window.
        base: usize,
        /// Saved instruction pointer, restored when the frame resumes.
        saved_pc: usize,
    },
    /// Native function: yield context.
    Native {
        /// Continuation to run when the thread is resumed.
        cont: Option<crate::value::NativeFn>,
        /// Host context value carried across a yield.
        ctx: i64,
        /// `errfunc` of the caller, restored on return.
        old_errfunc: usize,
    },
}

/// Per-call activation record.
#[derive(Debug, Clone, Copy)]
pub struct CallInfo {
    /// Stack index of the callee value.
    pub func: usize,
    /// Stack high-water mark for this frame.
    pub top: usize,
    /// Results the caller expects ([`MULTRET`] for all).
    pub n_results: i32,
    /// Status bits (see [`callstatus`]).
    pub status: u8,
    /// Interpreted or native payload.
    pub kind: FrameKind,
}

impl CallInfo {
    fn base_frame() -> Self {
        Self {
            func: 0,
            top: 1 + MIN_STACK,
            n_results: 0,
            status: 0,
            kind: FrameKind::Native {
                cont: None,
                ctx: 0,
                old_errfunc: 0,
            },
        }
    }

    /// True if this frame runs interpreted code.
    #[inline]
    pub fn is_interp(&self) -> bool {
        self.status & callstatus::INTERP != 0
    }
}

/// Per-thread state: the value stack, the frame chain, suspension and hook
/// configuration.
pub struct ThreadState {
    header: GcHeader,
    /// Current status; `Ok` while runnable.
    pub status: ThreadStatus,
    pub(crate) stack: Vec<Value>,
    /// Index of the first free stack slot.
    pub(crate) top: usize,
    /// Last usable slot; [`EXTRA_STACK`] slots follow it.
    pub(crate) stack_last: usize,
    /// Frame storage: `cis[..=ci]` are active, the rest are kept for reuse.
    pub(crate) cis: Vec<CallInfo>,
    /// Index of the current frame.
    pub(crate) ci: usize,
    /// Nested native call depth.
    pub(crate) n_ccalls: u16,
    /// Number of non-yieldable frames above; the thread may yield only at 0.
    pub(crate) nny: u16,
    /// Open upvalues, sorted by stack index, highest first.
    pub(crate) open_upvals: SmallVec<[UpvalId; 4]>,
    /// Stack index of the current error handler (0 = none).
    pub(crate) errfunc: usize,
    pub(crate) hook: Option<HookFn>,
    pub(crate) hook_mask: u8,
    pub(crate) hook_count: i32,
    pub(crate) base_hook_count: i32,
    pub(crate) allow_hook: bool,
}

impl GcObject for ThreadState {
    fn header(&self) -> &GcHeader {
        &self.header
    }
}

impl ThreadState {
    /// Consistent empty state; allocates nothing so it cannot fail.
    pub(crate) fn preinit(white: u8) -> Self {
        Self {
            header: GcHeader::new(kinds::THREAD, white),
            status: ThreadStatus::Ok,
            stack: Vec::new(),
            top: 0,
            stack_last: 0,
            cis: Vec::new(),
            ci: 0,
            n_ccalls: 0,
            nny: 1,
            open_upvals: SmallVec::new(),
            errfunc: 0,
            hook: None,
            hook_mask: 0,
            hook_count: 0,
            base_hook_count: 0,
            allow_hook: true,
        }
    }

    /// Index of the first free slot.
    #[inline]
    pub fn top(&self) -> usize {
        self.top
    }

    /// Move `top`; slots between old and new top must be live or nil.
    #[inline]
    pub fn set_top(&mut self, top: usize) {
        debug_assert!(top <= self.stack_last + EXTRA_STACK);
        self.top = top;
    }

    /// Value at a stack index.
    #[inline]
    pub fn value(&self, idx: usize) -> &Value {
        &self.stack[idx]
    }

    /// Overwrite a stack slot.
    #[inline]
    pub fn set_value(&mut self, idx: usize, v: Value) {
        self.stack[idx] = v;
    }

    /// Push a value. The caller must have reserved room via `check_stack`.
    #[inline]
    pub fn push(&mut self, v: Value) {
        debug_assert!(self.top < self.stack.len());
        self.stack[self.top] = v;
        self.top += 1;
    }

    /// The current frame.
    #[inline]
    pub fn current_frame(&self) -> &CallInfo {
        &self.cis[self.ci]
    }

    /// Number of active frames (the base frame included).
    #[inline]
    pub fn frame_depth(&self) -> usize {
        self.ci + 1
    }

    /// Number of upvalues still pointing into this thread's stack.
    #[inline]
    pub fn open_upvalue_count(&self) -> usize {
        self.open_upvals.len()
    }

    /// Configure the debug hook.
    pub fn set_hook(&mut self, hook: Option<HookFn>, mask: u8, count: i32) {
        self.hook = hook;
        self.hook_mask = if hook.is_some() { mask } else { 0 };
        self.base_hook_count = count;
        self.hook_count = count;
    }

    /// Bytes this thread accounts for besides its stack and frames.
    pub(crate) fn base_footprint() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Enumerate children for the mark phase: live stack slots and open
    /// upvalue cells.
    pub(crate) fn trace(&self, visit: &mut dyn FnMut(GcRef)) {
        for v in &self.stack[..self.top] {
            if v.is_collectable()
                && let Some(r) = v.gc_ref()
            {
                visit(r);
            }
        }
        for &uv in &self.open_upvals {
            visit(GcRef::Upvalue(uv));
        }
    }
}

/// Build the initial stack and the embedded base frame.
pub(crate) fn stack_init(
    mem: &mut MemoryManager,
    gc: &mut GcState,
    th: &mut ThreadState,
) -> VmResult<()> {
    mem.alloc(
        gc,
        checked_bytes(BASIC_STACK_SIZE, std::mem::size_of::<Value>())?,
    )?;
    th.stack = vec![Value::Nil; BASIC_STACK_SIZE];
    th.stack_last = BASIC_STACK_SIZE - EXTRA_STACK;
    // the base frame's callee slot
    th.stack[0] = Value::Nil;
    th.top = 1;
    mem.alloc(gc, std::mem::size_of::<CallInfo>())?;
    th.cis = vec![CallInfo::base_frame()];
    th.ci = 0;
    Ok(())
}

/// Release the stack and the whole frame list.
pub(crate) fn free_stack(mem: &mut MemoryManager, gc: &mut GcState, th: &mut ThreadState) {
    if th.stack.is_empty() {
        return; // stack not completely built yet
    }
    th.ci = 0;
    let frames = th.cis.len();
    mem.free(gc, frames * std::mem::size_of::<CallInfo>());
    th.cis = Vec::new();
    mem.free(
        gc,
        th.stack.len() * std::mem::size_of::<Value>(),
    );
    th.stack = Vec::new();
    th.top = 0;
    th.stack_last = 0;
}

/// Ensure `n` free slots above `top`, growing (and possibly relocating)
/// the stack. Saved indices stay valid; raw borrows into the stack do not.
pub fn check_stack(
    mem: &mut MemoryManager,
    gc: &mut GcState,
    th: &mut ThreadState,
    n: usize,
) -> VmResult<()> {
    if th.stack_last.saturating_sub(th.top) <= n {
        grow_stack(mem, gc, th, n)?;
    }
    Ok(())
}

fn grow_stack(
    mem: &mut MemoryManager,
    gc: &mut GcState,
    th: &mut ThreadState,
    n: usize,
) -> VmResult<()> {
    let size = th.stack.len();
    if size > MAX_STACK {
        // overflow while already handling a stack error
        return Err(VmError::ErrorInHandler);
    }
    let needed = th.top + n + EXTRA_STACK;
    let mut new_size = (2 * size).min(MAX_STACK);
    if new_size < needed {
        new_size = needed;
    }
    if new_size > MAX_STACK {
        realloc_stack(mem, gc, th, ERROR_STACK_SIZE)?;
        return Err(VmError::runtime("stack overflow"));
    }
    realloc_stack(mem, gc, th, new_size)
}

/// Reallocate the stack to `new_size` slots. Frames and open upvalues hold
/// indices, so nothing needs rewriting after the move.
fn realloc_stack(
    mem: &mut MemoryManager,
    gc: &mut GcState,
    th: &mut ThreadState,
    new_size: usize,
) -> VmResult<()> {
    let old = th.stack.len();
    mem.realloc(
        gc,
        checked_bytes(old, std::mem::size_of::<Value>())?,
        checked_bytes(new_size, std::mem::size_of::<Value>())?,
    )?;
    th.stack.resize(new_size, Value::Nil);
    th.stack_last = new_size - EXTRA_STACK;
    tracing::trace!(old, new_size, "stack reallocated");
    Ok(())
}

/// Push a frame, reusing a retired one when available.
fn push_frame(
    mem: &mut MemoryManager,
    gc: &mut GcState,
    th: &mut ThreadState,
    frame: CallInfo,
) -> VmResult<()> {
    if th.ci + 1 == th.cis.len() {
        mem.alloc(gc, std::mem::size_of::<CallInfo>())?;
        th.cis.push(frame);
    } else {
        th.cis[th.ci + 1] = frame;
    }
    th.ci += 1;
    Ok(())
}

/// Release retired frames beyond the current one.
pub(crate) fn free_extra_frames(mem: &mut MemoryManager, gc: &mut GcState, th: &mut ThreadState) {
    let keep = th.ci + 1;
    let extra = th.cis.len() - keep;
    if extra > 0 {
        mem.free(gc, extra * std::mem::size_of::<CallInfo>());
        th.cis.truncate(keep);
    }
}

/// The open upvalue at `level`, creating and list-inserting one if absent.
pub fn find_upvalue(
    upvals: &mut Arena<UpvalId, Upvalue>,
    mem: &mut MemoryManager,
    gc: &mut GcState,
    th: &mut ThreadState,
    level: usize,
) -> VmResult<UpvalId> {
    let mut insert_at = th.open_upvals.len();
    for (i, &id) in th.open_upvals.iter().enumerate() {
        let UpvalueState::Open(idx) = upvals[id].state else {
            unreachable!("closed upvalue on the open list");
        };
        if idx == level {
            return Ok(id); // found a corresponding upvalue
        }
        if idx < level {
            insert_at = i;
            break;
        }
    }
    mem.alloc(gc, std::mem::size_of::<Upvalue>())?;
    let id = upvals.alloc(Upvalue::open(level, gc.white()));
    th.open_upvals.insert(insert_at, id);
    Ok(id)
}

/// Close every upvalue at or above `level`: copy the stack value into the
/// cell and drop it from the open list.
pub fn close_upvalues(
    upvals: &mut Arena<UpvalId, Upvalue>,
    th: &mut ThreadState,
    level: usize,
) {
    while let Some(&id) = th.open_upvals.first() {
        let UpvalueState::Open(idx) = upvals[id].state else {
            unreachable!("closed upvalue on the open list");
        };
        if idx < level {
            break;
        }
        upvals[id].state = UpvalueState::Closed(th.stack[idx]);
        th.open_upvals.remove(0);
    }
}

/// What a call set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// A native callee ran to completion (or yielded); results adjusted.
    Native,
    /// An interpreted frame is ready; the dispatcher resumes it.
    Interpreted,
}

/// Prepare (and for natives, run) a call to the value at stack index
/// `func`, with the arguments sitting between it and `top`.
pub fn precall(
    g: &mut Global,
    th: &mut ThreadState,
    func: usize,
    n_results: i32,
) -> VmResult<CallKind> {
    match th.stack[func] {
        Value::LightFunction(f) => call_native(g, th, func, n_results, f, 0),
        Value::NativeClosure(id) => {
            let Closure::Native(c) = &g.heap.closures[id] else {
                unreachable!("native closure tag");
            };
            let f = c.func;
            call_native(g, th, func, n_results, f, 0)
        }
        Value::Closure(id) => {
            let Closure::Interp(c) = &g.heap.closures[id] else {
                unreachable!("interpreted closure tag");
            };
            let proto = &g.heap.protos[c.proto];
            let num_params = proto.num_params as usize;
            let is_vararg = proto.is_vararg;
            let max_stack = proto.max_stack as usize;
            check_stack(&mut g.mem, &mut g.gc, th, max_stack + num_params)?;
            let mut n_args = th.top - func - 1;
            while n_args < num_params {
                th.push(Value::Nil); // complete missing arguments
                n_args += 1;
            }
            let base = if is_vararg {
                adjust_varargs(th, num_params, n_args)
            } else {
                func + 1
            };
            push_frame(
                &mut g.mem,
                &mut g.gc,
                th,
                CallInfo {
                    func,
                    top: base + max_stack,
                    n_results,
                    status: callstatus::INTERP,
                    kind: FrameKind::Interp { base, saved_pc: 0 },
                },
            )?;
            th.top = base + max_stack;
            Ok(CallKind::Interpreted)
        }
        v => Err(VmError::runtime(format!(
            "attempt to call a {} value",
            v.type_name()
        ))),
    }
}

/// Move fixed parameters above the varargs so the frame base sits past
/// them. Returns the new base.
fn adjust_varargs(th: &mut ThreadState, num_params: usize, actual: usize) -> usize {
    let fixed = th.top - actual; // first fixed argument
    let base = th.top; // final position of first argument
    for i in 0..num_params.min(actual) {
        let v = th.stack[fixed + i];
        th.stack[th.top] = v;
        th.top += 1;
        th.stack[fixed + i] = Value::Nil; // erase original copy (for GC)
    }
    for _ in actual.min(num_params)..num_params {
        th.stack[th.top] = Value::Nil;
        th.top += 1;
    }
    base
}

fn call_native(
    g: &mut Global,
    th: &mut ThreadState,
    func: usize,
    n_results: i32,
    f: crate::value::NativeFn,
    ctx: i64,
) -> VmResult<CallKind> {
    check_stack(&mut g.mem, &mut g.gc, th, MIN_STACK)?;
    push_frame(
        &mut g.mem,
        &mut g.gc,
        th,
        CallInfo {
            func,
            top: th.top + MIN_STACK,
            n_results,
            status: 0,
            kind: FrameKind::Native {
                cont: None,
                ctx,
                old_errfunc: th.errfunc,
            },
        },
    )?;
    let n = f(g, th)?;
    if th.status == ThreadStatus::Yield {
        // suspended: leave the frame in place for the continuation
        return Ok(CallKind::Native);
    }
    if let FrameKind::Native { old_errfunc, .. } = th.cis[th.ci].kind {
        th.errfunc = old_errfunc;
    }
    debug_assert!(n >= 0 && (n as usize) <= th.top);
    postcall(th, th.top - n as usize);
    Ok(CallKind::Native)
}

/// Deliver a hook event if the mask enables it. The dispatcher calls this
/// at instruction boundaries; the hook may raise an error to interrupt
/// the thread.
pub fn run_hook(
    g: &mut Global,
    th: &mut ThreadState,
    event: HookEvent,
    line: i32,
) -> VmResult<()> {
    let bit = match event {
        HookEvent::Call => hookmask::CALL,
        HookEvent::Return => hookmask::RET,
        HookEvent::Line => hookmask::LINE,
        HookEvent::Count => hookmask::COUNT,
    };
    if th.hook_mask & bit == 0 || !th.allow_hook {
        return Ok(());
    }
    let Some(hook) = th.hook else {
        return Ok(());
    };
    th.allow_hook = false; // no hooks inside hooks
    let r = hook(g, th, event, line);
    th.allow_hook = true;
    r
}

/// Tick the instruction-count budget, delivering a count event when it
/// elapses.
pub fn count_hook(g: &mut Global, th: &mut ThreadState) -> VmResult<()> {
    if th.hook_mask & hookmask::COUNT != 0 {
        th.hook_count -= 1;
        if th.hook_count == 0 {
            th.hook_count = th.base_hook_count;
            return run_hook(g, th, HookEvent::Count, 0);
        }
    }
    Ok(())
}

/// Finish a call: move results down over the callee, adjust their count to
/// what the caller asked for, and restore the previous frame.
pub fn postcall(th: &mut ThreadState, first_result: usize) {
    let ci = th.cis[th.ci];
    let wanted = ci.n_results;
    let mut res = ci.func; // final position of first result
    th.ci -= 1; // back to caller
    let mut i = wanted;
    let mut fr = first_result;
    while i != 0 && fr < th.top {
        th.stack[res] = th.stack[fr];
        res += 1;
        fr += 1;
        i -= 1;
    }
    while i > 0 {
        // not enough results: complete with nils
        th.stack[res] = Value::Nil;
        res += 1;
        i -= 1;
    }
    th.top = res;
}

/// Call the value at `func`. Natives run to completion here; interpreted
/// callees come back as [`CallKind::Interpreted`] for the dispatcher.
pub fn call(
    g: &mut Global,
    th: &mut ThreadState,
    func: usize,
    n_results: i32,
    allow_yield: bool,
) -> VmResult<CallKind> {
    th.n_ccalls += 1;
    if th.n_ccalls >= MAX_NATIVE_CALLS {
        let e = if th.n_ccalls == MAX_NATIVE_CALLS {
            VmError::runtime("native stack overflow")
        } else {
            // error while handling the previous overflow
            VmError::ErrorInHandler
        };
        th.n_ccalls -= 1;
        return Err(e);
    }
    if !allow_yield {
        th.nny += 1;
    }
    let kind = precall(g, th, func, n_results)?;
    if !allow_yield {
        th.nny -= 1;
    }
    th.n_ccalls -= 1;
    Ok(kind)
}

/// Run `body` without stack healing; the `Result` is the unwind channel.
/// Used for bootstrapping the runtime.
pub fn raw_run_protected<F>(g: &mut Global, th: &mut ThreadState, body: F) -> VmResult<()>
where
    F: FnOnce(&mut Global, &mut ThreadState) -> VmResult<()>,
{
    body(g, th)
}

/// Build the value an error unwinds with. The memory-error message is
/// pre-interned and fixed, so this cannot allocate on the memory path.
pub(crate) fn error_object(g: &mut Global, e: &VmError) -> Value {
    match e {
        VmError::OutOfMemory => match g.mem_err_msg {
            Some(id) => Value::ShortStr(id),
            None => Value::Nil, // runtime not fully open yet
        },
        other => {
            let msg = other.to_string();
            g.new_string(msg.as_bytes()).unwrap_or_else(|_| {
                g.mem_err_msg.map(Value::ShortStr).unwrap_or(Value::Nil)
            })
        }
    }
}

/// Protected call: run `body`, and on error unwind to the saved state:
/// restore `(top, ci, n_ccalls, nny, errfunc)`, close upvalues above the
/// saved top, and leave the error value on the stack.
pub fn pcall<F>(
    g: &mut Global,
    th: &mut ThreadState,
    body: F,
    old_top: usize,
    errfunc: usize,
) -> ThreadStatus
where
    F: FnOnce(&mut Global, &mut ThreadState) -> VmResult<()>,
{
    let saved_ci = th.ci;
    let saved_nny = th.nny;
    let saved_ccalls = th.n_ccalls;
    let saved_errfunc = th.errfunc;
    th.errfunc = errfunc;
    let status = match raw_run_protected(g, th, body) {
        Ok(()) => ThreadStatus::Ok,
        Err(e) => {
            close_upvalues(&mut g.heap.upvalues, th, old_top);
            let errobj = error_object(g, &e);
            th.ci = saved_ci;
            th.nny = saved_nny;
            th.n_ccalls = saved_ccalls;
            th.top = old_top;
            th.stack[th.top] = errobj;
            th.top += 1;
            e.status()
        }
    };
    th.errfunc = saved_errfunc;
    status
}

/// True if the thread may suspend here.
#[inline]
pub fn yieldable(th: &ThreadState) -> bool {
    th.nny == 0
}

/// Suspend the running thread. Only legal when no non-yieldable frame is
/// above; the scheduler (resume) clears the status when it hands control
/// back.
pub fn suspend(th: &mut ThreadState) -> VmResult<()> {
    if !yieldable(th) {
        return Err(VmError::runtime(
            "attempt to yield from outside a coroutine",
        ));
    }
    th.status = ThreadStatus::Yield;
    Ok(())
}

/// Register a continuation for the current native frame, to be invoked
/// when the thread is resumed after a yield.
pub fn set_continuation(th: &mut ThreadState, k: crate::value::NativeFn, context: i64) {
    let frame = &mut th.cis[th.ci];
    if let FrameKind::Native { cont, ctx, .. } = &mut frame.kind {
        *cont = Some(k);
        *ctx = context;
    }
}

impl Runtime {
    /// Resume a coroutine: start it (function and arguments on its stack)
    /// or continue it after a yield. Errors are caught and reported as the
    /// returned status, with the error value on the coroutine's stack.
    pub fn resume(&mut self, co: ThreadId, n_args: usize) -> ThreadStatus {
        let mut th = self.g.heap.threads.take(co);
        let status = resume_body(&mut self.g, &mut th, n_args);
        self.g.heap.threads.put(co, th);
        status
    }
}

fn resume_body(g: &mut Global, th: &mut ThreadState, n_args: usize) -> ThreadStatus {
    match th.status {
        ThreadStatus::Ok if th.ci == 0 => {
            // starting a fresh coroutine
            if th.top < n_args + 1 {
                return ThreadStatus::ErrRun;
            }
            let func = th.top - n_args - 1;
            th.nny = 0;
            let status = match call(g, th, func, MULTRET, true) {
                Ok(_) => {
                    if th.status == ThreadStatus::Yield {
                        ThreadStatus::Yield
                    } else {
                        ThreadStatus::Ok
                    }
                }
                Err(e) => unwind_resume_error(g, th, e),
            };
            th.nny = 1;
            status
        }
        ThreadStatus::Yield => {
            // continuing after a suspension
            th.status = ThreadStatus::Ok;
            th.nny = 0;
            let frame = th.cis[th.ci];
            let status = match frame.kind {
                FrameKind::Native {
                    cont: Some(k),
                    old_errfunc,
                    ..
                } => match k(g, th) {
                    Ok(n) => {
                        if th.status == ThreadStatus::Yield {
                            ThreadStatus::Yield
                        } else {
                            th.errfunc = old_errfunc;
                            postcall(th, th.top - n as usize);
                            ThreadStatus::Ok
                        }
                    }
                    Err(e) => unwind_resume_error(g, th, e),
                },
                _ => ThreadStatus::Ok, // nothing to continue
            };
            th.nny = 1;
            status
        }
        ThreadStatus::Ok => {
            push_resume_error(g, th, "cannot resume non-suspended coroutine");
            ThreadStatus::ErrRun
        }
        _ => {
            push_resume_error(g, th, "cannot resume dead coroutine");
            ThreadStatus::ErrRun
        }
    }
}

fn unwind_resume_error(g: &mut Global, th: &mut ThreadState, e: VmError) -> ThreadStatus {
    let errobj = error_object(g, &e);
    th.status = e.status(); // the coroutine is now dead
    th.ci = 0;
    free_extra_frames(&mut g.mem, &mut g.gc, th);
    let base_top = th.cis[0].func + 1;
    close_upvalues(&mut g.heap.upvalues, th, base_top);
    th.top = base_top;
    th.stack[th.top] = errobj;
    th.top += 1;
    e.status()
}

fn push_resume_error(g: &mut Global, th: &mut ThreadState, msg: &str) {
    let errobj = g
        .new_string(msg.as_bytes())
        .unwrap_or(Value::Nil);
    if th.top < th.stack.len() {
        th.stack[th.top] = errobj;
        th.top += 1;
    }
}
