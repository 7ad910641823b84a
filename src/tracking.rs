//! Dependency tracking - capture frames and the tracking stack.
//!
//! While a computed cell's read function runs for the first time, every cell
//! it reads registers itself into the innermost *capture frame*. The frames
//! form a thread-local stack, so constructing a computed inside another
//! computed's read function is safe: the inner construction pushes and pops
//! its own frame without disturbing the outer capture.
//!
//! Re-evaluation never tracks. [`untracked`] pushes a suspend frame, under
//! which reads register nothing, unless a fresh capture frame is pushed on
//! top of it, which opens a new tracking scope of its own.

use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::Rc;

/// Identity of a cell, unique within the thread.
///
/// Used to collapse duplicate reads of the same cell into one subscription.
pub(crate) type CellId = u64;

/// Erased handle to a dependency cell.
///
/// A computed cell's dependencies have arbitrary value types; this trait is
/// what the capture frame collects and what the computed subscribes its
/// re-evaluation closure through.
pub(crate) trait Source {
    fn id(&self) -> CellId;

    /// Register a value-agnostic listener on this cell's listener list.
    fn subscribe_raw(&self, listener: Rc<dyn Fn()>);
}

/// One entry on the tracking stack.
enum Frame {
    /// A computed construction in progress: collects every cell read.
    Capture(Vec<Rc<dyn Source>>),
    /// An [`untracked`] region: reads register nothing.
    Suspend,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = RefCell::new(Vec::new());

    /// Counter for generating unique cell IDs.
    static NEXT_CELL_ID: Cell<CellId> = const { Cell::new(0) };
}

/// Allocate a fresh cell ID.
pub(crate) fn next_cell_id() -> CellId {
    NEXT_CELL_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

/// Whether a capture frame is currently accepting reads.
pub fn is_tracking() -> bool {
    FRAMES.with(|frames| matches!(frames.borrow().last(), Some(Frame::Capture(_))))
}

/// Record a read of `source` into the innermost capture frame, if tracking.
pub(crate) fn register_read(source: Rc<dyn Source>) {
    FRAMES.with(|frames| {
        if let Some(Frame::Capture(reads)) = frames.borrow_mut().last_mut() {
            reads.push(source);
        }
    });
}

/// Pops one frame when dropped. Covers the unwind path of [`capture`] and
/// [`untracked`] so a panicking read function cannot leave a stale frame.
struct FrameGuard;

impl Drop for FrameGuard {
    fn drop(&mut self) {
        FRAMES.with(|frames| {
            frames.borrow_mut().pop();
        });
    }
}

/// Run `f` under a fresh capture frame and return its result together with
/// every cell read during the call, in first-read order (duplicates kept;
/// callers decide whether to collapse them).
pub(crate) fn capture<T>(f: impl FnOnce() -> T) -> (T, Vec<Rc<dyn Source>>) {
    FRAMES.with(|frames| frames.borrow_mut().push(Frame::Capture(Vec::new())));
    let guard = FrameGuard;
    let value = f();
    // Normal path: the frame is popped right here to extract the reads.
    // The guard only covers unwinding out of `f`.
    mem::forget(guard);
    let reads = FRAMES.with(|frames| match frames.borrow_mut().pop() {
        Some(Frame::Capture(reads)) => reads,
        _ => Vec::new(),
    });
    (value, reads)
}

/// Run `f` with tracking suspended.
///
/// Reads inside `f` do not register as dependencies of any in-progress
/// computed construction. Every re-evaluation of a computed runs under this,
/// keeping the construction-time dependency set permanent.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    FRAMES.with(|frames| frames.borrow_mut().push(Frame::Suspend));
    let _guard = FrameGuard;
    f()
}
