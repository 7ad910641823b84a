//! Computed cell - a value derived from other cells.
//!
//! Dependencies are discovered implicitly: construction runs the read
//! function once under a capture frame, and every cell read during that
//! single synchronous evaluation becomes a dependency. The discovered set
//! is permanent: a re-evaluation closure is subscribed to each dependency
//! once, at construction, and the computed keeps no back-reference to them.
//!
//! Propagation is eager by default: an upstream write re-runs the read
//! function immediately and notifies listeners. Flipping [`Computed::set_lazy`]
//! defers the recompute to the next [`Computed::get`].
//!
//! Re-evaluation always runs with tracking suspended, so later reads never
//! grow the dependency set.

use std::cell::{Cell as StdCell, RefCell};
use std::rc::Rc;

use crate::error::ReadOnlyWrite;
use crate::notify::{Listener, Listeners};
use crate::tracking::{self, CellId, Source};

/// Create a read-only computed cell from a read function.
///
/// The read function runs once, immediately, to seed the cached value and
/// discover dependencies.
pub fn computed<T: Clone + 'static>(read: impl Fn() -> T + 'static) -> Computed<T> {
    Computed::from_parts(Box::new(read), None)
}

/// Read function bound to a context.
pub type ContextRead<C, T> = Box<dyn Fn(&C) -> T>;

/// Write function bound to a context.
pub type ContextWrite<C, T> = Box<dyn Fn(&mut C, T)>;

/// Explicit configuration for a computed cell with a bound context.
///
/// The context value is owned by the cell; the read function sees it as
/// `&C` and the write function as `&mut C`. Omitting `write` yields a
/// read-only cell.
///
/// # Example
///
/// ```
/// use observe::ComputedSpec;
///
/// struct Name {
///     first: String,
///     last: String,
/// }
///
/// let full = ComputedSpec {
///     context: Name {
///         first: "Ada".into(),
///         last: "Lovelace".into(),
///     },
///     read: Box::new(|name: &Name| format!("{} {}", name.first, name.last)),
///     write: Some(Box::new(|name: &mut Name, value: String| {
///         let mut parts = value.splitn(2, ' ');
///         name.first = parts.next().unwrap_or_default().to_string();
///         name.last = parts.next().unwrap_or_default().to_string();
///     })),
/// }
/// .build();
///
/// assert_eq!(full.get(), "Ada Lovelace");
/// full.set("Grace Hopper".to_string()).unwrap();
/// assert_eq!(full.get(), "Grace Hopper");
/// ```
pub struct ComputedSpec<C, T> {
    pub context: C,
    pub read: ContextRead<C, T>,
    pub write: Option<ContextWrite<C, T>>,
}

impl<C: 'static, T: Clone + 'static> ComputedSpec<C, T> {
    /// Build the cell, moving the context into it.
    pub fn build(self) -> Computed<T> {
        let ComputedSpec {
            context,
            read,
            write,
        } = self;
        let context = Rc::new(RefCell::new(context));

        let bound_read = {
            let context = Rc::clone(&context);
            Box::new(move || read(&context.borrow())) as Box<dyn Fn() -> T>
        };
        let bound_write = write.map(|write| {
            let context = Rc::clone(&context);
            Box::new(move |value: T| write(&mut context.borrow_mut(), value)) as Box<dyn Fn(T)>
        });

        Computed::from_parts(bound_read, bound_write)
    }
}

/// A reactive cell whose value is derived from other cells.
///
/// Like [`Observable`](crate::Observable), `Computed` is a cheap handle;
/// cloning it yields another handle to the same cell.
///
/// # Cycles
///
/// Dependency cycles are unsupported. A cell cannot read itself during its
/// own construction (it does not exist yet), but wiring a cycle through
/// listeners diverges: propagation recurses until the stack overflows.
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

struct ComputedInner<T> {
    id: CellId,
    value: RefCell<T>,
    listeners: Listeners<T>,
    read: Box<dyn Fn() -> T>,
    write: Option<Box<dyn Fn(T)>>,
    lazy: StdCell<bool>,
    dirty: StdCell<bool>,
}

impl<T: Clone + 'static> Computed<T> {
    /// Create a two-way computed cell.
    ///
    /// `read` derives the value; `write` pushes a written value back into
    /// whatever state `read` derives from. Every accepted write is followed
    /// by a fresh read, so the cache always reflects post-write state.
    pub fn writable(read: impl Fn() -> T + 'static, write: impl Fn(T) + 'static) -> Self {
        Self::from_parts(Box::new(read), Some(Box::new(write)))
    }

    fn from_parts(read: Box<dyn Fn() -> T>, write: Option<Box<dyn Fn(T)>>) -> Self {
        // Single construction-time evaluation under a fresh capture frame:
        // every cell read in there is a dependency.
        let (initial, reads) = tracking::capture(&read);

        let inner = Rc::new(ComputedInner {
            id: tracking::next_cell_id(),
            value: RefCell::new(initial),
            listeners: Listeners::new(),
            read,
            write,
            lazy: StdCell::new(false),
            dirty: StdCell::new(false),
        });

        // Subscribe the re-evaluation closure to each distinct dependency,
        // in first-read order. Duplicate reads of one cell collapse to a
        // single subscription, so one upstream write means one recompute.
        let mut seen: Vec<CellId> = Vec::new();
        for dependency in &reads {
            if seen.contains(&dependency.id()) {
                continue;
            }
            seen.push(dependency.id());

            let target = Rc::clone(&inner);
            dependency.subscribe_raw(Rc::new(move || {
                if target.lazy.get() {
                    target.dirty.set(true);
                    #[cfg(feature = "tracing")]
                    tracing::trace!(cell = target.id, "computed marked stale");
                } else {
                    target.refresh();
                }
            }));
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            cell = inner.id,
            reads = reads.len(),
            dependencies = seen.len(),
            "computed wired"
        );

        Self { inner }
    }

    /// Read the current value.
    ///
    /// If a computed construction is capturing, this cell registers itself
    /// as a dependency (a computed can depend on another computed). If the
    /// cell is lazy and stale, the value is recomputed here and listeners
    /// are notified with the refreshed value before it is returned.
    pub fn get(&self) -> T {
        if tracking::is_tracking() {
            tracking::register_read(self.inner.clone() as Rc<dyn Source>);
        }
        if self.inner.lazy.get() && self.inner.dirty.get() {
            return self.inner.refresh();
        }
        self.inner.value.borrow().clone()
    }

    /// Read the cached value without registering a dependency and without
    /// refreshing a stale lazy cell.
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Write through the cell.
    ///
    /// Fails with [`ReadOnlyWrite`] when the cell was built without a write
    /// function; the cache is untouched and nothing is notified. Otherwise
    /// the write function runs, the value is immediately re-read (laziness
    /// does not defer this), and listeners are notified. Returns the cell
    /// for chaining: `cell.set(a)?.set(b)?`.
    pub fn set(&self, value: T) -> Result<&Self, ReadOnlyWrite> {
        let write = self.inner.write.as_ref().ok_or(ReadOnlyWrite)?;
        write(value);
        self.inner.refresh();
        Ok(self)
    }

    /// Register a listener called with every refreshed value.
    pub fn on_change(&self, listener: impl Fn(&T) + 'static) {
        self.inner.listeners.register(Rc::new(listener));
    }

    /// Register an already-shared listener.
    pub fn subscribe(&self, listener: Listener<T>) {
        self.inner.listeners.register(listener);
    }

    /// Whether upstream changes defer recomputation to the next [`get`](Self::get).
    pub fn is_lazy(&self) -> bool {
        self.inner.lazy.get()
    }

    /// Toggle lazy evaluation.
    ///
    /// Turning laziness on leaves the current cache valid until the next
    /// upstream write marks it stale. Turning it off does not force a
    /// recompute; a still-stale value refreshes on the next upstream write
    /// or [`get`](Self::get).
    pub fn set_lazy(&self, lazy: bool) {
        self.inner.lazy.set(lazy);
    }
}

impl<T: Clone + 'static> ComputedInner<T> {
    /// Re-run the read function (untracked), cache the result, clear
    /// staleness, and notify listeners with the fresh value.
    fn refresh(&self) -> T {
        let value = tracking::untracked(|| (self.read)());
        *self.value.borrow_mut() = value;
        self.dirty.set(false);

        #[cfg(feature = "tracing")]
        tracing::trace!(cell = self.id, "computed refreshed");

        let value = self.value.borrow().clone();
        self.listeners.notify(&value);
        value
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Source for ComputedInner<T> {
    fn id(&self) -> CellId {
        self.id
    }

    fn subscribe_raw(&self, listener: Rc<dyn Fn()>) {
        self.listeners.register(Rc::new(move |_| listener()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::{Observable, observable};
    use std::cell::Cell;

    #[test]
    fn test_recomputes_on_upstream_write() {
        let base = observable(1);
        let doubled = {
            let base = base.clone();
            computed(move || base.get() * 2)
        };

        assert_eq!(doubled.get(), 2);

        base.set(5);
        assert_eq!(doubled.get(), 10);
    }

    #[test]
    fn test_notifies_listeners_on_recompute() {
        let base = observable(1);
        let doubled = {
            let base = base.clone();
            computed(move || base.get() * 2)
        };

        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            doubled.on_change(move |value: &i32| seen.borrow_mut().push(*value));
        }

        base.set(3);
        base.set(4);
        assert_eq!(*seen.borrow(), vec![6, 8]);
    }

    #[test]
    fn test_transitive_propagation() {
        let a = observable(1);
        let b = {
            let a = a.clone();
            computed(move || a.get() + 1)
        };
        let c = {
            let b = b.clone();
            computed(move || format!("v={}", b.get()))
        };

        a.set(2);
        assert_eq!(b.get(), 3);
        assert_eq!(c.get(), "v=3");
    }

    #[test]
    fn test_read_only_write_fails_without_side_effects() {
        let base = observable(1);
        let derived = {
            let base = base.clone();
            computed(move || base.get() + 1)
        };

        let notified = Rc::new(Cell::new(0));
        {
            let notified = notified.clone();
            derived.on_change(move |_| notified.set(notified.get() + 1));
        }

        assert_eq!(derived.set(99).err(), Some(ReadOnlyWrite));
        assert_eq!(derived.get(), 2);
        assert_eq!(notified.get(), 0);
    }

    #[test]
    fn test_writable_round_trip() {
        let first = observable(String::from("Ada"));
        let last = observable(String::from("Lovelace"));

        let full = {
            let (read_first, read_last) = (first.clone(), last.clone());
            let (write_first, write_last) = (first.clone(), last.clone());
            Computed::writable(
                move || format!("{} {}", read_first.get(), read_last.get()),
                move |value: String| {
                    let mut parts = value.splitn(2, ' ');
                    write_first.set(parts.next().unwrap_or_default().to_string());
                    write_last.set(parts.next().unwrap_or_default().to_string());
                },
            )
        };

        assert_eq!(full.get(), "Ada Lovelace");

        full.set(String::from("Grace Hopper")).unwrap();
        assert_eq!(first.get(), "Grace");
        assert_eq!(last.get(), "Hopper");
        assert_eq!(full.get(), "Grace Hopper");
    }

    #[test]
    fn test_chained_writes_through_writable() {
        let store = observable(0);
        let cell = {
            let (r, w) = (store.clone(), store.clone());
            Computed::writable(move || r.get(), move |value| {
                w.set(value);
            })
        };

        cell.set(1).unwrap().set(2).unwrap();
        assert_eq!(cell.get(), 2);
        assert_eq!(store.get(), 2);
    }

    #[test]
    fn test_lazy_defers_recompute_until_read() {
        let base = observable(1);
        let evals = Rc::new(Cell::new(0));
        let derived = {
            let base = base.clone();
            let evals = evals.clone();
            computed(move || {
                evals.set(evals.get() + 1);
                base.get() + 1
            })
        };
        assert_eq!(evals.get(), 1);

        derived.set_lazy(true);
        base.set(10);
        base.set(20);
        assert_eq!(evals.get(), 1);

        assert_eq!(derived.get(), 21);
        assert_eq!(evals.get(), 2);

        // Fresh again: another read recomputes nothing.
        assert_eq!(derived.get(), 21);
        assert_eq!(evals.get(), 2);
    }

    #[test]
    fn test_lazy_read_notifies_listeners() {
        let base = observable(1);
        let derived = {
            let base = base.clone();
            computed(move || base.get() + 1)
        };
        derived.set_lazy(true);

        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            derived.on_change(move |value: &i32| seen.borrow_mut().push(*value));
        }

        base.set(5);
        assert!(seen.borrow().is_empty());

        assert_eq!(derived.get(), 6);
        assert_eq!(*seen.borrow(), vec![6]);
    }

    #[test]
    fn test_write_refreshes_even_when_lazy() {
        let store = observable(1);
        let cell = {
            let (r, w) = (store.clone(), store.clone());
            Computed::writable(move || r.get(), move |value| {
                w.set(value);
            })
        };
        cell.set_lazy(true);

        cell.set(7).unwrap();
        assert!(!cell.inner.dirty.get());
        assert_eq!(cell.peek(), 7);
    }

    #[test]
    fn test_disabling_lazy_does_not_force_recompute() {
        let base = observable(1);
        let evals = Rc::new(Cell::new(0));
        let derived = {
            let base = base.clone();
            let evals = evals.clone();
            computed(move || {
                evals.set(evals.get() + 1);
                base.get()
            })
        };

        derived.set_lazy(true);
        base.set(2);
        derived.set_lazy(false);
        assert_eq!(evals.get(), 1);

        // Still stale until something triggers a refresh.
        assert_eq!(derived.peek(), 1);
        base.set(3);
        assert_eq!(derived.get(), 3);
    }

    #[test]
    fn test_duplicate_reads_collapse_to_one_subscription() {
        let base = observable(1);
        let evals = Rc::new(Cell::new(0));
        let _derived = {
            let base = base.clone();
            let evals = evals.clone();
            computed(move || {
                evals.set(evals.get() + 1);
                base.get() + base.get()
            })
        };
        assert_eq!(evals.get(), 1);

        base.set(2);
        assert_eq!(evals.get(), 2);
    }

    #[test]
    fn test_dependencies_fixed_at_construction() {
        let switch = observable(true);
        let a = observable(1);
        let b = observable(100);

        let picked = {
            let (switch, a, b) = (switch.clone(), a.clone(), b.clone());
            computed(move || if switch.get() { a.get() } else { b.get() })
        };
        assert_eq!(picked.get(), 1);

        switch.set(false);
        assert_eq!(picked.get(), 100);

        // The construction-time pass never reached the `else` branch, so
        // `b` is not a dependency: writing it re-evaluates nothing.
        b.set(200);
        assert_eq!(picked.get(), 100);

        // Any tracked dependency changing re-runs the read, which now sees
        // the new `b`.
        switch.set(false);
        assert_eq!(picked.get(), 200);
    }

    #[test]
    fn test_untracked_reads_are_not_dependencies() {
        let tracked = observable(1);
        let ignored = observable(10);

        let evals = Rc::new(Cell::new(0));
        let derived = {
            let (tracked, ignored) = (tracked.clone(), ignored.clone());
            let evals = evals.clone();
            computed(move || {
                evals.set(evals.get() + 1);
                tracked.get() + tracking::untracked(|| ignored.get())
            })
        };
        assert_eq!(derived.get(), 11);

        ignored.set(50);
        assert_eq!(evals.get(), 1);

        tracked.set(2);
        assert_eq!(derived.get(), 52);
    }

    #[test]
    fn test_nested_construction_keeps_outer_capture_intact() {
        let a = observable(1);
        let b = observable(10);

        let outer = {
            let (a, b) = (a.clone(), b.clone());
            computed(move || {
                let inner = {
                    let b = b.clone();
                    computed(move || b.get() * 2)
                };
                a.get() + inner.peek()
            })
        };
        assert_eq!(outer.get(), 21);

        // The inner construction pushed its own frame; `a` still landed in
        // the outer one.
        a.set(5);
        assert_eq!(outer.get(), 25);
    }

    #[test]
    fn test_computed_spec_context_binding() {
        struct Counter {
            step: i32,
            total: i32,
        }

        let cell = ComputedSpec {
            context: Counter { step: 2, total: 10 },
            read: Box::new(|counter: &Counter| counter.total * counter.step),
            write: Some(Box::new(|counter: &mut Counter, value: i32| {
                counter.total = value / counter.step;
            })),
        }
        .build();

        assert_eq!(cell.get(), 20);

        cell.set(40).unwrap();
        assert_eq!(cell.get(), 40);
    }

    #[test]
    fn test_computed_spec_without_write_is_read_only() {
        let cell = ComputedSpec {
            context: 5,
            read: Box::new(|base: &i32| base + 1),
            write: None,
        }
        .build();

        assert_eq!(cell.get(), 6);
        assert_eq!(cell.set(0).err(), Some(ReadOnlyWrite));
    }

    #[test]
    fn test_computed_as_dependency_of_computed_spec() {
        // ComputedSpec reads still capture: here the read function reaches
        // an observable through its context.
        let base = observable(3);
        let cell = ComputedSpec {
            context: base.clone(),
            read: Box::new(|base: &Observable<i32>| base.get() * base.get()),
            write: None,
        }
        .build();

        assert_eq!(cell.get(), 9);
        base.set(4);
        assert_eq!(cell.get(), 16);
    }
}
