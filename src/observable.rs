//! Observable cell - an independently settable reactive value.
//!
//! An observable is a leaf of the dependency graph: it has no dependencies
//! of its own. Reading one while a computed is under construction registers
//! it as a dependency of that computed; writing one notifies its listeners
//! synchronously, in registration order.

use std::cell::RefCell;
use std::rc::Rc;

use crate::notify::{Listener, Listeners};
use crate::tracking::{self, CellId, Source};

/// Create an observable cell holding `initial`.
pub fn observable<T: Clone + 'static>(initial: T) -> Observable<T> {
    Observable::new(initial)
}

/// A mutable reactive cell.
///
/// `Observable` is a cheap handle: cloning it yields another handle to the
/// same cell. Cells are single-threaded (`Rc`-backed) and live until the
/// last handle and the last subscription referring to them are gone; there
/// is no explicit teardown.
///
/// # Example
///
/// ```
/// use observe::observable;
///
/// let count = observable(1);
/// count.on_change(|value| println!("count is now {value}"));
///
/// // Writes chain: each `set` returns the cell.
/// count.set(2).set(3);
/// assert_eq!(count.get(), 3);
/// ```
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

struct ObservableInner<T> {
    id: CellId,
    value: RefCell<T>,
    listeners: Listeners<T>,
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                id: tracking::next_cell_id(),
                value: RefCell::new(initial),
                listeners: Listeners::new(),
            }),
        }
    }

    /// Read the current value.
    ///
    /// If a computed construction is capturing, this cell registers itself
    /// as a dependency of the computed being built.
    pub fn get(&self) -> T {
        if tracking::is_tracking() {
            tracking::register_read(self.inner.clone() as Rc<dyn Source>);
        }
        self.inner.value.borrow().clone()
    }

    /// Read the current value without registering a dependency.
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Write a new value and notify listeners with it.
    ///
    /// Returns the cell itself so writes chain: `cell.set(1).set(2)`.
    pub fn set(&self, value: T) -> &Self {
        *self.inner.value.borrow_mut() = value;
        let value = self.inner.value.borrow().clone();
        self.inner.listeners.notify(&value);
        self
    }

    /// Register a listener called with every written value.
    pub fn on_change(&self, listener: impl Fn(&T) + 'static) {
        self.inner.listeners.register(Rc::new(listener));
    }

    /// Register an already-shared listener.
    pub fn subscribe(&self, listener: Listener<T>) {
        self.inner.listeners.register(listener);
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Source for ObservableInner<T> {
    fn id(&self) -> CellId {
        self.id
    }

    fn subscribe_raw(&self, listener: Rc<dyn Fn()>) {
        self.listeners.register(Rc::new(move |_| listener()));
    }
}
