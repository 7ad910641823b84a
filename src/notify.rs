//! Listener registration and notification.
//!
//! One ordered listener list per cell, shared by observable and computed
//! cells. Delivery is synchronous on the calling thread, in registration
//! order. Listeners may themselves write to cells, which re-enters
//! notification; the list borrow is released around every call so
//! re-entrancy cannot trip the `RefCell`.

use std::cell::RefCell;
use std::rc::Rc;

/// Listener callback type (Rc for shared ownership in closures).
pub type Listener<T> = Rc<dyn Fn(&T)>;

/// Ordered list of listeners for one cell.
pub struct Listeners<T> {
    list: RefCell<Vec<Listener<T>>>,
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self {
            list: RefCell::new(Vec::new()),
        }
    }

    /// Append a listener. Call order is registration order.
    pub fn register(&self, listener: Listener<T>) {
        self.list.borrow_mut().push(listener);
    }

    /// Invoke every listener with `value`, in registration order.
    ///
    /// The list is walked live by index: a listener appended during the
    /// fan-out is reached by that same fan-out. A panicking listener
    /// unwinds to the caller and the remaining listeners are not called.
    pub fn notify(&self, value: &T) {
        #[cfg(feature = "tracing")]
        tracing::trace!(listeners = self.len(), "notify");

        let mut index = 0;
        loop {
            let listener = {
                let list = self.list.borrow();
                match list.get(index) {
                    Some(listener) => Rc::clone(listener),
                    None => break,
                }
            };
            listener(value);
            index += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.list.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.borrow().is_empty()
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}
