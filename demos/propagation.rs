//! Propagation Demo - Eager and lazy dependency chains
//!
//! Demonstrates automatic propagation:
//! - A three-cell chain updating on a single write
//! - The same chain with a lazy middle cell deferring work
//!
//! Run with: cargo run --example propagation

use std::cell::Cell;
use std::rc::Rc;

use observe::{computed, observable};

fn main() {
    println!("=== observe Propagation Demo ===\n");

    let a = observable(1);
    let evals = Rc::new(Cell::new(0u32));

    let b = {
        let a = a.clone();
        let evals = evals.clone();
        computed(move || {
            evals.set(evals.get() + 1);
            a.get() + 1
        })
    };
    let c = {
        let b = b.clone();
        computed(move || format!("v={}", b.get()))
    };

    println!("a={}  b={}  c=\"{}\"  (b evaluated {}x)", a.get(), b.get(), c.get(), evals.get());

    println!("\n--- a.set(2): eager chain updates immediately ---\n");
    a.set(2);
    println!("a={}  b={}  c=\"{}\"  (b evaluated {}x)", a.get(), b.get(), c.get(), evals.get());

    println!("\n--- b.set_lazy(true); three writes to a ---\n");
    b.set_lazy(true);
    a.set(3);
    a.set(4);
    a.set(5);
    println!("b evaluated {}x so far (writes only marked it stale)", evals.get());

    println!("\n--- reading b pays the deferred cost once ---\n");
    println!("b={}  (b evaluated {}x)", b.get(), evals.get());
    println!("c=\"{}\"", c.get());
}
