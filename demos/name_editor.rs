//! Name Editor Demo - Two-way computed cells
//!
//! Demonstrates writable computeds:
//! - A full-name cell derived from two observables
//! - Writing through the cell to update both sources
//! - A context-bound cell built from an explicit ComputedSpec
//!
//! Run with: cargo run --example name_editor

use observe::{Computed, ComputedSpec, observable};

fn main() {
    println!("=== observe Name Editor Demo ===\n");

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

    full.on_change(|value| println!("  [listener] full name is now \"{value}\""));

    println!("Initial full name: \"{}\"", full.get());

    println!("\n--- Writing \"Grace Hopper\" through the computed ---\n");
    full.set(String::from("Grace Hopper")).expect("cell is writable");

    println!("\nfirst = \"{}\"", first.get());
    println!("last  = \"{}\"", last.get());
    println!("full  = \"{}\"", full.get());

    println!("\n--- Context-bound cell ---\n");

    struct Name {
        first: String,
        last: String,
    }

    let badge = ComputedSpec {
        context: Name {
            first: String::from("Alan"),
            last: String::from("Turing"),
        },
        read: Box::new(|name: &Name| format!("{}, {}", name.last, name.first)),
        write: Some(Box::new(|name: &mut Name, value: String| {
            if let Some((last, first)) = value.split_once(", ") {
                name.last = last.to_string();
                name.first = first.to_string();
            }
        })),
    }
    .build();

    println!("badge reads: \"{}\"", badge.get());
    badge.set(String::from("Hamilton, Margaret")).expect("cell is writable");
    println!("after write: \"{}\"", badge.get());
}
