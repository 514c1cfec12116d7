//! Shared test utilities for the integration tests.

#![allow(dead_code)]

use std::{cell::Cell, rc::Rc};

use dynarray::DynArray;

/// Initialize a tracing subscriber so growth events show up with `--nocapture`.
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Builds an array holding `values` in order, starting from the default capacity.
pub fn array_of<T: Clone>(values: &[T]) -> DynArray<T> {
    let mut array = DynArray::new();
    for value in values {
        array.push(value.clone());
    }
    array
}

/// Element that counts how many of its kind have been dropped.
#[derive(Debug)]
pub struct Tracked {
    pub id: u32,
    drops: Rc<Cell<usize>>,
}

impl Tracked {
    pub fn new(id: u32, drops: &Rc<Cell<usize>>) -> Self {
        Self {
            id,
            drops: Rc::clone(drops),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}
