//! The shadebook content: a tree of sections holding the built-in teaching
//! examples, plus the small math helper a few of them share.
//!
//! The catalog is assembled once at startup and never mutated; everything
//! that can go wrong in here is a programming error, not a runtime
//! condition.

mod fundamentals;
mod index;
pub mod m3;

pub use index::{NavigationEntry, NavigationIndex};

use driver::ExampleDescriptor;

/// A named grouping node. A section may hold examples, child sections,
/// both, or neither.
pub struct Section {
    pub title: &'static str,
    pub examples: Vec<ExampleDescriptor>,
    pub sections: Vec<Section>,
}

impl Section {
    pub fn group(title: &'static str, sections: Vec<Section>) -> Self {
        Self {
            title,
            examples: Vec::new(),
            sections,
        }
    }

    pub fn leaf(title: &'static str, examples: Vec<ExampleDescriptor>) -> Self {
        Self {
            title,
            examples,
            sections: Vec::new(),
        }
    }
}

/// The full table of contents.
pub fn catalog() -> Vec<Section> {
    vec![fundamentals::section()]
}
