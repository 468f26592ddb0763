#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Lexer, GLR parser and incremental syntax trees for grove.
//!
//! A [`Parser`] drives a [`ParseTable`](grove_table::ParseTable) over source
//! bytes and always produces a [`SyntaxTree`]: unparsable regions become
//! `ERROR` nodes instead of failures. [`Parser::reparse`] takes the previous
//! tree and the [`Edit`]s that turned its text into the new one, and shifts
//! every provably unchanged subtree over as a unit.

mod edit;
mod invariants;
mod lexer;
mod options;
mod parser;
mod reuse;
mod stack;
mod subtree;
mod trace;
mod tree;

#[cfg(test)]
mod edit_tests;
#[cfg(test)]
mod parser_tests;
#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod trace_tests;
#[cfg(test)]
mod tree_tests;

pub use edit::{Edit, EditError, EditMap};
pub use lexer::{ExternalScanner, ScanCursor};
pub use options::ParseOptions;
pub use parser::Parser;
pub use subtree::{LeafInfo, Subtree};
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
pub use tree::{Leaf, Node, SyntaxTree};
