//! Declarative grammar layer.
//!
//! [`Grammar`] mirrors tree-sitter's `grammar.json` one to one. It can be
//! loaded from JSON or assembled in Rust with the [`dsl`] constructors and
//! [`GrammarBuilder`]. Nothing here is validated; [`Grammar::validate`]
//! turns it into a [`GrammarModel`](crate::GrammarModel).

pub mod dsl;
mod json;
mod types;

#[cfg(test)]
mod json_tests;

pub use dsl::GrammarBuilder;
pub use types::{Grammar, Precedence, PrecedenceEntry, Rule};
