#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Parse tables for grove.
//!
//! A [`ParseTable`] is the single artifact handed from the table builder to
//! the runtime:
//! - symbol metadata and production shapes
//! - per-state actions (with fork points) and gotos
//! - the lexical table: compiled token matchers and per-state lex modes
//!
//! It is built once and never mutated; share it behind an `Arc`.

mod dump;
mod lex;
mod table;

#[cfg(test)]
mod lex_tests;
#[cfg(test)]
mod table_tests;

pub use lex::{ERROR_LEX_MODE, LexMode, LexTable, LexTerminal, MatcherError, TokenMatch, TokenMatcher};
pub use table::{Action, ParseState, ParseTable, ProductionId, ProductionInfo, StateId, TableParts};

pub use grove_core::{FieldId, Symbol, SymbolInfo, SymbolKind};
