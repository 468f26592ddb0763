#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Parse table builder for grove.
//!
//! Turns a validated [`GrammarModel`] into a [`ParseTable`]:
//! - canonical LR(1) or LALR state construction
//! - conflict resolution by precedence, associativity and declared conflicts
//! - lexical table with per-state lex modes and keyword extraction
//!
//! ```
//! use grove_compiler::{BuildOptions, build};
//! use grove_core::{Grammar, dsl::*};
//!
//! let grammar = Grammar::builder("list")
//!     .rule("list", repeat1(sym("item")))
//!     .rule("item", pattern("[a-z]+"))
//!     .extra(pattern(r"\s"))
//!     .build();
//! let table = build(&grammar.validate()?, BuildOptions::default())?;
//! assert!(table.state_count() > 1);
//! # Ok::<(), grove_core::GrammarError>(())
//! ```

mod automaton;
mod build;
pub mod codegen;
mod conflicts;
mod lexical;
mod sets;

#[cfg(test)]
mod build_tests;
#[cfg(test)]
mod sets_tests;

use grove_core::{Grammar, GrammarError, GrammarModel};
use grove_table::ParseTable;

pub use sets::{FirstSets, TerminalSet};

/// How LR(1) states with equal cores are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StateMerging {
    /// Keep states apart unless their lookaheads match too.
    #[default]
    Canonical,
    /// Merge states with the same items, unioning lookaheads.
    Lalr,
}

/// Which mechanism settles a conflict first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolutionOrder {
    /// Precedence and associativity, then declared conflicts.
    #[default]
    PrecedenceFirst,
    /// A declared conflict forks even when precedence could decide it.
    DeclaredConflictsFirst,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BuildOptions {
    pub state_merging: StateMerging,
    pub resolution_order: ResolutionOrder,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_merging(mut self, merging: StateMerging) -> Self {
        self.state_merging = merging;
        self
    }

    pub fn resolution_order(mut self, order: ResolutionOrder) -> Self {
        self.resolution_order = order;
        self
    }
}

/// Build the parse table for a validated grammar.
pub fn build(model: &GrammarModel, options: BuildOptions) -> Result<ParseTable, GrammarError> {
    build::build(model, options)
}

/// Validate and build in one step.
pub fn build_grammar(grammar: &Grammar, options: BuildOptions) -> Result<ParseTable, GrammarError> {
    build(&grammar.validate()?, options)
}
