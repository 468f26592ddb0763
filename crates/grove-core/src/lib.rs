#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Grammar model for grove.
//!
//! Two layers:
//! - **Declarative** ([`Grammar`], [`Rule`]): tree-sitter's `grammar.json`
//!   shape, loadable from JSON or built with the [`dsl`] constructors
//! - **Validated** ([`GrammarModel`]): numbered symbols, terminals in
//!   declaration order and flat productions, ready for table construction

mod error;
pub mod grammar;
mod model;
mod prepare;
mod symbol;

pub use error::GrammarError;
pub use grammar::{Grammar, GrammarBuilder, Precedence, PrecedenceEntry, Rule, dsl};
pub use model::{Associativity, GrammarModel, Production, Step, TerminalDef, TokenPattern};
pub use symbol::{FieldId, Symbol, SymbolInfo, SymbolKind};
