#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Incremental GLR parsing for user-defined grammars.
//!
//! A grammar (tree-sitter's `grammar.json` shape, or built with [`dsl`])
//! compiles once into a [`Language`]. Parsing never fails: syntax errors
//! become `ERROR` nodes in the tree. After an edit, [`Language::reparse`]
//! rebuilds only what the edit touched and shares the rest with the old
//! tree.
//!
//! ```
//! use grove::{Edit, Grammar, Language, dsl::*};
//!
//! let grammar = Grammar::builder("sum")
//!     .rule("expr", choice([prec_left(1, seq([sym("expr"), "+".into(), sym("expr")])), sym("number")]))
//!     .rule("number", pattern("[0-9]+"))
//!     .build();
//! let language = Language::new(&grammar)?;
//!
//! let tree = language.parse(b"1+2").tree;
//! assert_eq!(tree.to_sexp(), r#"(expr (expr (number)) "+" (expr (number)))"#);
//!
//! let tree = language.reparse(&tree, &[Edit::insert(3, 2)], b"1+2+3").unwrap();
//! assert_eq!(tree.root_node().child_count(), 3);
//! # Ok::<(), grove::GrammarError>(())
//! ```

mod language;


pub use language::{Language, ParseResult};

pub use grove_compiler::{BuildOptions, ResolutionOrder, StateMerging, codegen};
pub use grove_core::{Grammar, GrammarError, GrammarModel, Rule, dsl};
pub use grove_runtime::{
    Edit, EditError, ExternalScanner, Leaf, Node, NoopTracer, ParseOptions, Parser, PrintTracer, ScanCursor,
    Subtree, SyntaxTree, Tracer, Verbosity,
};
pub use grove_table::{ParseTable, Symbol};
