use std::sync::Arc;

use grove_compiler::{BuildOptions, build_grammar, codegen};
use grove_core::{Grammar, GrammarError};
use grove_runtime::{Edit, EditError, ParseOptions, Parser, SyntaxTree};
use grove_table::ParseTable;

/// A compiled grammar.
///
/// Cloning is cheap: every clone, parser and tree shares one immutable
/// table, which may be read from any number of threads.
#[derive(Clone, Debug)]
pub struct Language {
    table: Arc<ParseTable>,
    options: ParseOptions,
}

/// Outcome of [`Language::parse`].
#[derive(Debug)]
pub struct ParseResult {
    pub tree: SyntaxTree,
    /// Some alternative readings of an ambiguous region were dropped to
    /// stay within the fork limit.
    pub ambiguity_limit_hit: bool,
}

impl Language {
    pub fn new(grammar: &Grammar) -> Result<Self, GrammarError> {
        Self::with_build_options(grammar, BuildOptions::default())
    }

    pub fn with_build_options(grammar: &Grammar, options: BuildOptions) -> Result<Self, GrammarError> {
        let table = build_grammar(grammar, options)?;
        tracing::info!(
            grammar = table.name(),
            states = table.state_count(),
            symbols = table.symbols().len(),
            "language ready"
        );
        Ok(Self::from_table(Arc::new(table)))
    }

    /// Compile a tree-sitter style `grammar.json`.
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        Self::new(&Grammar::from_json(json)?)
    }

    pub fn from_table(table: Arc<ParseTable>) -> Self {
        Self {
            table,
            options: ParseOptions::default(),
        }
    }

    /// Options for parsers handed out by this language.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub fn table(&self) -> &Arc<ParseTable> {
        &self.table
    }

    /// A parser for this language. Grammars with external tokens need one
    /// with a scanner attached through [`Parser::with_external_scanner`].
    pub fn parser(&self) -> Parser {
        Parser::new(Arc::clone(&self.table)).with_options(self.options)
    }

    pub fn parse(&self, source: &[u8]) -> ParseResult {
        let tree = self.parser().parse(source);
        ParseResult {
            ambiguity_limit_hit: tree.ambiguity_limit_hit(),
            tree,
        }
    }

    /// Reparse `source`, the text of `old` after `edits`, in submission
    /// order.
    pub fn reparse(&self, old: &SyntaxTree, edits: &[Edit], source: &[u8]) -> Result<SyntaxTree, EditError> {
        self.parser().reparse(old, edits, source)
    }

    /// Rust source for a closed enum of this language's node kinds.
    pub fn node_kinds(&self) -> String {
        codegen::rust_node_kinds(&self.table)
    }
}
