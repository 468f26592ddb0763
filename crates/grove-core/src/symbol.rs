//! Symbol numbering shared by the grammar model, the parse table and the runtime.

use std::fmt;
use std::num::NonZeroU16;

/// Grammar symbol identifier.
///
/// Numbering is fixed by the grammar model: `end` is 0, `ERROR` is 1, then
/// lexical terminals, external tokens, named nonterminals, auxiliary
/// nonterminals and alias-only kinds, in that order. Every range is
/// contiguous, so "is this a terminal" is a single comparison.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Symbol(u16);

impl Symbol {
    /// End of input.
    pub const END: Symbol = Symbol(0);
    /// Error nodes and unmatched bytes.
    pub const ERROR: Symbol = Symbol(1);

    #[inline]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Create a symbol from a table index.
    ///
    /// Callers guarantee the index fits; the grammar model rejects grammars
    /// with more than `u16::MAX` symbols.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        debug_assert!(index <= u16::MAX as usize);
        Self(index as u16)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Field identifier. Field names are numbered from 1 in first-use order.
pub type FieldId = NonZeroU16;

/// What a symbol stands for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SymbolKind {
    End,
    Error,
    /// Token recognized by the built-in lexer.
    Terminal,
    /// Token recognized by an external scanner.
    External,
    /// Rule declared in the grammar.
    NonTerminal,
    /// Rule synthesized while flattening (repetitions, complex aliases).
    Auxiliary,
    /// Kind that only exists as the target of an alias.
    Alias,
}

/// Display metadata for one symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    /// Hidden symbols are transparent in the tree query surface.
    pub visible: bool,
    /// Named symbols come from rules; anonymous ones from string literals.
    pub named: bool,
    pub supertype: bool,
    /// Named rule an auxiliary rule was extracted from.
    pub origin: Option<Symbol>,
}

impl SymbolInfo {
    pub(crate) fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        let name = name.into();
        Self {
            visible: !name.starts_with('_'),
            name,
            kind,
            named: true,
            supertype: false,
            origin: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::End | SymbolKind::Error | SymbolKind::Terminal | SymbolKind::External
        )
    }
}
