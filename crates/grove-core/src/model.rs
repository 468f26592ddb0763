//! Validated, flattened grammar.
//!
//! Every rule is reduced to plain productions over numbered symbols. Tokens
//! are collected into [`TerminalDef`]s in declaration order. This is the only
//! shape the table builder and lexer ever look at.

use std::fmt::Write as _;
use std::ops::Range;

use crate::grammar::{Precedence, PrecedenceEntry};
use crate::symbol::{FieldId, Symbol, SymbolInfo, SymbolKind};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Associativity {
    Left,
    Right,
}

/// One symbol on the right-hand side of a production.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Step {
    pub symbol: Symbol,
    /// Innermost enclosing static precedence.
    pub precedence: Precedence,
    pub associativity: Option<Associativity>,
    pub field: Option<FieldId>,
    /// Kind the child is renamed to in the tree.
    pub alias: Option<Symbol>,
}

impl Step {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            precedence: Precedence::default(),
            associativity: None,
            field: None,
            alias: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Production {
    pub lhs: Symbol,
    pub steps: Vec<Step>,
    /// Preference used when choosing among ambiguous parses.
    pub dynamic_precedence: i32,
}

impl Production {
    /// Precedence of a reduction by this production: that of its last step.
    pub fn precedence(&self) -> &Precedence {
        static NONE: Precedence = Precedence::Integer(0);
        self.steps.last().map_or(&NONE, |s| &s.precedence)
    }

    pub fn associativity(&self) -> Option<Associativity> {
        self.steps.last().and_then(|s| s.associativity)
    }
}

/// How the lexer recognizes a terminal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenPattern {
    /// Exact byte string.
    Literal(String),
    /// Regex in `regex-syntax` dialect, already validated.
    Regex(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminalDef {
    pub symbol: Symbol,
    pub pattern: TokenPattern,
    /// Lexical precedence. Breaks ties between equally long matches.
    pub precedence: i32,
    /// Must follow the previous token with no extras in between.
    pub immediate: bool,
}

/// Result of [`Grammar::validate`](crate::Grammar::validate).
#[derive(Clone, Debug)]
pub struct GrammarModel {
    pub(crate) name: String,
    pub(crate) symbols: Vec<SymbolInfo>,
    pub(crate) terminals: Vec<TerminalDef>,
    pub(crate) externals: Vec<Symbol>,
    pub(crate) productions: Vec<Production>,
    /// Production ids per nonterminal, indexed from `first_nonterminal`.
    pub(crate) by_lhs: Vec<Vec<usize>>,
    pub(crate) first_nonterminal: u16,
    pub(crate) start: Symbol,
    pub(crate) extras: Vec<Symbol>,
    pub(crate) conflicts: Vec<Vec<Symbol>>,
    pub(crate) precedences: Vec<Vec<PrecedenceEntry>>,
    pub(crate) word: Option<Symbol>,
    pub(crate) field_names: Vec<String>,
}

impl GrammarModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbols(&self) -> &[SymbolInfo] {
        &self.symbols
    }

    pub fn symbol(&self, symbol: Symbol) -> &SymbolInfo {
        &self.symbols[symbol.index()]
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Look up a symbol by name, preferring named symbols.
    pub fn symbol_by_name(&self, name: &str) -> Option<Symbol> {
        let mut anonymous = None;
        for (i, info) in self.symbols.iter().enumerate() {
            if info.name != name || info.kind == SymbolKind::End {
                continue;
            }
            if info.named {
                return Some(Symbol::from_index(i));
            }
            anonymous.get_or_insert(Symbol::from_index(i));
        }
        anonymous
    }

    /// Terminals (end, error, lexical and external tokens) occupy `0..n`.
    pub fn terminal_count(&self) -> usize {
        self.first_nonterminal as usize
    }

    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        symbol.get() < self.first_nonterminal
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = Symbol> + '_ {
        (self.first_nonterminal as usize..self.first_nonterminal as usize + self.by_lhs.len())
            .map(Symbol::from_index)
    }

    /// Lexical terminals in declaration order.
    pub fn terminals(&self) -> &[TerminalDef] {
        &self.terminals
    }

    pub fn externals(&self) -> &[Symbol] {
        &self.externals
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, id: usize) -> &Production {
        &self.productions[id]
    }

    /// Ids of the productions whose left-hand side is `lhs`.
    pub fn productions_for(&self, lhs: Symbol) -> &[usize] {
        match (lhs.get() as usize).checked_sub(self.first_nonterminal as usize) {
            Some(i) if i < self.by_lhs.len() => &self.by_lhs[i],
            _ => &[],
        }
    }

    /// Symbol ids reserved for nonterminals.
    pub fn nonterminal_range(&self) -> Range<usize> {
        self.first_nonterminal as usize..self.first_nonterminal as usize + self.by_lhs.len()
    }

    pub fn start(&self) -> Symbol {
        self.start
    }

    pub fn extras(&self) -> &[Symbol] {
        &self.extras
    }

    pub fn is_extra(&self, symbol: Symbol) -> bool {
        self.extras.contains(&symbol)
    }

    /// Declared conflict sets.
    pub fn conflicts(&self) -> &[Vec<Symbol>] {
        &self.conflicts
    }

    pub fn precedence_orderings(&self) -> &[Vec<PrecedenceEntry>] {
        &self.precedences
    }

    pub fn word(&self) -> Option<Symbol> {
        self.word
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn field_name(&self, id: FieldId) -> &str {
        &self.field_names[id.get() as usize - 1]
    }

    /// Named rule a symbol belongs to: auxiliary rules map to their origin.
    pub fn origin(&self, symbol: Symbol) -> Symbol {
        self.symbol(symbol).origin.unwrap_or(symbol)
    }

    /// Human-readable symbol: anonymous tokens are quoted.
    pub fn display_symbol(&self, symbol: Symbol) -> String {
        let info = self.symbol(symbol);
        if info.named || info.kind == SymbolKind::End {
            info.name.clone()
        } else {
            format!("'{}'", info.name)
        }
    }

    /// Render a production, optionally with an item dot: `expr → expr • '+' expr`.
    pub fn display_production(&self, id: usize, dot: Option<usize>) -> String {
        let p = &self.productions[id];
        let mut out = format!("{} →", self.symbol(p.lhs).name);
        for (i, step) in p.steps.iter().enumerate() {
            if dot == Some(i) {
                out.push_str(" •");
            }
            let _ = write!(out, " {}", self.display_symbol(step.symbol));
        }
        if dot == Some(p.steps.len()) {
            out.push_str(" •");
        }
        out
    }

    /// Textual dump of symbols, terminals and productions.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str("[symbols]\n");
        for (i, info) in self.symbols.iter().enumerate() {
            let _ = write!(out, "{i:>3} {:?} {}", info.kind, info.name);
            if !info.visible {
                out.push_str(" (hidden)");
            }
            if !info.named {
                out.push_str(" (anonymous)");
            }
            out.push('\n');
        }
        out.push_str("\n[terminals]\n");
        for t in &self.terminals {
            let pattern = match &t.pattern {
                TokenPattern::Literal(s) => format!("{s:?}"),
                TokenPattern::Regex(r) => format!("/{r}/"),
            };
            let _ = write!(out, "{:>3} {pattern}", t.symbol.get());
            if t.precedence != 0 {
                let _ = write!(out, " prec={}", t.precedence);
            }
            if t.immediate {
                out.push_str(" immediate");
            }
            out.push('\n');
        }
        out.push_str("\n[productions]\n");
        for id in 0..self.productions.len() {
            let _ = writeln!(out, "{id:>3} {}", self.display_production(id, None));
        }
        out
    }
}
