//! Parse table types.

use grove_core::{FieldId, Symbol, SymbolInfo, SymbolKind};

use crate::lex::{LexMode, LexTable};

pub type StateId = usize;
pub type ProductionId = usize;

/// Parser action for a (state, lookahead) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Shift(StateId),
    /// Shift an extra token without changing state.
    ShiftExtra,
    Reduce(ProductionId),
    Accept,
}

/// Shape of one production as the runtime needs it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductionInfo {
    pub lhs: Symbol,
    pub rhs: Box<[Symbol]>,
    /// Field label per child position.
    pub fields: Box<[Option<FieldId>]>,
    /// Alias per child position.
    pub aliases: Box<[Option<Symbol>]>,
    pub dynamic_precedence: i32,
}

impl ProductionInfo {
    pub fn child_count(&self) -> usize {
        self.rhs.len()
    }

    pub fn field(&self, child: usize) -> Option<FieldId> {
        self.fields.get(child).copied().flatten()
    }

    pub fn alias(&self, child: usize) -> Option<Symbol> {
        self.aliases.get(child).copied().flatten()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseState {
    /// Actions per terminal, sorted by symbol. More than one action is a fork.
    pub actions: Vec<(Symbol, Box<[Action]>)>,
    /// Successor per nonterminal, sorted by symbol.
    pub gotos: Vec<(Symbol, StateId)>,
    pub lex_mode: usize,
    /// Kernel items as (production, dot). The start item is omitted.
    pub kernel: Vec<(ProductionId, usize)>,
}

impl ParseState {
    pub fn actions(&self, lookahead: Symbol) -> &[Action] {
        match self.actions.binary_search_by_key(&lookahead, |(s, _)| *s) {
            Ok(i) => &self.actions[i].1,
            Err(_) => &[],
        }
    }

    pub fn goto(&self, nonterminal: Symbol) -> Option<StateId> {
        self.gotos
            .binary_search_by_key(&nonterminal, |(s, _)| *s)
            .ok()
            .map(|i| self.gotos[i].1)
    }
}

/// Everything the table builder produces, assembled into a [`ParseTable`].
#[derive(Debug)]
pub struct TableParts {
    pub name: String,
    pub symbols: Vec<SymbolInfo>,
    pub start: Symbol,
    pub states: Vec<ParseState>,
    pub productions: Vec<ProductionInfo>,
    pub field_names: Vec<String>,
    pub extras: Vec<Symbol>,
    pub externals: Vec<Symbol>,
    pub lex: LexTable,
}

/// Immutable parse automaton plus lexical table.
#[derive(Debug)]
pub struct ParseTable {
    name: String,
    symbols: Vec<SymbolInfo>,
    first_nonterminal: usize,
    start: Symbol,
    states: Vec<ParseState>,
    productions: Vec<ProductionInfo>,
    field_names: Vec<String>,
    extras: Vec<Symbol>,
    externals: Vec<Symbol>,
    lex: LexTable,
}

impl ParseTable {
    pub fn new(parts: TableParts) -> Self {
        let first_nonterminal = parts
            .symbols
            .iter()
            .position(|s| !s.is_terminal())
            .unwrap_or(parts.symbols.len());
        Self {
            name: parts.name,
            symbols: parts.symbols,
            first_nonterminal,
            start: parts.start,
            states: parts.states,
            productions: parts.productions,
            field_names: parts.field_names,
            extras: parts.extras,
            externals: parts.externals,
            lex: parts.lex,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbols(&self) -> &[SymbolInfo] {
        &self.symbols
    }

    pub fn symbol(&self, symbol: Symbol) -> &SymbolInfo {
        &self.symbols[symbol.index()]
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        &self.symbols[symbol.index()].name
    }

    /// First symbol with the given name and namedness.
    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<Symbol> {
        self.symbols
            .iter()
            .position(|s| s.name == name && s.named == named && s.kind != SymbolKind::End)
            .map(Symbol::from_index)
    }

    /// Quote anonymous tokens, leave named symbols bare.
    pub fn display_symbol(&self, symbol: Symbol) -> String {
        let info = self.symbol(symbol);
        if info.named || info.kind == SymbolKind::End {
            info.name.clone()
        } else {
            format!("'{}'", info.name)
        }
    }

    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        symbol.index() < self.first_nonterminal
    }

    pub fn start_symbol(&self) -> Symbol {
        self.start
    }

    pub fn states(&self) -> &[ParseState] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, id: StateId) -> &ParseState {
        &self.states[id]
    }

    pub fn actions(&self, state: StateId, lookahead: Symbol) -> &[Action] {
        self.states[state].actions(lookahead)
    }

    pub fn goto(&self, state: StateId, nonterminal: Symbol) -> Option<StateId> {
        self.states[state].goto(nonterminal)
    }

    pub fn lex_mode(&self, state: StateId) -> &LexMode {
        self.lex.mode(self.states[state].lex_mode)
    }

    pub fn productions(&self) -> &[ProductionInfo] {
        &self.productions
    }

    pub fn production(&self, id: ProductionId) -> &ProductionInfo {
        &self.productions[id]
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn field_name(&self, id: FieldId) -> &str {
        &self.field_names[id.get() as usize - 1]
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        let index = self.field_names.iter().position(|n| n == name)?;
        FieldId::new(u16::try_from(index + 1).ok()?)
    }

    pub fn extras(&self) -> &[Symbol] {
        &self.extras
    }

    pub fn is_extra(&self, symbol: Symbol) -> bool {
        self.extras.contains(&symbol)
    }

    pub fn externals(&self) -> &[Symbol] {
        &self.externals
    }

    /// Position of an external token in the externals list.
    pub fn external_index(&self, symbol: Symbol) -> Option<usize> {
        self.externals.iter().position(|&s| s == symbol)
    }

    pub fn lex(&self) -> &LexTable {
        &self.lex
    }

    /// Human-readable rendering of every state.
    pub fn dump(&self) -> String {
        crate::dump::dump(self)
    }
}
