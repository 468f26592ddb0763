//! Terminal sets, nullability and FIRST sets.

use grove_core::{GrammarModel, Symbol};

/// Bitset over terminal symbols.
///
/// Words are only ever added when a bit is set, so equal sets have equal
/// representations and the derived `Eq`/`Hash` are sound.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalSet {
    words: Vec<u64>,
}

impl TerminalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(symbol: Symbol) -> Self {
        let mut set = Self::new();
        set.insert(symbol);
        set
    }

    /// Returns true if the symbol was not present.
    pub fn insert(&mut self, symbol: Symbol) -> bool {
        let (word, bit) = (symbol.index() / 64, symbol.index() % 64);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let mask = 1u64 << bit;
        let added = self.words[word] & mask == 0;
        self.words[word] |= mask;
        added
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        let (word, bit) = (symbol.index() / 64, symbol.index() % 64);
        self.words.get(word).is_some_and(|w| w & (1u64 << bit) != 0)
    }

    /// Returns true if anything was added.
    pub fn union_with(&mut self, other: &TerminalSet) -> bool {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let merged = *mine | theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..64)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| Symbol::from_index(i * 64 + bit))
        })
    }
}

/// FIRST sets and nullability for every symbol.
pub struct FirstSets {
    first: Vec<TerminalSet>,
    nullable: Vec<bool>,
}

impl FirstSets {
    pub fn compute(model: &GrammarModel) -> Self {
        let count = model.symbol_count();
        let mut first = vec![TerminalSet::new(); count];
        let mut nullable = vec![false; count];
        for t in 0..model.terminal_count() {
            first[t].insert(Symbol::from_index(t));
        }

        let mut changed = true;
        while changed {
            changed = false;
            for p in model.productions() {
                let lhs = p.lhs.index();
                let mut all_nullable = true;
                for step in &p.steps {
                    let s = step.symbol.index();
                    if s != lhs {
                        let tail = first[s].clone();
                        changed |= first[lhs].union_with(&tail);
                    }
                    if !nullable[s] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !nullable[lhs] {
                    nullable[lhs] = true;
                    changed = true;
                }
            }
        }
        Self { first, nullable }
    }

    pub fn first(&self, symbol: Symbol) -> &TerminalSet {
        &self.first[symbol.index()]
    }

    pub fn is_nullable(&self, symbol: Symbol) -> bool {
        self.nullable[symbol.index()]
    }

    /// FIRST of a symbol string, and whether the whole string is nullable.
    pub fn first_of_sequence(&self, symbols: impl IntoIterator<Item = Symbol>) -> (TerminalSet, bool) {
        let mut set = TerminalSet::new();
        for symbol in symbols {
            set.union_with(self.first(symbol));
            if !self.is_nullable(symbol) {
                return (set, false);
            }
        }
        (set, true)
    }
}
