//! LR(1) item sets and state construction.
//!
//! Items carry lookahead sets. With canonical merging, two kernels are the
//! same state only if items and lookaheads match. With LALR merging, kernels
//! with the same items share a state and their lookaheads are unioned; a
//! state whose lookaheads grow is expanded again until nothing changes.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap, VecDeque};

use grove_core::{GrammarModel, Symbol};
use grove_table::StateId;

use crate::StateMerging;
use crate::sets::{FirstSets, TerminalSet};

/// (production, dot position).
pub(crate) type Item = (usize, usize);
pub(crate) type ItemSet = BTreeMap<Item, TerminalSet>;

pub(crate) struct LrState {
    pub kernel: ItemSet,
    /// Kernel plus closure.
    pub items: ItemSet,
    pub transitions: BTreeMap<Symbol, StateId>,
}

pub(crate) struct Automaton {
    pub states: Vec<LrState>,
    /// Right-hand sides by production id. The last one is `S' → start`.
    pub rhs: Vec<Vec<Symbol>>,
}

impl Automaton {
    /// Id of the synthetic start production.
    pub fn augmented(&self) -> usize {
        self.rhs.len() - 1
    }
}

pub(crate) fn build(model: &GrammarModel, first: &FirstSets, merging: StateMerging) -> Automaton {
    let mut rhs: Vec<Vec<Symbol>> = model
        .productions()
        .iter()
        .map(|p| p.steps.iter().map(|s| s.symbol).collect())
        .collect();
    rhs.push(vec![model.start()]);
    let augmented = rhs.len() - 1;

    let mut builder = Builder {
        model,
        first,
        rhs,
        merging,
        states: Vec::new(),
        canonical: HashMap::new(),
        cores: HashMap::new(),
        queue: VecDeque::new(),
        queued: Vec::new(),
    };
    builder.intern(ItemSet::from([(
        (augmented, 0),
        TerminalSet::single(Symbol::END),
    )]));
    while let Some(id) = builder.queue.pop_front() {
        builder.queued[id] = false;
        builder.expand(id);
    }

    Automaton {
        states: builder.states,
        rhs: builder.rhs,
    }
}

struct Builder<'a> {
    model: &'a GrammarModel,
    first: &'a FirstSets,
    rhs: Vec<Vec<Symbol>>,
    merging: StateMerging,
    states: Vec<LrState>,
    canonical: HashMap<Vec<(Item, TerminalSet)>, StateId>,
    cores: HashMap<Vec<Item>, StateId>,
    queue: VecDeque<StateId>,
    queued: Vec<bool>,
}

impl Builder<'_> {
    fn intern(&mut self, kernel: ItemSet) -> StateId {
        match self.merging {
            StateMerging::Canonical => {
                let key: Vec<_> = kernel.iter().map(|(i, la)| (*i, la.clone())).collect();
                if let Some(&id) = self.canonical.get(&key) {
                    return id;
                }
                let id = self.push(kernel);
                self.canonical.insert(key, id);
                id
            }
            StateMerging::Lalr => {
                let key: Vec<Item> = kernel.keys().copied().collect();
                if let Some(&id) = self.cores.get(&key) {
                    let existing = &mut self.states[id].kernel;
                    let mut grew = false;
                    for (item, la) in &kernel {
                        if let Some(current) = existing.get_mut(item) {
                            grew |= current.union_with(la);
                        }
                    }
                    if grew {
                        self.enqueue(id);
                    }
                    return id;
                }
                let id = self.push(kernel);
                self.cores.insert(key, id);
                id
            }
        }
    }

    fn push(&mut self, kernel: ItemSet) -> StateId {
        let id = self.states.len();
        self.states.push(LrState {
            kernel,
            items: ItemSet::new(),
            transitions: BTreeMap::new(),
        });
        self.queued.push(false);
        self.enqueue(id);
        id
    }

    fn enqueue(&mut self, id: StateId) {
        if !self.queued[id] {
            self.queued[id] = true;
            self.queue.push_back(id);
        }
    }

    fn expand(&mut self, id: StateId) {
        let items = self.closure(&self.states[id].kernel);
        let mut successors: BTreeMap<Symbol, ItemSet> = BTreeMap::new();
        for (&(production, dot), lookahead) in &items {
            if let Some(&next) = self.rhs[production].get(dot) {
                successors
                    .entry(next)
                    .or_default()
                    .entry((production, dot + 1))
                    .or_default()
                    .union_with(lookahead);
            }
        }
        let mut transitions = BTreeMap::new();
        for (symbol, kernel) in successors {
            transitions.insert(symbol, self.intern(kernel));
        }
        let state = &mut self.states[id];
        state.items = items;
        state.transitions = transitions;
    }

    fn closure(&self, kernel: &ItemSet) -> ItemSet {
        let mut items = kernel.clone();
        let mut pending: Vec<Item> = kernel.keys().copied().collect();
        while let Some(item @ (production, dot)) = pending.pop() {
            let rhs = &self.rhs[production];
            let Some(&next) = rhs.get(dot) else {
                continue;
            };
            if self.model.is_terminal(next) {
                continue;
            }
            let (mut lookahead, nullable) = self.first.first_of_sequence(rhs[dot + 1..].iter().copied());
            if nullable && let Some(inherited) = items.get(&item) {
                lookahead.union_with(inherited);
            }
            for &candidate in self.model.productions_for(next) {
                let changed = match items.entry((candidate, 0)) {
                    Entry::Vacant(slot) => {
                        slot.insert(lookahead.clone());
                        true
                    }
                    Entry::Occupied(mut slot) => slot.get_mut().union_with(&lookahead),
                };
                if changed {
                    pending.push((candidate, 0));
                }
            }
        }
        items
    }
}
