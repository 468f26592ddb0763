//! Conflict resolution for a single (state, lookahead) pair.
//!
//! Shift/reduce and reduce/reduce conflicts are settled by static
//! precedence and associativity. Whatever survives is either a declared
//! conflict (kept as a fork for the GLR runtime) or a build error.

use std::cmp::Ordering;

use grove_core::{Associativity, GrammarError, GrammarModel, Precedence, PrecedenceEntry, Symbol};
use grove_table::{Action, ProductionId, StateId};
use indexmap::IndexSet;

use crate::ResolutionOrder;
use crate::automaton::Item;

/// Every action the item set allows on one lookahead.
#[derive(Debug, Default)]
pub(crate) struct Candidates {
    pub shift: Option<StateId>,
    /// Items with the lookahead right after the dot.
    pub shift_items: Vec<Item>,
    pub reduces: Vec<ProductionId>,
    pub accept: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Level<'a> {
    Integer(i32),
    Name(&'a str),
    Rule(&'a str),
}

pub(crate) struct Resolver<'a> {
    model: &'a GrammarModel,
    order: ResolutionOrder,
}

impl<'a> Resolver<'a> {
    pub fn new(model: &'a GrammarModel, order: ResolutionOrder) -> Self {
        Self { model, order }
    }

    pub fn resolve(
        &self,
        state: StateId,
        lookahead: Symbol,
        mut candidates: Candidates,
    ) -> Result<Box<[Action]>, GrammarError> {
        if candidates.accept {
            return Ok(Box::new([Action::Accept]));
        }
        candidates.reduces.sort_unstable();
        candidates.reduces.dedup();

        let mut shift = candidates.shift;
        let mut reduces = candidates.reduces;
        let shift_items = candidates.shift_items;

        if shift.is_some() as usize + reduces.len() == 1 {
            return Ok(self.actions(shift, &shift_items, &reduces));
        }

        if self.order == ResolutionOrder::DeclaredConflictsFirst
            && self.is_declared(shift.is_some(), &shift_items, &reduces)
        {
            return Ok(self.actions(shift, &shift_items, &reduces));
        }

        // Reduce/reduce: keep only productions no other one outranks.
        let levels: Vec<Level<'_>> = reduces.iter().map(|&p| self.reduce_level(p)).collect();
        let kept: Vec<ProductionId> = reduces
            .iter()
            .zip(&levels)
            .filter(|(_, level)| {
                !levels
                    .iter()
                    .any(|other| self.compare(*other, **level) == Some(Ordering::Greater))
            })
            .map(|(&p, _)| p)
            .collect();
        if kept.len() < reduces.len() {
            tracing::debug!(
                "state {}: reduce/reduce on {} settled by precedence",
                state,
                self.model.display_symbol(lookahead)
            );
            reduces = kept;
        }

        if shift.is_some() {
            let mut shift_lost = false;
            reduces.retain(|&p| match self.shift_vs_reduce(&shift_items, p) {
                Some(Ordering::Greater) => {
                    tracing::debug!(
                        "state {}: shift {} over reduce {}",
                        state,
                        self.model.display_symbol(lookahead),
                        self.model.display_production(p, None)
                    );
                    false
                }
                Some(Ordering::Less) => {
                    tracing::debug!(
                        "state {}: reduce {} over shift {}",
                        state,
                        self.model.display_production(p, None),
                        self.model.display_symbol(lookahead)
                    );
                    shift_lost = true;
                    true
                }
                _ => true,
            });
            if shift_lost {
                shift = None;
            }
        }

        if shift.is_some() as usize + reduces.len() == 1
            || self.is_declared(shift.is_some(), &shift_items, &reduces)
        {
            return Ok(self.actions(shift, &shift_items, &reduces));
        }

        Err(self.conflict_error(state, lookahead, shift.is_some(), &shift_items, &reduces))
    }

    /// Actions in fork order: by production id, a shift ranked by its
    /// lowest item production.
    fn actions(&self, shift: Option<StateId>, shift_items: &[Item], reduces: &[ProductionId]) -> Box<[Action]> {
        let mut keyed: Vec<(ProductionId, Action)> = reduces.iter().map(|&p| (p, Action::Reduce(p))).collect();
        if let Some(target) = shift {
            let key = shift_items.iter().map(|&(p, _)| p).min().unwrap_or(0);
            keyed.push((key, Action::Shift(target)));
        }
        keyed.sort_by_key(|&(key, action)| (key, matches!(action, Action::Reduce(_))));
        keyed.into_iter().map(|(_, action)| action).collect()
    }

    fn involved(&self, shift: bool, shift_items: &[Item], reduces: &[ProductionId]) -> IndexSet<Symbol> {
        let shifts = shift_items.iter().filter(|_| shift).map(|&(p, _)| p);
        shifts
            .chain(reduces.iter().copied())
            .map(|p| self.model.origin(self.model.production(p).lhs))
            .collect()
    }

    fn is_declared(&self, shift: bool, shift_items: &[Item], reduces: &[ProductionId]) -> bool {
        let involved = self.involved(shift, shift_items, reduces);
        self.model
            .conflicts()
            .iter()
            .any(|set| involved.iter().all(|s| set.contains(s)))
    }

    /// Compare the shift items against a reduction. `Greater` means shift wins.
    fn shift_vs_reduce(&self, shift_items: &[Item], reduce: ProductionId) -> Option<Ordering> {
        let reduce_level = self.reduce_level(reduce);
        let (mut higher, mut lower, mut equal) = (false, false, false);
        for &(production, dot) in shift_items {
            let step = &self.model.production(production).steps[dot];
            let level = self.level(&step.precedence, production);
            match self.compare(level, reduce_level)? {
                Ordering::Greater => higher = true,
                Ordering::Less => lower = true,
                Ordering::Equal => equal = true,
            }
        }
        match (higher, lower, equal) {
            (true, false, false) => Some(Ordering::Greater),
            (false, true, false) => Some(Ordering::Less),
            (false, false, true) => match self.model.production(reduce).associativity() {
                Some(Associativity::Left) => Some(Ordering::Less),
                Some(Associativity::Right) => Some(Ordering::Greater),
                None => None,
            },
            _ => None,
        }
    }

    fn reduce_level(&self, production: ProductionId) -> Level<'a> {
        self.level(self.model.production(production).precedence(), production)
    }

    fn level(&self, precedence: &'a Precedence, production: ProductionId) -> Level<'a> {
        match precedence {
            Precedence::Name(name) => Level::Name(name),
            Precedence::Integer(0) => {
                let lhs = self.model.origin(self.model.production(production).lhs);
                let name = self.model.symbol(lhs).name.as_str();
                let ranked = self
                    .model
                    .precedence_orderings()
                    .iter()
                    .flatten()
                    .any(|e| matches!(e, PrecedenceEntry::Symbol(s) if s == name));
                if ranked { Level::Rule(name) } else { Level::Integer(0) }
            }
            Precedence::Integer(n) => Level::Integer(*n),
        }
    }

    /// Named levels are ordered by the precedence lists: earlier is higher.
    /// Levels that never appear together in one list are incomparable.
    fn compare(&self, a: Level<'_>, b: Level<'_>) -> Option<Ordering> {
        if a == b {
            return Some(Ordering::Equal);
        }
        if let (Level::Integer(x), Level::Integer(y)) = (a, b) {
            return Some(x.cmp(&y));
        }
        let position = |list: &[PrecedenceEntry], level: Level<'_>| {
            list.iter().position(|e| match (e, level) {
                (PrecedenceEntry::Name(n), Level::Name(m)) => n == m,
                (PrecedenceEntry::Symbol(n), Level::Rule(m)) => n == m,
                _ => false,
            })
        };
        self.model.precedence_orderings().iter().find_map(|list| {
            let i = position(list, a)?;
            let j = position(list, b)?;
            Some(j.cmp(&i))
        })
    }

    fn conflict_error(
        &self,
        state: StateId,
        lookahead: Symbol,
        shift: bool,
        shift_items: &[Item],
        reduces: &[ProductionId],
    ) -> GrammarError {
        let mut candidates = Vec::new();
        if shift {
            for &(production, dot) in shift_items {
                candidates.push(format!(
                    "shift: {}",
                    self.model.display_production(production, Some(dot))
                ));
            }
        }
        for &production in reduces {
            let len = self.model.production(production).steps.len();
            candidates.push(format!(
                "reduce: {}",
                self.model.display_production(production, Some(len))
            ));
        }
        let names: Vec<String> = self
            .involved(shift, shift_items, reduces)
            .iter()
            .map(|&s| format!("{:?}", self.model.symbol(s).name))
            .collect();
        GrammarError::Conflict {
            state,
            lookahead: self.model.display_symbol(lookahead),
            candidates,
            hint: format!(
                "add precedence or associativity, or declare the conflict [{}]",
                names.join(", ")
            ),
        }
    }
}
