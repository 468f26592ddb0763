//! Subtree reuse across tree versions.
//!
//! A cursor walks the previous tree alongside the parse, moving only
//! forward and descending only into nodes that straddle the position the
//! parser asks about. At a position that maps back into unchanged old text,
//! the outermost old node starting there that holds no errors, external
//! tokens or fragile parts, and whose lexer lookahead stays clear of every
//! edit, is the candidate:
//! - a leaf is reused as the next token when it was lexed in the same lex
//!   mode
//! - an interior node rides along on its first token and is shifted whole
//!   in place of that token when a [`Replay`] proves a fresh parse would
//!   rebuild exactly that node
//!
//! A node pushed over the very state it was first built on parses the same
//! bytes the same way, so its replay only checks the reductions that close
//! it against the new lookahead. Elsewhere the replay runs over every leaf.

use std::iter::Peekable;

use grove_table::{Action, ParseTable, ProductionId, StateId, Symbol};

use crate::edit::EditMap;
use crate::subtree::{Reductions, Subtree};

struct Entry {
    subtree: Subtree,
    /// Offset in the old text.
    start: usize,
    /// Index among the parent's children.
    index: usize,
}

/// Forward-only cursor over the previous tree.
pub(crate) struct ReusePool {
    edits: EditMap,
    root: Subtree,
    /// Path from the root down to the current node.
    path: Vec<Entry>,
}

impl ReusePool {
    pub fn new(old_root: &Subtree, edits: EditMap) -> Self {
        Self {
            edits,
            root: old_root.clone(),
            path: vec![Entry {
                subtree: old_root.clone(),
                start: 0,
                index: 0,
            }],
        }
    }

    /// Outermost reusable old subtree starting at `position` of the new
    /// text. Positions must not decrease between calls.
    pub fn candidate(&mut self, position: usize) -> Option<Subtree> {
        let old = self.edits.to_old(position)?;
        self.seek(old);
        loop {
            let entry = self.path.last()?;
            if entry.start != old {
                return None;
            }
            if self.is_reusable(entry) {
                return Some(entry.subtree.clone());
            }
            if entry.subtree.is_leaf() {
                return None;
            }
            // Nothing checked above depends on the parse, so the node stays
            // unusable for the rest of this run.
            self.descend();
        }
    }

    fn is_reusable(&self, entry: &Entry) -> bool {
        let subtree = &entry.subtree;
        let reach = entry.start + subtree.len() + subtree.lookahead_bytes();
        !subtree.ptr_eq(&self.root)
            && !subtree.is_empty()
            && subtree.error_count() == 0
            && !subtree.has_external()
            && !subtree.is_fragile()
            && !self.edits.damages(entry.start, reach)
    }

    /// Move to the outermost node that starts at or after `old`.
    fn seek(&mut self, old: usize) {
        while let Some(entry) = self.path.last() {
            if entry.start >= old {
                return;
            }
            if entry.start + entry.subtree.len() <= old {
                self.advance();
            } else {
                self.descend();
            }
        }
    }

    fn descend(&mut self) {
        let first = self.path.last().and_then(|entry| {
            let child = entry.subtree.children().first()?;
            Some(Entry {
                subtree: child.clone(),
                start: entry.start,
                index: 0,
            })
        });
        match first {
            Some(entry) => self.path.push(entry),
            None => self.advance(),
        }
    }

    /// Next sibling, or the next sibling of the nearest ancestor that has
    /// one. Past the last node the path is empty.
    fn advance(&mut self) {
        while let Some(entry) = self.path.pop() {
            let Some(parent) = self.path.last() else {
                return;
            };
            let index = entry.index + 1;
            if let Some(sibling) = parent.subtree.children().get(index) {
                let next = Entry {
                    subtree: sibling.clone(),
                    start: entry.start + entry.subtree.len(),
                    index,
                };
                self.path.push(next);
                return;
            }
        }
    }
}

/// Outcome of a successful replay.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Replayed {
    /// State after shifting the reused node.
    pub state: StateId,
    /// Lex context after its last leaf.
    pub lex_state: StateId,
    pub after_extra: bool,
}

pub(crate) enum ReplayStep {
    /// The lookahead was an extra; feed the next token.
    Extra,
    Done(Replayed),
}

/// (production, raw child count) of a node the replay must rebuild.
type Reduction = (Option<ProductionId>, usize);

/// Parse actions around a candidate, tracked on a state-only stack.
///
/// Every step must be the single action the candidate's own shape implies.
/// Forks, missing actions and any reduction that disagrees with the
/// candidate's post-order abort the replay.
pub(crate) struct Replay<'a> {
    table: &'a ParseTable,
    /// (state, is extra); the bottom entry is the state before the node.
    stack: Vec<(StateId, bool)>,
    /// Reductions still to come, innermost first.
    expected: Peekable<Box<dyn Iterator<Item = Reduction>>>,
    lex_state: StateId,
    after_extra: bool,
    /// Extras seen after the last leaf.
    trailing: Vec<Symbol>,
    end: Option<(StateId, bool)>,
}

impl<'a> Replay<'a> {
    /// Replay over every leaf, from a state the candidate was not built on.
    /// Call [`Replay::feed_leaves`] next.
    pub fn full(
        table: &'a ParseTable,
        candidate: &Subtree,
        state: StateId,
        lex_state: StateId,
        after_extra: bool,
    ) -> Self {
        let expected: Box<dyn Iterator<Item = Reduction>> = Box::new(Reductions::new(candidate));
        Self {
            table,
            stack: vec![(state, false)],
            expected: expected.peekable(),
            lex_state,
            after_extra,
            trailing: Vec::new(),
            end: None,
        }
    }

    /// Replay from the state the candidate was built on. Only the right
    /// spine is rebuilt: the stack as it stood after the last leaf, with
    /// the nodes that leaf's lookahead closed.
    pub fn resume(table: &'a ParseTable, candidate: &Subtree, state: StateId) -> Option<Self> {
        let mut stack = vec![(state, false)];
        let mut spine = Vec::new();
        let mut node = candidate.clone();
        let lex_state = loop {
            spine.push((node.production(), node.children().len()));
            let (last, init) = node.children().split_last()?;
            for child in init {
                let top = stack.last().map_or(state, |&(s, _)| s);
                stack.push((Self::transition(table, top, child)?, child.is_extra()));
            }
            if last.is_extra() {
                return None;
            }
            if last.is_leaf() {
                let top = stack.last().map_or(state, |&(s, _)| s);
                let next = Self::transition(table, top, last)?;
                stack.push((next, false));
                break next;
            }
            // Still open when the lookahead arrives: its children are on
            // the stack instead.
            node = last.clone();
        };
        spine.reverse();
        let expected: Box<dyn Iterator<Item = Reduction>> = Box::new(spine.into_iter());
        Some(Self {
            table,
            stack,
            expected: expected.peekable(),
            lex_state,
            after_extra: false,
            trailing: Vec::new(),
            end: Some((lex_state, false)),
        })
    }

    /// State after `child` on top of `state`, as the first parse left it.
    fn transition(table: &ParseTable, state: StateId, child: &Subtree) -> Option<StateId> {
        if child.is_extra() {
            return Some(state);
        }
        if !child.is_leaf() {
            return table.goto(state, child.symbol());
        }
        table.actions(state, child.symbol()).iter().find_map(|action| match action {
            Action::Shift(next) => Some(*next),
            _ => None,
        })
    }

    /// Feed every leaf of the candidate, checking each would lex the same.
    pub fn feed_leaves(&mut self, candidate: &Subtree) -> Option<()> {
        for (_, leaf) in candidate.leaf_iter() {
            let info = leaf.leaf_info()?;
            let mode = self.table.state(self.lex_state).lex_mode;
            if info.lex_mode != mode
                || info.after_extra != self.after_extra
                || info.external
                || self.table.lex().mode(mode).any_external()
            {
                return None;
            }
            self.feed(leaf.symbol(), leaf.is_extra())?;
        }
        self.end = Some((self.lex_state, self.after_extra));
        Some(())
    }

    /// Where and how to lex the next lookahead.
    pub fn lex_context(&self) -> (StateId, bool) {
        (self.lex_state, self.after_extra)
    }

    fn feed(&mut self, symbol: Symbol, extra: bool) -> Option<()> {
        loop {
            let top = self.top();
            match self.table.actions(top, symbol) {
                [Action::Shift(next)] if !extra => {
                    self.stack.push((*next, false));
                    self.lex_state = *next;
                    self.after_extra = false;
                    return Some(());
                }
                [Action::ShiftExtra] if extra => {
                    self.stack.push((top, true));
                    self.after_extra = true;
                    return Some(());
                }
                [Action::Reduce(production)] => {
                    self.reduce(*production)?;
                    self.expected.peek()?;
                }
                _ => return None,
            }
        }
    }

    /// Process one lookahead after the last leaf.
    pub fn finish(&mut self, symbol: Symbol) -> Option<ReplayStep> {
        let (lex_state, after_extra) = self.end?;
        loop {
            let top = self.top();
            match self.table.actions(top, symbol) {
                [Action::ShiftExtra] => {
                    self.stack.push((top, true));
                    self.after_extra = true;
                    self.trailing.push(symbol);
                    return Some(ReplayStep::Extra);
                }
                [Action::Reduce(production)] => {
                    let state = self.reduce(*production)?;
                    if self.expected.peek().is_some() {
                        continue;
                    }
                    // The real parser meets the trailing extras in the new state.
                    let extras_agree = self
                        .trailing
                        .iter()
                        .all(|&extra| self.table.actions(state, extra) == [Action::ShiftExtra]);
                    return extras_agree.then_some(ReplayStep::Done(Replayed {
                        state,
                        lex_state,
                        after_extra,
                    }));
                }
                _ => return None,
            }
        }
    }

    fn top(&self) -> StateId {
        self.stack.last().map_or(0, |&(state, _)| state)
    }

    /// Apply a reduction that must match the next expected node. Returns
    /// the goto state.
    fn reduce(&mut self, production: ProductionId) -> Option<StateId> {
        let (expected, children) = self.expected.next()?;
        if expected? != production {
            return None;
        }
        let info = self.table.production(production);

        let mut trailing = 0;
        while self.stack.len() > 1 && self.stack.last().is_some_and(|&(_, extra)| extra) {
            self.stack.pop();
            trailing += 1;
        }
        let mut popped = 0;
        let mut remaining = info.child_count();
        while remaining > 0 {
            if self.stack.len() <= 1 {
                return None;
            }
            let (_, extra) = self.stack.pop()?;
            if !extra {
                remaining -= 1;
            }
            popped += 1;
        }
        if popped != children {
            return None;
        }

        let done = self.expected.peek().is_none();
        if done && self.stack.len() != 1 {
            return None;
        }
        let state = self.table.goto(self.top(), info.lhs)?;
        self.stack.push((state, false));
        for _ in 0..trailing {
            self.stack.push((state, true));
        }
        Some(state)
    }
}
