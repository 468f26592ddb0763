//! GLR parse loop.
//!
//! Stack versions advance one token at a time, always the version furthest
//! behind first, so versions that meet at the same position can merge. A
//! state with several actions for the lookahead forks the version; versions
//! with no action die, unless none is left, in which case the last one
//! recovers by wrapping stack entries and skipped tokens in an `ERROR`
//! node. Parsing therefore always produces a tree.

use std::rc::Rc;
use std::sync::Arc;

use grove_table::{Action, ERROR_LEX_MODE, ParseTable, ProductionId, StateId, Symbol};

use crate::edit::{Edit, EditError, EditMap};
use crate::invariants::{ensure_finished, ensure_goto};
use crate::lexer::{ExternalScanner, Lexer, ScannerSlot, Token};
use crate::options::ParseOptions;
use crate::reuse::{Replay, ReplayStep, Replayed, ReusePool};
use crate::stack::{StackNode, Version};
use crate::subtree::Subtree;
use crate::trace::{NoopTracer, Tracer};
use crate::tree::SyntaxTree;

const START_STATE: StateId = 0;

/// Turns source bytes into syntax trees for one language.
///
/// A parser owns its external scanner, so one parser serves one thread at a
/// time; create one per thread to parse in parallel.
pub struct Parser {
    table: Arc<ParseTable>,
    options: ParseOptions,
    scanner: Option<Box<dyn ExternalScanner + Send>>,
}

impl Parser {
    pub fn new(table: Arc<ParseTable>) -> Self {
        Self {
            table,
            options: ParseOptions::default(),
            scanner: None,
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Scanner for the grammar's external tokens. It is reset with an empty
    /// state at the start of every parse.
    pub fn with_external_scanner(mut self, scanner: impl ExternalScanner + Send + 'static) -> Self {
        self.scanner = Some(Box::new(scanner));
        self
    }

    pub fn table(&self) -> &Arc<ParseTable> {
        &self.table
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn parse(&mut self, source: &[u8]) -> SyntaxTree {
        self.parse_with(source, &mut NoopTracer)
    }

    pub fn parse_with<T: Tracer>(&mut self, source: &[u8], tracer: &mut T) -> SyntaxTree {
        self.run(source, None, tracer, 1)
    }

    /// Parse `source`, the text of `old` after `edits`, reusing the parts of
    /// `old` the edits left alone. The result is the tree a fresh parse of
    /// `source` would produce.
    pub fn reparse(&mut self, old: &SyntaxTree, edits: &[Edit], source: &[u8]) -> Result<SyntaxTree, EditError> {
        self.reparse_with(old, edits, source, &mut NoopTracer)
    }

    pub fn reparse_with<T: Tracer>(
        &mut self,
        old: &SyntaxTree,
        edits: &[Edit],
        source: &[u8],
        tracer: &mut T,
    ) -> Result<SyntaxTree, EditError> {
        let map = EditMap::from_edits(old.len(), edits)?;
        if map.new_len() != source.len() {
            return Err(EditError::LengthMismatch {
                expected: map.new_len(),
                actual: source.len(),
            });
        }
        let reuse = self
            .options
            .get_reuse()
            .then(|| ReusePool::new(old.root_subtree(), map));
        Ok(self.run(source, reuse, tracer, old.version() + 1))
    }

    fn run<T: Tracer>(
        &mut self,
        source: &[u8],
        reuse: Option<ReusePool>,
        tracer: &mut T,
        version: u64,
    ) -> SyntaxTree {
        tracing::debug!(
            grammar = self.table.name(),
            len = source.len(),
            incremental = reuse.is_some(),
            version,
            "parse started"
        );
        let run = Run {
            table: &self.table,
            lexer: Lexer::new(&self.table, source),
            scanner: self.scanner.as_deref_mut(),
            fork_limit: self.options.get_fork_limit(),
            reuse,
            versions: Vec::new(),
            finished: Vec::new(),
            limit_hit: false,
            forking: false,
            reused: 0,
            tracer,
        };
        let (root, limit_hit) = run.parse();
        SyntaxTree::new(root, Arc::clone(&self.table), Arc::from(source), version, limit_hit)
    }
}

/// State of one parse.
struct Run<'p, T: Tracer> {
    table: &'p ParseTable,
    lexer: Lexer<'p>,
    scanner: Option<&'p mut (dyn ExternalScanner + Send + 'static)>,
    fork_limit: usize,
    reuse: Option<ReusePool>,
    /// Versions still consuming input.
    versions: Vec<Version>,
    /// Versions that accepted.
    finished: Vec<Version>,
    limit_hit: bool,
    /// Applying the actions of a fork.
    forking: bool,
    reused: usize,
    tracer: &'p mut T,
}

impl<T: Tracer> Run<'_, T> {
    fn parse(mut self) -> (Subtree, bool) {
        if let Some(scanner) = self.scanner.as_deref_mut() {
            scanner.deserialize(&[]);
        }
        let initial: Arc<[u8]> = Arc::from(Vec::new());
        self.versions.push(Version::new(START_STATE, initial));

        while let Some(index) = self.next_version() {
            let version = self.versions.swap_remove(index);
            self.step(version);
        }

        let finished = std::mem::take(&mut self.finished);
        let best = ensure_finished(finished.into_iter().min_by(Version::preference));
        tracing::debug!(
            errors = best.error_count,
            reused = self.reused,
            limit_hit = self.limit_hit,
            "parse finished"
        );
        (self.root(&best), self.limit_hit)
    }

    /// The version furthest behind; ties go to the earlier fork alternative.
    fn next_version(&self) -> Option<usize> {
        self.versions
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.position()
                    .cmp(&b.position())
                    .then_with(|| a.fork_path.cmp(&b.fork_path))
            })
            .map(|(index, _)| index)
    }

    fn step(&mut self, mut version: Version) {
        let token = match version.lookahead.take() {
            Some(token) => token,
            None => {
                let token = self.next_token(&version);
                self.tracer.trace_lex(token.symbol, token.start, token.len);
                tracing::trace!(
                    symbol = self.table.symbol_name(token.symbol),
                    start = token.start,
                    len = token.len,
                    "token"
                );
                token
            }
        };

        let table = self.table;
        match table.actions(version.state(), token.symbol) {
            [] => self.fail(version, token),
            [action] => self.apply(version, *action, token),
            actions => self.fork(version, actions, token),
        }
    }

    fn apply(&mut self, mut version: Version, action: Action, token: Token) {
        match action {
            Action::Shift(state) => {
                if !self.reuse_node(&mut version, &token) {
                    self.tracer.trace_shift(token.symbol, state);
                    self.shift(&mut version, state, token, false);
                }
                self.settle(version);
            }
            Action::ShiftExtra => {
                self.tracer.trace_shift_extra(token.symbol);
                let state = version.state();
                self.shift(&mut version, state, token, true);
                self.settle(version);
            }
            Action::Reduce(production) => {
                self.reduce(&mut version, production);
                version.lookahead = Some(token);
                self.versions.push(version);
            }
            Action::Accept => {
                self.tracer.trace_accept();
                self.finished.push(version);
            }
        }
    }

    fn shift(&mut self, version: &mut Version, state: StateId, token: Token, extra: bool) {
        if let Some(scanner_state) = &token.scanner_state {
            version.scanner_state = Arc::clone(scanner_state);
        }
        if !extra {
            version.lex_state = state;
        }
        version.after_extra = extra;
        let fragile = self.contested() || self.table.lex().mode(token.info.lex_mode).any_external();
        version.push(state, token.into_leaf(extra, fragile));
    }

    /// Other interpretations are alive, so what gets built now may depend
    /// on more than the input it covers.
    fn contested(&self) -> bool {
        self.forking || !self.versions.is_empty()
    }

    fn reduce(&mut self, version: &mut Version, production: ProductionId) {
        let info = self.table.production(production);

        let mut node = Rc::clone(&version.top);
        let mut trailing = Vec::new();
        while node.is_extra() {
            trailing.push(node.ensure_subtree().clone());
            node = Rc::clone(node.ensure_prev());
        }

        let mut children = Vec::with_capacity(info.child_count());
        let mut remaining = info.child_count();
        while remaining > 0 {
            let subtree = node.ensure_subtree().clone();
            if !subtree.is_extra() {
                remaining -= 1;
            }
            children.push(subtree);
            node = Rc::clone(node.ensure_prev());
        }
        children.reverse();

        let state = ensure_goto(self.table, node.state, info.lhs);
        let subtree = Subtree::node(
            info.lhs,
            Some(production),
            children,
            info.dynamic_precedence,
            node.state,
            self.contested(),
        );
        let mut top = StackNode::push(node, state, subtree);
        for extra in trailing.into_iter().rev() {
            top = StackNode::push(top, state, extra);
        }
        version.top = top;
        version.dynamic_precedence += info.dynamic_precedence;
        self.tracer.trace_reduce(production, state);
    }

    fn fork(&mut self, version: Version, actions: &[Action], token: Token) {
        self.tracer.trace_fork(actions.len());
        tracing::debug!(
            state = version.state(),
            lookahead = self.table.symbol_name(token.symbol),
            count = actions.len(),
            "fork"
        );
        self.forking = true;
        for (index, &action) in actions.iter().enumerate() {
            let mut branch = version.clone();
            branch.fork_path.push(index as u16);
            self.apply(branch, action, token.clone());
        }
        self.forking = false;
        self.enforce_limit();
    }

    /// Park a version that consumed a token, merging it into an equivalent
    /// one when possible.
    fn settle(&mut self, version: Version) {
        let Some(index) = self.versions.iter().position(|v| v.can_merge(&version)) else {
            self.versions.push(version);
            return;
        };
        let position = version.position();
        self.tracer.trace_merge(position);
        tracing::debug!(position, "merged stack versions");
        if version.preference(&self.versions[index]).is_lt() {
            self.versions[index] = version;
        }
    }

    fn enforce_limit(&mut self) {
        if self.versions.len() <= self.fork_limit {
            return;
        }
        self.versions.sort_by(Version::preference);
        let dropped = self.versions.len() - self.fork_limit;
        self.versions.truncate(self.fork_limit);
        self.limit_hit = true;
        self.tracer.trace_limit(dropped);
        tracing::warn!(
            dropped,
            limit = self.fork_limit,
            "too many stack versions; dropped the least preferred"
        );
    }

    fn fail(&mut self, version: Version, token: Token) {
        if !self.versions.is_empty() || !self.finished.is_empty() {
            tracing::trace!(
                state = version.state(),
                lookahead = self.table.symbol_name(token.symbol),
                "version dropped"
            );
            return;
        }
        self.recover(version, token);
    }

    fn recover(&mut self, mut version: Version, mut token: Token) {
        let mut skipped = Vec::new();
        loop {
            if let Some((node, popped)) = self.resume_point(&version.top, token.symbol) {
                let (popped_count, skipped_count) = (popped.len(), skipped.len());
                let mut children = popped;
                children.append(&mut skipped);
                version.top = node;
                let state = version.state();
                if !children.is_empty() {
                    version.push(state, Subtree::error(children).with_extra(true));
                    version.error_count += 1;
                    version.after_extra = true;
                }
                version.lex_state = state;
                self.tracer.trace_recover(popped_count, skipped_count, state);
                tracing::debug!(
                    popped = popped_count,
                    skipped = skipped_count,
                    state,
                    at = token.start,
                    "recovered from syntax error"
                );
                version.lookahead = Some(token);
                self.versions.push(version);
                return;
            }

            if token.symbol == Symbol::END {
                self.wrap_all(version, skipped);
                return;
            }

            self.tracer.trace_skip(token.symbol, token.start, token.len);
            let position = token.end();
            if let Some(scanner_state) = &token.scanner_state {
                version.scanner_state = Arc::clone(scanner_state);
            }
            skipped.push(token.into_leaf(false, true));
            token = self.lex(position, ERROR_LEX_MODE, false, &version.scanner_state);
        }
    }

    /// Nearest stack entry from which `symbol` leads to a shift. Returns the
    /// entry and the subtrees above it, bottom first.
    fn resume_point(&self, top: &Rc<StackNode>, symbol: Symbol) -> Option<(Rc<StackNode>, Vec<Subtree>)> {
        if symbol == Symbol::ERROR {
            return None;
        }
        let mut node = Rc::clone(top);
        let mut popped = Vec::new();
        loop {
            if self.can_proceed(&node, symbol) {
                popped.reverse();
                return Some((node, popped));
            }
            popped.push(node.subtree.clone()?);
            node = Rc::clone(node.prev.as_ref()?);
        }
    }

    /// Whether `symbol` reaches a shift or accept from `node` through
    /// reductions alone.
    fn can_proceed(&self, node: &Rc<StackNode>, symbol: Symbol) -> bool {
        let mut states = node.states();
        let limit = states.len() + self.table.state_count();
        for _ in 0..limit {
            let Some(&top) = states.last() else {
                return false;
            };
            match self.table.actions(top, symbol).first() {
                None => return false,
                Some(Action::Reduce(production)) => {
                    let info = self.table.production(*production);
                    if info.child_count() >= states.len() {
                        return false;
                    }
                    states.truncate(states.len() - info.child_count());
                    let Some(next) = states.last().and_then(|&s| self.table.goto(s, info.lhs)) else {
                        return false;
                    };
                    states.push(next);
                }
                Some(_) => return true,
            }
        }
        false
    }

    /// Last resort at end of input: everything becomes one error node.
    fn wrap_all(&mut self, mut version: Version, skipped: Vec<Subtree>) {
        let mut children = version.top.subtrees();
        let popped = children.len();
        children.extend(skipped.iter().cloned());

        let mut base = Rc::clone(&version.top);
        while let Some(prev) = base.prev.clone() {
            base = prev;
        }
        let state = base.state;
        version.top = base;
        version.push(state, Subtree::error(children));
        version.error_count += 1;

        self.tracer.trace_recover(popped, skipped.len(), state);
        tracing::debug!(popped, skipped = skipped.len(), "wrapped the whole input in an error");
        self.tracer.trace_accept();
        self.finished.push(version);
    }

    fn next_token(&mut self, version: &Version) -> Token {
        let position = version.position();
        let mode = self.table.state(version.lex_state).lex_mode;
        let after_extra = version.after_extra;
        let candidate = self.reuse_candidate(position, mode);
        let reused_leaf = candidate.as_ref().filter(|c| {
            c.leaf_info()
                .is_some_and(|info| info.lex_mode == mode && info.after_extra == after_extra && !info.external)
        });
        if let Some(token) = reused_leaf.and_then(|leaf| Token::from_leaf(leaf.clone(), position)) {
            return token;
        }
        let mut token = self.lex(position, mode, after_extra, &version.scanner_state);
        token.candidate = candidate.filter(|c| !c.is_leaf() && c.first_leaf() == Some(token.info));
        token
    }

    fn lex(&mut self, position: usize, mode: usize, after_extra: bool, scanner_state: &Arc<[u8]>) -> Token {
        let scanner = self.scanner.as_deref_mut().map(|scanner| ScannerSlot {
            scanner,
            state: Arc::clone(scanner_state),
        });
        self.lexer.lex(position, mode, after_extra, scanner)
    }

    fn reuse_candidate(&mut self, position: usize, mode: usize) -> Option<Subtree> {
        let pool = self.reuse.as_mut()?;
        if self.table.lex().mode(mode).any_external() {
            return None;
        }
        pool.candidate(position)
    }

    /// Shift a whole old subtree instead of `token` when a replay proves a
    /// fresh parse would build the same one here. Tries the candidate the
    /// token carries, then the nodes down its left edge.
    fn reuse_node(&mut self, version: &mut Version, token: &Token) -> bool {
        if token.candidate.is_none() || self.contested() || !self.finished.is_empty() {
            return false;
        }
        let start = token.start;
        let mut next = token.candidate.clone();
        while let Some(candidate) = next.take() {
            if candidate.is_leaf() {
                break;
            }
            next = candidate.children().first().cloned();
            let Some(replayed) = self.replay(version, &candidate) else {
                continue;
            };
            self.tracer.trace_reuse(candidate.symbol(), start, candidate.len());
            tracing::debug!(
                symbol = self.table.symbol_name(candidate.symbol()),
                start,
                len = candidate.len(),
                "reused subtree"
            );
            version.dynamic_precedence += candidate.dynamic_precedence();
            version.lex_state = replayed.lex_state;
            version.after_extra = replayed.after_extra;
            version.push(replayed.state, candidate);
            self.reused += 1;
            return true;
        }
        false
    }

    fn replay(&mut self, version: &Version, candidate: &Subtree) -> Option<Replayed> {
        let table = self.table;
        let state = version.state();
        let mut replay = if candidate.parse_state() == Some(state) {
            Replay::resume(table, candidate, state)?
        } else {
            let mut replay = Replay::full(table, candidate, state, version.lex_state, version.after_extra);
            replay.feed_leaves(candidate)?;
            replay
        };

        let mut position = version.position() + candidate.len();
        loop {
            let (lex_state, after_extra) = replay.lex_context();
            let mode = table.state(lex_state).lex_mode;
            let token = self.lex(position, mode, after_extra, &version.scanner_state);
            match replay.finish(token.symbol)? {
                ReplayStep::Extra if token.len > 0 => position = token.end(),
                ReplayStep::Extra => return None,
                ReplayStep::Done(replayed) => return Some(replayed),
            }
        }
    }

    /// Tree of an accepted version. Extras around the start node move inside
    /// it so the root spans the whole input.
    fn root(&self, version: &Version) -> Subtree {
        let subtrees = version.top.subtrees();
        let mut main = subtrees
            .iter()
            .enumerate()
            .filter(|(_, subtree)| !subtree.is_extra())
            .map(|(index, _)| index);
        let (Some(index), None) = (main.next(), main.next()) else {
            return Subtree::error(subtrees);
        };
        let start = subtrees[index].clone();
        if subtrees.len() == 1 {
            return start;
        }

        let mut children = Vec::with_capacity(subtrees.len() + start.children().len());
        for (i, subtree) in subtrees.into_iter().enumerate() {
            if i == index {
                children.extend(start.children().iter().cloned());
            } else {
                children.push(subtree);
            }
        }
        let own = start
            .production()
            .map_or(0, |p| self.table.production(p).dynamic_precedence);
        Subtree::node(start.symbol(), start.production(), children, own, START_STATE, start.is_fragile())
    }
}
