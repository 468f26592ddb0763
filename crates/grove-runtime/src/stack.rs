//! Parse stack versions.
//!
//! Every version is a persistent linked stack: forking a version copies one
//! pointer and both copies share everything below the fork point.

use std::cmp::Ordering;
use std::rc::Rc;
use std::sync::Arc;

use grove_table::StateId;

use crate::lexer::Token;
use crate::subtree::Subtree;

#[derive(Debug)]
pub(crate) struct StackNode {
    pub state: StateId,
    /// `None` only for the bottom entry.
    pub subtree: Option<Subtree>,
    /// Byte offset where this entry ends.
    pub end: usize,
    pub prev: Option<Rc<StackNode>>,
}

impl StackNode {
    pub fn base(state: StateId) -> Rc<Self> {
        Rc::new(Self {
            state,
            subtree: None,
            end: 0,
            prev: None,
        })
    }

    pub fn push(prev: Rc<StackNode>, state: StateId, subtree: Subtree) -> Rc<Self> {
        Rc::new(Self {
            state,
            end: prev.end + subtree.len(),
            subtree: Some(subtree),
            prev: Some(prev),
        })
    }

    pub fn is_extra(&self) -> bool {
        self.subtree.as_ref().is_some_and(Subtree::is_extra)
    }

    /// States of the non-extra entries, bottom first.
    pub fn states(self: &Rc<Self>) -> Vec<StateId> {
        let mut states = Vec::new();
        let mut node = Some(self);
        while let Some(n) = node {
            if !n.is_extra() {
                states.push(n.state);
            }
            node = n.prev.as_ref();
        }
        states.reverse();
        states
    }

    /// Subtrees above the bottom entry, bottom first.
    pub fn subtrees(self: &Rc<Self>) -> Vec<Subtree> {
        let mut subtrees = Vec::new();
        let mut node = Some(self);
        while let Some(n) = node {
            subtrees.extend(n.subtree.clone());
            node = n.prev.as_ref();
        }
        subtrees.reverse();
        subtrees
    }
}

/// Unlinks the chain below one entry at a time; deep stacks would otherwise
/// recurse once per entry.
impl Drop for StackNode {
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(node) = prev {
            prev = match Rc::try_unwrap(node) {
                Ok(mut node) => node.prev.take(),
                Err(_) => None,
            };
        }
    }
}

/// Two stacks whose non-extra entries carry the same states behave the same
/// from here on.
fn same_states(a: &Rc<StackNode>, b: &Rc<StackNode>) -> bool {
    let mut a = Some(a);
    let mut b = Some(b);
    loop {
        while let Some(n) = a.filter(|n| n.is_extra()) {
            a = n.prev.as_ref();
        }
        while let Some(n) = b.filter(|n| n.is_extra()) {
            b = n.prev.as_ref();
        }
        match (a, b) {
            (None, None) => return true,
            (Some(x), Some(y)) => {
                if Rc::ptr_eq(x, y) {
                    return true;
                }
                if x.state != y.state {
                    return false;
                }
                a = x.prev.as_ref();
                b = y.prev.as_ref();
            }
            _ => return false,
        }
    }
}

/// One interpretation of the input seen so far.
#[derive(Clone, Debug)]
pub(crate) struct Version {
    pub top: Rc<StackNode>,
    /// State whose lex mode tokenizes the next token. Reductions leave it
    /// alone; only shifts move it.
    pub lex_state: StateId,
    pub after_extra: bool,
    /// Token waiting to be shifted, kept across reductions.
    pub lookahead: Option<Token>,
    pub error_count: u32,
    pub dynamic_precedence: i32,
    /// Alternative taken at each fork, in order. Earlier alternatives belong
    /// to earlier-declared productions.
    pub fork_path: Vec<u16>,
    pub scanner_state: Arc<[u8]>,
}

impl Version {
    pub fn new(start_state: StateId, scanner_state: Arc<[u8]>) -> Self {
        Self {
            top: StackNode::base(start_state),
            lex_state: start_state,
            after_extra: false,
            lookahead: None,
            error_count: 0,
            dynamic_precedence: 0,
            fork_path: Vec::new(),
            scanner_state,
        }
    }

    pub fn state(&self) -> StateId {
        self.top.state
    }

    pub fn position(&self) -> usize {
        self.top.end
    }

    pub fn push(&mut self, state: StateId, subtree: Subtree) {
        self.top = StackNode::push(self.top.clone(), state, subtree);
    }

    /// Ranking among versions: fewer errors, then higher dynamic
    /// precedence, then the earlier fork alternative. `Less` is better.
    pub fn preference(&self, other: &Version) -> Ordering {
        self.error_count
            .cmp(&other.error_count)
            .then(other.dynamic_precedence.cmp(&self.dynamic_precedence))
            .then_with(|| self.fork_path.cmp(&other.fork_path))
    }

    /// Both versions stand at the same token boundary with stacks that
    /// will react identically to the rest of the input.
    pub fn can_merge(&self, other: &Version) -> bool {
        self.lookahead.is_none()
            && other.lookahead.is_none()
            && self.position() == other.position()
            && self.lex_state == other.lex_state
            && self.after_extra == other.after_extra
            && self.scanner_state == other.scanner_state
            && same_states(&self.top, &other.top)
    }
}
