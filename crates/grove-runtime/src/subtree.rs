//! Immutable syntax tree nodes shared between tree versions.
//!
//! A [`Subtree`] knows its length but not its position: absolute offsets are
//! computed while walking down from the root. That keeps a subtree valid in
//! any tree that contains it, so an edit before it never forces a rewrite.

use std::fmt;
use std::sync::Arc;

use grove_table::{ProductionId, StateId, Symbol};

/// Reference-counted, immutable tree node.
#[derive(Clone)]
pub struct Subtree(Arc<SubtreeData>);

struct SubtreeData {
    symbol: Symbol,
    len: usize,
    /// Bytes past the end that lexing one of the leaves inspected.
    lookahead_bytes: usize,
    extra: bool,
    error_count: u32,
    has_external: bool,
    /// Built while other stack versions were alive, lexed in a mode where
    /// the external scanner could run, or holds something that was. Such a
    /// node may owe its shape to its surroundings.
    fragile: bool,
    /// Lex context of the first leaf.
    first_leaf: Option<LeafInfo>,
    body: Body,
}

enum Body {
    Leaf(LeafInfo),
    Node {
        production: Option<ProductionId>,
        children: Box<[Subtree]>,
        dynamic_precedence: i32,
        /// State under the node on the stack: the one its first leaf was
        /// shifted from.
        parse_state: StateId,
    },
}

/// How a token was lexed. Reuse compares these against the current context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafInfo {
    pub lex_mode: usize,
    /// An extra was shifted right before this token.
    pub after_extra: bool,
    pub external: bool,
}

impl Subtree {
    pub(crate) fn leaf(symbol: Symbol, len: usize, lookahead_bytes: usize, info: LeafInfo) -> Self {
        Self(Arc::new(SubtreeData {
            symbol,
            len,
            lookahead_bytes,
            extra: false,
            error_count: u32::from(symbol == Symbol::ERROR),
            has_external: info.external,
            fragile: false,
            first_leaf: Some(info),
            body: Body::Leaf(info),
        }))
    }

    /// Interior node. `dynamic_precedence` is the production's own value;
    /// the children's totals are added to it. `parse_state` is the state
    /// the node is pushed over.
    pub(crate) fn node(
        symbol: Symbol,
        production: Option<ProductionId>,
        children: Vec<Subtree>,
        dynamic_precedence: i32,
        parse_state: StateId,
        fragile: bool,
    ) -> Self {
        let mut len = 0;
        let mut reach = 0;
        let mut error_count = u32::from(symbol == Symbol::ERROR);
        let mut has_external = false;
        let mut total_precedence = dynamic_precedence;
        // A zero-length first child means the first leaf was not shifted
        // from `parse_state`.
        let mut fragile = fragile || children.first().is_none_or(Subtree::is_empty);
        for child in &children {
            reach = reach.max(len + child.len() + child.lookahead_bytes());
            len += child.len();
            error_count += child.error_count();
            has_external |= child.has_external();
            fragile |= child.is_fragile();
            total_precedence += child.dynamic_precedence();
        }
        Self(Arc::new(SubtreeData {
            symbol,
            len,
            lookahead_bytes: reach.saturating_sub(len),
            extra: false,
            error_count,
            has_external,
            fragile,
            first_leaf: children.first().and_then(|child| child.0.first_leaf),
            body: Body::Node {
                production,
                children: children.into_boxed_slice(),
                dynamic_precedence: total_precedence,
                parse_state,
            },
        }))
    }

    pub(crate) fn error(children: Vec<Subtree>) -> Self {
        Self::node(Symbol::ERROR, None, children, 0, 0, true)
    }

    /// Same node with the extra flag set as requested. Shares `self` when
    /// nothing changes.
    pub(crate) fn with_extra(self, extra: bool) -> Self {
        let fragile = self.is_fragile();
        self.with_flags(extra, fragile)
    }

    /// Same node with both flags set as requested. Shares `self` when
    /// nothing changes.
    pub(crate) fn with_flags(self, extra: bool, fragile: bool) -> Self {
        if self.0.extra == extra && self.0.fragile == fragile {
            return self;
        }
        let body = match &self.0.body {
            Body::Leaf(info) => Body::Leaf(*info),
            Body::Node {
                production,
                children,
                dynamic_precedence,
                parse_state,
            } => Body::Node {
                production: *production,
                children: children.clone(),
                dynamic_precedence: *dynamic_precedence,
                parse_state: *parse_state,
            },
        };
        Self(Arc::new(SubtreeData {
            symbol: self.0.symbol,
            len: self.0.len,
            lookahead_bytes: self.0.lookahead_bytes,
            extra,
            error_count: self.0.error_count,
            has_external: self.0.has_external,
            fragile,
            first_leaf: self.0.first_leaf,
            body,
        }))
    }

    pub fn symbol(&self) -> Symbol {
        self.0.symbol
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len
    }

    pub fn is_empty(&self) -> bool {
        self.0.len == 0
    }

    pub fn lookahead_bytes(&self) -> usize {
        self.0.lookahead_bytes
    }

    pub fn is_extra(&self) -> bool {
        self.0.extra
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.0.body, Body::Leaf(_))
    }

    pub fn is_error(&self) -> bool {
        self.0.symbol == Symbol::ERROR
    }

    /// Error nodes and error tokens at or below this node.
    pub fn error_count(&self) -> u32 {
        self.0.error_count
    }

    pub fn has_external(&self) -> bool {
        self.0.has_external
    }

    pub(crate) fn is_fragile(&self) -> bool {
        self.0.fragile
    }

    pub(crate) fn first_leaf(&self) -> Option<LeafInfo> {
        self.0.first_leaf
    }

    /// State the node was pushed over; `None` for leaves.
    pub(crate) fn parse_state(&self) -> Option<StateId> {
        match &self.0.body {
            Body::Leaf(_) => None,
            Body::Node { parse_state, .. } => Some(*parse_state),
        }
    }

    pub fn children(&self) -> &[Subtree] {
        match &self.0.body {
            Body::Leaf(_) => &[],
            Body::Node { children, .. } => children,
        }
    }

    /// Production that built this node; `None` for leaves and error nodes.
    pub fn production(&self) -> Option<ProductionId> {
        match &self.0.body {
            Body::Leaf(_) => None,
            Body::Node { production, .. } => *production,
        }
    }

    pub fn dynamic_precedence(&self) -> i32 {
        match &self.0.body {
            Body::Leaf(_) => 0,
            Body::Node {
                dynamic_precedence, ..
            } => *dynamic_precedence,
        }
    }

    pub fn leaf_info(&self) -> Option<LeafInfo> {
        match &self.0.body {
            Body::Leaf(info) => Some(*info),
            Body::Node { .. } => None,
        }
    }

    /// Identity, not structure: true only for the very same node.
    pub fn ptr_eq(&self, other: &Subtree) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Leaves in order with their offsets relative to this node.
    pub fn leaves(&self) -> Vec<(usize, Subtree)> {
        self.leaf_iter().collect()
    }

    pub(crate) fn leaf_iter(&self) -> Leaves {
        Leaves {
            stack: vec![(0, self.clone())],
        }
    }
}

/// Depth-first walk over the leaves of a subtree.
pub(crate) struct Leaves {
    stack: Vec<(usize, Subtree)>,
}

impl Iterator for Leaves {
    type Item = (usize, Subtree);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((offset, subtree)) = self.stack.pop() {
            if subtree.is_leaf() {
                return Some((offset, subtree));
            }
            let mut end = offset + subtree.len();
            for child in subtree.children().iter().rev() {
                end -= child.len();
                self.stack.push((end, child.clone()));
            }
        }
        None
    }
}

/// Interior nodes in post-order, the order an LR parse reduces them in:
/// (production, raw child count).
pub(crate) struct Reductions {
    stack: Vec<(Subtree, bool)>,
}

impl Reductions {
    pub fn new(subtree: &Subtree) -> Self {
        Self {
            stack: vec![(subtree.clone(), false)],
        }
    }
}

impl Iterator for Reductions {
    type Item = (Option<ProductionId>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, expanded)) = self.stack.pop() {
            if node.is_leaf() {
                continue;
            }
            if expanded {
                return Some((node.production(), node.children().len()));
            }
            let children: Vec<_> = node.children().iter().rev().map(|c| (c.clone(), false)).collect();
            self.stack.push((node, true));
            self.stack.extend(children);
        }
        None
    }
}

/// Children move onto a work list so that dropping a deep tree does not
/// recurse once per level.
impl Drop for SubtreeData {
    fn drop(&mut self) {
        let Body::Node { children, .. } = &mut self.body else {
            return;
        };
        let mut pending = std::mem::take(children).into_vec();
        while let Some(subtree) = pending.pop() {
            let Some(mut data) = Arc::into_inner(subtree.0) else {
                continue;
            };
            if let Body::Node { children, .. } = &mut data.body {
                pending.extend(std::mem::take(children).into_vec());
            }
        }
    }
}

/// Structural equality: same kinds, lengths, productions and shape.
impl PartialEq for Subtree {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if a.ptr_eq(b) {
                continue;
            }
            let same = a.symbol() == b.symbol()
                && a.len() == b.len()
                && a.is_extra() == b.is_extra()
                && a.is_leaf() == b.is_leaf()
                && a.production() == b.production()
                && a.children().len() == b.children().len();
            if !same {
                return false;
            }
            pending.extend(a.children().iter().zip(b.children()));
        }
        true
    }
}

impl Eq for Subtree {}

/// `symbol~[len][children]`, written without recursion.
impl fmt::Debug for Subtree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        enum Piece<'a> {
            Node(&'a Subtree),
            Text(&'static str),
        }

        let mut stack = vec![Piece::Node(self)];
        while let Some(piece) = stack.pop() {
            let subtree = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Node(subtree) => subtree,
            };
            write!(f, "{}", subtree.symbol())?;
            if subtree.is_extra() {
                f.write_str("~")?;
            }
            write!(f, "[{}]", subtree.len())?;
            if subtree.is_leaf() {
                continue;
            }
            stack.push(Piece::Text("]"));
            for (index, child) in subtree.children().iter().enumerate().rev() {
                stack.push(Piece::Node(child));
                if index > 0 {
                    stack.push(Piece::Text(", "));
                }
            }
            stack.push(Piece::Text("["));
        }
        Ok(())
    }
}
