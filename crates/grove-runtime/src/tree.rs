//! Syntax trees and the node query surface.
//!
//! A [`SyntaxTree`] is an immutable snapshot: a root [`Subtree`] plus the
//! source it was parsed from. [`Node`] is a borrowed cursor-like view that
//! computes positions, parents and siblings while walking, so the shared
//! subtrees themselves never store them.
//!
//! Hidden nodes (names starting with `_`, repetition helpers) are
//! transparent: their visible descendants appear as children of the nearest
//! visible ancestor and inherit the hidden node's field name.

use std::cell::OnceCell;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;
use std::sync::Arc;

use grove_table::{FieldId, ParseTable, Symbol};
use rowan::{TextRange, TextSize};

use crate::subtree::Subtree;

/// One parse result.
#[derive(Clone)]
pub struct SyntaxTree {
    root: Subtree,
    table: Arc<ParseTable>,
    source: Arc<[u8]>,
    version: u64,
    ambiguity_limit_hit: bool,
}

/// A token of the tree with its absolute byte range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaf {
    pub symbol: Symbol,
    pub byte_range: Range<usize>,
    pub extra: bool,
}

impl SyntaxTree {
    pub(crate) fn new(
        root: Subtree,
        table: Arc<ParseTable>,
        source: Arc<[u8]>,
        version: u64,
        ambiguity_limit_hit: bool,
    ) -> Self {
        Self {
            root,
            table,
            source,
            version,
            ambiguity_limit_hit,
        }
    }

    pub fn root_node(&self) -> Node<'_> {
        Node {
            tree: self,
            subtree: &self.root,
            start: 0,
            symbol: self.root.symbol(),
            field: None,
            parent: None,
            children: OnceCell::new(),
        }
    }

    pub fn root_subtree(&self) -> &Subtree {
        &self.root
    }

    pub fn language(&self) -> &Arc<ParseTable> {
        &self.table
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// 1 for a fresh parse, one more than the previous tree for a reparse.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Stack versions were dropped to respect the fork limit. The tree is
    /// still the best interpretation that survived.
    pub fn ambiguity_limit_hit(&self) -> bool {
        self.ambiguity_limit_hit
    }

    pub fn has_error(&self) -> bool {
        self.root.error_count() > 0
    }

    /// Every token in order, hidden ones included.
    pub fn leaves(&self) -> Vec<Leaf> {
        self.root
            .leaves()
            .into_iter()
            .map(|(start, leaf)| Leaf {
                symbol: leaf.symbol(),
                byte_range: start..start + leaf.len(),
                extra: leaf.is_extra(),
            })
            .collect()
    }

    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("version", &self.version)
            .field("ambiguity_limit_hit", &self.ambiguity_limit_hit)
            .field("root", &self.to_sexp())
            .finish()
    }
}

/// A node of a [`SyntaxTree`], with its position and ancestry.
#[derive(Clone)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    subtree: &'t Subtree,
    start: usize,
    /// Kind after the parent production's alias.
    symbol: Symbol,
    field: Option<FieldId>,
    /// Nearest visible ancestor.
    parent: Option<Rc<Node<'t>>>,
    /// Visible children, filled on first use.
    children: OnceCell<Rc<[Node<'t>]>>,
}

/// Byte range as a [`TextRange`], if it fits in 32 bits.
pub(crate) fn text_range(start: usize, len: usize) -> Option<TextRange> {
    let start = TextSize::try_from(start).ok()?;
    let len = TextSize::try_from(len).ok()?;
    start.checked_add(len)?;
    Some(TextRange::at(start, len))
}

impl<'t> Node<'t> {
    pub fn subtree(&self) -> &'t Subtree {
        self.subtree
    }

    pub fn kind(&self) -> &'t str {
        self.tree.table.symbol_name(self.symbol)
    }

    pub fn kind_id(&self) -> u16 {
        self.symbol.get()
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Named nodes come from rules; anonymous ones from string literals.
    pub fn is_named(&self) -> bool {
        self.symbol == Symbol::ERROR || self.tree.table.symbol(self.symbol).named
    }

    pub fn is_extra(&self) -> bool {
        self.subtree.is_extra()
    }

    pub fn is_error(&self) -> bool {
        self.subtree.is_error()
    }

    pub fn has_error(&self) -> bool {
        self.subtree.error_count() > 0
    }

    pub fn start_byte(&self) -> usize {
        self.start
    }

    pub fn end_byte(&self) -> usize {
        self.start + self.subtree.len()
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte()..self.end_byte()
    }

    /// Byte range as a [`TextRange`]. `None` when the node ends past the
    /// 4 GiB that `TextSize` can address; [`Node::byte_range`] always works.
    pub fn range(&self) -> Option<TextRange> {
        text_range(self.start, self.subtree.len())
    }

    /// Source text, when the range is valid UTF-8.
    pub fn utf8_text(&self) -> Option<&'t str> {
        std::str::from_utf8(&self.tree.source[self.byte_range()]).ok()
    }

    /// Field this node fills in its parent.
    pub fn field_name(&self) -> Option<&'t str> {
        self.field.map(|id| self.tree.table.field_name(id))
    }

    fn is_visible_symbol(&self, symbol: Symbol) -> bool {
        symbol == Symbol::ERROR || self.tree.table.symbol(symbol).visible
    }

    /// Copy without the children cache, to hand out as a parent.
    fn detached(&self) -> Node<'t> {
        Node {
            tree: self.tree,
            subtree: self.subtree,
            start: self.start,
            symbol: self.symbol,
            field: self.field,
            parent: self.parent.clone(),
            children: OnceCell::new(),
        }
    }

    /// Visible descendants reached through hidden nodes only. Each takes
    /// the field of the nearest hidden node that has one when its own
    /// production gives it none.
    fn collect_visible(&self) -> Rc<[Node<'t>]> {
        struct Frame<'t> {
            subtree: &'t Subtree,
            index: usize,
            /// Non-extra children seen so far.
            structural: usize,
            offset: usize,
            field: Option<FieldId>,
        }

        let table = &self.tree.table;
        let parent = Rc::new(self.detached());
        let mut out = Vec::new();
        let mut stack = vec![Frame {
            subtree: self.subtree,
            index: 0,
            structural: 0,
            offset: self.start,
            field: None,
        }];
        while let Some(frame) = stack.last_mut() {
            let subtree: &'t Subtree = frame.subtree;
            let Some(child) = subtree.children().get(frame.index) else {
                stack.pop();
                continue;
            };
            frame.index += 1;
            let start = frame.offset;
            frame.offset += child.len();
            let (alias, field) = match subtree.production().map(|p| table.production(p)) {
                Some(info) if !child.is_extra() => {
                    let index = frame.structural;
                    frame.structural += 1;
                    (info.alias(index), info.field(index))
                }
                _ => (None, None),
            };
            let field = field.or(frame.field);
            let symbol = alias.unwrap_or(child.symbol());
            if self.is_visible_symbol(symbol) {
                out.push(Node {
                    tree: self.tree,
                    subtree: child,
                    start,
                    symbol,
                    field,
                    parent: Some(Rc::clone(&parent)),
                    children: OnceCell::new(),
                });
            } else {
                stack.push(Frame {
                    subtree: child,
                    index: 0,
                    structural: 0,
                    offset: start,
                    field,
                });
            }
        }
        out.into()
    }

    fn cached_children(&self) -> &[Node<'t>] {
        self.children.get_or_init(|| self.collect_visible())
    }

    /// Visible children, with hidden intermediate nodes flattened away.
    pub fn children(&self) -> Vec<Node<'t>> {
        self.cached_children().to_vec()
    }

    pub fn named_children(&self) -> Vec<Node<'t>> {
        self.children().into_iter().filter(Node::is_named).collect()
    }

    pub fn child_count(&self) -> usize {
        self.cached_children().len()
    }

    pub fn child(&self, index: usize) -> Option<Node<'t>> {
        self.cached_children().get(index).cloned()
    }

    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'t>> {
        let id = self.tree.table.field_id(name)?;
        self.cached_children().iter().find(|child| child.field == Some(id)).cloned()
    }

    pub fn field_name_for_child(&self, index: usize) -> Option<&'t str> {
        self.child(index)?.field_name()
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.parent.as_deref().map(Node::detached)
    }

    fn sibling(&self, step: impl FnOnce(usize) -> Option<usize>) -> Option<Node<'t>> {
        let siblings = self.parent.as_deref()?.cached_children();
        let index = siblings
            .iter()
            .position(|s| s.subtree.ptr_eq(self.subtree) && s.start == self.start)?;
        siblings.get(step(index)?).cloned()
    }

    pub fn next_sibling(&self) -> Option<Node<'t>> {
        self.sibling(|index| index.checked_add(1))
    }

    pub fn prev_sibling(&self) -> Option<Node<'t>> {
        self.sibling(|index| index.checked_sub(1))
    }

    /// Smallest visible node spanning `range`.
    pub fn descendant_for_byte_range(&self, range: Range<usize>) -> Option<Node<'t>> {
        if range.start < self.start_byte() || range.end > self.end_byte() {
            return None;
        }
        let mut node = self.clone();
        loop {
            let next = node
                .cached_children()
                .iter()
                .find(|child| child.start_byte() <= range.start && range.end <= child.end_byte())
                .cloned();
            match next {
                Some(child) => node = child,
                None => return Some(node),
            }
        }
    }

    /// Renders named nodes as `(kind ...)`, anonymous tokens quoted and
    /// fields as `name: ` prefixes.
    pub fn to_sexp(&self) -> String {
        enum Step<'t> {
            Root(Node<'t>),
            Child(Node<'t>),
            Close,
        }

        let mut out = String::new();
        let mut stack = vec![Step::Root(self.clone())];
        while let Some(step) = stack.pop() {
            let node = match step {
                Step::Close => {
                    out.push(')');
                    continue;
                }
                Step::Root(node) => node,
                Step::Child(node) => {
                    out.push(' ');
                    if let Some(field) = node.field_name() {
                        out.push_str(field);
                        out.push_str(": ");
                    }
                    node
                }
            };
            if !node.is_named() {
                out.push_str(&format!("{:?}", node.kind()));
                continue;
            }
            out.push('(');
            out.push_str(node.kind());
            stack.push(Step::Close);
            stack.extend(node.cached_children().iter().rev().cloned().map(Step::Child));
        }
        out
    }
}

/// Releases the ancestor chain one link at a time.
impl Drop for Node<'_> {
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            parent = match Rc::try_unwrap(node) {
                Ok(mut node) => node.parent.take(),
                Err(_) => None,
            };
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind(), self.byte_range())
    }
}
