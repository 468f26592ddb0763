//! Text edits and the position map between two tree versions.

use std::ops::Range;

/// One replaced byte range.
///
/// `start_byte..old_end_byte` of the text the edit applies to is replaced by
/// `start_byte..new_end_byte` of the resulting text. A sequence of edits is
/// applied in order, each in the coordinates left by the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
}

impl Edit {
    /// Edit that replaces `range` with `new_len` bytes.
    pub fn replace(range: Range<usize>, new_len: usize) -> Self {
        Self {
            start_byte: range.start,
            old_end_byte: range.end,
            new_end_byte: range.start + new_len,
        }
    }

    pub fn insert(at: usize, len: usize) -> Self {
        Self::replace(at..at, len)
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::replace(range, 0)
    }

    /// Length change of everything after the edit.
    pub fn delta(&self) -> isize {
        self.new_end_byte as isize - self.old_end_byte as isize
    }

    /// Apply the edit to `text`, taking the inserted bytes from `replacement`.
    pub fn apply(&self, text: &mut Vec<u8>, replacement: &[u8]) {
        debug_assert_eq!(replacement.len(), self.new_end_byte - self.start_byte);
        text.splice(self.start_byte..self.old_end_byte, replacement.iter().copied());
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditError {
    #[error("edit {index} ends before it starts: {start}..{end}")]
    Inverted { index: usize, start: usize, end: usize },

    #[error("edit {index} reaches byte {end}, past the text length {len}")]
    OutOfBounds { index: usize, end: usize, len: usize },

    #[error("edits describe a text of {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Replaced region, in old and new coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Region {
    old: Range<usize>,
    new: Range<usize>,
}

/// Composition of an ordered edit sequence.
///
/// Stores sorted, disjoint regions: `old` bytes of the previous text became
/// `new` bytes of the current one. Everything between regions is unchanged
/// and only shifted, so positions are mapped on demand instead of rewriting
/// the old tree.
#[derive(Clone, Debug)]
pub struct EditMap {
    regions: Vec<Region>,
    old_len: usize,
    new_len: usize,
}

impl EditMap {
    pub fn new(old_len: usize) -> Self {
        Self {
            regions: Vec::new(),
            old_len,
            new_len: old_len,
        }
    }

    /// Fold a sequence of edits over a text of `old_len` bytes.
    pub fn from_edits(old_len: usize, edits: &[Edit]) -> Result<Self, EditError> {
        let mut map = Self::new(old_len);
        for (index, edit) in edits.iter().enumerate() {
            map.push(index, edit)?;
        }
        Ok(map)
    }

    pub fn old_len(&self) -> usize {
        self.old_len
    }

    /// Length of the text after all edits.
    pub fn new_len(&self) -> usize {
        self.new_len
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    fn push(&mut self, index: usize, edit: &Edit) -> Result<(), EditError> {
        let (s, oe, ne) = (edit.start_byte, edit.old_end_byte, edit.new_end_byte);
        if oe < s || ne < s {
            return Err(EditError::Inverted {
                index,
                start: s,
                end: oe.min(ne),
            });
        }
        if oe > self.new_len {
            return Err(EditError::OutOfBounds {
                index,
                end: oe,
                len: self.new_len,
            });
        }

        // Regions touching the edit are absorbed into one.
        let first = self.regions.partition_point(|r| r.new.end < s);
        let last = self.regions.partition_point(|r| r.new.start <= oe);
        let touched = &self.regions[first..last];

        let new_start = touched.first().map_or(s, |r| r.new.start.min(s));
        let new_end = touched.last().map_or(oe, |r| r.new.end.max(oe));
        let old_start = match touched.first() {
            Some(r) if r.new.start <= s => r.old.start,
            _ => self.old_of_unchanged(s),
        };
        let old_end = match touched.last() {
            Some(r) if r.new.end >= oe => r.old.end,
            _ => self.old_of_unchanged(oe),
        };

        let grow = ne as isize - oe as isize;
        let merged = Region {
            old: old_start..old_end,
            new: new_start..shift(new_end, grow),
        };
        for region in &mut self.regions[last..] {
            region.new = shift(region.new.start, grow)..shift(region.new.end, grow);
        }
        self.regions.splice(first..last, [merged]);
        self.new_len = shift(self.new_len, grow);
        Ok(())
    }

    /// Old position of a current position that lies outside every region.
    fn old_of_unchanged(&self, position: usize) -> usize {
        let mut old = position as isize;
        for region in self.regions.iter().take_while(|r| r.new.end <= position) {
            old -= region.new.len() as isize - region.old.len() as isize;
        }
        old as usize
    }

    /// Position in the old text of the byte now at `position`, or `None`
    /// when that byte is new.
    pub fn to_old(&self, position: usize) -> Option<usize> {
        if self
            .regions
            .iter()
            .any(|r| r.new.start <= position && position < r.new.end)
        {
            return None;
        }
        Some(self.old_of_unchanged(position))
    }

    /// Whether a node whose lexing depended on old bytes `start..reach`
    /// overlaps a replaced region. A region ending exactly at `start` leaves
    /// the node intact; one starting at `reach` does too. An insertion
    /// strictly inside the span damages it.
    pub fn damages(&self, start: usize, reach: usize) -> bool {
        self.regions
            .iter()
            .any(|r| r.old.start < reach && r.old.end > start)
    }
}

fn shift(position: usize, by: isize) -> usize {
    (position as isize + by) as usize
}
