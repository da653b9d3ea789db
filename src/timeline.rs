//! Ordered, doubly-linked sequence of placed blocks for one (weekday, parity).
//!
//! Nodes live in an arena owned by the timeline. Slot `0` is the sentinel: it
//! stands for "no neighbor" in both directions, and its own `next`/`prev`
//! point at the head and tail of the list. Freed slots are recycled, so a
//! search that keeps inserting and removing does not grow the arena past the
//! deepest descent. Each slot carries a generation that moves on when the slot
//! is freed, so handles to a recycled slot go stale instead of aliasing.

use crate::data::Minutes;
use std::fmt;
use std::iter::FusedIterator;

const SENTINEL: usize = 0;

/// Half-open occupied interval `[start, end)` in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: Minutes,
    pub end: Minutes,
}

impl Span {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        Self { start, end }
    }
}

/// Handle to a node placed in a [`DayTimeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    index: usize,
    generation: u32,
}

impl NodeHandle {
    /// The past-the-end node. Removing it is a no-op.
    pub const END: NodeHandle = NodeHandle {
        index: SENTINEL,
        generation: 0,
    };

    pub fn is_end(self) -> bool {
        self.index == SENTINEL
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeHandle({}v{})", self.index, self.generation)
    }
}

/// The block could not be placed without overlapping an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collision;

#[derive(Debug, Clone)]
struct Node {
    span: Span,
    prev: usize,
    next: usize,
    linked: bool,
    generation: u32,
}

#[derive(Debug, Clone)]
pub struct DayTimeline {
    nodes: Vec<Node>,
    free: Vec<usize>,
    len: usize,
}

impl Default for DayTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl DayTimeline {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                span: Span::new(0, 0),
                prev: SENTINEL,
                next: SENTINEL,
                linked: false,
                generation: 0,
            }],
            free: Vec::new(),
            len: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes[SENTINEL].next == SENTINEL
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Links `span` in at the first gap wide enough to hold it.
    ///
    /// Back-to-back placement (`prev.end == span.start` or
    /// `span.end == next.start`) is accepted. On collision nothing changes.
    pub fn insert_if_no_collision(&mut self, span: Span) -> Result<NodeHandle, Collision> {
        let mut prev = SENTINEL;
        let mut cur = self.nodes[SENTINEL].next;

        while cur != SENTINEL {
            let placed = self.nodes[cur].span;
            if placed.end <= span.start {
                prev = cur;
                cur = self.nodes[cur].next;
            } else if placed.start >= span.end {
                break;
            } else {
                return Err(Collision);
            }
        }

        Ok(self.link_between(span, prev, cur))
    }

    /// Unlinks a node in O(1). Removing [`NodeHandle::END`] or a handle
    /// whose node was already removed does nothing, even after its slot has
    /// been recycled.
    pub fn remove(&mut self, handle: NodeHandle) {
        let idx = handle.index;
        if idx == SENTINEL || idx >= self.nodes.len() {
            return;
        }
        let node = &self.nodes[idx];
        if !node.linked || node.generation != handle.generation {
            return;
        }

        let Node { prev, next, .. } = self.nodes[idx];
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;

        let node = &mut self.nodes[idx];
        node.linked = false;
        node.generation = node.generation.wrapping_add(1);
        node.prev = SENTINEL;
        node.next = SENTINEL;
        self.free.push(idx);
        self.len -= 1;
    }

    /// First start and last end of the day, or `None` when nothing is placed.
    #[inline]
    pub fn bounds(&self) -> Option<(Minutes, Minutes)> {
        if self.is_empty() {
            return None;
        }
        let head = self.nodes[SENTINEL].next;
        let tail = self.nodes[SENTINEL].prev;
        Some((self.nodes[head].span.start, self.nodes[tail].span.end))
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            nodes: &self.nodes,
            cur: self.nodes[SENTINEL].next,
        }
    }

    fn link_between(&mut self, span: Span, prev: usize, next: usize) -> NodeHandle {
        let generation = self.free.last().map_or(0, |&idx| self.nodes[idx].generation);
        let node = Node {
            span,
            prev,
            next,
            linked: true,
            generation,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        self.nodes[prev].next = idx;
        self.nodes[next].prev = idx;
        self.len += 1;
        NodeHandle { index: idx, generation }
    }
}

/// Placed spans in ascending start order.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    nodes: &'a [Node],
    cur: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Span;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == SENTINEL {
            return None;
        }
        let node = &self.nodes[self.cur];
        self.cur = node.next;
        Some(node.span)
    }
}

impl FusedIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a DayTimeline {
    type Item = Span;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
