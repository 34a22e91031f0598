//! Multi-level page table.
//!
//! Nodes live in an arena and refer to their children by index. Node 0 is
//! the root. A node at level `i` has `2^level_bits[i]` entries; only the
//! final level holds mappings. Nodes are created lazily by [`PageTable::bind`]
//! and are never freed during a run.

use crate::config::AddressLayout;
use crate::memory::FrameIndex;
use crate::translation::Vpn;

/// Handle of a node inside the arena
pub type NodeId = usize;

const ROOT: NodeId = 0;

/// A valid final-level entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub frame: FrameIndex,
    /// Logical time the mapping was installed
    pub stamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Empty,
    Table(NodeId),
    Mapped(Mapping),
}

struct Node {
    entries: Box<[Entry]>,
}

impl Node {
    fn new(size: usize) -> Self {
        Node {
            entries: vec![Entry::Empty; size].into_boxed_slice(),
        }
    }
}

pub struct PageTable {
    layout: AddressLayout,
    nodes: Vec<Node>,
}

impl PageTable {
    pub fn new(layout: &AddressLayout) -> Self {
        PageTable {
            nodes: vec![Node::new(layout.entries_at(0))],
            layout: layout.clone(),
        }
    }

    pub fn layout(&self) -> &AddressLayout {
        &self.layout
    }

    /// Frame bound to `vpn`, if the page is resident
    pub fn lookup(&self, vpn: Vpn) -> Option<FrameIndex> {
        self.mapping(vpn).map(|m| m.frame)
    }

    /// Final-level entry for `vpn`, if the page is resident
    pub fn mapping(&self, vpn: Vpn) -> Option<Mapping> {
        let (node, index) = self.find_leaf(vpn)?;
        match self.nodes[node].entries[index] {
            Entry::Mapped(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// Map `vpn` to `frame`, creating intermediate nodes on the way
    pub fn bind(&mut self, vpn: Vpn, frame: FrameIndex, now: u64) {
        let last = self.layout.depth() - 1;
        let mut node = ROOT;

        for level in 0..last {
            let index = self.layout.index(vpn, level);
            let entry = self.nodes[node].entries[index];
            node = match entry {
                Entry::Table(child) => child,
                Entry::Empty => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::new(self.layout.entries_at(level + 1)));
                    self.nodes[node].entries[index] = Entry::Table(child);
                    child
                }
                Entry::Mapped(_) => unreachable!("mapping above the final level at level {}", level),
            };
        }

        let index = self.layout.index(vpn, last);
        self.nodes[node].entries[index] = Entry::Mapped(Mapping { frame, stamp: now });
    }

    /// Remove the mapping for `vpn`, returning the frame it pointed at
    pub fn invalidate(&mut self, vpn: Vpn) -> Option<FrameIndex> {
        let (node, index) = self.find_leaf(vpn)?;
        let slot = &mut self.nodes[node].entries[index];
        let Entry::Mapped(mapping) = *slot else {
            return None;
        };
        *slot = Entry::Empty;
        Some(mapping.frame)
    }

    /// Nodes allocated so far, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Walk to the final-level node holding `vpn` without creating anything
    fn find_leaf(&self, vpn: Vpn) -> Option<(NodeId, usize)> {
        let last = self.layout.depth() - 1;
        let mut node = ROOT;

        for level in 0..last {
            match self.nodes[node].entries[self.layout.index(vpn, level)] {
                Entry::Table(child) => node = child,
                _ => return None,
            }
        }

        Some((node, self.layout.index(vpn, last)))
    }
}
