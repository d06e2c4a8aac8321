//! MemTable implementation
//!
//! Arena-backed binary search tree with case-insensitive key order.

use std::cmp::Ordering;

use crate::error::{PageKvError, Result};
use crate::key::compare_keys;

use super::Entry;

/// A tree node; children are indexes into `MemTable::nodes`
#[derive(Debug)]
struct Node {
    key: String,
    value: Vec<u8>,
    lower: Option<usize>,
    higher: Option<usize>,
}

/// In-memory ordered table for recent writes
#[derive(Debug, Default)]
pub struct MemTable {
    /// Every node ever inserted since the last clear; nothing is removed
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value for `key`.
    ///
    /// Returns `true` when the key was not present before. On replacement the
    /// spelling stored first is kept and only the value changes.
    pub fn set(&mut self, key: impl Into<String>, value: Vec<u8>) -> bool {
        let key = key.into();
        let new_index = self.nodes.len();

        let mut current = match self.root {
            Some(root) => root,
            None => {
                self.nodes.push(Node::leaf(key, value));
                self.root = Some(new_index);
                return true;
            }
        };

        loop {
            let node = &mut self.nodes[current];
            let branch = match compare_keys(&key, &node.key) {
                Ordering::Equal => {
                    node.value = value;
                    return false;
                }
                Ordering::Less => &mut node.lower,
                Ordering::Greater => &mut node.higher,
            };

            let next = *branch;
            match next {
                Some(child) => current = child,
                None => {
                    *branch = Some(new_index);
                    self.nodes.push(Node::leaf(key, value));
                    return true;
                }
            }
        }
    }

    /// Check whether `key` is present
    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Get the value for `key`, or `KeyNotFound`
    pub fn get(&self, key: &str) -> Result<&[u8]> {
        self.find(key)
            .map(|index| self.nodes[index].value.as_slice())
            .ok_or_else(|| PageKvError::KeyNotFound(key.to_string()))
    }

    /// Number of distinct keys held
    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate entries in ascending key order
    pub fn iter(&self) -> MemTableIter<'_> {
        MemTableIter {
            nodes: &self.nodes,
            pending: Vec::new(),
            cursor: self.root,
        }
    }

    /// Copy all entries out in ascending key order
    pub fn to_sorted_entries(&self) -> Vec<Entry> {
        self.iter()
            .map(|(key, value)| Entry::new(key, value))
            .collect()
    }

    /// Consume the table, moving all entries out in ascending key order
    pub fn into_sorted_entries(mut self) -> Vec<Entry> {
        let mut entries = Vec::with_capacity(self.nodes.len());
        let mut pending = Vec::new();
        let mut cursor = self.root;

        while let Some(index) = next_in_order(&self.nodes, &mut pending, &mut cursor) {
            let node = &mut self.nodes[index];
            entries.push(Entry {
                key: std::mem::take(&mut node.key),
                value: std::mem::take(&mut node.value),
            });
        }

        entries
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Longest root-to-leaf path, measured with an explicit work list
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending: Vec<(usize, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();

        while let Some((index, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            let node = &self.nodes[index];
            pending.extend(node.lower.map(|child| (child, depth + 1)));
            pending.extend(node.higher.map(|child| (child, depth + 1)));
        }

        deepest
    }

    fn find(&self, key: &str) -> Option<usize> {
        let mut cursor = self.root;
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            cursor = match compare_keys(key, &node.key) {
                Ordering::Equal => return Some(index),
                Ordering::Less => node.lower,
                Ordering::Greater => node.higher,
            };
        }
        None
    }
}

impl Node {
    fn leaf(key: String, value: Vec<u8>) -> Self {
        Self {
            key,
            value,
            lower: None,
            higher: None,
        }
    }
}

/// In-order iterator over a MemTable.
///
/// Keeps a stack of nodes whose lower subtree is being visited; the stack never
/// grows past the tree depth.
pub struct MemTableIter<'a> {
    nodes: &'a [Node],
    pending: Vec<usize>,
    cursor: Option<usize>,
}

/// One in-order step: descend lower from `cursor`, then pop the next node and
/// move `cursor` to its higher child
fn next_in_order(
    nodes: &[Node],
    pending: &mut Vec<usize>,
    cursor: &mut Option<usize>,
) -> Option<usize> {
    while let Some(index) = *cursor {
        pending.push(index);
        *cursor = nodes[index].lower;
    }

    let index = pending.pop()?;
    *cursor = nodes[index].higher;
    Some(index)
}

impl<'a> Iterator for MemTableIter<'a> {
    type Item = (&'a str, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let index = next_in_order(self.nodes, &mut self.pending, &mut self.cursor)?;
        let node = &self.nodes[index];
        Some((node.key.as_str(), node.value.as_slice()))
    }
}
