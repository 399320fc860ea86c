//! Structural verification and debug rendering.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::common::config::MAX_HEIGHT;
use crate::common::{Error, FixedCodec, IndexKey, KeyHash, PageOffset, Result};
use crate::storage::record::Node;

use super::store::{read_node, too_deep};
use super::BTree;

/// Summary of a tree that passed [`BTree::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Levels from the root to the leaves.
    pub height: usize,
    /// Number of reachable node records.
    pub node_count: u64,
    /// Number of entries across all nodes.
    pub entry_count: u64,
    /// Key hashes held by the root.
    pub root_keys: Vec<KeyHash>,
}

/// A node waiting to be checked, with the constraints its position implies.
struct Pending {
    offset: PageOffset,
    parent: PageOffset,
    depth: usize,
    /// Exclusive key bounds of the subtree.
    lower: Option<KeyHash>,
    upper: Option<KeyHash>,
}

fn violation(message: String) -> Error {
    Error::Integrity(message)
}

impl<K: IndexKey + ?Sized, V: FixedCodec> BTree<K, V> {
    /// Walk the whole tree and check its structural invariants.
    ///
    /// Checks minimum occupancy of non-root nodes, parent links, strict key
    /// order within nodes and across subtrees, equal leaf depth, that no
    /// record is reachable twice, and that the entry count matches
    /// [`len`](Self::len).
    ///
    /// # Errors
    /// Returns `Error::Integrity` naming the first violation found, or the
    /// error of a record that could not be read.
    pub fn verify(&self) -> Result<IntegrityReport> {
        let mut cache = self.cache.lock();
        let min = self.config().min_entries();
        let root = self.header.root;

        let mut seen = HashSet::new();
        let mut stack = vec![Pending {
            offset: root,
            parent: PageOffset::INVALID,
            depth: 1,
            lower: None,
            upper: None,
        }];
        let mut leaf_depth = None;
        let mut node_count = 0u64;
        let mut entry_count = 0u64;
        let mut root_keys = Vec::new();

        while let Some(Pending {
            offset,
            parent,
            depth,
            lower,
            upper,
        }) = stack.pop()
        {
            if depth > MAX_HEIGHT {
                return Err(violation(format!(
                    "tree is deeper than {} levels",
                    MAX_HEIGHT
                )));
            }
            if !seen.insert(offset) {
                return Err(violation(format!("record {} is reachable twice", offset)));
            }

            let node: Node<V> = read_node(&mut cache, &self.layout, offset)?;
            if node.parent != parent {
                return Err(violation(format!(
                    "node {} names parent {}, expected {}",
                    offset, node.parent, parent
                )));
            }

            if offset == root {
                if !node.is_leaf() && node.is_empty() {
                    return Err(violation("internal root holds no entries".to_string()));
                }
                root_keys = node.keys.clone();
            } else if node.len() < min {
                return Err(violation(format!(
                    "node {} holds {} entries, minimum is {}",
                    offset,
                    node.len(),
                    min
                )));
            }

            if node.keys.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(violation(format!(
                    "keys of node {} are not strictly increasing",
                    offset
                )));
            }
            let below = matches!((lower, node.keys.first()), (Some(lo), Some(&first)) if first <= lo);
            let above = matches!((upper, node.keys.last()), (Some(hi), Some(&last)) if last >= hi);
            if below || above {
                return Err(violation(format!(
                    "node {} holds keys outside its subtree range",
                    offset
                )));
            }

            node_count += 1;
            entry_count += node.len() as u64;

            if node.is_leaf() {
                match leaf_depth {
                    None => leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(violation(format!(
                            "leaf {} is at depth {}, expected {}",
                            offset, depth, expected
                        )));
                    }
                    Some(_) => {}
                }
                continue;
            }

            for (i, &child) in node.children.iter().enumerate() {
                stack.push(Pending {
                    offset: child,
                    parent: offset,
                    depth: depth + 1,
                    lower: if i == 0 { lower } else { Some(node.keys[i - 1]) },
                    upper: node.keys.get(i).copied().or(upper),
                });
            }
        }

        if entry_count != self.header.len {
            return Err(violation(format!(
                "tree holds {} entries, header records {}",
                entry_count, self.header.len
            )));
        }

        Ok(IntegrityReport {
            height: leaf_depth.unwrap_or(1),
            node_count,
            entry_count,
            root_keys,
        })
    }

    /// Render every node, depth first, one per line.
    ///
    /// ```text
    /// @16052 parent=@INVALID keys=[9] children=[@16220, @16388]
    ///   @16220 parent=@16052 keys=[3, 6] children=[...]
    /// ```
    pub fn dump(&self) -> Result<String> {
        let mut cache = self.cache.lock();
        let mut out = String::new();
        let mut seen = HashSet::new();
        let mut stack = vec![(self.header.root, 0usize)];

        while let Some((offset, level)) = stack.pop() {
            if level >= MAX_HEIGHT || !seen.insert(offset) {
                return Err(too_deep());
            }
            let node: Node<V> = read_node(&mut cache, &self.layout, offset)?;

            let keys: Vec<String> = node.keys.iter().map(ToString::to_string).collect();
            let _ = write!(
                out,
                "{:indent$}{} parent={} keys=[{}]",
                "",
                offset,
                node.parent,
                keys.join(", "),
                indent = level * 2
            );
            if !node.is_leaf() {
                let children: Vec<String> =
                    node.children.iter().map(ToString::to_string).collect();
                let _ = write!(out, " children=[{}]", children.join(", "));
            }
            out.push('\n');

            stack.extend(node.children.iter().rev().map(|&child| (child, level + 1)));
        }

        Ok(out)
    }
}
