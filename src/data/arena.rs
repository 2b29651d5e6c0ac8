//! Contiguous feature-node arena.
//!
//! All samples of a problem share one allocation of [`FeatureNode`]s. Each
//! sample owns a sub-range that starts at a recorded offset and ends with a
//! sentinel node:
//!
//! ```text
//! nodes:  (1,0.5) (3,1.0) (4,1.0) (-1,-1) (2,-1.0) (4,1.0) (-1,-1)
//! starts: 0                               4
//! ```
//!
//! Construction goes through [`ArenaWriter`], which owns a single write cursor
//! shared by every sample. [`ArenaWriter::finish`] checks that the cursor landed
//! exactly on the pre-computed capacity; any other outcome is a sizing bug and
//! is reported as [`LinearError::InternalConsistency`].

use crate::error::{LinearError, Result};

use super::node::{FeatureNode, SENTINEL_INDEX};

/// Immutable, sentinel-terminated node storage for a set of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureArena {
    /// All nodes, sample after sample.
    nodes: Box<[FeatureNode]>,
    /// `starts[i]` is the offset of sample `i`'s first node.
    starts: Box<[usize]>,
}

impl FeatureArena {
    /// Allocate a writer with exactly `total_entries` node slots.
    ///
    /// `total_entries` must already account for one sentinel per sample and
    /// any bias nodes.
    pub fn allocate(total_entries: usize) -> ArenaWriter {
        ArenaWriter {
            nodes: vec![FeatureNode::SENTINEL; total_entries].into_boxed_slice(),
            starts: Vec::new(),
            cursor: 0,
            index_limit: None,
        }
    }

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.starts.len()
    }

    /// Total number of nodes, sentinels included.
    #[inline]
    pub fn total_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Offset of a sample's first node.
    #[inline]
    pub fn start(&self, sample: usize) -> Option<usize> {
        self.starts.get(sample).copied()
    }

    /// Nodes of one sample, without its sentinel.
    ///
    /// Scans forward from the recorded start until the sentinel.
    pub fn sample(&self, sample: usize) -> Option<&[FeatureNode]> {
        let start = self.start(sample)?;
        let end = self.nodes[start..]
            .iter()
            .position(FeatureNode::is_sentinel)
            .map_or(self.nodes.len(), |len| start + len);
        Some(&self.nodes[start..end])
    }

    /// Nodes of one sample, sentinel included.
    pub fn sample_with_sentinel(&self, sample: usize) -> Option<&[FeatureNode]> {
        self.sample(sample).map(|nodes| {
            let start = self.starts[sample];
            &self.nodes[start..start + nodes.len() + 1]
        })
    }

    /// Iterate over every sample's nodes (sentinels excluded).
    pub fn samples(&self) -> impl ExactSizeIterator<Item = &[FeatureNode]> + '_ {
        (0..self.n_samples()).map(move |i| self.sample(i).unwrap_or(&[]))
    }

    /// Raw node storage.
    #[inline]
    pub fn as_slice(&self) -> &[FeatureNode] {
        &self.nodes
    }
}

/// Write cursor over a freshly allocated arena.
#[derive(Debug)]
pub struct ArenaWriter {
    nodes: Box<[FeatureNode]>,
    starts: Vec<usize>,
    cursor: usize,
    /// Largest index accepted by [`append`](Self::append), if bounded.
    index_limit: Option<i32>,
}

impl ArenaWriter {
    /// Reject real feature indices outside `1..=limit`.
    ///
    /// Sentinel and bias nodes are written through their own methods and are
    /// never checked against the limit.
    pub fn with_index_limit(mut self, limit: i32) -> Self {
        self.index_limit = Some(limit);
        self
    }

    /// Mark the current cursor as the start of the next sample.
    pub fn begin_sample(&mut self) {
        self.starts.push(self.cursor);
    }

    /// Current write position.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of slots allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Number of samples begun so far.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.starts.len()
    }

    /// Write a real feature node and advance the cursor.
    pub fn append(&mut self, index: i32, value: f64) -> Result<()> {
        if let Some(limit) = self.index_limit {
            if index < 1 || index > limit {
                return Err(LinearError::FeatureIndexInvalid {
                    sample: self.starts.len().saturating_sub(1),
                    index,
                    max: limit,
                });
            }
        }
        self.put(FeatureNode::new(index, value)).map(|_| ())
    }

    /// Write a bias node and return its slot.
    pub fn append_bias(&mut self, index: i32, value: f64) -> Result<usize> {
        self.put(FeatureNode::new(index, value))
    }

    /// Write the end-of-sample sentinel.
    pub fn append_sentinel(&mut self) -> Result<()> {
        self.put(FeatureNode::SENTINEL).map(|_| ())
    }

    /// Rewrite the index of an already written node.
    ///
    /// Used to resolve bias placeholders once the final feature count is known.
    pub fn patch_index(&mut self, slot: usize, index: i32) {
        debug_assert!(slot < self.cursor, "patching an unwritten slot");
        debug_assert_ne!(index, SENTINEL_INDEX);
        self.nodes[slot].index = index;
    }

    /// Seal the arena.
    ///
    /// Fails with [`LinearError::InternalConsistency`] unless every allocated
    /// slot was written.
    pub fn finish(self) -> Result<FeatureArena> {
        if self.cursor != self.nodes.len() {
            return Err(LinearError::InternalConsistency {
                allocated: self.nodes.len(),
                written: self.cursor,
            });
        }
        if let Some(last) = self.nodes.last() {
            if !last.is_sentinel() {
                return Err(LinearError::InternalConsistency {
                    allocated: self.nodes.len(),
                    written: self.cursor,
                });
            }
        }
        Ok(FeatureArena {
            nodes: self.nodes,
            starts: self.starts.into_boxed_slice(),
        })
    }

    fn put(&mut self, node: FeatureNode) -> Result<usize> {
        let slot = self.cursor;
        let target = self
            .nodes
            .get_mut(slot)
            .ok_or(LinearError::ArenaOverflow {
                capacity: slot,
            })?;
        *target = node;
        self.cursor += 1;
        Ok(slot)
    }
}
