// SPDX-License-Identifier: BSD-3-Clause
//! Pointer flow graph
//!
//! An edge `s -> t` means that `t` may point to whatever `s` points to.
//! Nodes are [`PointerId`]s; both directions are stored so that successors
//! and predecessors are cheap to query.

use rustc_hash::FxHashSet;

use super::PointerId;

#[derive(Debug, Default)]
pub struct PointerFlowGraph {
    succs: Vec<Vec<PointerId>>,
    preds: Vec<Vec<PointerId>>,
    edges: FxHashSet<(PointerId, PointerId)>,
}

impl PointerFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, p: PointerId) {
        if p.index() >= self.succs.len() {
            self.succs.resize_with(p.index() + 1, Vec::new);
            self.preds.resize_with(p.index() + 1, Vec::new);
        }
    }

    /// Returns whether the edge is new.
    pub fn add_edge(&mut self, source: PointerId, target: PointerId) -> bool {
        if !self.edges.insert((source, target)) {
            return false;
        }
        self.ensure_node(source);
        self.ensure_node(target);
        self.succs[source.index()].push(target);
        self.preds[target.index()].push(source);
        true
    }

    pub fn has_edge(&self, source: PointerId, target: PointerId) -> bool {
        self.edges.contains(&(source, target))
    }

    pub fn succs_of(&self, p: PointerId) -> &[PointerId] {
        self.succs.get(p.index()).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn preds_of(&self, p: PointerId) -> &[PointerId] {
        self.preds.get(p.index()).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn edges(&self) -> impl Iterator<Item = (PointerId, PointerId)> + '_ {
        self.succs.iter().enumerate().flat_map(|(s, ts)| {
            ts.iter().map(move |t| (PointerId::from_index(s), *t))
        })
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}
