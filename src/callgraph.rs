// SPDX-License-Identifier: BSD-3-Clause
//! Call graphs, generic in the representation of call sites and methods so
//! that the same structure serves context-sensitive and -insensitive
//! analyses.
//!
//! A call graph only grows: methods become reachable and edges are added,
//! never removed.

use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ir::CallKind;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Edge<C, M> {
    pub kind: CallKind,
    pub call_site: C,
    pub callee: M,
}

#[derive(Clone, Debug)]
pub struct CallGraph<C, M> {
    entry_methods: Vec<M>,
    /// In order of discovery
    reachable: Vec<M>,
    reachable_set: FxHashSet<M>,
    /// In order of discovery
    edges: Vec<Edge<C, M>>,
    edge_set: FxHashSet<Edge<C, M>>,
    callees: FxHashMap<C, Vec<M>>,
    callers: FxHashMap<M, Vec<C>>,
}

impl<C, M> Default for CallGraph<C, M> {
    fn default() -> Self {
        CallGraph {
            entry_methods: Vec::new(),
            reachable: Vec::new(),
            reachable_set: FxHashSet::default(),
            edges: Vec::new(),
            edge_set: FxHashSet::default(),
            callees: FxHashMap::default(),
            callers: FxHashMap::default(),
        }
    }
}

impl<C, M> CallGraph<C, M>
where
    C: Copy + Eq + Hash,
    M: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry_method(&mut self, m: M) {
        if !self.entry_methods.contains(&m) {
            self.entry_methods.push(m);
        }
    }

    pub fn entry_methods(&self) -> &[M] {
        &self.entry_methods
    }

    /// Returns whether `m` was not already reachable.
    pub fn add_reachable_method(&mut self, m: M) -> bool {
        if self.reachable_set.insert(m) {
            self.reachable.push(m);
            true
        } else {
            false
        }
    }

    pub fn reachable_methods(&self) -> &[M] {
        &self.reachable
    }

    #[inline]
    pub fn contains(&self, m: M) -> bool {
        self.reachable_set.contains(&m)
    }

    /// Returns whether the edge is new. Does not make the callee reachable.
    pub fn add_edge(&mut self, edge: Edge<C, M>) -> bool {
        if !self.edge_set.insert(edge) {
            return false;
        }
        self.edges.push(edge);
        self.callees
            .entry(edge.call_site)
            .or_default()
            .push(edge.callee);
        self.callers
            .entry(edge.callee)
            .or_default()
            .push(edge.call_site);
        true
    }

    pub fn has_edge(&self, edge: &Edge<C, M>) -> bool {
        self.edge_set.contains(edge)
    }

    pub fn callees_of(&self, call_site: C) -> &[M] {
        self.callees
            .get(&call_site)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn callers_of(&self, m: M) -> &[C] {
        self.callers.get(&m).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge<C, M>> + '_ {
        self.edges.iter()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Apply `fc` and `fm` to every call site and method, merging the
    /// elements they identify.
    pub fn project<C2, M2>(
        &self,
        mut fc: impl FnMut(C) -> C2,
        mut fm: impl FnMut(M) -> M2,
    ) -> CallGraph<C2, M2>
    where
        C2: Copy + Eq + Hash,
        M2: Copy + Eq + Hash,
    {
        let mut cg = CallGraph::new();
        for m in &self.entry_methods {
            cg.add_entry_method(fm(*m));
        }
        for m in &self.reachable {
            cg.add_reachable_method(fm(*m));
        }
        for e in &self.edges {
            cg.add_edge(Edge {
                kind: e.kind,
                call_site: fc(e.call_site),
                callee: fm(e.callee),
            });
        }
        cg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(call_site: u32, callee: char) -> Edge<u32, char> {
        Edge {
            kind: CallKind::Virtual,
            call_site,
            callee,
        }
    }

    #[test]
    fn edges_are_added_once() {
        let mut cg = CallGraph::new();
        assert!(cg.add_edge(edge(0, 'a')));
        assert!(!cg.add_edge(edge(0, 'a')));
        assert!(cg.add_edge(edge(0, 'b')));
        assert!(cg.add_edge(edge(1, 'a')));
        assert_eq!(3, cg.num_edges());
        assert_eq!(&['a', 'b'], cg.callees_of(0));
        assert_eq!(&[0, 1], cg.callers_of('a'));
        assert!(cg.callees_of(7).is_empty());
    }

    #[test]
    fn reachability() {
        let mut cg: CallGraph<u32, char> = CallGraph::new();
        cg.add_entry_method('m');
        assert!(cg.add_reachable_method('m'));
        assert!(!cg.add_reachable_method('m'));
        assert!(cg.contains('m'));
        assert!(!cg.contains('n'));
        assert_eq!(&['m'], cg.entry_methods());
    }

    #[test]
    fn projection_merges() {
        let mut cg = CallGraph::new();
        cg.add_edge(edge(0, 'a'));
        cg.add_edge(edge(1, 'a'));
        cg.add_reachable_method('a');
        let p = cg.project(|c| c / 2, |m| m);
        assert_eq!(1, p.num_edges());
        assert_eq!(&['a'], p.reachable_methods());
    }
}
