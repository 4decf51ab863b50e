// SPDX-License-Identifier: BSD-3-Clause
use super::IcfgEdge;
use crate::cfg::Node;

/// An intraprocedural dataflow analysis over graphs with nodes of type `N`
pub trait DataflowAnalysis<N> {
    type Fact: Clone;

    fn is_forward(&self) -> bool;

    /// Fact at the entry (forward) or exit (backward) node
    fn new_boundary_fact(&self) -> Self::Fact;

    /// Fact at every other node, before the analysis learns anything
    fn new_initial_fact(&self) -> Self::Fact;

    /// Merge `fact` into `target`.
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    /// Compute `output` from `input`, where `input` is the fact flowing
    /// into `node` in the direction of the analysis (the in-fact of a
    /// forward analysis, the out-fact of a backward one). Returns whether
    /// `output` changed.
    fn transfer_node(&mut self, node: N, input: &Self::Fact, output: &mut Self::Fact) -> bool;
}

/// A forward interprocedural dataflow analysis
pub trait InterDataflowAnalysis {
    type Fact: Clone;

    /// Fact at the entry of an entry method
    fn new_boundary_fact(&self, entry: Node) -> Self::Fact;

    fn new_initial_fact(&self) -> Self::Fact;

    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    /// As [`DataflowAnalysis::transfer_node`]
    fn transfer_node(&mut self, node: Node, input: &Self::Fact, output: &mut Self::Fact) -> bool;

    /// The fact flowing along `edge`, given the out-fact of its source
    fn transfer_edge(&mut self, edge: &IcfgEdge, source_out: &Self::Fact) -> Self::Fact;

    /// Called with the in-fact of `node` just before its transfer. Returns
    /// further nodes to (re-)analyze because state shared between nodes
    /// changed, e.g., the value stored in a heap location.
    fn refine(&mut self, _node: Node, _input: &Self::Fact) -> Vec<Node> {
        Vec::new()
    }
}
