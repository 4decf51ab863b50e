// SPDX-License-Identifier: BSD-3-Clause
//! Worklist solver for intraprocedural analyses.

use std::collections::VecDeque;
use std::hash::Hash;

use rustc_hash::FxHashSet;
use tracing::trace_span;

use super::{DataflowAnalysis, DataflowResult};
use crate::cfg::Graph;

/// FIFO queue holding each node at most once
#[derive(Debug)]
pub(crate) struct NodeQueue<N> {
    queue: VecDeque<N>,
    queued: FxHashSet<N>,
}

impl<N: Copy + Eq + Hash> NodeQueue<N> {
    pub(crate) fn new(nodes: impl IntoIterator<Item = N>) -> Self {
        let mut q = NodeQueue {
            queue: VecDeque::new(),
            queued: FxHashSet::default(),
        };
        for n in nodes {
            q.push(n);
        }
        q
    }

    pub(crate) fn push(&mut self, n: N) {
        if self.queued.insert(n) {
            self.queue.push_back(n);
        }
    }

    pub(crate) fn pop(&mut self) -> Option<N> {
        let n = self.queue.pop_front()?;
        self.queued.remove(&n);
        Some(n)
    }
}

pub fn solve<G, A>(graph: &G, analysis: &mut A) -> DataflowResult<G::Node, A::Fact>
where
    G: Graph,
    A: DataflowAnalysis<G::Node>,
{
    let span = trace_span!("dataflow");
    let _span = span.enter();
    if analysis.is_forward() {
        solve_forward(graph, analysis)
    } else {
        solve_backward(graph, analysis)
    }
}

fn initialize<G, A>(graph: &G, analysis: &A, boundary: G::Node) -> DataflowResult<G::Node, A::Fact>
where
    G: Graph,
    A: DataflowAnalysis<G::Node>,
{
    let mut result = DataflowResult::default();
    for n in graph.nodes() {
        let fact = if n == boundary {
            analysis.new_boundary_fact()
        } else {
            analysis.new_initial_fact()
        };
        result.set_in_fact(n, fact.clone());
        result.set_out_fact(n, fact);
    }
    result
}

fn solve_forward<G, A>(graph: &G, analysis: &mut A) -> DataflowResult<G::Node, A::Fact>
where
    G: Graph,
    A: DataflowAnalysis<G::Node>,
{
    let entry = graph.entry();
    let mut result = initialize(graph, analysis, entry);
    let mut worklist = NodeQueue::new(graph.nodes().into_iter().filter(|n| *n != entry));
    while let Some(n) = worklist.pop() {
        let Some(mut input) = result.in_fact(n).cloned() else {
            panic!("Bug! Dataflow node outside of the graph");
        };
        for p in graph.preds_of(n) {
            if let Some(out) = result.out_fact(*p) {
                analysis.meet_into(out, &mut input);
            }
        }
        let changed = match result.out_fact_mut(n) {
            Some(out) => analysis.transfer_node(n, &input, out),
            None => panic!("Bug! Dataflow node outside of the graph"),
        };
        result.set_in_fact(n, input);
        if changed {
            for s in graph.succs_of(n) {
                if *s != entry {
                    worklist.push(*s);
                }
            }
        }
    }
    result
}

fn solve_backward<G, A>(graph: &G, analysis: &mut A) -> DataflowResult<G::Node, A::Fact>
where
    G: Graph,
    A: DataflowAnalysis<G::Node>,
{
    let exit = graph.exit();
    let mut result = initialize(graph, analysis, exit);
    let mut worklist = NodeQueue::new(graph.nodes().into_iter().filter(|n| *n != exit));
    while let Some(n) = worklist.pop() {
        let Some(mut input) = result.out_fact(n).cloned() else {
            panic!("Bug! Dataflow node outside of the graph");
        };
        for s in graph.succs_of(n) {
            if let Some(in_fact) = result.in_fact(*s) {
                analysis.meet_into(in_fact, &mut input);
            }
        }
        let changed = match result.in_fact_mut(n) {
            Some(in_fact) => analysis.transfer_node(n, &input, in_fact),
            None => panic!("Bug! Dataflow node outside of the graph"),
        };
        result.set_out_fact(n, input);
        if changed {
            for p in graph.preds_of(n) {
                if *p != exit {
                    worklist.push(*p);
                }
            }
        }
    }
    result
}
