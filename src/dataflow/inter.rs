// SPDX-License-Identifier: BSD-3-Clause
use tracing::{debug, trace_span};

use super::solver::NodeQueue;
use super::{DataflowResult, Icfg, InterDataflowAnalysis};
use crate::cfg::Node;

/// Worklist fixpoint of a forward interprocedural analysis.
///
/// The in-fact of a node accumulates the edge transfers of all of its
/// in-edges, so facts only grow. The entry nodes of the ICFG's entry methods
/// start from the boundary fact.
pub fn solve_inter<A>(icfg: &Icfg, analysis: &mut A) -> DataflowResult<Node, A::Fact>
where
    A: InterDataflowAnalysis,
{
    let span = trace_span!("dataflow_inter");
    let _span = span.enter();

    let mut result = DataflowResult::default();
    for n in icfg.nodes() {
        result.set_in_fact(*n, analysis.new_initial_fact());
        result.set_out_fact(*n, analysis.new_initial_fact());
    }
    for m in icfg.entry_methods() {
        let entry = Node::Entry(*m);
        result.set_in_fact(entry, analysis.new_boundary_fact(entry));
        result.set_out_fact(entry, analysis.new_boundary_fact(entry));
    }

    let mut worklist = NodeQueue::new(icfg.nodes().iter().copied());
    let mut steps = 0usize;
    while let Some(n) = worklist.pop() {
        steps += 1;
        let Some(mut input) = result.in_fact(n).cloned() else {
            panic!("Bug! Dataflow node outside of the ICFG");
        };
        for edge in icfg.in_edges_of(n) {
            if let Some(out) = result.out_fact(edge.source) {
                let flowing = analysis.transfer_edge(edge, out);
                analysis.meet_into(&flowing, &mut input);
            }
        }
        for other in analysis.refine(n, &input) {
            worklist.push(other);
        }
        let changed = match result.out_fact_mut(n) {
            Some(out) => analysis.transfer_node(n, &input, out),
            None => panic!("Bug! Dataflow node outside of the ICFG"),
        };
        result.set_in_fact(n, input);
        if changed {
            for s in icfg.succs_of(n) {
                worklist.push(*s);
            }
        }
    }
    debug!("Interprocedural fixpoint after {steps} node visits");
    result
}
