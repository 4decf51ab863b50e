// SPDX-License-Identifier: BSD-3-Clause
//! Call graph construction by class-hierarchy analysis
//!
//! Every virtual call may reach every override in the subtree of its declared
//! class, whether or not an object of that type is ever allocated. This is
//! much coarser than the call graph of the points-to analysis, but needs no
//! fixpoint.

use std::collections::VecDeque;

use tracing::{debug, trace, trace_span};

use crate::callgraph::{CallGraph, Edge};
use crate::ir::{MethodId, Program, StmtId};

pub fn cha(program: &Program) -> CallGraph<StmtId, MethodId> {
    let span = trace_span!("cha");
    let _span = span.enter();

    let mut cg = CallGraph::new();
    let entry = program.entry();
    cg.add_entry_method(entry);
    let mut queue = VecDeque::from([entry]);
    while let Some(m) = queue.pop_front() {
        if !cg.add_reachable_method(m) {
            continue;
        }
        trace!("Reachable: {}", program.method_name(m));
        for site in &program.method(m).call_sites {
            let Some(invoke) = program.invoke(*site) else {
                panic!("Bug! Call site {} is not an invocation", site);
            };
            let mut targets: Vec<_> = program
                .hierarchy()
                .resolve_cha(invoke)
                .into_iter()
                .collect();
            // Deterministic edge order
            targets.sort();
            for callee in targets {
                cg.add_edge(Edge {
                    kind: invoke.kind,
                    call_site: *site,
                    callee,
                });
                if !cg.contains(callee) {
                    queue.push_back(callee);
                }
            }
        }
    }
    debug!(
        reachable = cg.reachable_methods().len(),
        edges = cg.num_edges(),
        "built CHA call graph"
    );
    cg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CallKind, ProgramBuilder, Type};

    #[test]
    fn virtual_call_reaches_all_overrides() {
        let mut b = ProgramBuilder::new();
        let main_class = b.class("Main");
        let a = b.class("A");
        let sub1 = b.subclass("B", a);
        let sub2 = b.subclass("C", a);
        let am = b.method(a, "void m()", Type::Void);
        let bm = b.method(sub1, "void m()", Type::Void);
        let cm = b.method(sub2, "void m()", Type::Void);
        let unused = b.static_method(main_class, "void unused()", Type::Void);

        let main = b.static_method(main_class, "void main(A)", Type::Void);
        let x = b.param(main, "x", Type::Class(a));
        let call = b.call(main, CallKind::Virtual, None, Some(x), am, vec![]);
        let program = b.build(main).unwrap();

        let cg = cha(&program);
        assert_eq!(&[am, bm, cm], cg.callees_of(call));
        assert!(cg.contains(bm));
        assert!(!cg.contains(unused));
        assert_eq!(4, cg.reachable_methods().len());
        assert_eq!(&[call], cg.callers_of(cm));
    }

    #[test]
    fn recursion_terminates() {
        let mut b = ProgramBuilder::new();
        let a = b.class("A");
        let main = b.static_method(a, "void main()", Type::Void);
        let call = b.call(main, CallKind::Static, None, None, main, vec![]);
        let program = b.build(main).unwrap();

        let cg = cha(&program);
        assert_eq!(&[main], cg.reachable_methods());
        assert_eq!(&[main], cg.callees_of(call));
        assert_eq!(1, cg.num_edges());
    }
}
