// SPDX-License-Identifier: BSD-3-Clause
//! Interprocedural control-flow graph
//!
//! The CFGs of all reachable methods, connected at call sites:
//!
//! - a *call* edge from each call site to the entry of each callee,
//! - a *return* edge from the exit of each callee to each successor (return
//!   site) of the call site,
//! - a *call-to-return* edge from the call site to each return site, which
//!   carries the caller's local facts around the call.
//!
//! All other edges are *normal* intraprocedural edges.

use rustc_hash::FxHashMap;

use crate::callgraph::CallGraph;
use crate::cfg::{Cfg, Graph, Node};
use crate::ir::{MethodId, Program, StmtId};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum IcfgEdgeKind {
    Normal,
    CallToReturn,
    Call,
    Return {
        call_site: StmtId,
    },
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct IcfgEdge {
    pub kind: IcfgEdgeKind,
    pub source: Node,
    pub target: Node,
}

#[derive(Debug)]
pub struct Icfg {
    entry_methods: Vec<MethodId>,
    nodes: Vec<Node>,
    in_edges: FxHashMap<Node, Vec<IcfgEdge>>,
    out_edges: FxHashMap<Node, Vec<IcfgEdge>>,
    succs: FxHashMap<Node, Vec<Node>>,
}

impl Icfg {
    pub fn new(program: &Program, call_graph: &CallGraph<StmtId, MethodId>) -> Self {
        let mut icfg = Icfg {
            entry_methods: call_graph.entry_methods().to_vec(),
            nodes: Vec::new(),
            in_edges: FxHashMap::default(),
            out_edges: FxHashMap::default(),
            succs: FxHashMap::default(),
        };
        for m in call_graph.reachable_methods() {
            let cfg = Cfg::new(program, *m);
            for n in cfg.nodes() {
                icfg.nodes.push(n);
                let call_site = match n {
                    Node::Stmt(s) if program.invoke(s).is_some() => Some(s),
                    _ => None,
                };
                for succ in cfg.succs_of(n) {
                    let kind = if call_site.is_some() {
                        IcfgEdgeKind::CallToReturn
                    } else {
                        IcfgEdgeKind::Normal
                    };
                    icfg.add_edge(kind, n, *succ);
                }
                if let Some(site) = call_site {
                    for callee in call_graph.callees_of(site) {
                        icfg.add_edge(IcfgEdgeKind::Call, n, Node::Entry(*callee));
                        for ret in cfg.succs_of(n) {
                            icfg.add_edge(
                                IcfgEdgeKind::Return { call_site: site },
                                Node::Exit(*callee),
                                *ret,
                            );
                        }
                    }
                }
            }
        }
        icfg
    }

    fn add_edge(&mut self, kind: IcfgEdgeKind, source: Node, target: Node) {
        let edge = IcfgEdge {
            kind,
            source,
            target,
        };
        let outs = self.out_edges.entry(source).or_default();
        if outs.contains(&edge) {
            return;
        }
        outs.push(edge);
        self.in_edges.entry(target).or_default().push(edge);
        let succs = self.succs.entry(source).or_default();
        if !succs.contains(&target) {
            succs.push(target);
        }
    }

    pub fn entry_methods(&self) -> &[MethodId] {
        &self.entry_methods
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn in_edges_of(&self, n: Node) -> &[IcfgEdge] {
        self.in_edges.get(&n).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn out_edges_of(&self, n: Node) -> &[IcfgEdge] {
        self.out_edges.get(&n).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn succs_of(&self, n: Node) -> &[Node] {
        self.succs.get(&n).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::callgraph::cha;
    use crate::ir::{CallKind, ProgramBuilder, Type};

    #[test]
    fn calls_are_connected() {
        let mut b = ProgramBuilder::new();
        let a = b.class("A");
        let main = b.static_method(a, "void main()", Type::Void);
        let id = b.static_method(a, "int id(int)", Type::Int);
        let p = b.param(id, "p", Type::Int);
        b.ret(id, Some(p));
        let x = b.var(main, "x", Type::Int);
        b.literal(main, x, 1);
        let call = b.call(main, CallKind::Static, Some(x), None, id, vec![x]);
        let ret = b.ret(main, None);
        let program = b.build(main).unwrap();

        let cg = cha(&program);
        let icfg = Icfg::new(&program, &cg);
        let kinds: Vec<_> = icfg
            .out_edges_of(Node::Stmt(call))
            .iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(vec![IcfgEdgeKind::CallToReturn, IcfgEdgeKind::Call], kinds);
        assert_eq!(
            &[IcfgEdge {
                kind: IcfgEdgeKind::Return { call_site: call },
                source: Node::Exit(id),
                target: Node::Stmt(ret),
            }],
            icfg.out_edges_of(Node::Exit(id))
        );
        assert_eq!(2, icfg.in_edges_of(Node::Stmt(ret)).len());
        assert_eq!(&[main], icfg.entry_methods());
    }
}
