// SPDX-License-Identifier: BSD-3-Clause
//! Intraprocedural control-flow graphs.
//!
//! Nodes are the statements of one method plus a synthetic entry and exit.
//! `return` statements flow to the exit.

use std::fmt::Display;

use rustc_hash::FxHashMap;

use crate::ir::{MethodId, Program, Stmt, StmtId};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Node {
    Entry(MethodId),
    Stmt(StmtId),
    Exit(MethodId),
}

impl Node {
    pub fn method(self) -> MethodId {
        match self {
            Node::Entry(m) | Node::Exit(m) => m,
            Node::Stmt(s) => s.method,
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Entry(m) => write!(f, "{}[entry]", m),
            Node::Stmt(s) => write!(f, "{}", s),
            Node::Exit(m) => write!(f, "{}[exit]", m),
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum EdgeKind {
    Entry,
    FallThrough,
    Goto,
    IfTrue,
    IfFalse,
    SwitchCase(i32),
    SwitchDefault,
    Return,
}

/// A directed graph with designated entry and exit nodes, as consumed by
/// the dataflow solvers
pub trait Graph {
    type Node: Copy + Eq + std::hash::Hash;

    fn nodes(&self) -> Vec<Self::Node>;
    fn entry(&self) -> Self::Node;
    fn exit(&self) -> Self::Node;
    fn preds_of(&self, n: Self::Node) -> &[Self::Node];
    fn succs_of(&self, n: Self::Node) -> &[Self::Node];
}

#[derive(Debug)]
pub struct Cfg {
    method: MethodId,
    nodes: Vec<Node>,
    edges: Vec<(EdgeKind, Node, Node)>,
    preds: FxHashMap<Node, Vec<Node>>,
    succs: FxHashMap<Node, Vec<Node>>,
}

impl Cfg {
    pub fn new(program: &Program, method: MethodId) -> Self {
        let stmts = program.method(method).stmts();
        let node = |i: usize| {
            if i < stmts.len() {
                Node::Stmt(StmtId::new(method, i))
            } else {
                Node::Exit(method)
            }
        };

        let mut nodes = Vec::with_capacity(stmts.len() + 2);
        nodes.push(Node::Entry(method));
        nodes.extend((0..stmts.len()).map(node));
        nodes.push(Node::Exit(method));

        let mut edges = vec![(EdgeKind::Entry, Node::Entry(method), node(0))];
        for (i, s) in stmts.iter().enumerate() {
            let src = node(i);
            match s {
                Stmt::Goto(g) => edges.push((EdgeKind::Goto, src, node(g.target))),
                Stmt::If(c) => {
                    edges.push((EdgeKind::IfTrue, src, node(c.target)));
                    edges.push((EdgeKind::IfFalse, src, node(i + 1)));
                }
                Stmt::Switch(sw) => {
                    for (value, target) in &sw.cases {
                        edges.push((EdgeKind::SwitchCase(*value), src, node(*target)));
                    }
                    edges.push((EdgeKind::SwitchDefault, src, node(sw.default)));
                }
                Stmt::Return(_) => edges.push((EdgeKind::Return, src, Node::Exit(method))),
                _ => {
                    debug_assert!(s.falls_through());
                    edges.push((EdgeKind::FallThrough, src, node(i + 1)));
                }
            }
        }

        let mut preds: FxHashMap<Node, Vec<Node>> = FxHashMap::default();
        let mut succs: FxHashMap<Node, Vec<Node>> = FxHashMap::default();
        for (_, src, dst) in &edges {
            let ss = succs.entry(*src).or_default();
            if !ss.contains(dst) {
                ss.push(*dst);
                preds.entry(*dst).or_default().push(*src);
            }
        }

        Cfg {
            method,
            nodes,
            edges,
            preds,
            succs,
        }
    }

    #[inline]
    pub fn method(&self) -> MethodId {
        self.method
    }

    /// All edges with their kinds, including parallel ones (e.g., an `if`
    /// whose target is the next statement)
    pub fn edges(&self) -> &[(EdgeKind, Node, Node)] {
        &self.edges
    }
}

impl Graph for Cfg {
    type Node = Node;

    fn nodes(&self) -> Vec<Node> {
        self.nodes.clone()
    }

    fn entry(&self) -> Node {
        Node::Entry(self.method)
    }

    fn exit(&self) -> Node {
        Node::Exit(self.method)
    }

    fn preds_of(&self, n: Node) -> &[Node] {
        self.preds.get(&n).map(Vec::as_slice).unwrap_or_default()
    }

    fn succs_of(&self, n: Node) -> &[Node] {
        self.succs.get(&n).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::stmt::{BinaryOp, Goto, If};
    use crate::ir::{ProgramBuilder, Type};

    #[test]
    fn branches() {
        let mut b = ProgramBuilder::new();
        let a = b.class("A");
        let main = b.static_method(a, "void main()", Type::Void);
        let x = b.var(main, "x", Type::Int);
        b.literal(main, x, 0); // 0
        b.push(
            main,
            Stmt::If(If {
                op: BinaryOp::Eq,
                op0: x,
                op1: x,
                target: 4,
            }),
        ); // 1
        b.literal(main, x, 1); // 2
        b.push(main, Stmt::Goto(Goto { target: 5 })); // 3
        b.literal(main, x, 2); // 4
        b.ret(main, None); // 5
        let program = b.build(main).unwrap();
        let cfg = Cfg::new(&program, main);

        let s = |i| Node::Stmt(StmtId::new(main, i));
        assert_eq!(&[s(0)], cfg.succs_of(Node::Entry(main)));
        assert_eq!(&[s(4), s(2)], cfg.succs_of(s(1)));
        assert_eq!(&[s(5)], cfg.succs_of(s(3)));
        assert_eq!(&[s(3), s(4)], cfg.preds_of(s(5)));
        assert_eq!(&[s(5)], cfg.preds_of(Node::Exit(main)));
        assert!(cfg.succs_of(Node::Exit(main)).is_empty());
        assert_eq!(8, cfg.nodes().len());
    }

    #[test]
    fn empty_body() {
        let mut b = ProgramBuilder::new();
        let a = b.class("A");
        let main = b.static_method(a, "void main()", Type::Void);
        let program = b.build(main).unwrap();
        let cfg = Cfg::new(&program, main);
        assert_eq!(&[Node::Exit(main)], cfg.succs_of(Node::Entry(main)));
    }
}
