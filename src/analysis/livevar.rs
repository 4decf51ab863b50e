// SPDX-License-Identifier: BSD-3-Clause
//! Live variables: a variable is live at a point if some path from there
//! reads it before writing it.

use std::collections::BTreeSet;

use crate::cfg::{Cfg, Node};
use crate::dataflow::{self, DataflowAnalysis, DataflowResult};
use crate::ir::{MethodId, Program, VarId};

pub type LiveVars = BTreeSet<VarId>;

#[derive(Debug)]
pub struct LiveVariables<'p> {
    program: &'p Program,
}

impl<'p> LiveVariables<'p> {
    pub fn new(program: &'p Program) -> Self {
        LiveVariables { program }
    }
}

impl DataflowAnalysis<Node> for LiveVariables<'_> {
    type Fact = LiveVars;

    fn is_forward(&self) -> bool {
        false
    }

    fn new_boundary_fact(&self) -> LiveVars {
        LiveVars::new()
    }

    fn new_initial_fact(&self) -> LiveVars {
        LiveVars::new()
    }

    fn meet_into(&self, fact: &LiveVars, target: &mut LiveVars) {
        target.extend(fact.iter().copied());
    }

    /// `in = (out - def) + uses`
    fn transfer_node(&mut self, node: Node, out: &LiveVars, in_fact: &mut LiveVars) -> bool {
        let mut new = out.clone();
        if let Node::Stmt(s) = node {
            let stmt = self.program.stmt(s);
            if let Some(def) = stmt.def() {
                new.remove(&def);
            }
            new.extend(stmt.uses());
        }
        if new == *in_fact {
            false
        } else {
            *in_fact = new;
            true
        }
    }
}

pub fn live_variables(program: &Program, method: MethodId) -> DataflowResult<Node, LiveVars> {
    let cfg = Cfg::new(program, method);
    dataflow::solve(&cfg, &mut LiveVariables::new(program))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::stmt::{Goto, If};
    use crate::ir::{BinaryOp, ProgramBuilder, Stmt, StmtId, Type};

    #[test]
    fn loop_keeps_counter_live() {
        // 0: i = 0
        // 1: n = 10
        // 2: if (i >= n) goto 6
        // 3: one = 1
        // 4: i = i + one
        // 5: goto 2
        // 6: return
        let mut b = ProgramBuilder::new();
        let a = b.class("A");
        let main = b.static_method(a, "void main()", Type::Void);
        let i = b.var(main, "i", Type::Int);
        let n = b.var(main, "n", Type::Int);
        let one = b.var(main, "one", Type::Int);
        let dead = b.var(main, "dead", Type::Int);
        b.literal(main, i, 0);
        b.literal(main, n, 10);
        b.push(
            main,
            Stmt::If(If {
                op: BinaryOp::Ge,
                op0: i,
                op1: n,
                target: 6,
            }),
        );
        b.literal(main, one, 1);
        b.binary(main, i, BinaryOp::Add, i, one);
        b.push(main, Stmt::Goto(Goto { target: 2 }));
        b.ret(main, None);
        b.literal(main, dead, 5);
        let program = b.build(main).unwrap();

        let result = live_variables(&program, main);
        let at = |idx| StmtId::new(main, idx);
        let live_out = |idx| result.out_fact(Node::Stmt(at(idx))).unwrap().clone();
        let live_in = |idx| result.in_fact(Node::Stmt(at(idx))).unwrap().clone();

        assert_eq!(LiveVars::from([i]), live_out(0));
        assert_eq!(LiveVars::from([i, n]), live_out(1));
        assert_eq!(LiveVars::from([i, n]), live_in(2));
        assert_eq!(LiveVars::from([i, n, one]), live_out(3));
        assert_eq!(LiveVars::from([i, n]), live_out(4));
        assert!(live_in(6).is_empty());
        assert!(live_out(7).is_empty());
        assert!(!live_in(0).contains(&i));
    }
}
