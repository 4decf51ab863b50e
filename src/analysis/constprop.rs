// SPDX-License-Identifier: BSD-3-Clause
//! Constant propagation over `int`-like variables
//!
//! [`ConstantPropagation`] analyzes a single method. Its interprocedural
//! counterpart [`InterConstantPropagation`] follows calls along the call
//! graph of a points-to analysis and uses the points-to sets to track values
//! stored in instance fields, static fields and array elements: a store
//! through `x` may be observed by any load through a variable aliasing `x`.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::cfg::{Cfg, Node};
use crate::dataflow::{
    self, DataflowAnalysis, DataflowResult, Icfg, IcfgEdge, IcfgEdgeKind, InterDataflowAnalysis,
};
use crate::heap::ObjId;
use crate::ir::stmt::{Binary, LoadArray, LoadField, StoreArray, StoreField};
use crate::ir::{BinaryOp, FieldId, MethodId, Program, Stmt, StmtId, VarId};
use crate::lattice::Value;
use crate::pta::PointerAnalysisResult;

/// Values of variables at one program point. Missing variables are `UNDEF`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpFact(BTreeMap<VarId, Value>);

impl CpFact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, v: VarId) -> Value {
        self.0.get(&v).copied().unwrap_or_default()
    }

    /// Returns whether the fact changed
    pub fn update(&mut self, v: VarId, value: Value) -> bool {
        if value.is_undef() {
            self.0.remove(&v).is_some()
        } else {
            self.0.insert(v, value) != Some(value)
        }
    }

    pub fn remove(&mut self, v: VarId) {
        self.0.remove(&v);
    }

    /// Bindings that are not `UNDEF`, ordered by variable
    pub fn iter(&self) -> impl Iterator<Item = (VarId, Value)> + '_ {
        self.0.iter().map(|(v, val)| (*v, *val))
    }

    pub fn meet_into(&self, target: &mut CpFact) {
        for (v, val) in self.iter() {
            let met = target.get(v).meet(val);
            target.update(v, met);
        }
    }
}

impl fmt::Display for CpFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (v, val)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", v, val)?;
        }
        write!(f, "}}")
    }
}

// ------------------------------------------------------------------
// Evaluation

fn is_int(program: &Program, v: VarId) -> bool {
    program.var(v).ty.can_hold_int()
}

/// Value of `op0 <op> op1` with Java `int` semantics
pub fn evaluate_binary(op: BinaryOp, v0: Value, v1: Value) -> Value {
    if op.may_fault() && v1.as_constant() == Some(0) {
        // Always throws, so never produces a value
        return Value::undef();
    }
    match (v0.as_constant(), v1.as_constant()) {
        (Some(a), Some(b)) => {
            // No `_` pattern to ensure this is updated if the type changes
            match op {
                BinaryOp::Add => Value::constant(a.wrapping_add(b)),
                BinaryOp::Sub => Value::constant(a.wrapping_sub(b)),
                BinaryOp::Mul => Value::constant(a.wrapping_mul(b)),
                BinaryOp::Div => Value::constant(a.wrapping_div(b)),
                BinaryOp::Rem => Value::constant(a.wrapping_rem(b)),
                BinaryOp::And => Value::constant(a & b),
                BinaryOp::Or => Value::constant(a | b),
                BinaryOp::Xor => Value::constant(a ^ b),
                // Shift distances are masked to five bits, as `wrapping_sh*` do
                BinaryOp::Shl => Value::constant(a.wrapping_shl(b as u32)),
                BinaryOp::Shr => Value::constant(a.wrapping_shr(b as u32)),
                BinaryOp::Ushr => Value::constant((a as u32).wrapping_shr(b as u32) as i32),
                BinaryOp::Eq => Value::from_bool(a == b),
                BinaryOp::Ne => Value::from_bool(a != b),
                BinaryOp::Lt => Value::from_bool(a < b),
                BinaryOp::Gt => Value::from_bool(a > b),
                BinaryOp::Le => Value::from_bool(a <= b),
                BinaryOp::Ge => Value::from_bool(a >= b),
            }
        }
        _ if v0.is_nac() || v1.is_nac() => Value::nac(),
        _ => Value::undef(),
    }
}

/// Value of the right-hand side of `stmt` under `fact`. Heap reads, calls,
/// allocations and casts are `NAC`.
pub fn evaluate(program: &Program, stmt: &Stmt, fact: &CpFact) -> Value {
    let read = |v: VarId| {
        if is_int(program, v) {
            fact.get(v)
        } else {
            Value::nac()
        }
    };
    match stmt {
        Stmt::Literal(l) => Value::constant(l.value),
        Stmt::Copy(c) => read(c.rhs),
        Stmt::Binary(Binary { op, op0, op1, .. }) => {
            if is_int(program, *op0) && is_int(program, *op1) {
                evaluate_binary(*op, fact.get(*op0), fact.get(*op1))
            } else {
                Value::nac()
            }
        }
        Stmt::New(_)
        | Stmt::Cast(_)
        | Stmt::LoadField(_)
        | Stmt::LoadArray(_)
        | Stmt::Invoke(_) => Value::nac(),
        Stmt::StoreField(_)
        | Stmt::StoreArray(_)
        | Stmt::If(_)
        | Stmt::Switch(_)
        | Stmt::Goto(_)
        | Stmt::Return(_)
        | Stmt::Nop => Value::undef(),
    }
}

/// Replace `output` with `new`, returning whether it changed
fn replace(output: &mut CpFact, new: CpFact) -> bool {
    if *output == new {
        false
    } else {
        *output = new;
        true
    }
}

fn boundary(program: &Program, method: MethodId) -> CpFact {
    let mut fact = CpFact::new();
    for p in program.method(method).params() {
        if is_int(program, *p) {
            fact.update(*p, Value::nac());
        }
    }
    fact
}

// ------------------------------------------------------------------
// Intraprocedural

#[derive(Debug)]
pub struct ConstantPropagation<'p> {
    program: &'p Program,
    method: MethodId,
}

impl<'p> ConstantPropagation<'p> {
    pub fn new(program: &'p Program, method: MethodId) -> Self {
        ConstantPropagation { program, method }
    }
}

impl DataflowAnalysis<Node> for ConstantPropagation<'_> {
    type Fact = CpFact;

    fn is_forward(&self) -> bool {
        true
    }

    fn new_boundary_fact(&self) -> CpFact {
        boundary(self.program, self.method)
    }

    fn new_initial_fact(&self) -> CpFact {
        CpFact::new()
    }

    fn meet_into(&self, fact: &CpFact, target: &mut CpFact) {
        fact.meet_into(target)
    }

    fn transfer_node(&mut self, node: Node, input: &CpFact, output: &mut CpFact) -> bool {
        let mut new = input.clone();
        if let Node::Stmt(s) = node {
            let stmt = self.program.stmt(s);
            if let Some(lhs) = stmt.def() {
                if is_int(self.program, lhs) {
                    new.update(lhs, evaluate(self.program, stmt, input));
                }
            }
        }
        replace(output, new)
    }
}

/// Constant propagation within `method`
pub fn constant_propagation(program: &Program, method: MethodId) -> DataflowResult<Node, CpFact> {
    let cfg = Cfg::new(program, method);
    dataflow::solve(&cfg, &mut ConstantPropagation::new(program, method))
}

// ------------------------------------------------------------------
// Interprocedural

#[derive(Debug)]
pub struct InterConstantPropagation<'p> {
    program: &'p Program,
    pta: &'p PointerAnalysisResult,
    /// Variables that may point to each object
    aliases: FxHashMap<ObjId, Vec<VarId>>,
    /// Reachable loads of each static field
    static_loads: FxHashMap<FieldId, Vec<StmtId>>,
    instance_values: FxHashMap<(ObjId, FieldId), Value>,
    static_values: FxHashMap<FieldId, Value>,
    /// Keyed by array object and index value
    array_values: FxHashMap<(ObjId, Value), Value>,
}

impl<'p> InterConstantPropagation<'p> {
    /// Key under which [`inter_constant_propagation`] results may be stored
    /// in a [`PointerAnalysisResult`]
    pub const ID: &'static str = "inter-constprop";

    pub fn new(program: &'p Program, pta: &'p PointerAnalysisResult) -> Self {
        let mut aliases: FxHashMap<ObjId, Vec<VarId>> = FxHashMap::default();
        for v in pta.vars() {
            for o in pta.points_to(v) {
                aliases.entry(o).or_default().push(v);
            }
        }
        let mut static_loads: FxHashMap<FieldId, Vec<StmtId>> = FxHashMap::default();
        for m in pta.ci_call_graph().reachable_methods() {
            for (idx, stmt) in program.method(*m).stmts().iter().enumerate() {
                if let Stmt::LoadField(LoadField { access, .. }) = stmt {
                    if access.is_static() {
                        static_loads
                            .entry(access.field)
                            .or_default()
                            .push(StmtId::new(*m, idx));
                    }
                }
            }
        }
        InterConstantPropagation {
            program,
            pta,
            aliases,
            static_loads,
            instance_values: FxHashMap::default(),
            static_values: FxHashMap::default(),
            array_values: FxHashMap::default(),
        }
    }

    fn is_int(&self, v: VarId) -> bool {
        is_int(self.program, v)
    }

    fn aliases_of(&self, o: ObjId) -> &[VarId] {
        self.aliases.get(&o).map(Vec::as_slice).unwrap_or_default()
    }

    fn load_value(&self, stmt: &Stmt, input: &CpFact) -> Option<Value> {
        match stmt {
            Stmt::LoadField(LoadField { access, .. }) => Some(match access.base {
                None => self
                    .static_values
                    .get(&access.field)
                    .copied()
                    .unwrap_or_default(),
                Some(base) => self
                    .pta
                    .points_to(base)
                    .into_iter()
                    .filter_map(|o| self.instance_values.get(&(o, access.field)))
                    .fold(Value::undef(), |acc, v| acc.meet(*v)),
            }),
            Stmt::LoadArray(LoadArray { base, index, .. }) => {
                let idx = input.get(*index);
                let pts = self.pta.points_to(*base);
                Some(
                    self.array_values
                        .iter()
                        .filter(|((o, i), _)| pts.contains(o) && i.may_alias_index(&idx))
                        .fold(Value::undef(), |acc, (_, v)| acc.meet(*v)),
                )
            }
            _ => None,
        }
    }

    /// Loads through any alias of `o` that read `field`
    fn field_loads(&self, o: ObjId, field: FieldId, out: &mut Vec<Node>) {
        for v in self.aliases_of(o) {
            for s in &self.program.var_uses(*v).load_fields {
                if let Stmt::LoadField(l) = self.program.stmt(*s) {
                    if l.access.field == field {
                        out.push(Node::Stmt(*s));
                    }
                }
            }
        }
    }

    fn array_loads(&self, o: ObjId, out: &mut Vec<Node>) {
        for v in self.aliases_of(o) {
            out.extend(self.program.var_uses(*v).load_arrays.iter().map(|s| Node::Stmt(*s)));
        }
    }
}

fn meet_at<K: Eq + std::hash::Hash>(map: &mut FxHashMap<K, Value>, key: K, value: Value) -> bool {
    let entry = map.entry(key).or_default();
    let met = entry.meet(value);
    if met == *entry {
        false
    } else {
        *entry = met;
        true
    }
}

impl InterDataflowAnalysis for InterConstantPropagation<'_> {
    type Fact = CpFact;

    fn new_boundary_fact(&self, entry: Node) -> CpFact {
        boundary(self.program, entry.method())
    }

    fn new_initial_fact(&self) -> CpFact {
        CpFact::new()
    }

    fn meet_into(&self, fact: &CpFact, target: &mut CpFact) {
        fact.meet_into(target)
    }

    fn transfer_node(&mut self, node: Node, input: &CpFact, output: &mut CpFact) -> bool {
        let mut new = input.clone();
        if let Node::Stmt(s) = node {
            let stmt = self.program.stmt(s);
            // Call nodes pass facts through; results arrive on return edges.
            if stmt.as_invoke().is_none() {
                if let Some(lhs) = stmt.def() {
                    if self.is_int(lhs) {
                        let value = match self.load_value(stmt, input) {
                            Some(v) => v,
                            None => evaluate(self.program, stmt, input),
                        };
                        new.update(lhs, value);
                    }
                }
            }
        }
        replace(output, new)
    }

    fn transfer_edge(&mut self, edge: &IcfgEdge, source_out: &CpFact) -> CpFact {
        match edge.kind {
            IcfgEdgeKind::Normal => source_out.clone(),
            IcfgEdgeKind::CallToReturn => {
                let mut fact = source_out.clone();
                if let Node::Stmt(s) = edge.source {
                    if let Some(lhs) = self.program.invoke(s).and_then(|i| i.lhs) {
                        fact.remove(lhs);
                    }
                }
                fact
            }
            IcfgEdgeKind::Call => {
                let mut fact = CpFact::new();
                let (Node::Stmt(s), Node::Entry(callee)) = (edge.source, edge.target) else {
                    panic!("Bug! Malformed call edge {} -> {}", edge.source, edge.target);
                };
                let Some(invoke) = self.program.invoke(s) else {
                    panic!("Bug! Call edge from non-call {}", s);
                };
                let params = self.program.method(callee).params();
                for (arg, param) in invoke.args.iter().zip(params) {
                    if self.is_int(*param) {
                        fact.update(*param, source_out.get(*arg));
                    }
                }
                fact
            }
            IcfgEdgeKind::Return { call_site } => {
                let mut fact = CpFact::new();
                let lhs = self.program.invoke(call_site).and_then(|i| i.lhs);
                if let Some(lhs) = lhs.filter(|l| self.is_int(*l)) {
                    let callee = edge.source.method();
                    let value = self
                        .program
                        .method(callee)
                        .return_vars
                        .iter()
                        .fold(Value::undef(), |acc, rv| acc.meet(source_out.get(*rv)));
                    fact.update(lhs, value);
                }
                fact
            }
        }
    }

    fn refine(&mut self, node: Node, input: &CpFact) -> Vec<Node> {
        let Node::Stmt(s) = node else {
            return Vec::new();
        };
        let program = self.program;
        let mut affected = Vec::new();
        match program.stmt(s) {
            Stmt::StoreField(StoreField { access, rhs }) if self.is_int(*rhs) => {
                let value = input.get(*rhs);
                match access.base {
                    None => {
                        if meet_at(&mut self.static_values, access.field, value) {
                            if let Some(loads) = self.static_loads.get(&access.field) {
                                affected.extend(loads.iter().map(|l| Node::Stmt(*l)));
                            }
                        }
                    }
                    Some(base) => {
                        for o in self.pta.points_to(base) {
                            if meet_at(&mut self.instance_values, (o, access.field), value) {
                                self.field_loads(o, access.field, &mut affected);
                            }
                        }
                    }
                }
            }
            Stmt::StoreArray(StoreArray { base, index, rhs }) if self.is_int(*rhs) => {
                let idx = input.get(*index);
                if !idx.is_undef() {
                    let value = input.get(*rhs);
                    for o in self.pta.points_to(*base) {
                        if meet_at(&mut self.array_values, (o, idx), value) {
                            self.array_loads(o, &mut affected);
                        }
                    }
                }
            }
            _ => (),
        }
        if !affected.is_empty() {
            trace!("Store at {} affects {} loads", s, affected.len());
        }
        affected
    }
}

/// Constant propagation over the methods reachable in `pta`'s call graph
pub fn inter_constant_propagation(
    program: &Program,
    pta: &PointerAnalysisResult,
) -> DataflowResult<Node, CpFact> {
    let icfg = Icfg::new(program, pta.ci_call_graph());
    dataflow::solve_inter(&icfg, &mut InterConstantPropagation::new(program, pta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::stmt::If;
    use crate::ir::{ProgramBuilder, Type};

    #[test]
    fn binary_ops() {
        let c = Value::constant;
        assert_eq!(c(7), evaluate_binary(BinaryOp::Add, c(3), c(4)));
        assert_eq!(c(i32::MIN), evaluate_binary(BinaryOp::Add, c(i32::MAX), c(1)));
        assert_eq!(c(-2), evaluate_binary(BinaryOp::Div, c(-7), c(3)));
        assert_eq!(c(-1), evaluate_binary(BinaryOp::Rem, c(-7), c(3)));
        assert_eq!(c(i32::MIN), evaluate_binary(BinaryOp::Div, c(i32::MIN), c(-1)));
        assert_eq!(c(2), evaluate_binary(BinaryOp::Shl, c(1), c(33)));
        assert_eq!(c(-1), evaluate_binary(BinaryOp::Shr, c(-1), c(4)));
        assert_eq!(c(0x0fff_ffff), evaluate_binary(BinaryOp::Ushr, c(-1), c(4)));
        assert_eq!(c(1), evaluate_binary(BinaryOp::Le, c(2), c(2)));
        assert_eq!(c(0), evaluate_binary(BinaryOp::Ne, c(2), c(2)));
    }

    #[test]
    fn binary_lattice() {
        let c = Value::constant;
        assert!(evaluate_binary(BinaryOp::Div, Value::nac(), c(0)).is_undef());
        assert!(evaluate_binary(BinaryOp::Rem, c(1), c(0)).is_undef());
        assert!(evaluate_binary(BinaryOp::Mul, Value::nac(), c(0)).is_nac());
        assert!(evaluate_binary(BinaryOp::Add, Value::undef(), Value::nac()).is_nac());
        assert!(evaluate_binary(BinaryOp::Add, Value::undef(), c(1)).is_undef());
    }

    #[test]
    fn branches_meet() {
        // p is a parameter: if (p == p) x = 1 else x = 2; y = 3; z = x + y
        let mut b = ProgramBuilder::new();
        let a = b.class("A");
        let main = b.static_method(a, "void main(int)", Type::Void);
        let p = b.param(main, "p", Type::Int);
        let x = b.var(main, "x", Type::Int);
        let y = b.var(main, "y", Type::Int);
        let z = b.var(main, "z", Type::Int);
        let w = b.var(main, "w", Type::Int);
        b.push(
            main,
            Stmt::If(If {
                op: BinaryOp::Eq,
                op0: p,
                op1: p,
                target: 3,
            }),
        );
        b.literal(main, x, 2);
        b.push(main, Stmt::Goto(crate::ir::stmt::Goto { target: 4 }));
        b.literal(main, x, 1);
        b.literal(main, y, 3);
        let sum = b.binary(main, z, BinaryOp::Add, y, y);
        let last = b.binary(main, w, BinaryOp::Add, x, p);
        let program = b.build(main).unwrap();

        let result = constant_propagation(&program, main);
        let at_sum = result.out_fact(Node::Stmt(sum)).unwrap();
        assert!(at_sum.get(x).is_nac());
        assert_eq!(Some(3), at_sum.get(y).as_constant());
        assert_eq!(Some(6), at_sum.get(z).as_constant());
        assert!(at_sum.get(p).is_nac());
        assert!(result.out_fact(Node::Stmt(last)).unwrap().get(w).is_nac());
        assert!(result.in_fact(Node::Stmt(StmtId::new(main, 1))).unwrap().get(x).is_undef());
    }
}
