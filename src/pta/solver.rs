// SPDX-License-Identifier: BSD-3-Clause
//! Inclusion-based points-to analysis with on-the-fly call graph
//! construction.
//!
//! Rules, for a statement in a method reachable under context `c`:
//!
//! - `x = new T`: `c:x` points to the object, under the heap context chosen
//!   by the selector.
//! - `x = y`, `x = (T) y`: `c:y -> c:x`.
//! - `x = C.f`, `C.f = y`: `C.f -> c:x`, `c:y -> C.f`.
//! - `x = C.m(...)`: an edge to the declared target, see below.
//!
//! Instance field and array accesses and instance calls depend on what their
//! base or receiver points to, so they are wired when an object `o` first
//! reaches `c:x`:
//!
//! - `x.f = y`, `y = x.f`: `c:y -> o.f`, `o.f -> c:y`.
//! - `x[i] = y`, `y = x[i]`: `c:y -> o[*]`, `o[*] -> c:y`.
//! - `r = x.m(...)`: dispatch on the class of `o`, bind `this` of the target
//!   to `o` and add a call edge.
//!
//! A new call edge makes the callee reachable and connects arguments to
//! parameters and return variables to the result.

use tracing::{debug, trace, trace_span};

use super::{
    CSCallSite, CSManager, CSMethod, ContextId, ContextSelector, Pointer, PointerFlowGraph,
    PointerId, PointsToSet, Receiver, WorkList,
};
use super::{Order, PointerAnalysisResult};
use crate::analysis::pointer::Metrics;
use crate::callgraph::{CallGraph, Edge};
use crate::heap::{Obj, ObjId};
use crate::ir::stmt::{LoadArray, LoadField, StoreArray, StoreField};
use crate::ir::{CallKind, Invoke, Program, Stmt, StmtId, Type, VarId};

/// Context-sensitive call graph
pub type CSCallGraph = CallGraph<CSCallSite, CSMethod>;

#[derive(Debug)]
pub struct Solver<'p, S> {
    program: &'p Program,
    selector: S,
    manager: CSManager,
    pfg: PointerFlowGraph,
    worklist: WorkList,
    call_graph: CSCallGraph,
    empty_ctx: ContextId,
    initialized: bool,
}

impl<'p, S: ContextSelector> Solver<'p, S> {
    pub fn new(program: &'p Program, selector: S, order: Order) -> Self {
        let mut manager = CSManager::new();
        let empty_ctx = manager.context_id(selector.empty_context());
        Solver {
            program,
            selector,
            manager,
            pfg: PointerFlowGraph::new(),
            worklist: WorkList::new(order),
            call_graph: CallGraph::new(),
            empty_ctx,
            initialized: false,
        }
    }

    /// Run to the fixpoint.
    pub fn solve(&mut self) {
        let span = trace_span!("solve");
        let _span = span.enter();
        self.initialize();
        while self.step() {}
        debug!(
            reachable = self.call_graph.reachable_methods().len(),
            call_edges = self.call_graph.num_edges(),
            pointers = self.manager.num_pointers(),
            pfg_edges = self.pfg.num_edges(),
            objects = self.manager.num_objects(),
            contexts = self.manager.num_contexts(),
            "reached fixpoint"
        );
    }

    /// Make the entry method reachable under the empty context. Idempotent.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        let span = trace_span!("initialize");
        let _span = span.enter();
        let entry = (self.empty_ctx, self.program.entry());
        self.call_graph.add_entry_method(entry);
        self.add_reachable(entry);
    }

    /// Process one worklist entry. Returns `false` once the fixpoint is
    /// reached.
    pub fn step(&mut self) -> bool {
        let Some((p, delta)) = self.worklist.pop() else {
            return false;
        };
        let diff = self.propagate(p, &delta);
        if diff.is_empty() {
            return true;
        }
        if let Pointer::Var(ctx, var) = self.manager.pointer_kind(p) {
            for o in diff.iter() {
                self.process_instance_stores(ctx, var, o);
                self.process_instance_loads(ctx, var, o);
                self.process_array_stores(ctx, var, o);
                self.process_array_loads(ctx, var, o);
                self.process_calls(ctx, var, o);
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Propagation

    /// Add `delta` to the points-to set of `p`, and forward the objects that
    /// were actually new along the outgoing edges of `p`.
    fn propagate(&mut self, p: PointerId, delta: &PointsToSet) -> PointsToSet {
        let diff = self.manager.points_to_mut(p).add_all_diff(delta);
        if !diff.is_empty() {
            for succ in self.pfg.succs_of(p) {
                self.worklist.push(*succ, diff.clone());
            }
        }
        diff
    }

    /// Add `source -> target`. A new edge carries everything `source`
    /// already points to.
    pub fn add_pfg_edge(&mut self, source: PointerId, target: PointerId) {
        if self.pfg.add_edge(source, target) {
            let pts = self.manager.points_to(source);
            if !pts.is_empty() {
                let pts = pts.clone();
                self.worklist.push(target, pts);
            }
        }
    }

    // ------------------------------------------------------------------
    // Reachability

    fn add_reachable(&mut self, csm: CSMethod) {
        if !self.call_graph.add_reachable_method(csm) {
            return;
        }
        let (ctx, m) = csm;
        trace!(method = %self.program.method_name(m), context = %ctx, "reachable");
        let program = self.program;
        for (idx, s) in program.method(m).stmts().iter().enumerate() {
            let site = StmtId::new(m, idx);
            match s {
                Stmt::New(n) => {
                    let obj = self.new_obj(ctx, site, n.ty.clone());
                    let lhs = self.manager.var_ptr(ctx, n.lhs);
                    self.worklist.push(lhs, PointsToSet::singleton(obj));
                }
                Stmt::Copy(c) => self.add_var_edge(ctx, c.rhs, c.lhs),
                Stmt::Cast(c) => self.add_var_edge(ctx, c.rhs, c.lhs),
                Stmt::LoadField(LoadField { lhs, access }) if access.is_static() => {
                    let field = self.manager.static_field_ptr(access.field);
                    let lhs = self.manager.var_ptr(ctx, *lhs);
                    self.add_pfg_edge(field, lhs);
                }
                Stmt::StoreField(StoreField { access, rhs }) if access.is_static() => {
                    let rhs = self.manager.var_ptr(ctx, *rhs);
                    let field = self.manager.static_field_ptr(access.field);
                    self.add_pfg_edge(rhs, field);
                }
                Stmt::Invoke(i) if i.is_static() => {
                    let Some(callee) = program.hierarchy().resolve_callee(None, i) else {
                        panic!("Bug! Unresolved static call at {}", site);
                    };
                    let callee_ctx = self.selector.select_context(
                        self.manager.context(ctx),
                        site,
                        callee,
                    );
                    let callee_ctx = self.manager.context_id(callee_ctx);
                    self.process_call_edge(Edge {
                        kind: CallKind::Static,
                        call_site: (ctx, site),
                        callee: (callee_ctx, callee),
                    });
                }
                // Wired once their base or receiver points to something
                Stmt::LoadField(_)
                | Stmt::StoreField(_)
                | Stmt::LoadArray(_)
                | Stmt::StoreArray(_)
                | Stmt::Invoke(_) => (),
                // No `_` pattern to ensure this is updated if the type changes
                Stmt::Literal(_) => (),
                Stmt::Binary(_) => (),
                Stmt::If(_) => (),
                Stmt::Switch(_) => (),
                Stmt::Goto(_) => (),
                Stmt::Return(_) => (),
                Stmt::Nop => (),
            }
        }
    }

    fn new_obj(&mut self, method_ctx: ContextId, site: StmtId, ty: Type) -> ObjId {
        let heap_ctx = self
            .selector
            .select_heap_context(self.manager.context(method_ctx), site.method);
        let context = self.manager.context_id(heap_ctx);
        let container = self.program.method(site.method).class();
        self.manager.obj_id(Obj {
            site,
            ty,
            container,
            context,
        })
    }

    fn add_var_edge(&mut self, ctx: ContextId, from: VarId, to: VarId) {
        let from = self.manager.var_ptr(ctx, from);
        let to = self.manager.var_ptr(ctx, to);
        self.add_pfg_edge(from, to);
    }

    fn process_call_edge(&mut self, edge: Edge<CSCallSite, CSMethod>) {
        if !self.call_graph.add_edge(edge) {
            return;
        }
        let (caller_ctx, site) = edge.call_site;
        let (callee_ctx, callee) = edge.callee;
        trace!(
            call_site = %site,
            callee = %self.program.method_name(callee),
            kind = %edge.kind,
            "call edge"
        );
        self.add_reachable(edge.callee);

        let program = self.program;
        let Some(invoke) = program.invoke(site) else {
            panic!("Bug! Call edge from a non-call statement: {}", site);
        };
        let callee_method = program.method(callee);
        for (arg, param) in invoke.args.iter().zip(callee_method.params()) {
            let arg = self.manager.var_ptr(caller_ctx, *arg);
            let param = self.manager.var_ptr(callee_ctx, *param);
            self.add_pfg_edge(arg, param);
        }
        if let Some(lhs) = invoke.lhs {
            let lhs = self.manager.var_ptr(caller_ctx, lhs);
            for ret in &callee_method.return_vars {
                let ret = self.manager.var_ptr(callee_ctx, *ret);
                self.add_pfg_edge(ret, lhs);
            }
        }
    }

    // ------------------------------------------------------------------
    // Reactions to new objects

    fn process_instance_stores(&mut self, ctx: ContextId, var: VarId, o: ObjId) {
        let program = self.program;
        for s in &program.var_uses(var).store_fields {
            if let Stmt::StoreField(StoreField { access, rhs }) = program.stmt(*s) {
                let rhs = self.manager.var_ptr(ctx, *rhs);
                let field = self.manager.instance_field_ptr(o, access.field);
                self.add_pfg_edge(rhs, field);
            }
        }
    }

    fn process_instance_loads(&mut self, ctx: ContextId, var: VarId, o: ObjId) {
        let program = self.program;
        for s in &program.var_uses(var).load_fields {
            if let Stmt::LoadField(LoadField { lhs, access }) = program.stmt(*s) {
                let field = self.manager.instance_field_ptr(o, access.field);
                let lhs = self.manager.var_ptr(ctx, *lhs);
                self.add_pfg_edge(field, lhs);
            }
        }
    }

    fn process_array_stores(&mut self, ctx: ContextId, var: VarId, o: ObjId) {
        let program = self.program;
        for s in &program.var_uses(var).store_arrays {
            if let Stmt::StoreArray(StoreArray { rhs, .. }) = program.stmt(*s) {
                let rhs = self.manager.var_ptr(ctx, *rhs);
                let elems = self.manager.array_ptr(o);
                self.add_pfg_edge(rhs, elems);
            }
        }
    }

    fn process_array_loads(&mut self, ctx: ContextId, var: VarId, o: ObjId) {
        let program = self.program;
        for s in &program.var_uses(var).load_arrays {
            if let Stmt::LoadArray(LoadArray { lhs, .. }) = program.stmt(*s) {
                let elems = self.manager.array_ptr(o);
                let lhs = self.manager.var_ptr(ctx, *lhs);
                self.add_pfg_edge(elems, lhs);
            }
        }
    }

    fn process_calls(&mut self, ctx: ContextId, var: VarId, o: ObjId) {
        let program = self.program;
        for site in &program.var_uses(var).invokes {
            let Some(invoke) = program.invoke(*site) else {
                continue;
            };
            self.process_call(ctx, *site, invoke, o);
        }
    }

    fn process_call(&mut self, ctx: ContextId, site: StmtId, invoke: &Invoke, o: ObjId) {
        let program = self.program;
        let obj = self.manager.obj(o);
        let Some(callee) = program.hierarchy().resolve_callee(obj.class(), invoke) else {
            return;
        };
        let callee_ctx = self.selector.select_receiver_context(
            self.manager.context(ctx),
            site,
            Receiver {
                id: o,
                obj,
                context: self.manager.context(obj.context),
            },
            callee,
        );
        let callee_ctx = self.manager.context_id(callee_ctx);
        if let Some(this) = program.method(callee).this() {
            let this = self.manager.var_ptr(callee_ctx, this);
            self.worklist.push(this, PointsToSet::singleton(o));
        }
        self.process_call_edge(Edge {
            kind: invoke.kind,
            call_site: (ctx, site),
            callee: (callee_ctx, callee),
        });
    }

    // ------------------------------------------------------------------
    // Queries, valid at any point of the run

    pub fn manager(&self) -> &CSManager {
        &self.manager
    }

    pub fn pfg(&self) -> &PointerFlowGraph {
        &self.pfg
    }

    pub fn call_graph(&self) -> &CSCallGraph {
        &self.call_graph
    }

    /// Objects `var` points to, under any context
    pub fn points_to(&self, var: VarId) -> PointsToSet {
        let mut pts = PointsToSet::new();
        for (id, p) in self.manager.pointers() {
            if matches!(p, Pointer::Var(_, v) if v == var) {
                pts.extend(self.manager.points_to(id));
            }
        }
        pts
    }

    // ------------------------------------------------------------------
    // Finishing

    /// Check invariants of the fixpoint, panicking on violation.
    pub fn check_assertions(&self) {
        let span = trace_span!("check_assertions");
        let _span = span.enter();
        assert!(self.worklist.is_empty(), "Bug! Checking before fixpoint");
        for (s, t) in self.pfg.edges() {
            if !self.manager.points_to(s).is_subset(self.manager.points_to(t)) {
                panic!(
                    "Bug! Points-to set of {} not included in that of its successor {}",
                    self.manager.pointer_kind(s),
                    self.manager.pointer_kind(t)
                );
            }
        }
        let program = self.program;
        for (ctx, m) in self.call_graph.reachable_methods() {
            for site in &program.method(*m).call_sites {
                let Some(invoke) = program.invoke(*site) else {
                    continue;
                };
                let Some(recv) = invoke.receiver else {
                    continue;
                };
                let Some(p) = self.manager.lookup_pointer(&Pointer::Var(*ctx, recv)) else {
                    continue;
                };
                for o in self.manager.points_to(p).iter() {
                    let class = self.manager.obj(o).class();
                    if let Some(target) = program.hierarchy().resolve_callee(class, invoke) {
                        let found = self
                            .call_graph
                            .callees_of((*ctx, *site))
                            .iter()
                            .any(|(_, callee)| *callee == target);
                        if !found {
                            panic!(
                                "Bug! Missing call edge from {} to {}",
                                site,
                                program.method_name(target)
                            );
                        }
                    }
                }
            }
        }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            reachable_methods: self.call_graph.reachable_methods().len(),
            call_graph_edges: self.call_graph.num_edges(),
            pointers: self.manager.num_pointers(),
            pfg_edges: self.pfg.num_edges(),
            objects: self.manager.num_objects(),
            contexts: self.manager.num_contexts(),
            points_to_facts: self
                .manager
                .pointers()
                .map(|(id, _)| self.manager.points_to(id).len())
                .sum(),
        }
    }

    pub fn finish(self, metrics: Option<Metrics>) -> PointerAnalysisResult {
        PointerAnalysisResult::new(self.manager, self.call_graph, metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ProgramBuilder, Type};
    use crate::pta::Insensitive;

    #[test]
    fn new_edges_carry_existing_objects() {
        let mut b = ProgramBuilder::new();
        let a = b.class("A");
        let main = b.static_method(a, "void main()", Type::Void);
        let x = b.var(main, "x", Type::Class(a));
        let y = b.var(main, "y", Type::Class(a));
        b.alloc(main, x, Type::Class(a));
        let program = b.build(main).unwrap();

        let mut solver = Solver::new(&program, Insensitive, Order::Fifo);
        solver.solve();
        assert_eq!(1, solver.points_to(x).len());
        assert!(solver.points_to(y).is_empty());

        let ctx = solver.empty_ctx;
        let px = solver.manager.var_ptr(ctx, x);
        let py = solver.manager.var_ptr(ctx, y);
        solver.add_pfg_edge(px, py);
        solver.add_pfg_edge(px, py);
        assert_eq!(1, solver.pfg().num_edges());
        solver.solve();
        assert_eq!(solver.points_to(x), solver.points_to(y));
        solver.check_assertions();
    }
}
