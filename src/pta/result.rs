// SPDX-License-Identifier: BSD-3-Clause
//! Read-only view of a finished points-to analysis.

use std::any::Any;
use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use super::{CSCallGraph, CSManager, Context, ContextId, Pointer, PointsToSet};
use crate::analysis::pointer::Metrics;
use crate::callgraph::CallGraph;
use crate::heap::{Obj, ObjId};
use crate::ir::{FieldId, MethodId, StmtId, VarId};

pub struct PointerAnalysisResult {
    contexts: Vec<Context>,
    objects: Vec<Obj>,
    pointers: Vec<Pointer>,
    pointer_ids: FxHashMap<Pointer, usize>,
    points_to: Vec<PointsToSet>,
    /// Pointers of each variable, one per context
    var_pointers: FxHashMap<VarId, Vec<usize>>,
    call_graph: CSCallGraph,
    ci_call_graph: CallGraph<StmtId, MethodId>,
    results: FxHashMap<String, Box<dyn Any>>,
    metrics: Option<Metrics>,
}

impl std::fmt::Debug for PointerAnalysisResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerAnalysisResult")
            .field("contexts", &self.contexts.len())
            .field("objects", &self.objects)
            .field("pointers", &self.points_to.len())
            .field("call_graph_edges", &self.call_graph.num_edges())
            .field("results", &self.results.keys().collect::<Vec<_>>())
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl PointerAnalysisResult {
    pub(crate) fn new(
        manager: CSManager,
        call_graph: CSCallGraph,
        metrics: Option<Metrics>,
    ) -> Self {
        let (contexts, objects, pointers, points_to) = manager.into_parts();
        let mut pointer_ids = FxHashMap::default();
        let mut var_pointers: FxHashMap<VarId, Vec<usize>> = FxHashMap::default();
        for (idx, p) in pointers.iter().enumerate() {
            if let Pointer::Var(_, v) = p {
                var_pointers.entry(*v).or_default().push(idx);
            }
            pointer_ids.insert(*p, idx);
        }
        let ci_call_graph = call_graph.project(|(_, site)| site, |(_, m)| m);
        PointerAnalysisResult {
            contexts,
            objects,
            pointers,
            pointer_ids,
            points_to,
            var_pointers,
            call_graph,
            ci_call_graph,
            results: FxHashMap::default(),
            metrics,
        }
    }

    // ------------------------------------------------------------------
    // Call graphs

    /// Context-sensitive call graph
    pub fn call_graph(&self) -> &CSCallGraph {
        &self.call_graph
    }

    /// The call graph with contexts projected away
    pub fn ci_call_graph(&self) -> &CallGraph<StmtId, MethodId> {
        &self.ci_call_graph
    }

    // ------------------------------------------------------------------
    // Points-to sets

    fn sorted(&self, p: &Pointer) -> BTreeSet<ObjId> {
        self.pointer_ids
            .get(p)
            .map(|idx| self.points_to[*idx].iter().collect())
            .unwrap_or_default()
    }

    /// Objects `var` may point to, under any context
    pub fn points_to(&self, var: VarId) -> BTreeSet<ObjId> {
        let mut pts = BTreeSet::new();
        for idx in self.var_pointers.get(&var).into_iter().flatten() {
            pts.extend(self.points_to[*idx].iter());
        }
        pts
    }

    pub fn cs_points_to(&self, ctx: ContextId, var: VarId) -> BTreeSet<ObjId> {
        self.sorted(&Pointer::Var(ctx, var))
    }

    /// Contexts under which `var` was seen, i.e., contexts of reachable
    /// methods declaring it
    pub fn contexts_of(&self, var: VarId) -> Vec<ContextId> {
        let mut ctxs: Vec<_> = self
            .var_pointers
            .get(&var)
            .into_iter()
            .flatten()
            .filter_map(|idx| match self.pointers[*idx] {
                Pointer::Var(c, _) => Some(c),
                _ => None,
            })
            .collect();
        ctxs.sort();
        ctxs
    }

    /// All variables the analysis has seen, in order
    pub fn vars(&self) -> Vec<VarId> {
        let mut vars: Vec<_> = self.var_pointers.keys().copied().collect();
        vars.sort();
        vars
    }

    pub fn field_points_to(&self, obj: ObjId, field: FieldId) -> BTreeSet<ObjId> {
        self.sorted(&Pointer::InstanceField(obj, field))
    }

    pub fn static_field_points_to(&self, field: FieldId) -> BTreeSet<ObjId> {
        self.sorted(&Pointer::StaticField(field))
    }

    /// Objects stored in any element of the array `obj`
    pub fn array_points_to(&self, obj: ObjId) -> BTreeSet<ObjId> {
        self.sorted(&Pointer::ArrayIndex(obj))
    }

    pub fn may_alias(&self, a: VarId, b: VarId) -> bool {
        let pa = self.points_to(a);
        self.points_to(b).iter().any(|o| pa.contains(o))
    }

    // ------------------------------------------------------------------
    // Objects and contexts

    #[inline]
    pub fn obj(&self, id: ObjId) -> &Obj {
        &self.objects[id.index()]
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjId, &Obj)> + '_ {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, o)| (ObjId::from_index(i), o))
    }

    /// Objects allocated by `site`, one per heap context
    pub fn objects_at(&self, site: StmtId) -> BTreeSet<ObjId> {
        self.objects()
            .filter(|(_, o)| o.site == site)
            .map(|(id, _)| id)
            .collect()
    }

    #[inline]
    pub fn context(&self, id: ContextId) -> &Context {
        &self.contexts[id.index()]
    }

    // ------------------------------------------------------------------
    // Client artifacts

    /// Publish an artifact under `key`, replacing any previous one.
    pub fn store_result<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.results.insert(key.into(), Box::new(value));
    }

    /// The artifact stored under `key`, if any and if it has type `T`
    pub fn get_result<T: Any>(&self, key: &str) -> Option<&T> {
        self.results.get(key).and_then(|b| b.downcast_ref::<T>())
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }
}
