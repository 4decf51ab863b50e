// SPDX-License-Identifier: BSD-3-Clause
//! Arenas for the context-qualified elements of the analysis.
//!
//! Contexts, objects and pointers are created on first reference and live
//! until the result is dropped. Each is addressed by a dense index, which is
//! also how the pointer flow graph refers to pointers.

use std::fmt::Display;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use super::{Context, ContextId, PointsToSet};
use crate::heap::{Obj, ObjId};
use crate::ir::{id, FieldId, MethodId, StmtId, VarId};

id!(
    /// An interned [`Pointer`]
    PointerId,
    "p"
);

/// Abstract storage location that may hold references
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Pointer {
    Var(ContextId, VarId),
    InstanceField(ObjId, FieldId),
    StaticField(FieldId),
    /// All elements of an array object
    ArrayIndex(ObjId),
}

impl Display for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pointer::Var(c, v) => write!(f, "{}:{}", c, v),
            Pointer::InstanceField(o, fld) => write!(f, "{}.{}", o, fld),
            Pointer::StaticField(fld) => write!(f, "{}", fld),
            Pointer::ArrayIndex(o) => write!(f, "{}[*]", o),
        }
    }
}

pub type CSMethod = (ContextId, MethodId);
pub type CSCallSite = (ContextId, StmtId);

#[derive(Clone, Debug)]
pub(crate) struct Interner<T> {
    ids: FxHashMap<T, u32>,
    elems: Vec<T>,
}

impl<T> Default for Interner<T> {
    fn default() -> Self {
        Interner {
            ids: FxHashMap::default(),
            elems: Vec::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> Interner<T> {
    /// Index of `t`, and whether it was new
    pub(crate) fn intern(&mut self, t: T) -> (usize, bool) {
        if let Some(idx) = self.ids.get(&t) {
            return (*idx as usize, false);
        }
        let idx = self.elems.len();
        debug_assert!(idx < u32::MAX as usize);
        self.ids.insert(t.clone(), idx as u32);
        self.elems.push(t);
        (idx, true)
    }

    pub(crate) fn lookup(&self, t: &T) -> Option<usize> {
        self.ids.get(t).map(|idx| *idx as usize)
    }

    #[inline]
    pub(crate) fn get(&self, idx: usize) -> &T {
        &self.elems[idx]
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.elems.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.elems.iter()
    }
}

/// Owner of every context, object and pointer of one analysis run, and of
/// the points-to set of each pointer
#[derive(Debug, Default)]
pub struct CSManager {
    contexts: Interner<Context>,
    objects: Interner<Obj>,
    pointers: Interner<Pointer>,
    points_to: Vec<PointsToSet>,
}

impl CSManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Contexts and objects

    pub fn context_id(&mut self, ctx: Context) -> ContextId {
        ContextId::from_index(self.contexts.intern(ctx).0)
    }

    #[inline]
    pub fn context(&self, id: ContextId) -> &Context {
        self.contexts.get(id.index())
    }

    pub fn obj_id(&mut self, obj: Obj) -> ObjId {
        ObjId::from_index(self.objects.intern(obj).0)
    }

    #[inline]
    pub fn obj(&self, id: ObjId) -> &Obj {
        self.objects.get(id.index())
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjId, &Obj)> + '_ {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, o)| (ObjId::from_index(i), o))
    }

    // ------------------------------------------------------------------
    // Pointers

    pub fn pointer(&mut self, p: Pointer) -> PointerId {
        let (idx, new) = self.pointers.intern(p);
        if new {
            self.points_to.push(PointsToSet::new());
        }
        PointerId::from_index(idx)
    }

    #[inline]
    pub fn var_ptr(&mut self, ctx: ContextId, v: VarId) -> PointerId {
        self.pointer(Pointer::Var(ctx, v))
    }

    #[inline]
    pub fn instance_field_ptr(&mut self, o: ObjId, f: FieldId) -> PointerId {
        self.pointer(Pointer::InstanceField(o, f))
    }

    #[inline]
    pub fn static_field_ptr(&mut self, f: FieldId) -> PointerId {
        self.pointer(Pointer::StaticField(f))
    }

    #[inline]
    pub fn array_ptr(&mut self, o: ObjId) -> PointerId {
        self.pointer(Pointer::ArrayIndex(o))
    }

    /// Like [`CSManager::pointer`], without creating it
    pub fn lookup_pointer(&self, p: &Pointer) -> Option<PointerId> {
        self.pointers.lookup(p).map(PointerId::from_index)
    }

    #[inline]
    pub fn pointer_kind(&self, id: PointerId) -> Pointer {
        *self.pointers.get(id.index())
    }

    pub fn pointers(&self) -> impl Iterator<Item = (PointerId, Pointer)> + '_ {
        self.pointers
            .iter()
            .enumerate()
            .map(|(i, p)| (PointerId::from_index(i), *p))
    }

    #[inline]
    pub fn points_to(&self, id: PointerId) -> &PointsToSet {
        &self.points_to[id.index()]
    }

    #[inline]
    pub(crate) fn points_to_mut(&mut self, id: PointerId) -> &mut PointsToSet {
        &mut self.points_to[id.index()]
    }

    // ------------------------------------------------------------------
    // Sizes

    pub fn num_contexts(&self) -> usize {
        self.contexts.len()
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn num_pointers(&self) -> usize {
        self.pointers.len()
    }

    pub(crate) fn into_parts(self) -> (Vec<Context>, Vec<Obj>, Vec<Pointer>, Vec<PointsToSet>) {
        (
            self.contexts.elems,
            self.objects.elems,
            self.pointers.elems,
            self.points_to,
        )
    }
}
