// SPDX-License-Identifier: BSD-3-Clause
//! Contexts and the policies that create them.
//!
//! The solver never inspects a context; it only asks a [`ContextSelector`]
//! for new ones and uses them as (interned) keys. Everything that makes an
//! analysis call-site-, object- or type-sensitive lives here.

use std::fmt::Display;

use crate::heap::{Obj, ObjId};
use crate::ir::{id, ClassId, MethodId, StmtId};
use crate::klimited::KLimited;

id!(
    /// An interned [`Context`]
    ContextId,
    "ctx"
);

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContextElement {
    CallSite(StmtId),
    Object(ObjId),
    Type(ClassId),
}

impl Display for ContextElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextElement::CallSite(s) => write!(f, "{}", s),
            ContextElement::Object(o) => write!(f, "{}", o),
            ContextElement::Type(c) => write!(f, "{}", c),
        }
    }
}

pub type Context = KLimited<ContextElement>;

/// The receiver object of an instance call, with its heap context
#[derive(Clone, Copy, Debug)]
pub struct Receiver<'a> {
    pub id: ObjId,
    pub obj: &'a Obj,
    pub context: &'a Context,
}

pub trait ContextSelector {
    fn empty_context(&self) -> Context;

    /// Context for the callee of a static call
    fn select_context(&self, caller: &Context, call_site: StmtId, callee: MethodId) -> Context;

    /// Context for the callee of an instance call on `recv`
    fn select_receiver_context(
        &self,
        caller: &Context,
        call_site: StmtId,
        recv: Receiver<'_>,
        callee: MethodId,
    ) -> Context;

    /// Heap context for an object allocated in `method` under `method_ctx`
    fn select_heap_context(&self, method_ctx: &Context, method: MethodId) -> Context;
}

/// Heap contexts keep one element fewer than method contexts
fn heap_context(method_ctx: &Context) -> Context {
    method_ctx.truncated(method_ctx.k().saturating_sub(1))
}

// ------------------------------------------------------------------
// Selectors

#[derive(Clone, Copy, Debug, Default)]
pub struct Insensitive;

impl ContextSelector for Insensitive {
    fn empty_context(&self) -> Context {
        KLimited::empty(0)
    }

    fn select_context(&self, _caller: &Context, _site: StmtId, _callee: MethodId) -> Context {
        self.empty_context()
    }

    fn select_receiver_context(
        &self,
        _caller: &Context,
        _site: StmtId,
        _recv: Receiver<'_>,
        _callee: MethodId,
    ) -> Context {
        self.empty_context()
    }

    fn select_heap_context(&self, _method_ctx: &Context, _method: MethodId) -> Context {
        self.empty_context()
    }
}

/// The `k` most recent call sites
#[derive(Clone, Copy, Debug)]
pub struct KCallSite {
    pub k: usize,
}

impl ContextSelector for KCallSite {
    fn empty_context(&self) -> Context {
        KLimited::empty(self.k)
    }

    fn select_context(&self, caller: &Context, call_site: StmtId, _callee: MethodId) -> Context {
        caller.pushed(ContextElement::CallSite(call_site))
    }

    fn select_receiver_context(
        &self,
        caller: &Context,
        call_site: StmtId,
        _recv: Receiver<'_>,
        callee: MethodId,
    ) -> Context {
        self.select_context(caller, call_site, callee)
    }

    fn select_heap_context(&self, method_ctx: &Context, _method: MethodId) -> Context {
        heap_context(method_ctx)
    }
}

/// The `k` most recent receiver objects (allocation sites)
#[derive(Clone, Copy, Debug)]
pub struct KObject {
    pub k: usize,
}

impl ContextSelector for KObject {
    fn empty_context(&self) -> Context {
        KLimited::empty(self.k)
    }

    fn select_context(&self, caller: &Context, _call_site: StmtId, _callee: MethodId) -> Context {
        caller.clone()
    }

    fn select_receiver_context(
        &self,
        _caller: &Context,
        _call_site: StmtId,
        recv: Receiver<'_>,
        _callee: MethodId,
    ) -> Context {
        recv.context.pushed(ContextElement::Object(recv.id))
    }

    fn select_heap_context(&self, method_ctx: &Context, _method: MethodId) -> Context {
        heap_context(method_ctx)
    }
}

/// The `k` most recent classes containing the allocation of a receiver
#[derive(Clone, Copy, Debug)]
pub struct KType {
    pub k: usize,
}

impl ContextSelector for KType {
    fn empty_context(&self) -> Context {
        KLimited::empty(self.k)
    }

    fn select_context(&self, caller: &Context, _call_site: StmtId, _callee: MethodId) -> Context {
        caller.clone()
    }

    fn select_receiver_context(
        &self,
        _caller: &Context,
        _call_site: StmtId,
        recv: Receiver<'_>,
        _callee: MethodId,
    ) -> Context {
        recv.context.pushed(ContextElement::Type(recv.obj.container))
    }

    fn select_heap_context(&self, method_ctx: &Context, _method: MethodId) -> Context {
        heap_context(method_ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Type;

    fn site(i: usize) -> StmtId {
        StmtId::new(MethodId(0), i)
    }

    fn obj() -> Obj {
        Obj {
            site: site(9),
            ty: Type::Class(ClassId(1)),
            container: ClassId(2),
            context: ContextId(0),
        }
    }

    #[test]
    fn call_site_sensitivity() {
        let s = KCallSite { k: 2 };
        let c0 = s.empty_context();
        let c1 = s.select_context(&c0, site(1), MethodId(1));
        let c2 = s.select_context(&c1, site(2), MethodId(1));
        let c3 = s.select_context(&c2, site(3), MethodId(1));
        assert_eq!("[m0[3], m0[2]]", c3.to_string());
        assert_eq!("[m0[3]]", s.select_heap_context(&c3, MethodId(1)).to_string());
    }

    #[test]
    fn object_sensitivity() {
        let s = KObject { k: 1 };
        let caller = s.empty_context();
        let heap = s.empty_context();
        let o = obj();
        let recv = Receiver {
            id: ObjId(4),
            obj: &o,
            context: &heap,
        };
        let c = s.select_receiver_context(&caller, site(1), recv, MethodId(1));
        assert_eq!("[o4]", c.to_string());
        // Static calls keep the caller's context
        assert_eq!(c, s.select_context(&c, site(2), MethodId(2)));
        assert!(s.select_heap_context(&c, MethodId(1)).is_empty());
    }

    #[test]
    fn type_sensitivity() {
        let s = KType { k: 2 };
        let caller = s.empty_context();
        let heap = s.empty_context();
        let o = obj();
        let recv = Receiver {
            id: ObjId(4),
            obj: &o,
            context: &heap,
        };
        let c = s.select_receiver_context(&caller, site(1), recv, MethodId(1));
        assert_eq!("[c2]", c.to_string());
    }

    #[test]
    fn insensitive() {
        let s = Insensitive;
        let c = s.select_context(&s.empty_context(), site(1), MethodId(1));
        assert_eq!(s.empty_context(), c);
    }
}
