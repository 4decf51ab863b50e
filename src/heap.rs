// SPDX-License-Identifier: BSD-3-Clause
//! Allocation-site abstraction of the heap.
//!
//! Every `new` statement stands for all of the objects it creates at runtime,
//! optionally split further by a heap context.

use std::fmt::Display;

use crate::ir::{id, ClassId, MethodId, StmtId, Type};
use crate::pta::ContextId;

id!(
    /// An abstract heap object
    ObjId,
    "o"
);

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Obj {
    /// The allocating `new` statement
    pub site: StmtId,
    pub ty: Type,
    /// Class declaring the allocating method
    pub container: ClassId,
    /// Heap context; empty for context-insensitive heaps
    pub context: ContextId,
}

impl Obj {
    #[inline]
    pub fn method(&self) -> MethodId {
        self.site.method
    }

    /// Class used for dispatch on this object, `None` for arrays
    #[inline]
    pub fn class(&self) -> Option<ClassId> {
        self.ty.class()
    }
}

impl Display for Obj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "new {}@{}", self.ty, self.site)
    }
}
