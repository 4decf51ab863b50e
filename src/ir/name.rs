// SPDX-License-Identifier: BSD-3-Clause
//! Identifiers for program entities.
//!
//! Every entity of the program model lives in an arena owned by
//! [`Program`](super::Program) and is addressed by a small, `Copy` index.

use std::fmt::Display;

macro_rules! id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(
            Clone,
            Copy,
            Debug,
            Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            serde::Deserialize,
            serde::Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub(crate) fn from_index(idx: usize) -> Self {
                debug_assert!(idx <= u32::MAX as usize);
                $name(idx as u32)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}
pub(crate) use id;

id!(
    /// A class or interface
    ClassId,
    "c"
);
id!(
    /// A field, instance or static
    FieldId,
    "f"
);
id!(
    /// A method, concrete or abstract
    MethodId,
    "m"
);
id!(
    /// A local variable (including parameters and `this`)
    VarId,
    "v"
);

/// A statement, identified by its containing method and its position in the
/// method body.
#[derive(
    Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
pub struct StmtId {
    pub method: MethodId,
    pub index: u32,
}

impl StmtId {
    #[inline]
    pub fn new(method: MethodId, index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize);
        StmtId {
            method,
            index: index as u32,
        }
    }
}

impl Display for StmtId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.method, self.index)
    }
}

/// Name and descriptor of a method, excluding the declaring class, e.g.
/// `void foo(A,int)`. Dispatch matches on subsignatures.
#[derive(
    Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct Subsignature(String);

impl Subsignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Subsignature {
    fn from(s: &str) -> Self {
        Subsignature(s.to_string())
    }
}

impl From<String> for Subsignature {
    fn from(s: String) -> Self {
        Subsignature(s)
    }
}

impl Display for Subsignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.0)
    }
}
