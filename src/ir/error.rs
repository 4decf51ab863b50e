// SPDX-License-Identifier: BSD-3-Clause
use super::name::{ClassId, FieldId, MethodId, StmtId, Subsignature, VarId};

/// A program model that violates the well-formedness assumptions of the
/// analyses. Raised once, while building a [`Program`](super::Program).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Malformed program: unknown class {0}")]
    UnknownClass(ClassId),
    #[error("Malformed program: unknown field {0}")]
    UnknownField(FieldId),
    #[error("Malformed program: unknown method {0}")]
    UnknownMethod(MethodId),
    #[error("Malformed program: unknown variable {var} in {stmt}")]
    UnknownVar { stmt: StmtId, var: VarId },
    #[error("Malformed program: variable {var} used in {method} but declared in {owner}")]
    ForeignVar {
        method: MethodId,
        owner: MethodId,
        var: VarId,
    },
    #[error("Malformed program: branch target {target} out of bounds in {stmt}")]
    BadTarget { stmt: StmtId, target: usize },
    #[error("Malformed program: {class} declares {subsignature} twice")]
    DuplicateMethod {
        class: ClassId,
        subsignature: Subsignature,
    },
    #[error("Malformed program: no method body for static call to {subsignature} in {class}, at {stmt}")]
    MissingStaticTarget {
        stmt: StmtId,
        class: ClassId,
        subsignature: Subsignature,
    },
    #[error("Malformed program: {stmt} passes {found} arguments to {subsignature}, which takes {expected}")]
    ArityMismatch {
        stmt: StmtId,
        subsignature: Subsignature,
        expected: usize,
        found: usize,
    },
    #[error("Malformed program: {stmt} accesses static field {field} through an object")]
    StaticFieldThroughObject { stmt: StmtId, field: FieldId },
    #[error("Malformed program: {stmt} accesses instance field {field} without an object")]
    InstanceFieldWithoutObject { stmt: StmtId, field: FieldId },
    #[error("Malformed program: branch condition of {0} is not a comparison")]
    NonComparisonBranch(StmtId),
    #[error("Malformed program: abstract method {0} has a body")]
    AbstractWithBody(MethodId),
    #[error("Malformed program: instance method {0} has no `this` variable")]
    MissingThis(MethodId),
    #[error("Malformed program: {0} is static and has a receiver")]
    StaticWithReceiver(StmtId),
    #[error("Malformed program: {0} is an instance call without a receiver")]
    MissingReceiver(StmtId),
    #[error("Malformed program: entry method {0} must be static and concrete")]
    BadEntry(MethodId),
    #[error("Malformed program: superclass chain of {0} is cyclic")]
    CyclicHierarchy(ClassId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let e = Error::MissingStaticTarget {
            stmt: StmtId::new(MethodId(0), 2),
            class: ClassId(1),
            subsignature: "void f()".into(),
        };
        assert_eq!(
            "Malformed program: no method body for static call to <void f()> in c1, at m0[2]",
            e.to_string()
        );
        let e = Error::ArityMismatch {
            stmt: StmtId::new(MethodId(0), 1),
            subsignature: "void f(A,A)".into(),
            expected: 2,
            found: 1,
        };
        assert_eq!(
            "Malformed program: m0[1] passes 1 arguments to <void f(A,A)>, which takes 2",
            e.to_string()
        );
    }
}
