// SPDX-License-Identifier: BSD-3-Clause
//! Statements of the intermediate representation.
//!
//! Statements are three-address code: every operand is a local variable
//! (integer literals are assigned to a variable first). Branch targets are
//! indices into the statement list of the containing method.

use std::fmt::Display;

use super::name::{ClassId, FieldId, Subsignature, VarId};

#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Type {
    Int,
    Boolean,
    Byte,
    Short,
    Char,
    Long,
    Float,
    Double,
    Class(ClassId),
    Array(Box<Type>),
    Null,
    Void,
}

impl Type {
    /// Whether values of this type are tracked by constant propagation.
    pub fn can_hold_int(&self) -> bool {
        matches!(
            self,
            Type::Int | Type::Boolean | Type::Byte | Type::Short | Type::Char
        )
    }

    pub fn class(&self) -> Option<ClassId> {
        match self {
            Type::Class(c) => Some(*c),
            _ => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Boolean => write!(f, "boolean"),
            Type::Byte => write!(f, "byte"),
            Type::Short => write!(f, "short"),
            Type::Char => write!(f, "char"),
            Type::Long => write!(f, "long"),
            Type::Float => write!(f, "float"),
            Type::Double => write!(f, "double"),
            Type::Class(c) => write!(f, "{}", c),
            Type::Array(t) => write!(f, "{}[]", t),
            Type::Null => write!(f, "null"),
            Type::Void => write!(f, "void"),
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinaryOp {
    /// Division and remainder may fault on a zero divisor.
    pub fn may_fault(self) -> bool {
        matches!(self, BinaryOp::Div | BinaryOp::Rem)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallKind {
    Static,
    Special,
    Virtual,
    Interface,
}

impl Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallKind::Static => write!(f, "static"),
            CallKind::Special => write!(f, "special"),
            CallKind::Virtual => write!(f, "virtual"),
            CallKind::Interface => write!(f, "interface"),
        }
    }
}

/// Statically referenced callee of an invocation
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct MethodRef {
    pub class: ClassId,
    pub subsignature: Subsignature,
}

/// `lhs = new T`
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct New {
    pub lhs: VarId,
    pub ty: Type,
}

/// `lhs = rhs`
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Copy {
    pub lhs: VarId,
    pub rhs: VarId,
}

/// `lhs = (ty) rhs`
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Cast {
    pub lhs: VarId,
    pub rhs: VarId,
    pub ty: Type,
}

/// `lhs = value`
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Literal {
    pub lhs: VarId,
    pub value: i32,
}

/// `lhs = op0 <op> op1`
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Binary {
    pub lhs: VarId,
    pub op: BinaryOp,
    pub op0: VarId,
    pub op1: VarId,
}

/// `base.field`, or `C.field` when `base` is `None`
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct FieldAccess {
    pub base: Option<VarId>,
    pub field: FieldId,
}

impl FieldAccess {
    pub fn is_static(&self) -> bool {
        self.base.is_none()
    }
}

/// `lhs = access`
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct LoadField {
    pub lhs: VarId,
    pub access: FieldAccess,
}

/// `access = rhs`
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct StoreField {
    pub access: FieldAccess,
    pub rhs: VarId,
}

/// `lhs = base[index]`
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct LoadArray {
    pub lhs: VarId,
    pub base: VarId,
    pub index: VarId,
}

/// `base[index] = rhs`
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct StoreArray {
    pub base: VarId,
    pub index: VarId,
    pub rhs: VarId,
}

/// `lhs = receiver.method(args)`; `receiver` is `None` for static calls
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Invoke {
    pub kind: CallKind,
    pub lhs: Option<VarId>,
    pub receiver: Option<VarId>,
    pub method: MethodRef,
    pub args: Vec<VarId>,
}

impl Invoke {
    pub fn is_static(&self) -> bool {
        self.kind == CallKind::Static
    }
}

/// `if (op0 <op> op1) goto target`, with `op` a comparison
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct If {
    pub op: BinaryOp,
    pub op0: VarId,
    pub op1: VarId,
    pub target: usize,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Switch {
    pub var: VarId,
    pub cases: Vec<(i32, usize)>,
    pub default: usize,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Goto {
    pub target: usize,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Return {
    pub value: Option<VarId>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stmt {
    New(New),
    Copy(Copy),
    Cast(Cast),
    Literal(Literal),
    Binary(Binary),
    LoadField(LoadField),
    StoreField(StoreField),
    LoadArray(LoadArray),
    StoreArray(StoreArray),
    Invoke(Invoke),
    If(If),
    Switch(Switch),
    Goto(Goto),
    Return(Return),
    Nop,
}

impl Stmt {
    /// The variable defined by this statement, if any
    pub fn def(&self) -> Option<VarId> {
        match self {
            Stmt::New(New { lhs, .. })
            | Stmt::Copy(Copy { lhs, .. })
            | Stmt::Cast(Cast { lhs, .. })
            | Stmt::Literal(Literal { lhs, .. })
            | Stmt::Binary(Binary { lhs, .. })
            | Stmt::LoadField(LoadField { lhs, .. })
            | Stmt::LoadArray(LoadArray { lhs, .. }) => Some(*lhs),
            Stmt::Invoke(Invoke { lhs, .. }) => *lhs,
            // No `_` pattern to ensure this is updated if the type changes
            Stmt::StoreField(_) => None,
            Stmt::StoreArray(_) => None,
            Stmt::If(_) => None,
            Stmt::Switch(_) => None,
            Stmt::Goto(_) => None,
            Stmt::Return(_) => None,
            Stmt::Nop => None,
        }
    }

    /// Variables read by this statement
    pub fn uses(&self) -> Vec<VarId> {
        match self {
            Stmt::New(_) => Vec::new(),
            Stmt::Copy(c) => vec![c.rhs],
            Stmt::Cast(c) => vec![c.rhs],
            Stmt::Literal(_) => Vec::new(),
            Stmt::Binary(b) => vec![b.op0, b.op1],
            Stmt::LoadField(l) => l.access.base.into_iter().collect(),
            Stmt::StoreField(s) => s.access.base.into_iter().chain([s.rhs]).collect(),
            Stmt::LoadArray(l) => vec![l.base, l.index],
            Stmt::StoreArray(s) => vec![s.base, s.index, s.rhs],
            Stmt::Invoke(i) => i.receiver.into_iter().chain(i.args.iter().copied()).collect(),
            Stmt::If(i) => vec![i.op0, i.op1],
            Stmt::Switch(s) => vec![s.var],
            Stmt::Goto(_) => Vec::new(),
            Stmt::Return(r) => r.value.into_iter().collect(),
            Stmt::Nop => Vec::new(),
        }
    }

    /// Whether control can fall through to the next statement
    pub fn falls_through(&self) -> bool {
        !matches!(self, Stmt::Goto(_) | Stmt::Switch(_) | Stmt::Return(_))
    }

    pub fn as_invoke(&self) -> Option<&Invoke> {
        match self {
            Stmt::Invoke(i) => Some(i),
            _ => None,
        }
    }
}
