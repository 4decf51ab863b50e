// SPDX-License-Identifier: BSD-3-Clause
//! Lattice for values of integer variables
//!
//! ```text
//!        NAC
//!   ... -1 0 1 ...
//!       UNDEF
//! ```
//!
//! Constant propagation meets facts from different paths, which in ascent's
//! terminology is a `join` on [`ConstPropagation`]: `UNDEF` is its bottom and
//! `NAC` its top.

use ascent::{lattice::constant_propagation::ConstPropagation, Lattice};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd)]
pub struct Value(ConstPropagation<i32>);

// ------------------------------------------------------------------
// Constructors

impl Value {
    /// Not yet defined, on any path seen so far
    #[inline]
    pub fn undef() -> Self {
        Value(ConstPropagation::Bottom)
    }

    #[inline]
    pub fn constant(i: i32) -> Self {
        Value(ConstPropagation::Constant(i))
    }

    /// Not a constant
    #[inline]
    pub fn nac() -> Self {
        Value(ConstPropagation::Top)
    }

    #[inline]
    pub fn from_bool(b: bool) -> Self {
        Self::constant(i32::from(b))
    }
}

// ------------------------------------------------------------------
// Queries

impl Value {
    #[inline]
    pub fn is_undef(&self) -> bool {
        matches!(self.0, ConstPropagation::Bottom)
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        matches!(self.0, ConstPropagation::Constant(_))
    }

    #[inline]
    pub fn is_nac(&self) -> bool {
        matches!(self.0, ConstPropagation::Top)
    }

    #[inline]
    pub fn as_constant(&self) -> Option<i32> {
        match self.0 {
            ConstPropagation::Constant(i) => Some(i),
            _ => None,
        }
    }
}

// ------------------------------------------------------------------
// Operations

impl Value {
    /// `UNDEF ⊓ v = v`, `NAC ⊓ v = NAC`, `c ⊓ c = c`, `c ⊓ d = NAC`
    #[inline]
    pub fn meet(self, other: Self) -> Self {
        Value(self.0.join(other.0))
    }

    /// Whether an array index with this value may equal one with `other`
    pub fn may_alias_index(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (ConstPropagation::Bottom, _) | (_, ConstPropagation::Bottom) => false,
            (ConstPropagation::Constant(i), ConstPropagation::Constant(j)) => i == j,
            (ConstPropagation::Top, _) | (_, ConstPropagation::Top) => true,
        }
    }
}

// ------------------------------------------------------------------
// Traits

impl Default for Value {
    fn default() -> Self {
        Self::undef()
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            ConstPropagation::Bottom => write!(f, "UNDEF"),
            ConstPropagation::Constant(c) => write!(f, "{}", c),
            ConstPropagation::Top => write!(f, "NAC"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meet() {
        let one = Value::constant(1);
        let two = Value::constant(2);
        assert_eq!(one, Value::undef().meet(one));
        assert_eq!(one, one.meet(Value::undef()));
        assert_eq!(one, one.meet(one));
        assert_eq!(Value::nac(), one.meet(two));
        assert_eq!(Value::nac(), Value::nac().meet(Value::undef()));
        assert_eq!(Value::undef(), Value::undef().meet(Value::undef()));
    }

    #[test]
    fn index_aliasing() {
        let one = Value::constant(1);
        assert!(one.may_alias_index(&one));
        assert!(!one.may_alias_index(&Value::constant(2)));
        assert!(one.may_alias_index(&Value::nac()));
        assert!(!Value::undef().may_alias_index(&Value::nac()));
    }

    #[test]
    fn display() {
        assert_eq!("UNDEF", Value::undef().to_string());
        assert_eq!("-3", Value::constant(-3).to_string());
        assert_eq!("NAC", Value::nac().to_string());
    }
}
