// SPDX-License-Identifier: BSD-3-Clause
//! Sequences that keep only their `k` most recent elements.
//!
//! The newest element is at the front. Two sequences are equal only if their
//! limits are equal too, so every context of one analysis run should share a
//! limit.
use std::collections::VecDeque;
use std::fmt::Display;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KLimited<T> {
    k: usize,
    elems: VecDeque<T>,
}

impl<T> KLimited<T> {
    /// `initial_elems` are given newest first; any beyond `k` are dropped.
    pub fn new(k: usize, initial_elems: Vec<T>) -> Self {
        let mut elems = if k < 8 {
            VecDeque::with_capacity(k)
        } else {
            VecDeque::new()
        };
        elems.extend(initial_elems.into_iter().take(k));
        KLimited { k, elems }
    }

    pub fn empty(k: usize) -> Self {
        Self::new(k, Vec::new())
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn push(&mut self, t: T) {
        if self.elems.len() >= self.k {
            self.elems.pop_back();
        }
        if self.k > 0 {
            self.elems.push_front(t);
        }
    }

    pub fn pushed(&self, t: T) -> Self
    where
        T: Clone,
    {
        let mut new = self.clone();
        new.push(t);
        new
    }

    /// The `n` newest elements, keeping the limit
    pub fn truncated(&self, n: usize) -> Self
    where
        T: Clone,
    {
        KLimited {
            k: self.k,
            elems: self.elems.iter().take(n).cloned().collect(),
        }
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elems.iter()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn into_iter(self) -> impl Iterator<Item = T> {
        self.elems.into_iter()
    }
}

impl<T: Display> Display for KLimited<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, e) in self.elems.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", e)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_drops_oldest() {
        let mut l = KLimited::empty(2);
        l.push(1);
        l.push(2);
        l.push(3);
        assert_eq!(vec![3, 2], l.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn zero_limit_stays_empty() {
        let l = KLimited::empty(0).pushed('a');
        assert!(l.is_empty());
        assert_eq!(KLimited::empty(0), l);
    }

    #[test]
    fn truncation_keeps_newest() {
        let l = KLimited::new(3, vec![3, 2, 1]);
        let t = l.truncated(1);
        assert_eq!(3, t.k());
        assert_eq!("[3]", t.to_string());
        assert_eq!("[3, 2, 1]", l.to_string());
    }

    #[test]
    fn new_respects_limit() {
        assert_eq!(1, KLimited::new(1, vec![1, 2]).len());
    }
}
