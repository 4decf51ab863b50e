// SPDX-License-Identifier: BSD-3-Clause
//! Pending propagation tasks.
//!
//! At most one entry per pointer is pending: pushing a pointer that is
//! already queued merges the new objects into its entry. The solver is
//! confluent, so the pop order only affects how long it takes to reach the
//! fixpoint.

use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rustc_hash::FxHashMap;

use super::{PointerId, PointsToSet};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Fifo,
    Lifo,
    /// Uniformly random among pending entries, reproducible from `seed`
    Random { seed: u64 },
}

#[derive(Debug)]
pub struct WorkList {
    queue: VecDeque<PointerId>,
    pending: FxHashMap<PointerId, PointsToSet>,
    order: Order,
    rng: Option<StdRng>,
}

impl WorkList {
    pub fn new(order: Order) -> Self {
        let rng = match order {
            Order::Random { seed } => Some(StdRng::seed_from_u64(seed)),
            Order::Fifo | Order::Lifo => None,
        };
        WorkList {
            queue: VecDeque::new(),
            pending: FxHashMap::default(),
            order,
            rng,
        }
    }

    pub fn push(&mut self, p: PointerId, pts: PointsToSet) {
        if pts.is_empty() {
            return;
        }
        match self.pending.get_mut(&p) {
            Some(entry) => entry.extend(&pts),
            None => {
                self.pending.insert(p, pts);
                self.queue.push_back(p);
            }
        }
    }

    pub fn pop(&mut self) -> Option<(PointerId, PointsToSet)> {
        let p = match self.order {
            Order::Fifo => self.queue.pop_front(),
            Order::Lifo => self.queue.pop_back(),
            Order::Random { .. } => {
                if self.queue.is_empty() {
                    None
                } else {
                    let idx = match &mut self.rng {
                        Some(rng) => rng.gen_range(0..self.queue.len()),
                        None => 0,
                    };
                    self.queue.swap_remove_back(idx)
                }
            }
        }?;
        match self.pending.remove(&p) {
            Some(pts) => Some((p, pts)),
            None => panic!("Bug! Queued pointer without pending objects: {}", p),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::ObjId;

    fn pts(objs: &[u32]) -> PointsToSet {
        objs.iter().map(|o| ObjId(*o)).collect()
    }

    #[test]
    fn entries_merge() {
        let mut w = WorkList::new(Order::Fifo);
        w.push(PointerId(0), pts(&[1]));
        w.push(PointerId(1), pts(&[2]));
        w.push(PointerId(0), pts(&[3]));
        assert_eq!(2, w.len());
        assert_eq!(Some((PointerId(0), pts(&[1, 3]))), w.pop());
        assert_eq!(Some((PointerId(1), pts(&[2]))), w.pop());
        assert_eq!(None, w.pop());
    }

    #[test]
    fn lifo() {
        let mut w = WorkList::new(Order::Lifo);
        w.push(PointerId(0), pts(&[1]));
        w.push(PointerId(1), pts(&[2]));
        assert_eq!(Some(PointerId(1)), w.pop().map(|e| e.0));
    }

    #[test]
    fn empty_sets_are_dropped() {
        let mut w = WorkList::new(Order::Fifo);
        w.push(PointerId(0), PointsToSet::new());
        assert!(w.is_empty());
    }

    #[test]
    fn random_order_is_reproducible() {
        let run = |seed| {
            let mut w = WorkList::new(Order::Random { seed });
            for i in 0..16 {
                w.push(PointerId(i), pts(&[i]));
            }
            let mut popped = Vec::new();
            while let Some((p, _)) = w.pop() {
                popped.push(p);
            }
            popped
        };
        let a = run(7);
        assert_eq!(a, run(7));
        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!((0..16).map(PointerId).collect::<Vec<_>>(), sorted);
    }
}
