// SPDX-License-Identifier: BSD-3-Clause
use std::hash::Hash;

use rustc_hash::FxHashMap;

/// In- and out-facts of every node of a solved graph
#[derive(Clone, Debug)]
pub struct DataflowResult<N, F> {
    in_facts: FxHashMap<N, F>,
    out_facts: FxHashMap<N, F>,
}

impl<N, F> Default for DataflowResult<N, F> {
    fn default() -> Self {
        DataflowResult {
            in_facts: FxHashMap::default(),
            out_facts: FxHashMap::default(),
        }
    }
}

impl<N: Copy + Eq + Hash, F> DataflowResult<N, F> {
    pub fn in_fact(&self, n: N) -> Option<&F> {
        self.in_facts.get(&n)
    }

    pub fn out_fact(&self, n: N) -> Option<&F> {
        self.out_facts.get(&n)
    }

    pub(crate) fn set_in_fact(&mut self, n: N, f: F) {
        self.in_facts.insert(n, f);
    }

    pub(crate) fn set_out_fact(&mut self, n: N, f: F) {
        self.out_facts.insert(n, f);
    }

    pub(crate) fn in_fact_mut(&mut self, n: N) -> Option<&mut F> {
        self.in_facts.get_mut(&n)
    }

    pub(crate) fn out_fact_mut(&mut self, n: N) -> Option<&mut F> {
        self.out_facts.get_mut(&n)
    }

    /// Nodes with an out-fact, in no particular order
    pub fn nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.out_facts.keys().copied()
    }
}
