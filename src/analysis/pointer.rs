// SPDX-License-Identifier: BSD-3-Clause
//! Pointer analysis front door
//!
//! Picks a context selector from [`Options`], runs the [`Solver`] to its
//! fixpoint and packages the result.

use std::fmt;

use tracing::{debug, trace_span};

use crate::ir::Program;
use crate::pta::{
    ContextSelector, Insensitive, KCallSite, KObject, KType, Order, PointerAnalysisResult, Solver,
};

/// Metrics about the size and precision of the points-to analysis. Lower is
/// more precise, for a fixed program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metrics {
    /// Number of (context, method) pairs found reachable
    pub reachable_methods: usize,
    /// Number of context-sensitive call graph edges. A more precise analysis
    /// resolves virtual calls to fewer targets, though more contexts can
    /// also mean more edges.
    pub call_graph_edges: usize,
    /// Number of pointers (variables, fields, array cells) that were ever
    /// referenced
    pub pointers: usize,
    /// Number of edges in the pointer flow graph
    pub pfg_edges: usize,
    /// Number of abstract heap objects, that is, allocation sites paired
    /// with a heap context
    pub objects: usize,
    /// Number of distinct contexts
    pub contexts: usize,
    /// Sum of the sizes of all points-to sets
    pub points_to_facts: usize,
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum Selector {
    #[default]
    Insensitive,
    CallSite,
    Object,
    Type,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Insensitive => write!(f, "ci"),
            Selector::CallSite => write!(f, "k-call"),
            Selector::Object => write!(f, "k-obj"),
            Selector::Type => write!(f, "k-type"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Options {
    pub selector: Selector,
    /// Context depth, ignored by [`Selector::Insensitive`]
    pub k: usize,
    pub order: Order,
    pub check_assertions: bool,
    pub debug: bool,
    pub metrics: bool,
}

/// Pointer analysis
///
/// Computes points-to sets for every variable, field and array cell of the
/// methods reachable from the entry method of `program`, and the call graph
/// over those methods.
///
/// # Panics
///
/// With `check_assertions`, panics if the fixpoint violates an invariant of
/// the analysis. This always indicates a bug in the solver.
pub fn analysis(program: &Program, opts: &Options) -> PointerAnalysisResult {
    let span = trace_span!("pointer", selector = %opts.selector, k = opts.k);
    let _span = span.enter();

    // No `_` pattern to ensure this is updated if the type changes
    match opts.selector {
        Selector::Insensitive => run(program, Insensitive, opts),
        Selector::CallSite => run(program, KCallSite { k: opts.k }, opts),
        Selector::Object => run(program, KObject { k: opts.k }, opts),
        Selector::Type => run(program, KType { k: opts.k }, opts),
    }
}

fn run<S: ContextSelector>(program: &Program, selector: S, opts: &Options) -> PointerAnalysisResult {
    let mut solver = Solver::new(program, selector, opts.order);
    solver.solve();
    if opts.check_assertions {
        solver.check_assertions();
    }
    let metrics = if opts.metrics || opts.debug {
        Some(solver.metrics())
    } else {
        None
    };
    if opts.debug {
        if let Some(m) = &metrics {
            debug!("{:#?}", m);
        }
        for (ctx, m) in solver.call_graph().reachable_methods() {
            debug!(
                "Reachable: {} in {}",
                program.method_name(*m),
                solver.manager().context(*ctx)
            );
        }
    }
    solver.finish(if opts.metrics { metrics } else { None })
}
