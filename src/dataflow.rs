// SPDX-License-Identifier: BSD-3-Clause
//! Monotone dataflow frameworks.
//!
//! [`solve`] computes the fixpoint of an intraprocedural analysis over any
//! [`Graph`](crate::cfg::Graph), forwards or backwards. [`solve_inter`]
//! computes the fixpoint of a forward interprocedural analysis over an
//! [`Icfg`], with transfer functions on edges as well as nodes.
//!
//! Termination requires a lattice of finite height and monotone transfer
//! functions; neither is checked.

mod analysis;
pub use analysis::*;
mod icfg;
pub use icfg::*;
mod inter;
pub use inter::solve_inter;
mod result;
pub use result::DataflowResult;
mod solver;
pub use solver::solve;
