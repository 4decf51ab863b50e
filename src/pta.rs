// SPDX-License-Identifier: BSD-3-Clause
//! Points-to analysis engine.
//!
//! One solver ([`Solver`]) implements the analysis for every kind of context
//! sensitivity; a [`ContextSelector`] decides how pointers, objects and
//! methods are split by context. The context-insensitive analysis is the
//! solver instantiated with [`Insensitive`].

mod context;
pub use context::*;
mod manager;
pub use manager::{CSCallSite, CSManager, CSMethod, Pointer, PointerId};
mod pfg;
pub use pfg::PointerFlowGraph;
mod points_to;
pub use points_to::PointsToSet;
mod result;
pub use result::PointerAnalysisResult;
mod solver;
pub use solver::{CSCallGraph, Solver};
mod worklist;
pub use worklist::{Order, WorkList};
