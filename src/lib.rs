// SPDX-License-Identifier: BSD-3-Clause
//! Whole-program points-to and dataflow analysis for object-oriented
//! programs.
//!
//! The [`pta`] engine computes points-to sets and a call graph together,
//! under a pluggable context-sensitivity policy. The [`dataflow`] engine
//! solves monotone frameworks within one method or across the call graph.
//! [`analysis`] holds the drivers and client analyses built on both.

pub mod analysis;
pub mod callgraph;
pub mod cfg;
pub mod dataflow;
pub mod heap;
pub mod hierarchy;
pub mod ir;
pub mod klimited;
pub mod lattice;
pub mod layers;
pub mod pta;

pub use analysis::pointer::{analysis as pointer_analysis, Metrics, Options, Selector};
pub use ir::{Program, ProgramBuilder, ProgramDef};
pub use pta::{Order, PointerAnalysisResult};
