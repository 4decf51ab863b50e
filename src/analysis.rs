// SPDX-License-Identifier: BSD-3-Clause
//! Analyses built on the engines in [`crate::pta`] and [`crate::dataflow`].

pub mod callgraph;
pub mod constprop;
pub mod livevar;
pub mod pointer;
