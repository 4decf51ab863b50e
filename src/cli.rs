// SPDX-License-Identifier: BSD-3-Clause
use std::fmt;
use std::path::PathBuf;

use oopta::analysis::pointer::Selector;
use oopta::Order;

#[derive(Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Check {
    Default,
    None,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Default => write!(f, "default"),
            Check::None => write!(f, "none"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum SelectorArg {
    Ci,
    KCall,
    KObj,
    KType,
}

impl fmt::Display for SelectorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorArg::Ci => write!(f, "ci"),
            SelectorArg::KCall => write!(f, "k-call"),
            SelectorArg::KObj => write!(f, "k-obj"),
            SelectorArg::KType => write!(f, "k-type"),
        }
    }
}

impl From<SelectorArg> for Selector {
    fn from(s: SelectorArg) -> Self {
        match s {
            SelectorArg::Ci => Selector::Insensitive,
            SelectorArg::KCall => Selector::CallSite,
            SelectorArg::KObj => Selector::Object,
            SelectorArg::KType => Selector::Type,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum OrderArg {
    Fifo,
    Lifo,
    Random,
}

impl fmt::Display for OrderArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderArg::Fifo => write!(f, "fifo"),
            OrderArg::Lifo => write!(f, "lifo"),
            OrderArg::Random => write!(f, "random"),
        }
    }
}

impl OrderArg {
    pub fn with_seed(self, seed: u64) -> Order {
        match self {
            OrderArg::Fifo => Order::Fifo,
            OrderArg::Lifo => Order::Lifo,
            OrderArg::Random => Order::Random { seed },
        }
    }
}

/// Points-to analysis for object-oriented programs
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Check assertions
    #[arg(long, default_value_t = Check::Default)]
    pub check: Check,

    /// Context sensitivity
    #[arg(long, default_value_t = SelectorArg::Ci)]
    pub selector: SelectorArg,

    /// Context depth
    #[arg(short, long, default_value_t = 1)]
    pub k: usize,

    /// Worklist order
    #[arg(long, default_value_t = OrderArg::Fifo)]
    pub order: OrderArg,

    /// Seed for `--order random`
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Debug
    #[arg(long)]
    pub debug: bool,

    /// Quiet
    #[arg(long)]
    pub quiet: bool,

    /// Collect and report metrics
    #[arg(long)]
    pub metrics: bool,

    /// Program, as JSON
    #[arg()]
    pub program: PathBuf,

    /// Tracing
    #[arg(long)]
    pub tracing: bool,
}
