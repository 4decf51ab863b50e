// SPDX-License-Identifier: BSD-3-Clause
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;

use tracing_flame::{FlameLayer, FlushGuard};
use tracing_subscriber::{fmt, prelude::*};

use oopta::analysis::constprop::{self, CpFact};
use oopta::analysis::pointer::{self, Selector};
use oopta::cfg::Node;
use oopta::dataflow::DataflowResult;
use oopta::ir::{MethodId, StmtId};
use oopta::lattice::Value;
use oopta::{Program, ProgramDef};

/// Alias-aware constant propagation for object-oriented programs
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Object-sensitivity depth of the underlying points-to analysis, 0 for
    /// context-insensitive
    #[arg(long, default_value_t = 0)]
    pub contexts: usize,

    /// Debug
    #[arg(long)]
    pub debug: bool,

    /// Analyze each method on its own, ignoring calls and the heap
    #[arg(long)]
    pub intra: bool,

    /// Quiet
    #[arg(long)]
    pub quiet: bool,

    /// Program, as JSON
    #[arg()]
    pub program: std::path::PathBuf,

    #[arg(long)]
    pub metrics: bool,

    /// Tracing
    #[arg(long)]
    pub tracing: bool,
}

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn setup_global_subscriber() -> Result<FlushGuard<io::BufWriter<std::fs::File>>> {
    let filter_layer = tracing::level_filters::LevelFilter::TRACE;
    let fmt_layer = fmt::Layer::default().with_writer(io::stderr);
    let (flame_layer, guard) =
        FlameLayer::with_file("./tracing.folded").context("Couldn't create tracing.folded")?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(flame_layer)
        .init();
    Ok(guard)
}

/// Value of every `int` definition, as (statement, variable name, value)
fn definitions(
    program: &Program,
    methods: &[MethodId],
    result: &DataflowResult<Node, CpFact>,
) -> Vec<(StmtId, String, Value)> {
    let mut defs = Vec::new();
    for m in methods {
        for (idx, stmt) in program.method(*m).stmts().iter().enumerate() {
            let Some(lhs) = stmt.def() else {
                continue;
            };
            if !program.var(lhs).ty.can_hold_int() {
                continue;
            }
            let s = StmtId::new(*m, idx);
            if let Some(out) = result.out_fact(Node::Stmt(s)) {
                defs.push((s, program.var_name(lhs), out.get(lhs)));
            }
        }
    }
    defs
}

fn main() -> Result<()> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let args = Args::parse();

    let _guard = if args.tracing {
        Some(setup_global_subscriber()?)
    } else if args.debug {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(io::stderr)
            .init();
        None
    } else {
        None
    };

    let json = std::fs::read_to_string(&args.program)
        .with_context(|| format!("Couldn't read program at {}", args.program.display()))?;
    let def: ProgramDef = serde_json::from_str(&json)
        .with_context(|| format!("Couldn't deserialize program at {}", args.program.display()))?;
    let program = Program::new(def).context("Malformed program")?;

    let defs = if args.intra {
        let mut defs = Vec::new();
        for (m, method) in program.methods() {
            if method.is_abstract() {
                continue;
            }
            let result = constprop::constant_propagation(&program, m);
            defs.extend(definitions(&program, &[m], &result));
        }
        defs
    } else {
        let opts = pointer::Options {
            selector: if args.contexts == 0 {
                Selector::Insensitive
            } else {
                Selector::Object
            },
            k: args.contexts,
            debug: args.debug,
            ..pointer::Options::default()
        };
        let pta = pointer::analysis(&program, &opts);
        let result = constprop::inter_constant_propagation(&program, &pta);
        definitions(&program, pta.ci_call_graph().reachable_methods(), &result)
    };

    if !args.quiet {
        let mut stdout = io::stdout().lock();
        for (s, var, val) in &defs {
            writeln!(stdout, "{} ⊢ {} = {}", s, var, val)?;
        }
    }

    if args.metrics {
        let mut stdout = io::stdout().lock();
        writeln!(stdout)?;
        writeln!(stdout, "metrics")?;
        writeln!(stdout, "-------")?;
        let nacs = defs.iter().filter(|(_, _, v)| v.is_nac()).count();
        writeln!(stdout, "nacs: {}", nacs)?;
        writeln!(stdout, "definitions: {}", defs.len())?;
    }
    Ok(())
}
