// SPDX-License-Identifier: BSD-3-Clause
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use tracing_flame::{FlameLayer, FlushGuard};
use tracing_subscriber::{fmt, prelude::*};

use oopta::analysis::pointer;
use oopta::layers::SpanTimeLayer;
use oopta::{Program, ProgramDef};

mod cli;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn setup_global_subscriber(
    times: &SpanTimeLayer,
) -> Result<FlushGuard<io::BufWriter<std::fs::File>>> {
    let filter_layer = tracing::level_filters::LevelFilter::TRACE;
    let fmt_layer = fmt::Layer::default().with_writer(io::stderr);
    let (flame_layer, guard) =
        FlameLayer::with_file("./tracing.folded").context("Couldn't create tracing.folded")?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(flame_layer)
        .with(times.clone())
        .init();
    Ok(guard)
}

fn read_program(path: &Path) -> Result<Program> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Couldn't read program at {}", path.display()))?;
    let def: ProgramDef = serde_json::from_str(&json)
        .with_context(|| format!("Couldn't deserialize program at {}", path.display()))?;
    Program::new(def).context("Malformed program")
}

fn main() -> Result<()> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let args = cli::Args::parse();

    let times = SpanTimeLayer::default();
    let _guard = if args.tracing {
        Some(setup_global_subscriber(&times)?)
    } else if args.debug {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(io::stderr)
            .init();
        None
    } else {
        None
    };

    let program = read_program(&args.program)?;

    let opts = pointer::Options {
        selector: args.selector.into(),
        k: args.k,
        order: args.order.with_seed(args.seed),
        check_assertions: args.check == cli::Check::Default,
        debug: args.debug,
        metrics: args.metrics,
    };
    let result = pointer::analysis(&program, &opts);

    if !args.quiet {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "reachable")?;
        writeln!(stdout, "---------")?;
        for (ctx, m) in result.call_graph().reachable_methods() {
            writeln!(
                stdout,
                "{} {}",
                result.context(*ctx),
                program.method_name(*m)
            )?;
        }
        writeln!(stdout)?;
        writeln!(stdout, "call_edges")?;
        writeln!(stdout, "----------")?;
        for e in result.call_graph().edges() {
            let ((caller_ctx, site), (callee_ctx, callee)) = (e.call_site, e.callee);
            writeln!(
                stdout,
                "{} {} --{}--> {} {}",
                result.context(caller_ctx),
                site,
                e.kind,
                result.context(callee_ctx),
                program.method_name(callee)
            )?;
        }
        writeln!(stdout)?;
        writeln!(stdout, "var_points_to")?;
        writeln!(stdout, "-------------")?;
        for v in result.vars() {
            for ctx in result.contexts_of(v) {
                let pts = result.cs_points_to(ctx, v);
                if pts.is_empty() {
                    continue;
                }
                let objs: Vec<_> = pts
                    .iter()
                    .map(|o| {
                        let obj = result.obj(*o);
                        format!("{} {}", result.context(obj.context), obj)
                    })
                    .collect();
                writeln!(
                    stdout,
                    "{} {} --> {{{}}}",
                    result.context(ctx),
                    program.var_name(v),
                    objs.join(", ")
                )?;
            }
        }
    }

    if args.metrics {
        let mut stdout = io::stdout().lock();
        if let Some(m) = result.metrics() {
            writeln!(stdout)?;
            writeln!(stdout, "metrics")?;
            writeln!(stdout, "-------")?;
            writeln!(stdout, "reachable methods: {}", m.reachable_methods)?;
            writeln!(stdout, "call graph edges: {}", m.call_graph_edges)?;
            writeln!(stdout, "pointers: {}", m.pointers)?;
            writeln!(stdout, "pointer flow edges: {}", m.pfg_edges)?;
            writeln!(stdout, "objects: {}", m.objects)?;
            writeln!(stdout, "contexts: {}", m.contexts)?;
            writeln!(stdout, "points-to facts: {}", m.points_to_facts)?;
        }
    }

    if args.tracing {
        times.report();
    }

    Ok(())
}
