// SPDX-License-Identifier: BSD-3-Clause
//! `tracing` layers for profiling the solvers.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{Id, Subscriber};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpanStats {
    pub entries: u64,
    pub busy: Duration,
}

/// Accumulates, per span name, how often spans were entered and how long
/// they were busy. Clones share the same totals, so one clone can be
/// installed in a subscriber and another used for [`SpanTimeLayer::report`].
#[derive(Clone, Debug, Default)]
pub struct SpanTimeLayer {
    totals: Arc<Mutex<FxHashMap<&'static str, SpanStats>>>,
}

impl SpanTimeLayer {
    /// Totals so far, sorted by decreasing busy time
    pub fn snapshot(&self) -> Vec<(&'static str, SpanStats)> {
        let mut stats: Vec<_> = match self.totals.lock() {
            Ok(totals) => totals.iter().map(|(k, v)| (*k, *v)).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .iter()
                .map(|(k, v)| (*k, *v))
                .collect(),
        };
        stats.sort_by(|a, b| b.1.busy.cmp(&a.1.busy).then(a.0.cmp(b.0)));
        stats
    }

    /// Print the totals to stderr
    pub fn report(&self) {
        for (name, stats) in self.snapshot() {
            eprintln!("{}: {} {}", name, stats.entries, stats.busy.as_nanos());
        }
    }
}

impl<S> Layer<S> for SpanTimeLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().replace(Instant::now());
        }
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            if let Some(start) = span.extensions_mut().remove::<Instant>() {
                let elapsed = start.elapsed();
                if let Ok(mut totals) = self.totals.lock() {
                    let stats = totals.entry(span.name()).or_default();
                    stats.entries += 1;
                    stats.busy += elapsed;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing::trace_span;
    use tracing_subscriber::prelude::*;

    use super::*;

    #[test]
    fn counts_entries() {
        let layer = SpanTimeLayer::default();
        let subscriber = tracing_subscriber::registry().with(layer.clone());
        tracing::subscriber::with_default(subscriber, || {
            for _ in 0..3 {
                let span = trace_span!("work");
                let _span = span.enter();
            }
        });
        let stats = layer.snapshot();
        assert_eq!(1, stats.len());
        assert_eq!("work", stats[0].0);
        assert_eq!(3, stats[0].1.entries);
    }
}
