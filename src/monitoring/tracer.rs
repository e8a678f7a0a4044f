/*!
 * Structured Logging
 * Subscriber setup and per-cycle spans for the control loops
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Cycles slower than this are logged at warn level
const SLOW_CYCLE: Duration = Duration::from_millis(100);

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - STABILITY_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("STABILITY_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    // Another subscriber may already be installed by the host application
    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::NONE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "Stability tracing initialized");
    }
}

/// Span covering one control-loop cycle
///
/// Logs completion on drop, at warn level when the cycle was slow.
pub struct CycleSpan {
    span: tracing::Span,
    start: Instant,
    cycle_id: String,
}

impl CycleSpan {
    pub fn new(loop_name: &'static str) -> Self {
        let cycle_id = Uuid::new_v4().to_string();
        let span = span!(
            Level::DEBUG,
            "control_cycle",
            cycle_id = %cycle_id,
            control_loop = loop_name,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            cycle_id,
        }
    }

    pub fn cycle_id(&self) -> &str {
        &self.cycle_id
    }

    pub fn record_result(&self, success: bool) {
        self.span
            .record("result", if success { "success" } else { "error" });
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for CycleSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration > SLOW_CYCLE {
            warn!(
                cycle_id = %self.cycle_id,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow control cycle"
            );
        } else {
            debug!(
                cycle_id = %self.cycle_id,
                duration_us = duration.as_micros() as u64,
                "control cycle completed"
            );
        }
    }
}

/// Helper to create a cycle span
#[inline]
pub fn span_cycle(loop_name: &'static str) -> CycleSpan {
    CycleSpan::new(loop_name)
}
