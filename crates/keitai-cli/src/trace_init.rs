use std::path::Path;
use std::sync::Once;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keitai_core=info"))
}

/// Install the global subscriber: human-readable events on stderr, or JSONL
/// span/event records in `<trace_dir>/keitai-trace.jsonl` when a directory is given.
pub fn init_tracing(trace_dir: Option<&Path>) {
    INIT.call_once(|| match trace_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::never(dir, "keitai-trace.jsonl");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            std::mem::forget(guard); // flushed at process exit

            tracing_subscriber::fmt()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_env_filter(env_filter())
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_env_filter(env_filter())
                .init();
        }
    });
}
