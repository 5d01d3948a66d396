use tracing_subscriber::{fmt::format::FmtSpan, fmt::SubscriberBuilder, EnvFilter};

use crate::util::env::{env_flag, env_opt};

/// Filter used by every binary when neither `RUST_LOG` nor a caller override is set.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,actix_web=info";

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `default_filter`. `LOG_COMPACT=1` switches to the single-line
/// compact formatter and `LOG_SPAN_CLOSE=1` emits an event (with timing) when an
/// instrumented data-access or core API span closes.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter = env_opt("RUST_LOG")
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter));

    let span_events = if env_flag("LOG_SPAN_CLOSE", false) {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let builder = SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_target(true)
        .with_line_number(true)
        .with_file(true);

    let installed = if env_flag("LOG_COMPACT", false) {
        builder.compact().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}
