use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use lazy_static::lazy_static;

lazy_static! {
    pub static ref QUIZ_QUESTIONS_CNTR: CounterVec = register_counter_vec!(
        "quiz_questions_served_total",
        "Number of questions drawn for quizzes",
        &["category"]
    )
    .unwrap();
    pub static ref QUESTIONS_CREATED_CNTR: Counter = register_counter!(
        "questions_created_total",
        "Number of questions created through the API"
    )
    .unwrap();
    pub static ref QUESTIONS_DELETED_CNTR: Counter = register_counter!(
        "questions_deleted_total",
        "Number of questions deleted through the API"
    )
    .unwrap();
}

/// Request spans from `TraceLayer` are emitted at debug, statement logs from sqlx at info.
const DEFAULT_FILTER: &str = "info,tower_http=debug,sqlx=warn";

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. `LOG_LEVEL` takes `EnvFilter` directives; a missing or
/// unparsable value falls back to the default filter.
pub fn init_tracing() {
    let mut fmt_layer = fmt::layer();
    if std::env::var("INCLUDE_SPAN_EVENTS").is_ok_and(|value| value.eq_ignore_ascii_case("true")) {
        fmt_layer = fmt_layer.with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);
    }
    let directives = std::env::var("LOG_LEVEL").ok();
    let filter_layer = filter_from(directives.as_deref());

    if let Err(error) = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
    {
        eprintln!("Tracing is already initialised: {error}");
    }
}
