//! Structured logging: one JSON object per line.
//!
//! Records look like
//! `{"level":"info","msg":"request_ok","status":200,"request_id":"…",…}`.
//! The event message becomes `msg`, the level is lower-case, and the event's
//! fields follow in the order they were recorded.

use serde_json::{Map, Value};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Event formatter writing one JSON object per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLines;

impl<S, N> FormatEvent<S, N> for JsonLines
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let mut record = Map::new();
        record.insert(
            "level".to_string(),
            Value::from(level_name(event.metadata().level())),
        );
        if let Some(message) = fields.message {
            record.insert("msg".to_string(), Value::from(message));
        }
        record.extend(fields.values);

        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    values: Map<String, Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.values.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{:?}", value)));
    }
}

/// Target of the per-invocation `request_ok`/`request_error` records.
pub const INVOCATION_TARGET: &str = "faas_runtime::function::adapter";

/// Build the filter from a `RUST_LOG`-style spec, defaulting to `info`.
///
/// Invocation records stay enabled at `info` whatever the spec says, so each
/// invocation still logs exactly one record under `RUST_LOG=warn`.
pub fn env_filter(spec: Option<&str>) -> EnvFilter {
    let filter = spec
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    match format!("{}=info", INVOCATION_TARGET).parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Build the process subscriber writing JSON lines to `writer`.
///
/// The filter comes from `RUST_LOG` (see [`env_filter`]).
pub fn subscriber<W>(writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let spec = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    subscriber_with_filter(writer, env_filter(spec.as_deref()))
}

/// Build a JSON-lines subscriber with an explicit filter.
pub fn subscriber_with_filter<W>(
    writer: W,
    filter: EnvFilter,
) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(JsonLines)
        .with_writer(writer)
        .finish()
}

/// Install the JSON-lines subscriber on stdout as the global default.
pub fn init() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    tracing::subscriber::set_global_default(subscriber(std::io::stdout))
}

#[cfg(test)]
pub(crate) mod capture {
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory log sink for assertions.
    #[derive(Clone, Default)]
    pub struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        pub fn records(&self) -> Vec<serde_json::Value> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    impl io::Write for Capture {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::capture::Capture;
    use super::*;

    #[test]
    fn test_record_shape() {
        let sink = Capture::default();
        let _guard =
            tracing::subscriber::set_default(subscriber_with_filter(sink.clone(), env_filter(None)));

        tracing::info!(status = 201u16, request_id = %"req-1", duration_ms = 3u64, "request_ok");
        tracing::error!(error = %"db unreachable", request_id = "req-2", "request_error");

        let records = sink.records();
        assert_eq!(records.len(), 2);

        let ok = records[0].as_object().unwrap();
        let keys: Vec<&str> = ok.keys().map(String::as_str).collect();
        assert_eq!(keys, ["level", "msg", "status", "request_id", "duration_ms"]);
        assert_eq!(ok["level"], "info");
        assert_eq!(ok["msg"], "request_ok");
        assert_eq!(ok["status"], 201);
        assert_eq!(ok["request_id"], "req-1");
        assert_eq!(ok["duration_ms"], 3);

        assert_eq!(records[1]["level"], "error");
        assert_eq!(records[1]["msg"], "request_error");
        assert_eq!(records[1]["error"], "db unreachable");
        assert_eq!(records[1]["request_id"], "req-2");
    }

    #[test]
    fn test_debug_is_filtered_by_default() {
        let sink = Capture::default();
        let _guard =
            tracing::subscriber::set_default(subscriber_with_filter(sink.clone(), env_filter(None)));

        tracing::debug!("request body unavailable");

        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_invocation_records_survive_quiet_filter() {
        let sink = Capture::default();
        let filter = env_filter(Some("warn"));
        let _guard = tracing::subscriber::set_default(subscriber_with_filter(sink.clone(), filter));

        tracing::info!(target: "faas_runtime::function::adapter", status = 200u16, "request_ok");
        tracing::info!(target: "faas_runtime::runtime::server", "listening");
        tracing::debug!(target: "faas_runtime::function::adapter", "request body unavailable");
        tracing::warn!(target: "faas_runtime::runtime::server", "slow accept");

        let records = sink.records();
        let messages: Vec<&str> = records
            .iter()
            .map(|record| record["msg"].as_str().unwrap())
            .collect();
        assert_eq!(messages, ["request_ok", "slow accept"]);
    }

    #[test]
    fn test_invalid_filter_spec_falls_back_to_info() {
        let sink = Capture::default();
        let filter = env_filter(Some("faas_runtime=notalevel"));
        let _guard = tracing::subscriber::set_default(subscriber_with_filter(sink.clone(), filter));

        tracing::info!("ready");
        tracing::debug!("noise");

        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn test_level_names() {
        assert_eq!(level_name(&Level::WARN), "warn");
        assert_eq!(level_name(&Level::TRACE), "trace");
    }
}
