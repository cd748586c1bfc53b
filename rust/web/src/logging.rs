use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "info,blackjack_web=debug,blackjack_engine=debug";

/// Output format of the process-wide subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format `{other}` (expected pretty or json)")),
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(format: LogFormat) -> Result<(), String> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    let result = match format {
        LogFormat::Pretty => builder.with_file(true).with_line_number(true).try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };
    result.map_err(|err| err.to_string())
}

/// A captured tracing event
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Collects events in memory so tests can assert on what was logged.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CapturedLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn with_message(&self, message: &str) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|entry| entry.message.contains(message))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn layer<S>(&self) -> CaptureLayer<S>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        CaptureLayer {
            logs: self.clone(),
            _phantom: PhantomData,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct CaptureLayer<S> {
    logs: CapturedLogs,
    _phantom: PhantomData<S>,
}

impl<S> Layer<S> for CaptureLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.logs.lock().push(LogEntry {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.fields.push((field.name().to_string(), rendered));
        }
    }
}

/// Scoped capture: events on this thread go to the returned logs until the
/// guard drops.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::new();
    let registry = Registry::default().with(logs.layer::<Registry>());
    let guard = tracing::subscriber::set_default(registry);
    (logs, guard)
}

/// Global capture shared by every test in the process, for code that logs from
/// spawned tasks on other threads.
pub fn init_test_logging() -> CapturedLogs {
    static LOGS: OnceLock<CapturedLogs> = OnceLock::new();
    static REGISTERED: OnceLock<()> = OnceLock::new();

    let logs = LOGS.get_or_init(CapturedLogs::new);

    REGISTERED.get_or_init(|| {
        let registry = Registry::default().with(logs.layer::<Registry>());
        if let Err(err) = tracing::subscriber::set_global_default(registry) {
            eprintln!("test log capture not installed: {err}");
        }
    });

    logs.clear();
    logs.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_engine::engine::{Command, RoundEngine};
    use blackjack_engine::shoe::Shoe;
    use blackjack_engine::store::{KvStatsRepository, MemoryStore};
    use tracing::{debug, error, info, warn};

    #[test]
    fn captures_levels_in_order() {
        let (logs, _guard) = capture_logs();
        debug!("debug message");
        info!("info message");
        warn!("warn message");
        error!("error message");

        let levels: Vec<_> = logs.entries().iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![Level::DEBUG, Level::INFO, Level::WARN, Level::ERROR]);
    }

    #[test]
    fn captures_structured_fields() {
        let (logs, _guard) = capture_logs();
        info!(session_id = "abc123", chips = 950, "bet placed");

        let entry = &logs.with_message("bet placed")[0];
        assert_eq!(entry.field("session_id"), Some("abc123"));
        assert_eq!(entry.field("chips"), Some("950"));
        assert_eq!(entry.field("missing"), None);
    }

    #[test]
    fn clear_discards_entries() {
        let (logs, _guard) = capture_logs();
        info!("first");
        logs.clear();
        assert!(logs.entries().is_empty());
        info!("second");
        assert_eq!(logs.entries().len(), 1);
    }

    #[test]
    fn engine_settlement_is_logged() {
        let (logs, _guard) = capture_logs();
        let mut engine = RoundEngine::new(
            KvStatsRepository::new(MemoryStore::new()),
            Shoe::new_with_seed(11),
        );
        engine.apply(Command::Bet { amount: 25 }).unwrap();
        engine.apply(Command::Deal).unwrap();
        if engine.phase() == blackjack_engine::Phase::Playing {
            engine.apply(Command::Stand).unwrap();
        }

        let settled = logs.with_message("round settled");
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].level, Level::INFO);
        assert_eq!(settled[0].target, "blackjack_engine::engine");
        assert_eq!(settled[0].field("bet"), Some("25"));
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
