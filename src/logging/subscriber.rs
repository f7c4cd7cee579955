//! Tracing subscriber setup: console formatter and initialisation.
use super::logger::{ENTRY_TARGET, STAGE_TARGET};
use super::utils::truncate_chars;

/// Maximum number of characters of captured command output echoed when a
/// log entry is mirrored to the console.
const MIRROR_OUTPUT_CHARS: usize = 500;

/// Extracts the `message` field and the captured command output fields from
/// a [`tracing::Event`].
#[derive(Default)]
struct FieldExtractor {
    message: String,
    stdout: String,
    stderr: String,
    returncode: Option<i64>,
}

impl tracing::field::Visit for FieldExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "stdout" => self.stdout = value.to_string(),
            "stderr" => self.stderr = value.to_string(),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        if field.name() == "returncode" {
            self.returncode = Some(value);
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that emits installer-style
/// console output.
struct InstallerFormatter;

impl InstallerFormatter {
    fn format_entry(
        writer: &mut tracing_subscriber::fmt::format::Writer<'_>,
        level: tracing::Level,
        fields: &FieldExtractor,
    ) -> std::fmt::Result {
        let (prefix, label) = match level {
            tracing::Level::ERROR => ("\x1b[31m❌\x1b[0m", "ERROR"),
            tracing::Level::WARN => ("\x1b[33m⚠️ \x1b[0m", "WARNING"),
            _ => ("ℹ️ ", "INFO"),
        };
        writeln!(writer, "{prefix}[{label}] {}", fields.message)?;
        if !fields.stdout.is_empty() {
            writeln!(
                writer,
                "  stdout: {}",
                truncate_chars(&fields.stdout, MIRROR_OUTPUT_CHARS)
            )?;
        }
        if !fields.stderr.is_empty() {
            writeln!(
                writer,
                "  stderr: {}",
                truncate_chars(&fields.stderr, MIRROR_OUTPUT_CHARS)
            )?;
        }
        if let Some(code) = fields.returncode {
            writeln!(writer, "  returncode: {code}")?;
        }
        Ok(())
    }
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for InstallerFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut fields = FieldExtractor::default();
        event.record(&mut fields);
        let msg = &fields.message;

        if target == ENTRY_TARGET {
            return Self::format_entry(&mut writer, level, &fields);
        }

        match level {
            tracing::Level::ERROR => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}"),
            tracing::Level::WARN => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}"),
            tracing::Level::INFO if target == STAGE_TARGET => {
                writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m")
            }
            tracing::Level::INFO => writeln!(writer, "{msg}"),
            _ => writeln!(writer, "\x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Sets up a console subscriber that formats events to match the installer
/// output style. Log-file entries mirrored by
/// [`Logger`](super::Logger) are shown only when `verbose` is set; the
/// install log itself is written directly by the logger and does not depend
/// on the subscriber. `RUST_LOG` may raise the console level for debugging.
/// Must be called once at program startup, before any logging.
pub fn init_subscriber(verbose: bool) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(InstallerFormatter)
        .with_writer(make_writer)
        .with_filter(filter::filter_fn(move |metadata| {
            verbose || metadata.target() != ENTRY_TARGET
        }))
        .with_filter(env_filter);

    tracing_subscriber::registry().with(console_layer).init();
}
