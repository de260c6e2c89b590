//! Logging setup for applications and benchmarks built on planar-lsq
//!
//! The library itself only emits `tracing` events: solve summaries at DEBUG, rejected
//! orderings at WARN and every constructed error at ERROR. Nothing is printed until a
//! subscriber is installed, e.g. with [`init_logger`].

use std::error::Error;
use tracing::Level;

/// Initialize the tracing subscriber with the default INFO level
///
/// Format: `[LEVEL YYYY-MM-DD HH:MM:SS module]` for INFO/WARN/ERROR
///         `[LEVEL YYYY-MM-DD HH:MM:SS file:line]` for DEBUG/TRACE
///
/// # Example
/// ```no_run
/// use planar_lsq::init_logger;
///
/// init_logger();
/// tracing::info!("Application started");
/// ```
///
/// # Environment Variables
/// Override the default log level using `RUST_LOG`:
/// ```bash
/// RUST_LOG=planar_lsq=debug cargo bench
/// ```
///
/// # Panics
/// If a global subscriber is already installed; use [`try_init_logger_with_level`]
/// where that can happen.
pub fn init_logger() {
    init_logger_with_level(Level::INFO)
}

/// Initialize the tracing subscriber with a custom default level
///
/// # Example
/// ```no_run
/// use planar_lsq::init_logger_with_level;
/// use tracing::Level;
///
/// init_logger_with_level(Level::DEBUG);
/// tracing::debug!("Debug logging enabled");
/// ```
pub fn init_logger_with_level(default_level: Level) {
    subscriber_builder(default_level).init();
}

/// Like [`init_logger_with_level`], but returns an error instead of panicking when a
/// global subscriber is already set.
pub fn try_init_logger_with_level(
    default_level: Level,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    subscriber_builder(default_level).try_init()
}

fn subscriber_builder(
    default_level: Level,
) -> tracing_subscriber::fmt::SubscriberBuilder<
    tracing_subscriber::fmt::format::DefaultFields,
    CustomFormatter,
    tracing_subscriber::EnvFilter,
> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .event_format(CustomFormatter)
}

/// Colored, fixed-width level tag.
fn level_tag(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[31mERROR\x1b[0m",
        Level::WARN => "\x1b[33mWARN\x1b[0m",
        Level::INFO => "\x1b[32mINFO\x1b[0m",
        Level::DEBUG => "\x1b[34mDEBUG\x1b[0m",
        Level::TRACE => "\x1b[35mTRACE\x1b[0m",
    }
}

/// File name without its directories.
fn short_file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Event formatter: bracketed level, local timestamp and origin, then the message
struct CustomFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for CustomFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        use chrono::Local;

        let metadata = event.metadata();
        let level = metadata.level();

        write!(
            writer,
            "[{} {} ",
            level_tag(level),
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;

        // DEBUG/TRACE point at the source line, the rest at the module
        match (metadata.file(), *level) {
            (Some(file), Level::DEBUG | Level::TRACE) => {
                write!(writer, "{}", short_file_name(file))?;
                if let Some(line) = metadata.line() {
                    write!(writer, ":{}", line)?;
                }
            }
            _ => write!(writer, "{}", metadata.target())?,
        }

        write!(writer, "] ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
