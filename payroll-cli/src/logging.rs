use anyhow::Result;
use chrono::Local;
use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

// --- Event format ---

/// `<local timestamp> <LEVEL> <target> <fields>`, one event per line.
struct PayrollLogFormat;

fn level_colour(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "1;31",
        Level::WARN => "1;33",
        Level::INFO => "1;32",
        Level::DEBUG => "1;34",
        Level::TRACE => "1;35",
    }
}

/// Writes `text`, wrapped in the SGR `code` when colour is on.
fn paint(
    writer: &mut Writer<'_>,
    colour: bool,
    code: &str,
    text: impl std::fmt::Display,
) -> std::fmt::Result {
    if colour {
        write!(writer, "\x1b[{code}m{text}\x1b[0m ")
    } else {
        write!(writer, "{text} ")
    }
}

impl<S, N> FormatEvent<S, N> for PayrollLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = event.metadata().level();
        let colour = writer.has_ansi_escapes();
        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");

        paint(&mut writer, colour, "2", timestamp)?;
        paint(&mut writer, colour, level_colour(level), format_args!("{level:>5}"))?;
        paint(&mut writer, colour, "36", event.metadata().target())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// --- Log file ---

/// Writer target for the file layer. Empty until `--log-file` is given, and
/// events are dropped while it is empty.
#[derive(Clone, Default)]
struct FileSlot(Arc<Mutex<Option<File>>>);

impl FileSlot {
    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the slot lock for one event.
struct SlotGuard<'a>(MutexGuard<'a, Option<File>>);

impl Write for SlotGuard<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), |file| file.flush())
    }
}

impl<'a> MakeWriter<'a> for FileSlot {
    type Writer = SlotGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SlotGuard(self.lock())
    }
}

static FILE_SLOT: OnceLock<FileSlot> = OnceLock::new();

/// Builds the global filter. An explicit `level` wins over `RUST_LOG`;
/// with neither, `info`.
///
/// Accepts a bare level ("warn", "debug") or any EnvFilter directive.
fn make_filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|e| anyhow::anyhow!("invalid log level '{level}': {e}")),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

fn open_append(path: &Path) -> Result<File> {
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("cannot open log file '{}': {e}", path.display()))
}

/// Appends every later event to `path` as well as stderr. Calling it again
/// switches to the new file.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let Some(slot) = FILE_SLOT.get() else {
        anyhow::bail!("init_logging must run before enable_file_logging");
    };
    *slot.lock() = Some(open_append(path)?);
    Ok(())
}

/// Installs the global subscriber. A second call fails.
///
/// - Stderr: colored when attached to a terminal, plain when piped. Reports
///   are printed to stdout.
/// - File: inactive until [`enable_file_logging`] is called.
/// - Level: `level` if given, else `RUST_LOG`, else INFO.
pub fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = make_filter(level)?;

    let slot = FILE_SLOT.get_or_init(FileSlot::default).clone();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(PayrollLogFormat)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(PayrollLogFormat)
        .with_ansi(false)
        .with_writer(slot);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logging already initialized: {e}"))
}
