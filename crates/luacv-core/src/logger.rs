//! Diagnostics for script runners.
//!
//! A Lua script owns stdout, so everything the bindings report goes to
//! stderr as `luacv: <level> <target>: <message>`. Records from the
//! codec and device crates underneath are noise for script authors and
//! only show up at `trace`.

use std::io::Write;
use std::sync::OnceLock;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Level for `-v` style verbosity counts; `0` keeps `quiet`.
pub fn verbosity_level(verbose: u8, quiet: LevelFilter) -> LevelFilter {
    match verbose {
        0 => quiet,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn is_binding_target(target: &str) -> bool {
    target
        .split("::")
        .next()
        .is_some_and(|root| root == "luacv" || root.starts_with("luacv_"))
}

fn shown(metadata: &Metadata, max: LevelFilter) -> bool {
    metadata.level() <= max && (max == LevelFilter::Trace || is_binding_target(metadata.target()))
}

fn tag(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warning",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

struct ScriptLogger;

impl Log for ScriptLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        shown(metadata, log::max_level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(
            std::io::stderr().lock(),
            "luacv: {} {}: {}",
            tag(record.level()),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: ScriptLogger = ScriptLogger;
static INSTALLED: OnceLock<()> = OnceLock::new();

/// Route `log` records to stderr at `level`.
///
/// The first call installs the logger; later calls only change the level.
/// Fails when a different logger is already installed.
pub fn init_stderr_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if INSTALLED.get().is_none() {
        log::set_logger(&LOGGER)?;
        let _ = INSTALLED.set(());
    }
    log::set_max_level(level);
    Ok(())
}

/// Install a `tracing` subscriber on stderr with span timings.
///
/// `RUST_LOG` wins when set; otherwise the binding crates log at `level`
/// and everything else at `warn`. `log` records are bridged by
/// `tracing-subscriber`.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let directives = format!(
        "warn,luacv={level},luacv_core={level},luacv_chessboard={level},luacv_highgui={level}"
    );
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(fmt::time::Uptime::default())
        .with_writer(std::io::stderr)
        .finish()
        .try_init();
}
