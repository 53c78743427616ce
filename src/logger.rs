//! Process-wide logging on top of log4rs.
//!
//! Three rolling files are written under the chosen directory:
//! `app.log` (root), `audit.log` (target `restdsl::audit`, write operations)
//! and `metrics.log` (target `restdsl::metrics`, query-shape timings).
//! Optionally `dev6.log` receives developer bench lines emitted with `dev6!`.

use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

use crate::utils::devlog::DEV6_TARGET;

pub const AUDIT_TARGET: &str = "restdsl::audit";
pub const METRICS_TARGET: &str = "restdsl::metrics";

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

static HANDLE: Mutex<Option<log4rs::Handle>> = Mutex::new(None);

type BoxError = Box<dyn std::error::Error>;

fn level_from_str(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, BoxError> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?;
    Ok(appender)
}

/// Configure logging for the process. Calling it again replaces the active config.
/// - dir: base directory for log files; current directory when None
/// - level: error|warn|info|debug|trace|off (default info)
/// - retention: number of rolled files kept per log (default 7)
///
/// # Errors
/// Fails when the directory or an appender cannot be created, or when a
/// non-log4rs logger is already installed.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
) -> Result<(), BoxError> {
    configure_logging_with_dev(dir, level, retention, false)
}

/// Same as [`configure_logging`], optionally routing `dev6!` lines to `dev6.log`.
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_logging_with_dev(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
    enable_dev6: bool,
) -> Result<(), BoxError> {
    let base = match dir {
        Some(d) => PathBuf::from(d),
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&base)?;
    let keep = u32::try_from(retention.unwrap_or(7)).unwrap_or(u32::MAX);
    let lvl = level_from_str(level);

    let mut builder = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(&base, "app", keep)?)))
        .appender(Appender::builder().build("audit", Box::new(rolling(&base, "audit", keep)?)))
        .appender(Appender::builder().build("metrics", Box::new(rolling(&base, "metrics", keep)?)))
        .logger(Logger::builder().appender("audit").additive(false).build(AUDIT_TARGET, lvl))
        .logger(Logger::builder().appender("metrics").additive(false).build(METRICS_TARGET, lvl));

    builder = if enable_dev6 {
        builder
            .appender(Appender::builder().build("dev6", Box::new(rolling(&base, "dev6", keep)?)))
            .logger(
                Logger::builder()
                    .appender("dev6")
                    .additive(false)
                    .build(DEV6_TARGET, LevelFilter::Trace),
            )
    } else {
        builder.logger(Logger::builder().additive(false).build(DEV6_TARGET, LevelFilter::Off))
    };

    let config = builder.build(Root::builder().appender("app").build(lvl))?;
    let mut slot = HANDLE.lock();
    match slot.as_ref() {
        Some(handle) => handle.set_config(config),
        None => *slot = Some(log4rs::init_config(config)?),
    }
    Ok(())
}

/// Configure logging from environment variables, when present:
/// `RESTDSL_LOG_DIR`, `RESTDSL_LOG_LEVEL`, `RESTDSL_LOG_RETENTION`, `RESTDSL_DEV6`.
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_env() -> Result<(), BoxError> {
    let dir = std::env::var("RESTDSL_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("RESTDSL_LOG_LEVEL").ok();
    let retention =
        std::env::var("RESTDSL_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok());
    let dev6 = std::env::var("RESTDSL_DEV6")
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    configure_logging_with_dev(dir.as_deref(), level.as_deref(), retention, dev6)
}
