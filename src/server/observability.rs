//! Structured logging and tracing configuration.
//!
//! Console output keeps ANSI colors when writing to a terminal; JSON output
//! is plain and suited for log shippers. Each run can also write a plain
//! text session log under `logs/`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
    Registry,
};

use crate::config::Config;
use crate::{Error, Result};

/// Default directory for session log files.
pub const SESSION_LOG_DIR: &str = "logs";

const SESSION_FILE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S%.3f";
const SESSION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %Z";

/// Tracing configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON output format
    pub json: bool,
    /// Directory for the per-run session log, or `None` to skip it
    pub session_dir: Option<PathBuf>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            session_dir: None,
        }
    }
}

impl From<&Config> for TracingConfig {
    fn from(config: &Config) -> Self {
        Self {
            level: config.log_level.to_lowercase(),
            json: config.log_json,
            session_dir: None,
        }
    }
}

/// Per-run log file.
///
/// Holds the background writer. Dropping it flushes pending lines and
/// appends the session footer.
#[derive(Debug)]
pub struct SessionLog {
    path: PathBuf,
    guard: Option<WorkerGuard>,
}

impl SessionLog {
    /// Create `dir/session_<timestamp>.log` and write the session header.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn create(dir: &Path) -> Result<(Self, NonBlocking)> {
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::internal(format!(
                "failed to create logs directory '{}': {e}",
                dir.display()
            ))
        })?;

        let started = Local::now();
        let path = dir.join(format!(
            "session_{}.log",
            started.format(SESSION_FILE_FORMAT)
        ));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                Error::internal(format!(
                    "failed to create log file '{}': {e}",
                    path.display()
                ))
            })?;
        writeln!(
            file,
            "=== Icon Server Session Started at {} ===",
            started.format(SESSION_TIME_FORMAT)
        )?;
        writeln!(file, "Version: {}\n", env!("CARGO_PKG_VERSION"))?;

        let (writer, guard) = tracing_appender::non_blocking(file);
        Ok((
            Self {
                path,
                guard: Some(guard),
            },
            writer,
        ))
    }

    /// Path of the session log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SessionLog {
    fn drop(&mut self) {
        // Flush the background writer before the footer goes in.
        drop(self.guard.take());

        let footer = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .and_then(|mut file| {
                writeln!(
                    file,
                    "\n=== Session Ended at {} ===",
                    Local::now().format(SESSION_TIME_FORMAT)
                )
            });
        if let Err(e) = footer {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to close session log");
        }
    }
}

/// Plain text layer for the session log file.
fn session_layer<S>(
    writer: NonBlocking,
) -> fmt::Layer<S, fmt::format::DefaultFields, fmt::format::Format, NonBlocking>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `config.level`. When
/// `config.session_dir` is set, everything logged to the console is also
/// written to a session file there. Keep the returned [`SessionLog`] alive
/// for the whole run.
///
/// # Errors
///
/// Returns an error if the session log cannot be created or a global
/// subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<Option<SessionLog>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (session, file_layer) = match &config.session_dir {
        Some(dir) => {
            let (session, writer) = SessionLog::create(dir)?;
            (Some(session), Some(session_layer(writer)))
        }
        None => (None, None),
    };

    let installed = if config.json {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_current_span(true);
        Registry::default()
            .with(env_filter)
            .with(file_layer)
            .with(json_layer)
            .try_init()
    } else {
        let fmt_layer = fmt::layer().with_target(false).with_thread_names(true);
        Registry::default()
            .with(env_filter)
            .with(file_layer)
            .with(fmt_layer)
            .try_init()
    };
    installed.map_err(|e| Error::internal(format!("failed to install tracing subscriber: {e}")))?;

    tracing::debug!(level = %config.level, json = config.json, "Tracing initialized");
    if let Some(session) = &session {
        tracing::info!(path = %session.path().display(), "Session log started");
    }
    Ok(session)
}

/// Spans shared by the HTTP layer and the rebuild loop.
pub mod spans {
    use std::net::SocketAddr;
    use std::path::Path;

    use axum::extract::ConnectInfo;
    use axum::http::{header, Request};
    use tracing::{info_span, Span};

    use crate::cache::ASSET_ROUTE_PREFIX;

    /// Span for one HTTP request.
    #[must_use]
    pub fn request_span<B>(request: &Request<B>) -> Span {
        let headers = request.headers();
        let request_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");

        info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            client_ip = %client_ip(request),
            icon = %icon_name(request.uri().path()).unwrap_or("N/A"),
            user_agent = %user_agent,
        )
    }

    /// Client address: `X-Forwarded-For` if present, else the peer address.
    #[must_use]
    pub fn client_ip<B>(request: &Request<B>) -> String {
        if let Some(forwarded) = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
        {
            return forwarded.trim().to_string();
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(|| "unknown".to_string(), |info| info.0.ip().to_string())
    }

    /// Asset name addressed by `path`, if it is an asset request.
    #[must_use]
    pub fn icon_name(path: &str) -> Option<&str> {
        path.strip_prefix(ASSET_ROUTE_PREFIX)
            .filter(|name| !name.is_empty() && *name != "list")
    }

    /// Span covering one snapshot rebuild.
    #[must_use]
    pub fn rebuild_span(dir: &Path, generation: u64) -> Span {
        info_span!(
            "rebuild",
            dir = %dir.display(),
            generation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::Request;
    use std::net::SocketAddr;
    use tempfile::TempDir;

    #[test]
    fn test_tracing_config_default() {
        let config = TracingConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
        assert!(config.session_dir.is_none());
    }

    #[test]
    fn test_tracing_config_from_config() {
        let config = Config {
            log_level: "DEBUG".to_string(),
            log_json: true,
            ..Default::default()
        };
        assert_eq!(
            TracingConfig::from(&config),
            TracingConfig {
                level: "debug".to_string(),
                json: true,
                session_dir: None,
            }
        );
    }

    #[test]
    fn test_init_tracing_twice_errors() {
        let config = TracingConfig::default();
        // Whichever call installs first wins; the next must report an error.
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }

    #[test]
    fn test_session_log_is_plain_text() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(SESSION_LOG_DIR);
        let (session, writer) = SessionLog::create(&dir).unwrap();
        let path = session.path().to_path_buf();

        let subscriber = Registry::default().with(session_layer(writer));
        tracing::subscriber::with_default(subscriber, || {
            let span = spans::rebuild_span(Path::new("/srv/icons"), 2);
            let _guard = span.enter();
            tracing::info!(icons = 3, "Loaded icons");
            tracing::error!("Rebuild failed");
        });
        drop(session);

        let file_name = path.file_name().unwrap().to_str().unwrap();
        assert!(file_name.starts_with("session_"));
        assert!(file_name.ends_with(".log"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("=== Icon Server Session Started at "));
        assert!(contents.contains(&format!("Version: {}", env!("CARGO_PKG_VERSION"))));
        assert!(contents.contains("Loaded icons"));
        assert!(contents.contains("icons=3"));
        assert!(contents.contains("Rebuild failed"));
        assert!(contents.contains("=== Session Ended at "));
        assert!(!contents.contains('\x1b'), "session log holds ANSI escapes");
    }

    #[test]
    fn test_session_log_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("logs");
        let (session, _writer) = SessionLog::create(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(session.path().starts_with(&dir));
    }

    #[test]
    fn test_session_log_bad_directory() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("logs");
        std::fs::write(&blocker, "not a directory").unwrap();
        assert!(SessionLog::create(&blocker).is_err());
    }

    #[test]
    fn test_icon_name() {
        assert_eq!(spans::icon_name("/assets/box.svg"), Some("box.svg"));
        assert_eq!(spans::icon_name("/assets/list"), None);
        assert_eq!(spans::icon_name("/assets/"), None);
        assert_eq!(spans::icon_name("/health"), None);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let mut request = Request::builder()
            .uri("/assets/box.svg")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        let peer: SocketAddr = "10.0.0.1:55000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(spans::client_ip(&request), "203.0.113.7");

        request.headers_mut().remove("x-forwarded-for");
        assert_eq!(spans::client_ip(&request), "10.0.0.1");

        let bare = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(spans::client_ip(&bare), "unknown");
    }

    #[test]
    fn test_span_creation() {
        let request = Request::builder()
            .uri("/assets/box.svg")
            .header("x-request-id", "req-123")
            .header("user-agent", "curl/8.0")
            .body(Body::empty())
            .unwrap();
        let span = spans::request_span(&request);
        let _guard = span.enter();

        let span = spans::rebuild_span(std::path::Path::new("/srv/icons"), 3);
        let _guard = span.enter();
    }
}
