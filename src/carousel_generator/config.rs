//! Runtime settings, read from command-line flags with environment-variable fallbacks.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::level_filters::LevelFilter;

use crate::infrastructure::drive_uploader::DRIVE_UPLOAD_URL;

/// Command-line arguments for the carousel generator binary.
#[derive(Debug, Parser)]
#[command(name = "carousel_generator", version, about = "Carousel slide generator server")]
pub struct CliArgs {
    /// Listener host.
    #[arg(long, env = "CAROUSEL_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Listener port.
    #[arg(long, env = "CAROUSEL_PORT", default_value_t = 3300)]
    pub port: u16,

    /// Deployment environment; development adds error details to 500 responses.
    #[arg(long, env = "CAROUSEL_ENV", value_enum, default_value_t = RunEnvironment::Production)]
    pub environment: RunEnvironment,

    /// Base log level (trace|debug|info|warn|error). RUST_LOG takes precedence.
    #[arg(long, env = "CAROUSEL_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    #[arg(long, env = "CAROUSEL_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Largest accepted request body in bytes. Inline `data:` backgrounds count towards it.
    #[arg(long, env = "CAROUSEL_MAX_BODY_BYTES", default_value_t = 6 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Accepted requests per client within one window.
    #[arg(
        long,
        env = "CAROUSEL_RATE_LIMIT_MAX_REQUESTS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub rate_limit_max_requests: u32,

    #[arg(
        long,
        env = "CAROUSEL_RATE_LIMIT_WINDOW_SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rate_limit_window_secs: u64,

    /// Timeout for each HTTP hop while downloading a background.
    #[arg(
        long,
        env = "CAROUSEL_FETCH_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub fetch_timeout_secs: u64,

    #[arg(long, env = "CAROUSEL_MAX_REDIRECTS", default_value_t = 10)]
    pub max_redirects: u32,

    /// Extra directory of font files to load next to the system fonts.
    #[arg(long, env = "CAROUSEL_FONTS_DIR", value_name = "PATH")]
    pub fonts_dir: Option<PathBuf>,

    #[arg(long, env = "CAROUSEL_DRIVE_UPLOAD_URL", default_value = DRIVE_UPLOAD_URL)]
    pub drive_upload_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunEnvironment {
    Production,
    Development,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub rate_limit: RateLimitSettings,
    pub fetch: FetchSettings,
    pub fonts_dir: Option<PathBuf>,
    pub drive_upload_url: String,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub environment: RunEnvironment,
    pub max_body_bytes: usize,
}

impl ServerSettings {
    pub fn expose_error_details(&self) -> bool {
        self.environment != RunEnvironment::Production
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub max_redirects: u32,
}

impl From<CliArgs> for Settings {
    fn from(args: CliArgs) -> Self {
        Self {
            server: ServerSettings {
                addr: SocketAddr::new(args.host, args.port),
                environment: args.environment,
                max_body_bytes: args.max_body_bytes,
            },
            logging: LoggingSettings {
                level: args.log_level,
                format: args.log_format,
            },
            rate_limit: RateLimitSettings {
                max_requests: args.rate_limit_max_requests,
                window: Duration::from_secs(args.rate_limit_window_secs),
            },
            fetch: FetchSettings {
                timeout: Duration::from_secs(args.fetch_timeout_secs),
                max_redirects: args.max_redirects,
            },
            fonts_dir: args.fonts_dir,
            drive_upload_url: args.drive_upload_url,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        CliArgs::parse().into()
    }
}
