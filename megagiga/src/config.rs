use clap::Parser;
use std::{path::PathBuf, time::Duration};

/// A terminal client for the megagiga crypto dashboard
#[derive(Debug, Parser)]
#[clap(version)]
pub struct Config {
    /// Base URL of the auth server. Endpoints are resolved relative to this,
    /// so include a trailing slash if it has a path.
    #[clap(long, env = "MEGAGIGA_SERVER", default_value = "http://127.0.0.1:8080/")]
    pub server: String,

    /// Where should we store data?
    #[clap(long, env = "MEGAGIGA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Request timeout, in seconds
    #[clap(long, env = "MEGAGIGA_REQUEST_TIMEOUT", default_value = "10", value_parser = duration_parser)]
    pub request_timeout: Duration,
}

/// Parse a whole number of seconds
fn duration_parser(s: &str) -> Result<Duration, std::num::ParseIntError> {
    s.parse().map(Duration::from_secs)
}

impl Config {
    /// Get either the configured or a default data directory. If no data
    /// directory can be found (e.g. because `$HOME` is unset) we will use the
    /// current directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| {
                directories::ProjectDirs::from("com", "example", "megagiga")
                    .map(|dirs| dirs.data_local_dir().to_owned())
            })
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// The HTTP client every request goes through.
    ///
    /// ## Errors
    ///
    /// Errors if the TLS backend can't be initialized.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
    }
}
