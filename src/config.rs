use crate::{
    error::{Error, Result},
    media::SizeCeiling,
};
use std::{
    env,
    fmt::{self, Debug},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15 * 60);
const DEFAULT_YTDLP_BIN: &str = "yt-dlp";
const DEFAULT_FFMPEG_BIN: &str = "ffmpeg";

/// Runtime configuration, built once at startup and handed to each
/// component.
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub log_level: String,
    pub download_dir: PathBuf,
    pub size_ceiling: SizeCeiling,
    /// Longest silence tolerated on a single read from Telegram.
    pub read_timeout: Duration,
    /// Wall-clock budget for a whole Telegram request, uploads included.
    pub request_timeout: Duration,
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,
    pub twitter_cookies: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// - `Error::MissingEnv` if `TELEGRAM_BOT_TOKEN` is unset or empty.
    /// - `Error::InvalidEnv` if a numeric variable does not parse, the size
    ///   ceiling is zero or overflows, or the request timeout is shorter than
    ///   the read timeout.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let token = get("TELEGRAM_BOT_TOKEN").ok_or(Error::MissingEnv("TELEGRAM_BOT_TOKEN"))?;

        let size_ceiling = match parse::<u64>("MAX_FILE_SIZE_MIB", get("MAX_FILE_SIZE_MIB"))? {
            None => SizeCeiling::DEFAULT,
            Some(mib) => SizeCeiling::from_mib(mib).ok_or_else(|| Error::InvalidEnv {
                key: "MAX_FILE_SIZE_MIB",
                value: mib.to_string(),
            })?,
        };

        let read_timeout = parse::<u64>("READ_TIMEOUT_SECS", get("READ_TIMEOUT_SECS"))?
            .map_or(DEFAULT_READ_TIMEOUT, Duration::from_secs);

        let request_timeout = parse::<u64>("REQUEST_TIMEOUT_SECS", get("REQUEST_TIMEOUT_SECS"))?
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs);
        if request_timeout < read_timeout {
            return Err(Error::InvalidEnv {
                key: "REQUEST_TIMEOUT_SECS",
                value: request_timeout.as_secs().to_string(),
            });
        }

        Ok(Self {
            token,
            log_level: get("LOG_LEVEL").map_or_else(
                || DEFAULT_LOG_LEVEL.to_owned(),
                |level| level.to_lowercase(),
            ),
            download_dir: get("DOWNLOAD_DIR").map_or_else(default_download_dir, PathBuf::from),
            size_ceiling,
            read_timeout,
            request_timeout,
            ytdlp_bin: get("YTDLP_BIN").unwrap_or_else(|| DEFAULT_YTDLP_BIN.to_owned()),
            ffmpeg_bin: get("FFMPEG_BIN").unwrap_or_else(|| DEFAULT_FFMPEG_BIN.to_owned()),
            twitter_cookies: get("TWITTER_SESSION_COOKIE_PATH")
                .map(PathBuf::from)
                .filter(|p| p.is_file()),
        })
    }

    /// Create the download directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the directory cannot be created.
    pub async fn ensure_download_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.download_dir).await?;
        Ok(())
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"[REDACTED]")
            .field("log_level", &self.log_level)
            .field("download_dir", &self.download_dir)
            .field("size_ceiling", &self.size_ceiling)
            .field("read_timeout", &self.read_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("ytdlp_bin", &self.ytdlp_bin)
            .field("ffmpeg_bin", &self.ffmpeg_bin)
            .field("twitter_cookies", &self.twitter_cookies)
            .finish()
    }
}

fn parse<T: FromStr>(key: &'static str, value: Option<String>) -> Result<Option<T>> {
    value
        .map(|v| v.parse::<T>().map_err(|_| Error::InvalidEnv { key, value: v }))
        .transpose()
}

/// `downloads/` next to the executable, or relative to the working
/// directory when the executable path is unknown.
fn default_download_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_DOWNLOAD_DIR)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR))
}
