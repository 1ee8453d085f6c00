use crate::{
    compress::Compressor,
    config::Config,
    error::{Error, Result},
    media::{MediaFile, SizeCeiling, TempPath, probe_media_kind},
    utils::run_command,
};
use std::{
    ffi::OsString,
    fmt::{self, Display},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{error, info, warn};

/// yt-dlp format expression to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSelector {
    /// Best single stream under the ceiling, otherwise the best available.
    UnderCeiling(SizeCeiling),
    /// Best available, no size filter.
    Best,
}

impl Display for FormatSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnderCeiling(ceiling) => write!(f, "best[filesize<{}]/best", ceiling.bytes()),
            Self::Best => f.write_str("best"),
        }
    }
}

/// Fetches a remote video into a local file.
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// Short name used for logging etc.
    fn name(&self) -> &'static str;

    /// Download `url` to exactly `output`.
    ///
    /// Implementations must report an unavailable format as
    /// `Error::FormatUnavailable` so the caller can relax the selector.
    async fn download(&self, url: &str, output: &Path, format: FormatSelector) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    bin: String,
    cookies_path: Option<PathBuf>,
}

impl YtDlp {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            bin: config.ytdlp_bin.clone(),
            cookies_path: config.twitter_cookies.clone(),
        }
    }

    fn args(&self, url: &str, output: &Path, format: FormatSelector) -> Vec<OsString> {
        let mut args = [
            "--quiet",
            "--no-warnings",
            "--no-progress",
            "--no-playlist",
            "--merge-output-format",
            "mp4",
            "--recode-video",
            "mp4",
        ]
        .into_iter()
        .map(OsString::from)
        .collect::<Vec<_>>();

        args.push("-f".into());
        args.push(format.to_string().into());
        args.push("-o".into());
        args.push(output.into());

        if let Some(cookies) = &self.cookies_path {
            args.push("--cookies".into());
            args.push(cookies.into());
        }

        args.push("--".into());
        args.push(url.into());
        args
    }
}

/// Map a failed yt-dlp run onto the structured error the fetcher acts on.
fn classify_ytdlp_error(err: Error) -> Error {
    match err {
        Error::ToolFailed { stderr, .. } if is_format_unavailable(&stderr) => {
            Error::FormatUnavailable(stderr)
        }
        Error::ToolFailed { stderr, code, .. } if stderr.is_empty() => {
            Error::ytdlp_failed(format!("exit code {code:?}"))
        }
        Error::ToolFailed { stderr, .. } => Error::ytdlp_failed(stderr),
        other => other,
    }
}

fn is_format_unavailable(stderr: &str) -> bool {
    stderr.to_lowercase().contains("format is not available")
}

#[async_trait::async_trait]
impl Downloader for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn download(&self, url: &str, output: &Path, format: FormatSelector) -> Result<()> {
        run_command(&self.bin, &self.args(url, output, format))
            .await
            .map_err(classify_ytdlp_error)
    }
}

/// Downloads a URL into the download directory and makes it fit the
/// size ceiling.
#[derive(Clone)]
pub struct Fetcher {
    downloader: Arc<dyn Downloader>,
    compressor: Compressor,
    download_dir: PathBuf,
    ceiling: SizeCeiling,
}

impl Fetcher {
    #[must_use]
    pub fn new(
        downloader: Arc<dyn Downloader>,
        compressor: Compressor,
        download_dir: impl Into<PathBuf>,
        ceiling: SizeCeiling,
    ) -> Self {
        Self {
            downloader,
            compressor,
            download_dir: download_dir.into(),
            ceiling,
        }
    }

    /// Fetch `url` as an MP4 no larger than the ceiling.
    ///
    /// Nothing is left on disk when this returns an error.
    ///
    /// # Errors
    ///
    /// - Propagates downloader errors (after the format fallback).
    /// - `Error::NoMediaFound` if the downloader reported success but wrote nothing.
    /// - `Error::UnknownMediaKind` if the output is clearly not a video.
    /// - `Error::CompressionFailed` if an oversized file could not be shrunk.
    pub async fn fetch(&self, url: &str) -> Result<MediaFile> {
        let output = TempPath::generate(&self.download_dir);
        info!(
            downloader = self.downloader.name(),
            url,
            output = %output.path().display(),
            "downloading video"
        );

        if let Err(err) = self.download_with_fallback(url, output.path()).await {
            error!(%err, url, "download failed");
            return Err(err);
        }

        let media = output.into_media().await.inspect_err(|err| {
            error!(%err, "download finished without an output file");
        })?;

        let kind = probe_media_kind(media.path()).await;
        if kind.is_definitely_not_video() {
            error!(?kind, path = %media.path().display(), "downloaded file is not a video");
            return Err(Error::UnknownMediaKind(format!("{kind:?}")));
        }

        if self.ceiling.allows(media.size()) {
            info!(size = media.size(), "download finished");
            return Ok(media);
        }

        warn!(
            size = media.size(),
            ceiling = %self.ceiling,
            "video exceeds the size ceiling, attempting compression"
        );
        self.compressor.compress(media).await
    }

    /// First attempt prefers a stream under the ceiling; only an
    /// unavailable format earns a second attempt with `best`.
    async fn download_with_fallback(&self, url: &str, output: &Path) -> Result<()> {
        let primary = FormatSelector::UnderCeiling(self.ceiling);
        match self.downloader.download(url, output, primary).await {
            Err(Error::FormatUnavailable(reason)) => {
                info!(%reason, "format not available, falling back to best available");
                self.downloader
                    .download(url, output, FormatSelector::Best)
                    .await
            }
            result => result,
        }
    }
}
