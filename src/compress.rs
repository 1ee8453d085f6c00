use crate::{
    config::Config,
    error::{Error, Result},
    media::{MediaFile, SizeCeiling, TempPath},
    utils::run_command,
};
use std::{ffi::OsString, path::Path, sync::Arc};
use tracing::{error, info};

/// Re-encodes one file into another.
#[async_trait::async_trait]
pub trait Transcoder: Send + Sync {
    /// Short name used for logging etc.
    fn name(&self) -> &'static str;

    /// Write a re-encoded copy of `input` to `output`.
    async fn transcode(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Fixed encoding parameters used to shrink oversized videos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionProfile {
    pub height: u32,
    pub video_codec: String,
    pub video_bitrate: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for CompressionProfile {
    fn default() -> Self {
        Self {
            height: 480,
            video_codec: "libx264".into(),
            video_bitrate: "1M".into(),
            audio_codec: "aac".into(),
            audio_bitrate: "128k".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    bin: String,
    profile: CompressionProfile,
}

impl Ffmpeg {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            bin: config.ffmpeg_bin.clone(),
            profile: CompressionProfile::default(),
        }
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let p = &self.profile;
        vec![
            OsString::from("-hide_banner"),
            OsString::from("-loglevel"),
            OsString::from("error"),
            OsString::from("-i"),
            OsString::from(input),
            OsString::from("-vf"),
            // -2 keeps the aspect ratio with an even width, which libx264 requires
            OsString::from(format!("scale=-2:{}", p.height)),
            OsString::from("-c:v"),
            OsString::from(&p.video_codec),
            OsString::from("-b:v"),
            OsString::from(&p.video_bitrate),
            OsString::from("-c:a"),
            OsString::from(&p.audio_codec),
            OsString::from("-b:a"),
            OsString::from(&p.audio_bitrate),
            OsString::from("-f"),
            OsString::from("mp4"),
            OsString::from("-y"),
            OsString::from(output),
        ]
    }
}

#[async_trait::async_trait]
impl Transcoder for Ffmpeg {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        run_command(&self.bin, &self.args(input, output)).await
    }
}

/// Shrinks files that exceed the size ceiling.
#[derive(Clone)]
pub struct Compressor {
    transcoder: Arc<dyn Transcoder>,
    ceiling: SizeCeiling,
}

impl Compressor {
    #[must_use]
    pub fn new(transcoder: Arc<dyn Transcoder>, ceiling: SizeCeiling) -> Self {
        Self {
            transcoder,
            ceiling,
        }
    }

    /// Re-encode `input` into a `_compressed.mp4` sibling.
    ///
    /// The original is deleted whatever the outcome; a partial output is
    /// deleted on failure.
    ///
    /// # Errors
    ///
    /// Returns `Error::CompressionFailed` when the transcoder fails, writes
    /// nothing, or the result is still above the ceiling.
    pub async fn compress(&self, input: MediaFile) -> Result<MediaFile> {
        let output = TempPath::compressed_sibling(input.path());
        info!(
            transcoder = self.transcoder.name(),
            input = %input.path().display(),
            size = input.size(),
            ceiling = %self.ceiling,
            "compressing oversized video"
        );

        if let Err(err) = self.transcoder.transcode(input.path(), output.path()).await {
            error!(%err, "transcoder failed");
            return Err(Error::compression_failed(err.to_string()));
        }

        let compressed = output.into_media().await.map_err(|err| {
            error!(%err, "transcoder produced no output");
            Error::compression_failed(err.to_string())
        })?;

        if !self.ceiling.allows(compressed.size()) {
            error!(
                size = compressed.size(),
                ceiling = %self.ceiling,
                "compressed video is still too large"
            );
            return Err(Error::compression_failed(format!(
                "output is {} bytes, above {}",
                compressed.size(),
                self.ceiling
            )));
        }

        info!(
            original = input.size(),
            compressed = compressed.size(),
            "compression finished"
        );
        Ok(compressed)
    }
}
