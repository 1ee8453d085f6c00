use crate::error::{Error, Result};
use std::{
    ffi::OsStr,
    fmt::{self, Display},
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{fs::File, io::AsyncReadExt};
use tracing::{debug, warn};

const FILE_PREFIX: &str = "x_video_";
const COMPRESSED_SUFFIX: &str = "_compressed";
const MIB: u64 = 1024 * 1024;

/// Upper bound on the size of any file we hand to Telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeCeiling(u64);

impl SizeCeiling {
    pub const DEFAULT: Self = Self(50 * MIB);

    /// `None` for zero or for sizes that do not fit in a `u64` byte count.
    #[inline]
    #[must_use]
    pub const fn from_mib(mib: u64) -> Option<Self> {
        match mib.checked_mul(MIB) {
            Some(bytes) if bytes > 0 => Some(Self(bytes)),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// A file of exactly the ceiling size is still allowed.
    #[inline]
    #[must_use]
    pub const fn allows(self, size: u64) -> bool {
        size <= self.0
    }
}

impl Default for SizeCeiling {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for SizeCeiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % MIB == 0 {
            write!(f, "{} MiB", self.0 / MIB)
        } else {
            write!(f, "{} B", self.0)
        }
    }
}

/// A path reserved for a transient artifact.
///
/// The file (if any) is removed when the value is dropped, so every exit
/// path of a request cleans up after itself.
#[derive(Debug)]
pub struct TempPath(PathBuf);

impl TempPath {
    /// Reserve a fresh `x_video_<hex>.mp4` path inside `dir`.
    #[must_use]
    pub fn generate(dir: &Path) -> Self {
        let suffix: u32 = rand::random();
        Self(dir.join(format!("{FILE_PREFIX}{suffix:08x}.mp4")))
    }

    /// Reserve the `_compressed.mp4` sibling of `path`.
    #[must_use]
    pub fn compressed_sibling(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or("video");
        Self(path.with_file_name(format!("{stem}{COMPRESSED_SUFFIX}.mp4")))
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Turn the reservation into a [`MediaFile`] once something was written.
    ///
    /// # Errors
    ///
    /// - `Error::NoMediaFound` if nothing exists at the path.
    /// - `Error::Io` if the metadata cannot be read.
    pub async fn into_media(self) -> Result<MediaFile> {
        match tokio::fs::metadata(&self.0).await {
            Ok(meta) if meta.is_file() => Ok(MediaFile {
                size: meta.len(),
                path: self,
            }),
            Ok(_) => Err(Error::NoMediaFound(self.0.clone())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(Error::NoMediaFound(self.0.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for TempPath {
    // a single unlink; not worth a spawn_blocking round trip
    fn drop(&mut self) {
        match fs::remove_file(&self.0) {
            Ok(()) => debug!(path = %self.0.display(), "removed temporary file"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.0.display(), %err, "failed to remove temporary file"),
        }
    }
}

/// A video artifact on disk, owned by exactly one request.
#[derive(Debug)]
pub struct MediaFile {
    path: TempPath,
    size: u64,
}

impl MediaFile {
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.path()
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
    Other(&'static str),
    Unknown,
}

impl MediaKind {
    /// True when the content is known to be something other than video.
    #[must_use]
    pub const fn is_definitely_not_video(self) -> bool {
        matches!(self, Self::Image | Self::Other(_))
    }
}

/// Probe the first 8 KiB of a file for magic bytes.
pub async fn probe_media_kind(path: &Path) -> MediaKind {
    let Ok(mut f) = File::open(path).await else {
        return MediaKind::Unknown;
    };
    let mut buf = vec![0u8; 8192];
    match f.read(&mut buf).await {
        Ok(n) if n > 0 => {
            buf.truncate(n);
            infer::get(&buf).map_or(MediaKind::Unknown, |k| {
                let mt = k.mime_type();
                if mt.starts_with("video/") {
                    MediaKind::Video
                } else if mt.starts_with("image/") {
                    MediaKind::Image
                } else {
                    MediaKind::Other(mt)
                }
            })
        }
        _ => MediaKind::Unknown,
    }
}
