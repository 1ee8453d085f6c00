use crate::{
    download::Fetcher,
    error::Result,
    reply::Reply,
    validate::{UrlClassifier, Validate},
};
use tracing::{error, info};

pub const INVALID_URL: &str = "Please send a valid X (Twitter) URL containing a video.";
pub const DOWNLOADING: &str = "Downloading your X video... Please wait.";
pub const FETCH_FAILED: &str =
    "Sorry, I couldn't download that X video. Check the URL and try again.";
pub const UPLOAD_TIMED_OUT: &str = "Upload timed out. The video might be too large or the network too slow. Try a smaller video.";
pub const SEND_FAILED: &str = "Something went wrong while sending the video.";
pub const GENERIC_FAILURE: &str = "An error occurred. Please try again later.";

/// How a single request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Text was not a supported URL.
    Rejected,
    FetchFailed,
    Sent,
    SendFailed { timed_out: bool },
}

/// Turns one incoming text message into a video reply.
#[derive(Clone)]
pub struct RequestHandler {
    classifier: UrlClassifier,
    fetcher: Fetcher,
}

impl RequestHandler {
    #[must_use]
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            classifier: UrlClassifier,
            fetcher,
        }
    }

    /// Classify, fetch, send. The fetched file is removed before this
    /// returns, whichever way it returns.
    ///
    /// # Errors
    ///
    /// Only failures to deliver a text reply are returned; download and
    /// upload failures are reported to the user and folded into [`Outcome`].
    pub async fn handle(&self, reply: &dyn Reply, text: &str) -> Result<Outcome> {
        let url = match self.classifier.validate(text) {
            Ok(url) => url,
            Err(err) => {
                info!(%err, "rejecting message");
                reply.text(INVALID_URL).await?;
                return Ok(Outcome::Rejected);
            }
        };

        reply.text(DOWNLOADING).await?;

        let media = match self.fetcher.fetch(&url).await {
            Ok(media) => media,
            Err(err) => {
                error!(%err, %url, "could not fetch video");
                reply.text(FETCH_FAILED).await?;
                return Ok(Outcome::FetchFailed);
            }
        };

        match reply.video(&media).await {
            Ok(()) => {
                info!(%url, size = media.size(), "sent video");
                Ok(Outcome::Sent)
            }
            Err(err) => {
                error!(%err, %url, "error sending video");
                let timed_out = err.is_timeout();
                let message = if timed_out {
                    UPLOAD_TIMED_OUT
                } else {
                    SEND_FAILED
                };
                reply.text(message).await?;
                Ok(Outcome::SendFailed { timed_out })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compress::tests::{FakeTranscoder, MIB},
        download::tests::{FakeDownloader, Step, fetcher},
        error::Error,
        media::MediaFile,
    };
    use std::{
        path::{Path, PathBuf},
        sync::{Arc, Mutex},
    };
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Sent {
        Text(String),
        Video { path: PathBuf, size: u64 },
    }

    #[derive(Clone, Copy)]
    enum VideoResult {
        Ok,
        Timeout,
        Fail,
    }

    struct RecordingReply {
        sent: Mutex<Vec<Sent>>,
        video: VideoResult,
        fail_text: bool,
    }

    impl RecordingReply {
        fn new(video: VideoResult) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                video,
                fail_text: false,
            }
        }

        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn texts(&self) -> Vec<String> {
            self.sent()
                .into_iter()
                .filter_map(|s| match s {
                    Sent::Text(t) => Some(t),
                    Sent::Video { .. } => None,
                })
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl Reply for RecordingReply {
        async fn text(&self, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push(Sent::Text(text.to_owned()));
            if self.fail_text && text != DOWNLOADING {
                return Err(Error::other("chat not found"));
            }
            Ok(())
        }

        async fn video(&self, media: &MediaFile) -> Result<()> {
            assert!(media.path().exists());
            self.sent.lock().unwrap().push(Sent::Video {
                path: media.path().to_path_buf(),
                size: media.size(),
            });
            match self.video {
                VideoResult::Ok => Ok(()),
                VideoResult::Timeout => Err(Error::Io(std::io::Error::from(
                    std::io::ErrorKind::TimedOut,
                ))),
                VideoResult::Fail => Err(Error::other("Bad Request: file too big")),
            }
        }
    }

    fn handler(dir: &Path, steps: &[Step], transcoder: FakeTranscoder) -> RequestHandler {
        RequestHandler::new(fetcher(
            dir,
            Arc::new(FakeDownloader::new(steps)),
            Arc::new(transcoder),
        ))
    }

    fn is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn valid_url_is_sent_and_removed() {
        let dir = tempdir().unwrap();
        let handler = handler(dir.path(), &[Step::Write(10 * MIB)], FakeTranscoder::failing());
        let reply = RecordingReply::new(VideoResult::Ok);

        let outcome = handler
            .handle(&reply, "https://x.com/user/status/123")
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Sent);
        let sent = reply.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], Sent::Text(DOWNLOADING.into()));
        assert!(matches!(&sent[1], Sent::Video { size, .. } if *size == 10 * MIB));
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn invalid_text_gets_guidance() {
        let dir = tempdir().unwrap();
        // no scripted steps: any download attempt would panic
        let handler = handler(dir.path(), &[], FakeTranscoder::failing());
        let reply = RecordingReply::new(VideoResult::Ok);

        let outcome = handler.handle(&reply, "not a url").await.unwrap();

        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(reply.texts(), [INVALID_URL]);
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn fetch_failure_apologizes() {
        let dir = tempdir().unwrap();
        let handler = handler(
            dir.path(),
            &[Step::FailAfterPartialWrite],
            FakeTranscoder::failing(),
        );
        let reply = RecordingReply::new(VideoResult::Ok);

        let outcome = handler
            .handle(&reply, "https://twitter.com/a/status/9")
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::FetchFailed);
        assert_eq!(reply.texts(), [DOWNLOADING, FETCH_FAILED]);
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn oversized_video_is_compressed_then_sent() {
        let dir = tempdir().unwrap();
        let handler = handler(
            dir.path(),
            &[Step::Write(70 * MIB)],
            FakeTranscoder::producing(40 * MIB),
        );
        let reply = RecordingReply::new(VideoResult::Ok);

        let outcome = handler
            .handle(&reply, "https://x.com/a/status/1")
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Sent);
        let videos = reply
            .sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Video { path, size } => Some((path, size)),
                Sent::Text(_) => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].1, 40 * MIB);
        assert!(videos[0].0.to_string_lossy().ends_with("_compressed.mp4"));
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn failed_compression_sends_nothing() {
        let dir = tempdir().unwrap();
        let handler = handler(
            dir.path(),
            &[Step::Write(70 * MIB)],
            FakeTranscoder::producing(60 * MIB),
        );
        let reply = RecordingReply::new(VideoResult::Ok);

        let outcome = handler
            .handle(&reply, "https://x.com/a/status/1")
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::FetchFailed);
        assert!(!reply.sent().iter().any(|s| matches!(s, Sent::Video { .. })));
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn upload_timeout_has_specific_message() {
        let dir = tempdir().unwrap();
        let handler = handler(dir.path(), &[Step::Write(MIB)], FakeTranscoder::failing());
        let reply = RecordingReply::new(VideoResult::Timeout);

        let outcome = handler
            .handle(&reply, "https://x.com/a/status/1")
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::SendFailed { timed_out: true });
        assert_eq!(reply.texts(), [DOWNLOADING, UPLOAD_TIMED_OUT]);
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn upload_failure_has_generic_message() {
        let dir = tempdir().unwrap();
        let handler = handler(dir.path(), &[Step::Write(MIB)], FakeTranscoder::failing());
        let reply = RecordingReply::new(VideoResult::Fail);

        let outcome = handler
            .handle(&reply, "https://x.com/a/status/1")
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::SendFailed { timed_out: false });
        assert_eq!(reply.texts(), [DOWNLOADING, SEND_FAILED]);
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn file_removed_even_when_reply_errors() {
        let dir = tempdir().unwrap();
        let handler = handler(dir.path(), &[Step::Write(MIB)], FakeTranscoder::failing());
        let mut reply = RecordingReply::new(VideoResult::Fail);
        reply.fail_text = true;

        let result = handler.handle(&reply, "https://x.com/a/status/1").await;

        assert!(result.is_err());
        assert!(is_empty(dir.path()));
    }
}
