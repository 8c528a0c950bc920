use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

pub mod state;

pub use state::{transition, Event, PipelineState, RunId, Session};

use crate::article::{ArticleWriter, ClaudeArticleWriter};
use crate::config::Config;
use crate::extractors;
use crate::transcribe::{HttpTranscriptSource, Transcript, TranscriptSource};
use crate::FailureReason;

/// Upper bounds for the remote calls of one run
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub acquire: Duration,
    pub transform: Duration,
}

impl Timeouts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            acquire: config.acquire_timeout(),
            transform: config.transform_timeout(),
        }
    }
}

/// Conversion pipeline.
///
/// Owns the single [`Session`] and is the only place that mutates it. Observers follow it
/// through [`Pipeline::subscribe`]. Runs may be started from several tasks; the latest one
/// wins and results of older runs are dropped.
pub struct Pipeline {
    source: Arc<dyn TranscriptSource>,
    writer: Arc<dyn ArticleWriter>,
    session: watch::Sender<Session>,
    timeouts: Timeouts,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        writer: Arc<dyn ArticleWriter>,
        timeouts: Timeouts,
    ) -> Self {
        let (session, _) = watch::channel(Session::default());
        Self {
            source,
            writer,
            session,
            timeouts,
        }
    }

    /// Pipeline talking to the configured transcript backend and the built-in writer
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(HttpTranscriptSource::new(&config.backend)?),
            Arc::new(ClaudeArticleWriter::new(&config.writer)?),
            Timeouts::from_config(config),
        ))
    }

    /// Receiver that sees every session change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// Current session
    pub fn snapshot(&self) -> Session {
        self.session.borrow().clone()
    }

    fn is_current(&self, run: RunId) -> bool {
        self.session.borrow().run == run
    }

    /// Apply an event atomically and return the resulting session
    fn dispatch(&self, event: Event) -> Session {
        let mut applied = None;
        self.session.send_if_modified(|current| {
            let next = transition(current, event);
            let changed = next != *current;
            *current = next.clone();
            applied = Some(next);
            changed
        });
        applied.unwrap_or_else(|| self.snapshot())
    }

    /// Automatic run: resolve the input, fetch its transcript, format the article.
    ///
    /// Returns the session as it stands when this run stops driving it.
    pub async fn run_automatic(&self, input: &str) -> Session {
        let run = self.dispatch(Event::AutomaticRequested).run;
        let span = tracing::info_span!("run", run, id = %Uuid::new_v4(), mode = "automatic");

        async move {
            let reference = match extractors::resolve(input) {
                Ok(reference) => reference,
                Err(reason) => {
                    tracing::info!(category = reason.category(), "{}", reason);
                    return self.dispatch(Event::ReferenceRejected { run, reason });
                }
            };
            tracing::info!(reference = %reference, "Resolved video reference");
            self.dispatch(Event::ReferenceResolved { run, reference });

            if !self.is_current(run) {
                return self.snapshot();
            }

            // The backend does its own parsing, so it gets the raw input
            let acquired = bounded(
                self.timeouts.acquire,
                self.source.fetch_transcript(input),
                FailureReason::AcquisitionFailed,
            )
            .await;

            match acquired {
                Ok(transcript) => {
                    let text = transcript.text.clone();
                    self.dispatch(Event::TranscriptAcquired { run, transcript });
                    self.transform(run, &text).await
                }
                Err(reason) => {
                    tracing::info!(category = reason.category(), "{}", reason);
                    self.dispatch(Event::AcquisitionFailed { run, reason })
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Manual run from user-supplied transcript text.
    ///
    /// Blank text is rejected with `EmptyManualInput` and never reaches the writer.
    pub async fn run_manual(&self, text: &str) -> Session {
        let blank = Transcript::manual(text).is_blank();
        let session = self.dispatch(Event::ManualSubmitted {
            text: text.to_string(),
        });

        if blank {
            tracing::info!(stage = %session.state, "Manual transcript is empty");
            return session;
        }

        let span = tracing::info_span!("run", run = session.run, id = %Uuid::new_v4(), mode = "manual");
        self.transform(session.run, text).instrument(span).await
    }

    async fn transform(&self, run: RunId, transcript: &str) -> Session {
        let superseded = {
            let current = self.session.borrow();
            (current.run != run || current.state != PipelineState::Transforming)
                .then(|| current.clone())
        };
        if let Some(current) = superseded {
            tracing::debug!("Run {} superseded before formatting", run);
            return current;
        }

        let produced = bounded(
            self.timeouts.transform,
            self.writer.write_article(transcript),
            FailureReason::TransformationFailed,
        )
        .await;

        match produced {
            Ok(article) => {
                tracing::info!(chars = article.as_str().chars().count(), "Article ready");
                self.dispatch(Event::ArticleProduced { run, article })
            }
            Err(reason) => {
                tracing::info!(category = reason.category(), "{}", reason);
                self.dispatch(Event::TransformationFailed { run, reason })
            }
        }
    }
}

/// Bound a remote call; expiry becomes the failure kind of that call
async fn bounded<T, F>(
    limit: Duration,
    call: F,
    on_timeout: fn(String) -> FailureReason,
) -> Result<T, FailureReason>
where
    F: Future<Output = Result<T, FailureReason>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(format!(
            "no response within {}",
            crate::utils::format_duration(limit.as_secs_f64())
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{Article, MockArticleWriter};
    use crate::transcribe::MockTranscriptSource;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    fn timeouts() -> Timeouts {
        Timeouts {
            acquire: Duration::from_secs(5),
            transform: Duration::from_secs(5),
        }
    }

    fn pipeline(source: impl TranscriptSource + 'static, writer: impl ArticleWriter + 'static) -> Pipeline {
        Pipeline::new(Arc::new(source), Arc::new(writer), timeouts())
    }

    fn echo_writer() -> MockArticleWriter {
        let mut writer = MockArticleWriter::new();
        writer
            .expect_write_article()
            .returning(|t| Ok(Article::new(format!("## Intro\n{}", t))));
        writer
    }

    #[tokio::test]
    async fn test_invalid_reference_issues_no_calls() {
        let mut source = MockTranscriptSource::new();
        source.expect_fetch_transcript().never();
        let mut writer = MockArticleWriter::new();
        writer.expect_write_article().never();

        let session = pipeline(source, writer).run_automatic("not a url").await;

        assert_eq!(
            session.state,
            PipelineState::Failed(FailureReason::InvalidReference("not a url".into()))
        );
        assert_eq!(session.transcript, None);
    }

    #[tokio::test]
    async fn test_automatic_run_completes() {
        let mut source = MockTranscriptSource::new();
        source
            .expect_fetch_transcript()
            .withf(|input| input.contains("watch?v=dQw4w9WgXcQ"))
            .times(1)
            .returning(|_| Ok(Transcript::manual("Hello world")));
        let mut writer = MockArticleWriter::new();
        writer
            .expect_write_article()
            .withf(|t| t.contains("Hello world"))
            .times(1)
            .returning(|_| Ok(Article::new("## Intro\nHello world")));

        let session = pipeline(source, writer)
            .run_automatic("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await;

        assert_eq!(session.state, PipelineState::Completed);
        assert_eq!(session.reference.unwrap().as_str(), "dQw4w9WgXcQ");
        assert_eq!(session.transcript.unwrap().text, "Hello world");
        assert_eq!(session.article.unwrap().as_str(), "## Intro\nHello world");
        assert_eq!(session.failure, None);
    }

    #[tokio::test]
    async fn test_acquisition_failure_falls_back_to_manual_input() {
        let mut source = MockTranscriptSource::new();
        source
            .expect_fetch_transcript()
            .times(1)
            .returning(|_| Err(FailureReason::AcquisitionFailed("Subtitles disabled".into())));
        let mut writer = MockArticleWriter::new();
        writer.expect_write_article().never();

        let session = pipeline(source, writer).run_automatic("dQw4w9WgXcQ").await;

        assert_eq!(session.state, PipelineState::AwaitingManualTranscript);
        assert_eq!(
            session.failure,
            Some(FailureReason::AcquisitionFailed("Subtitles disabled".into()))
        );
    }

    #[tokio::test]
    async fn test_manual_input_after_fallback() {
        let mut source = MockTranscriptSource::new();
        source
            .expect_fetch_transcript()
            .returning(|_| Err(FailureReason::AcquisitionFailed("down".into())));
        let pipeline = pipeline(source, echo_writer());

        pipeline.run_automatic("dQw4w9WgXcQ").await;
        let blank = pipeline.run_manual("   ").await;
        assert_eq!(blank.state, PipelineState::AwaitingManualTranscript);
        assert_eq!(blank.failure, Some(FailureReason::EmptyManualInput));

        let session = pipeline.run_manual("Pasted text").await;
        assert_eq!(session.state, PipelineState::Completed);
        assert_eq!(session.article.unwrap().as_str(), "## Intro\nPasted text");
        assert_eq!(session.failure, None);
    }

    #[tokio::test]
    async fn test_empty_manual_input_never_calls_writer() {
        let mut source = MockTranscriptSource::new();
        source.expect_fetch_transcript().never();
        let mut writer = MockArticleWriter::new();
        writer.expect_write_article().never();

        let session = pipeline(source, writer).run_manual("").await;

        assert_eq!(session.state, PipelineState::AwaitingManualTranscript);
        assert_eq!(session.failure, Some(FailureReason::EmptyManualInput));
    }

    #[tokio::test]
    async fn test_transformation_failure_ends_run() {
        let source = MockTranscriptSource::new();
        let mut writer = MockArticleWriter::new();
        writer
            .expect_write_article()
            .times(1)
            .returning(|_| Err(FailureReason::TransformationFailed("HTTP 529".into())));

        let session = pipeline(source, writer).run_manual("Some text").await;

        assert_eq!(
            session.state,
            PipelineState::Failed(FailureReason::TransformationFailed("HTTP 529".into()))
        );
        assert_eq!(session.article, None);
        assert_eq!(session.transcript.unwrap().text, "Some text");
    }

    /// Records the session the pipeline exposed at the moment of the request
    struct ProbeSource {
        probe: Arc<Mutex<Option<watch::Receiver<Session>>>>,
        seen: Arc<Mutex<Vec<Session>>>,
    }

    #[async_trait]
    impl TranscriptSource for ProbeSource {
        async fn fetch_transcript(&self, _input: &str) -> Result<Transcript, FailureReason> {
            let current = self
                .probe
                .lock()
                .unwrap()
                .as_ref()
                .map(|rx| rx.borrow().clone())
                .unwrap();
            self.seen.lock().unwrap().push(current);
            Ok(Transcript::manual("fresh"))
        }
    }

    #[tokio::test]
    async fn test_new_run_is_cleared_before_network_call() {
        let probe = Arc::new(Mutex::new(None));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let pipeline = pipeline(
            ProbeSource {
                probe: probe.clone(),
                seen: seen.clone(),
            },
            echo_writer(),
        );
        *probe.lock().unwrap() = Some(pipeline.subscribe());

        let first = pipeline.run_manual("old transcript").await;
        assert_eq!(first.state, PipelineState::Completed);

        pipeline.run_automatic("dQw4w9WgXcQ").await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].state, PipelineState::AcquiringTranscript);
        assert_eq!(seen[0].article, None);
        assert_eq!(seen[0].transcript, None);
        assert_eq!(seen[0].failure, None);
        assert_eq!(seen[0].run, first.run + 1);
    }

    /// Holds the transcript request until the test releases it
    struct GatedSource {
        gate: tokio::sync::Mutex<Option<oneshot::Receiver<Transcript>>>,
    }

    #[async_trait]
    impl TranscriptSource for GatedSource {
        async fn fetch_transcript(&self, _input: &str) -> Result<Transcript, FailureReason> {
            let rx = self.gate.lock().await.take();
            match rx {
                Some(rx) => rx
                    .await
                    .map_err(|_| FailureReason::AcquisitionFailed("gate dropped".into())),
                None => Err(FailureReason::AcquisitionFailed("called twice".into())),
            }
        }
    }

    #[tokio::test]
    async fn test_stale_run_result_is_discarded() {
        let (release, gate) = oneshot::channel();
        let mut writer = MockArticleWriter::new();
        writer
            .expect_write_article()
            .withf(|t| t.contains("Manual text"))
            .times(1)
            .returning(|_| Ok(Article::new("# Manual")));

        let pipeline = Arc::new(pipeline(
            GatedSource {
                gate: tokio::sync::Mutex::new(Some(gate)),
            },
            writer,
        ));

        let mut rx = pipeline.subscribe();
        let stale = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.run_automatic("dQw4w9WgXcQ").await }
        });
        rx.wait_for(|s| s.state == PipelineState::AcquiringTranscript)
            .await
            .unwrap();

        let manual = pipeline.run_manual("Manual text").await;
        assert_eq!(manual.state, PipelineState::Completed);

        release.send(Transcript::manual("Stale transcript")).unwrap();
        let returned = stale.await.unwrap();

        let current = pipeline.snapshot();
        assert_eq!(returned, current);
        assert_eq!(current.state, PipelineState::Completed);
        assert_eq!(current.article.unwrap().as_str(), "# Manual");
        assert_eq!(current.transcript.unwrap().text, "Manual text");
    }

    #[tokio::test]
    async fn test_blank_manual_input_does_not_interrupt_automatic_run() {
        let (release, gate) = oneshot::channel();
        let pipeline = Arc::new(pipeline(
            GatedSource {
                gate: tokio::sync::Mutex::new(Some(gate)),
            },
            echo_writer(),
        ));

        let mut rx = pipeline.subscribe();
        let automatic = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.run_automatic("dQw4w9WgXcQ").await }
        });
        rx.wait_for(|s| s.state == PipelineState::AcquiringTranscript)
            .await
            .unwrap();

        let blank = pipeline.run_manual("   ").await;
        assert_eq!(blank.state, PipelineState::AcquiringTranscript);
        assert_eq!(blank.failure, Some(FailureReason::EmptyManualInput));

        release.send(Transcript::manual("Fetched text")).unwrap();
        let session = automatic.await.unwrap();

        assert_eq!(session.state, PipelineState::Completed);
        assert_eq!(session.run, blank.run);
        assert_eq!(session.article.unwrap().as_str(), "## Intro\nFetched text");
        assert_eq!(session.failure, None);
    }

    struct SlowSource;

    #[async_trait]
    impl TranscriptSource for SlowSource {
        async fn fetch_transcript(&self, _input: &str) -> Result<Transcript, FailureReason> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Transcript::manual("too late"))
        }
    }

    #[tokio::test]
    async fn test_acquisition_timeout_is_acquisition_failure() {
        let mut writer = MockArticleWriter::new();
        writer.expect_write_article().never();
        let pipeline = Pipeline::new(
            Arc::new(SlowSource),
            Arc::new(writer),
            Timeouts {
                acquire: Duration::from_millis(20),
                transform: Duration::from_secs(5),
            },
        );

        let session = pipeline.run_automatic("dQw4w9WgXcQ").await;

        assert_eq!(session.state, PipelineState::AwaitingManualTranscript);
        assert!(matches!(
            session.failure,
            Some(FailureReason::AcquisitionFailed(ref detail)) if detail.contains("no response")
        ));
    }
}
