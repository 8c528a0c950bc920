use serde::Serialize;
use std::fmt;

use crate::article::Article;
use crate::extractors::VideoReference;
use crate::transcribe::Transcript;
use crate::FailureReason;

/// Run number inside one session. Increases with every started run.
pub type RunId = u64;

/// Where the current run is
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "stage", content = "reason", rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    ResolvingReference,
    AcquiringTranscript,
    AwaitingManualTranscript,
    Transforming,
    Completed,
    Failed(FailureReason),
}

impl PipelineState {
    /// A remote call or resolution is pending
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            PipelineState::ResolvingReference
                | PipelineState::AcquiringTranscript
                | PipelineState::Transforming
        )
    }

    /// Progress text for the presentation layer
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Waiting for input",
            PipelineState::ResolvingReference => "Resolving video link...",
            PipelineState::AcquiringTranscript => "Fetching transcript from YouTube...",
            PipelineState::AwaitingManualTranscript => "Waiting for a manual transcript",
            PipelineState::Transforming => "Formatting the article with Claude...",
            PipelineState::Completed => "Done!",
            PipelineState::Failed(_) => "Failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inputs of the state machine. Completion events carry the run that issued them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Start an automatic run from a link or identifier
    AutomaticRequested,
    ReferenceResolved { run: RunId, reference: VideoReference },
    ReferenceRejected { run: RunId, reason: FailureReason },
    TranscriptAcquired { run: RunId, transcript: Transcript },
    AcquisitionFailed { run: RunId, reason: FailureReason },
    /// Start a manual run with user-supplied text
    ManualSubmitted { text: String },
    ArticleProduced { run: RunId, article: Article },
    TransformationFailed { run: RunId, reason: FailureReason },
}

impl Event {
    fn run(&self) -> Option<RunId> {
        match self {
            Event::AutomaticRequested | Event::ManualSubmitted { .. } => None,
            Event::ReferenceResolved { run, .. }
            | Event::ReferenceRejected { run, .. }
            | Event::TranscriptAcquired { run, .. }
            | Event::AcquisitionFailed { run, .. }
            | Event::ArticleProduced { run, .. }
            | Event::TransformationFailed { run, .. } => Some(*run),
        }
    }
}

/// Everything the presentation layer may show about the current run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Session {
    pub run: RunId,
    pub state: PipelineState,
    pub reference: Option<VideoReference>,
    pub transcript: Option<Transcript>,
    pub article: Option<Article>,
    pub failure: Option<FailureReason>,
}

impl Session {
    /// Fresh run with everything from the previous one discarded
    fn start_run(&self, state: PipelineState) -> Session {
        Session {
            run: self.run + 1,
            state,
            ..Session::default()
        }
    }

    fn with_state(&self, state: PipelineState) -> Session {
        Session {
            state,
            ..self.clone()
        }
    }

    pub fn manual_input_open(&self) -> bool {
        self.state == PipelineState::AwaitingManualTranscript
    }
}

/// Apply one event. Stale events and events that make no sense in the current stage leave the
/// session untouched.
pub fn transition(session: &Session, event: Event) -> Session {
    if event.run().is_some_and(|run| run != session.run) {
        return session.clone();
    }

    use PipelineState as S;
    match (&session.state, event) {
        (_, Event::AutomaticRequested) => session.start_run(S::ResolvingReference),

        (S::ResolvingReference, Event::ReferenceResolved { reference, .. }) => Session {
            reference: Some(reference),
            ..session.with_state(S::AcquiringTranscript)
        },
        (S::ResolvingReference, Event::ReferenceRejected { reason, .. }) => Session {
            failure: Some(reason.clone()),
            ..session.with_state(S::Failed(reason))
        },

        (S::AcquiringTranscript, Event::TranscriptAcquired { transcript, .. }) => Session {
            transcript: Some(transcript),
            ..session.with_state(S::Transforming)
        },
        (S::AcquiringTranscript, Event::AcquisitionFailed { reason, .. }) => Session {
            failure: Some(reason),
            ..session.with_state(S::AwaitingManualTranscript)
        },

        (state, Event::ManualSubmitted { text }) => {
            let transcript = Transcript::manual(text);
            if !transcript.is_blank() {
                return Session {
                    transcript: Some(transcript),
                    ..session.start_run(S::Transforming)
                };
            }

            if state.is_in_flight() || *state == S::AwaitingManualTranscript {
                // A blank submission never changes the stage it arrives in
                Session {
                    failure: Some(FailureReason::EmptyManualInput),
                    ..session.clone()
                }
            } else {
                // Nothing to keep from the previous run once the user switched to manual input
                Session {
                    run: session.run,
                    failure: Some(FailureReason::EmptyManualInput),
                    ..Session::default().with_state(S::AwaitingManualTranscript)
                }
            }
        }

        (S::Transforming, Event::ArticleProduced { article, .. }) => Session {
            article: Some(article),
            failure: None,
            ..session.with_state(S::Completed)
        },
        (S::Transforming, Event::TransformationFailed { reason, .. }) => Session {
            failure: Some(reason.clone()),
            article: None,
            ..session.with_state(S::Failed(reason))
        },

        (state, event) => {
            tracing::debug!(?state, ?event, "Ignoring event for current stage");
            session.clone()
        }
    }
}
