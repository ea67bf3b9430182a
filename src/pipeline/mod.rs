use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::capability::ReviewCapability;
use crate::config::VibeConfig;
use crate::error::{Result, ReviewError};
use crate::leaderboard::{FeedbackSelection, Leaderboard, Vibe, VibeTally};
use crate::prompt::{ReviewRequest, build_request};
use crate::reference::{DEFAULT_HOST, RepositoryReference};
use crate::score::{ScoreCheck, check_reported};
use crate::source::SourceSelector;
use crate::validate::parse_review_response;
use crate::{ReviewResult, SourceFile};

/// Sources selected for a repository and the request built from them.
#[derive(Debug, Clone)]
pub struct PreparedReview {
    pub reference: RepositoryReference,
    pub files: Vec<SourceFile>,
    pub request: ReviewRequest,
}

/// A fully validated review, ready to be folded into a [`Session`].
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub repo: String,
    pub files: Vec<String>,
    pub result: ReviewResult,
    pub score: ScoreCheck,
}

/// Reference in, validated result out. Holds no session state, so it can be
/// cloned into a spawned task.
#[derive(Clone)]
pub struct ReviewPipeline {
    selector: SourceSelector,
    capability: Arc<dyn ReviewCapability>,
    model: String,
    host: String,
}

impl ReviewPipeline {
    pub fn new(
        selector: SourceSelector,
        capability: Arc<dyn ReviewCapability>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            selector,
            capability,
            model: model.into(),
            host: DEFAULT_HOST.to_string(),
        }
    }

    /// Accept references on `host` instead of the default.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Build a pipeline from configuration around `capability`.
    pub fn from_config(config: &VibeConfig, capability: Arc<dyn ReviewCapability>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.github.user_agent.as_str())
            .build()?;
        let selector = SourceSelector::new(http, config.github.api_base.as_str());
        Ok(Self::new(selector, capability, config.reviewer.model.as_str())
            .with_host(config.github.host.as_str()))
    }

    /// Resolve the reference, select sources and build the request.
    pub async fn prepare(&self, input: &str) -> Result<PreparedReview> {
        if input.trim().is_empty() {
            return Err(ReviewError::MissingReference);
        }
        let reference = RepositoryReference::parse_with_host(input, &self.host)?;
        info!(repo = %reference, "fetching code");

        let files = self.selector.select(&reference).await?;
        let request = build_request(&files, &self.model);
        debug!(
            repo = %reference,
            files = files.len(),
            bytes = request.instruction_document.len(),
            "built review request"
        );

        Ok(PreparedReview {
            reference,
            files,
            request,
        })
    }

    /// Run one review to completion or failure. Touches no session state.
    pub async fn run(&self, input: &str) -> Result<ReviewOutcome> {
        let prepared = self.prepare(input).await?;

        debug!(capability = self.capability.name(), "submitting review");
        let raw = self.capability.review(&prepared.request).await?;
        let result = parse_review_response(&raw)?;

        let score = check_reported(&result);
        if !score.agrees() {
            warn!(
                repo = %prepared.reference,
                reported = %score.reported,
                derived = %score.derived,
                "reviewer score disagrees with derivation rules"
            );
        }

        Ok(ReviewOutcome {
            repo: prepared.reference.key(),
            files: prepared.files.into_iter().map(|f| f.path).collect(),
            result,
            score,
        })
    }
}

/// Session-scoped state: leaderboard, sentiment tally and the displayed result.
///
/// All writes go through [`Session::apply`] and [`Session::give_feedback`].
#[derive(Debug, Default)]
pub struct Session {
    leaderboard: Leaderboard,
    tally: VibeTally,
    feedback: FeedbackSelection,
    current: Option<ReviewOutcome>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a completed review in and make it the displayed result.
    pub fn apply(&mut self, outcome: ReviewOutcome) -> &ReviewOutcome {
        self.leaderboard.record_review(&outcome.repo, &outcome.result);
        self.feedback = FeedbackSelection::default();
        self.current.insert(outcome)
    }

    /// Run `input` through `pipeline` and apply the outcome on success only.
    pub async fn review(
        &mut self,
        pipeline: &ReviewPipeline,
        input: &str,
    ) -> Result<&ReviewOutcome> {
        let outcome = pipeline.run(input).await?;
        Ok(self.apply(outcome))
    }

    /// Toggle feedback for the displayed result. No-op when nothing is displayed.
    pub fn give_feedback(&mut self, vibe: Vibe) {
        if self.current.is_some() {
            self.feedback.click(vibe, &mut self.tally);
        }
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn tally(&self) -> &VibeTally {
        &self.tally
    }

    pub fn feedback(&self) -> Option<Vibe> {
        self.feedback.active()
    }

    pub fn current(&self) -> Option<&ReviewOutcome> {
        self.current.as_ref()
    }

    /// Clear the displayed result, e.g. when a new review starts.
    pub fn clear_current(&mut self) {
        self.current = None;
        self.feedback = FeedbackSelection::default();
    }
}
