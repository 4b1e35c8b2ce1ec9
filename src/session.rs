use crate::assistance::{AssistanceConfig, AssistancePolicy};
use crate::config::Config;
use crate::content::{self, ContentThresholds, RenderedPassage};
use crate::controller::{DifficultyController, DifficultyIndex};
use crate::error::{Result, TutorError};
use crate::feedback::{default_templates, FeedbackSelector, FeedbackState};
use crate::history::{HistoryEntry, SessionHistory};
use crate::model::DifficultyModel;
use crate::signal::{Capture, FaceLandmarker, Signal, SignalExtractor, Transcriber};
use rand::Rng;
use serde::Serialize;
use tracing::info;

/// Everything one round produces.
#[derive(Debug, Clone, Serialize)]
pub struct RoundOutcome {
    pub signal: Signal,
    pub difficulty: DifficultyIndex,
    /// Assistance for the next passage.
    pub assistance: AssistanceConfig,
    pub next_passage: RenderedPassage,
    pub state: FeedbackState,
    pub feedback: String,
    pub entry: HistoryEntry,
}

/// A learner's session: owns the current difficulty and round history
/// explicitly instead of keeping them in process-wide state.
pub struct Tutor<M, R> {
    controller: DifficultyController<M>,
    assistance: AssistancePolicy,
    feedback: FeedbackSelector<R>,
    content: ContentThresholds,
    history: SessionHistory,
}

impl<M: DifficultyModel, R: Rng> Tutor<M, R> {
    /// `model` must already be loaded or trained; `rng` drives template choice.
    pub fn new(model: M, config: &Config, rng: R) -> Result<Self> {
        let initial = DifficultyIndex::try_from(config.initial_difficulty).map_err(|_| {
            TutorError::InvalidInput {
                field: "initial_difficulty",
                value: config.initial_difficulty,
            }
        })?;

        Ok(Self {
            controller: DifficultyController::new(model, initial),
            assistance: AssistancePolicy::new(config.assistance_thresholds),
            feedback: FeedbackSelector::with_templates(
                config.feedback_thresholds(),
                default_templates(),
                rng,
            ),
            content: config.content_thresholds,
            history: SessionHistory::default(),
        })
    }

    pub fn resume(&mut self, difficulty: DifficultyIndex) {
        self.controller.reset(difficulty);
    }

    pub fn current_difficulty(&self) -> DifficultyIndex {
        self.controller.current()
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// The passage to read now, styled for the current difficulty.
    pub fn passage(&self) -> RenderedPassage {
        self.render_for(self.current_difficulty()).1
    }

    fn render_for(&self, difficulty: DifficultyIndex) -> (AssistanceConfig, RenderedPassage) {
        let assistance = self.assistance.assist(difficulty.value());
        let passage = content::render(self.content.level(difficulty), &assistance);
        (assistance, passage)
    }

    /// Steps 2-5 of a round for an already captured signal.
    pub fn run_round(&mut self, signal: Signal) -> RoundOutcome {
        let difficulty = self.controller.step(&signal);
        let (assistance, next_passage) = self.render_for(difficulty);
        let state = self.feedback.state(signal.error_rate(), signal.focus_score());
        let feedback = self
            .feedback
            .feedback(signal.error_rate(), signal.focus_score());

        let entry = HistoryEntry::new(&signal, difficulty);
        self.history.push(entry.clone());
        info!(
            round = self.history.len(),
            error_rate = signal.error_rate(),
            wpm = signal.wpm(),
            focus_score = signal.focus_score(),
            difficulty = difficulty.value(),
            "round complete"
        );

        RoundOutcome {
            signal,
            difficulty,
            assistance,
            next_passage,
            state,
            feedback,
            entry,
        }
    }

    /// A full round from raw captures, judged against the current passage.
    /// Missing captures are simulated with `sim_rng`.
    pub fn run_capture<T, L, S>(
        &mut self,
        extractor: &SignalExtractor<T, L>,
        capture: &Capture,
        sim_rng: &mut S,
    ) -> Result<RoundOutcome>
    where
        T: Transcriber,
        L: FaceLandmarker,
        S: Rng + ?Sized,
    {
        let target = self.content.level(self.current_difficulty()).passage();
        self.run_capture_against(extractor, capture, target, sim_rng)
    }

    /// Like [`Tutor::run_capture`], but the reading is judged against `target`
    /// instead of the built-in passage.
    pub fn run_capture_against<T, L, S>(
        &mut self,
        extractor: &SignalExtractor<T, L>,
        capture: &Capture,
        target: &str,
        sim_rng: &mut S,
    ) -> Result<RoundOutcome>
    where
        T: Transcriber,
        L: FaceLandmarker,
        S: Rng + ?Sized,
    {
        let signal = extractor.extract(capture, target, sim_rng)?;
        Ok(self.run_round(signal))
    }
}
