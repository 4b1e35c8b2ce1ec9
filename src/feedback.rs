use crate::util::percent;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Message used when the template library has nothing for a state.
pub const DEFAULT_MESSAGE: &str = "Good effort today!";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedbackState {
    pub accuracy: Level,
    pub focus: Level,
}

/// Error-rate cut points (lower is better, strict `<`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyThresholds {
    pub high_below: f64,
    pub medium_below: f64,
}

impl Default for AccuracyThresholds {
    fn default() -> Self {
        Self {
            high_below: 0.2,
            medium_below: 0.5,
        }
    }
}

/// Focus-score cut points (strict `>`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusThresholds {
    pub high_above: f64,
    pub medium_above: f64,
}

impl Default for FocusThresholds {
    fn default() -> Self {
        Self {
            high_above: 0.7,
            medium_above: 0.4,
        }
    }
}

/// Cut points for discretizing a round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackThresholds {
    pub accuracy: AccuracyThresholds,
    pub focus: FocusThresholds,
}

impl FeedbackThresholds {
    pub fn classify(&self, error_rate: f64, focus_score: f64) -> FeedbackState {
        let accuracy = if error_rate < self.accuracy.high_below {
            Level::High
        } else if error_rate < self.accuracy.medium_below {
            Level::Medium
        } else {
            Level::Low
        };
        let focus = if focus_score > self.focus.high_above {
            Level::High
        } else if focus_score > self.focus.medium_above {
            Level::Medium
        } else {
            Level::Low
        };
        FeedbackState { accuracy, focus }
    }
}

const TEMPLATES: [(Level, Level, [&str; 2]); 9] = [
    (Level::High, Level::High, [
        "Outstanding work! Your reading was accurate and you stayed completely focused.",
        "You're on fire today! Great pronunciation and steady attention.",
    ]),
    (Level::High, Level::Medium, [
        "Good reading! You nailed the words. Try to keep your eyes on the screen a bit more.",
        "Your accuracy is great. Let's work on staying steady next time.",
    ]),
    (Level::High, Level::Low, [
        "You read the words correctly, but you seem a bit distracted. Maybe take a quick stretch?",
        "Great accuracy, but I noticed you looking away. Let's try to focus for just 2 more minutes.",
    ]),
    (Level::Medium, Level::High, [
        "Good focus! There were a few tricky words, but you powered through.",
        "I like how attentive you are. Let's practice some of those harder sounds together.",
    ]),
    (Level::Medium, Level::Medium, [
        "Solid effort. You're doing okay, just keep practicing those long words.",
        "Nice job. Remember to pause at periods to catch your breath.",
    ]),
    (Level::Medium, Level::Low, [
        "It looks like you're getting tired. The words are getting a bit mixed up. Want a break?",
        "Let's pause. Focus is key to getting these words right.",
    ]),
    (Level::Low, Level::High, [
        "I admire your focus! This text was really hard, wasn't it? Let's try something easier.",
        "You stayed with it, which is great. Don't worry about the mistakes, we'll fix them.",
    ]),
    (Level::Low, Level::Medium, [
        "That was a tough one. You stumbled a bit, but that's how we learn.",
        "Let's slow down. Read one word at a time.",
    ]),
    (Level::Low, Level::Low, [
        "This seems too difficult right now and you look tired. Let's stop and play a game instead.",
        "I think we need a break. We can try this again later when you're fresh.",
    ]),
];

/// Candidate coaching messages per discretized state.
pub type TemplateLibrary = HashMap<FeedbackState, Vec<String>>;

pub fn default_templates() -> TemplateLibrary {
    TEMPLATES
        .iter()
        .map(|(accuracy, focus, messages)| {
            (
                FeedbackState {
                    accuracy: *accuracy,
                    focus: *focus,
                },
                messages.iter().map(|m| m.to_string()).collect(),
            )
        })
        .collect()
}

/// Picks a coaching message for a round. The random source is owned so a
/// seeded generator gives a reproducible sequence of messages.
pub struct FeedbackSelector<R> {
    thresholds: FeedbackThresholds,
    templates: TemplateLibrary,
    rng: R,
}

impl<R: Rng> FeedbackSelector<R> {
    pub fn new(rng: R) -> Self {
        Self::with_templates(FeedbackThresholds::default(), default_templates(), rng)
    }

    pub fn with_templates(thresholds: FeedbackThresholds, templates: TemplateLibrary, rng: R) -> Self {
        Self {
            thresholds,
            templates,
            rng,
        }
    }

    pub fn state(&self, error_rate: f64, focus_score: f64) -> FeedbackState {
        self.thresholds.classify(error_rate, focus_score)
    }

    pub fn feedback(&mut self, error_rate: f64, focus_score: f64) -> String {
        let state = self.state(error_rate, focus_score);
        let template = self
            .templates
            .get(&state)
            .and_then(|candidates| candidates.choose(&mut self.rng))
            .map(String::as_str)
            .unwrap_or(DEFAULT_MESSAGE);
        debug!(accuracy = %state.accuracy, focus = %state.focus, "feedback state");

        format!(
            "{template} (Accuracy: {}%, Focus: {}%)",
            percent(1.0 - error_rate),
            percent(focus_score)
        )
    }
}
