use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VisualCue {
    SyllableSegmentation,
    FontSpacingWide,
    FontSpacingMedium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HighlightColor {
    None,
    Yellow,
    LightBlue,
}

impl HighlightColor {
    /// Background color used when rendering a passage.
    pub fn background(&self) -> &'static str {
        match self {
            HighlightColor::None => "transparent",
            HighlightColor::Yellow => "#fff9c4",
            HighlightColor::LightBlue => "#e1f5fe",
        }
    }
}

/// Accessibility affordances for the next passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistanceConfig {
    pub visual_cues: Vec<VisualCue>,
    pub tts_enabled: bool,
    pub highlight_color: HighlightColor,
}

impl AssistanceConfig {
    pub fn has_cue(&self, cue: VisualCue) -> bool {
        self.visual_cues.contains(&cue)
    }
}

/// Strict lower bounds for the heavy and light assistance tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssistanceThresholds {
    pub heavy_above: f64,
    pub light_above: f64,
}

impl Default for AssistanceThresholds {
    fn default() -> Self {
        Self {
            heavy_above: 0.7,
            light_above: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssistancePolicy {
    thresholds: AssistanceThresholds,
}

impl AssistancePolicy {
    pub fn new(thresholds: AssistanceThresholds) -> Self {
        Self { thresholds }
    }

    /// Total over any float: NaN and values at or below the light tier get no assistance.
    pub fn assist(&self, difficulty: f64) -> AssistanceConfig {
        let config = if difficulty > self.thresholds.heavy_above {
            AssistanceConfig {
                visual_cues: vec![VisualCue::SyllableSegmentation, VisualCue::FontSpacingWide],
                tts_enabled: true,
                highlight_color: HighlightColor::Yellow,
            }
        } else if difficulty > self.thresholds.light_above {
            AssistanceConfig {
                visual_cues: vec![VisualCue::FontSpacingMedium],
                tts_enabled: false,
                highlight_color: HighlightColor::LightBlue,
            }
        } else {
            AssistanceConfig {
                visual_cues: vec![],
                tts_enabled: false,
                highlight_color: HighlightColor::None,
            }
        };
        debug!(difficulty, ?config, "assistance selected");
        config
    }
}
