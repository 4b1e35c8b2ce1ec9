use crate::assistance::{AssistanceConfig, VisualCue};
use crate::controller::DifficultyIndex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentLevel {
    Easy,
    Medium,
    Hard,
}

impl ContentLevel {
    pub fn passage(&self) -> &'static str {
        match self {
            ContentLevel::Easy => "The sun is hot. The sky is blue. I like to play.",
            ContentLevel::Medium => {
                "The quick brown fox jumps over the lazy dog. It was a sunny day in the park."
            }
            ContentLevel::Hard => {
                "Photosynthesis is the process used by plants to convert light energy into chemical energy."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentThresholds {
    pub easy_below: f64,
    pub hard_above: f64,
}

impl Default for ContentThresholds {
    fn default() -> Self {
        Self {
            easy_below: 0.3,
            hard_above: 0.7,
        }
    }
}

impl ContentThresholds {
    pub fn level(&self, difficulty: DifficultyIndex) -> ContentLevel {
        let d = difficulty.value();
        if d < self.easy_below {
            ContentLevel::Easy
        } else if d > self.hard_above {
            ContentLevel::Hard
        } else {
            ContentLevel::Medium
        }
    }
}

/// A passage with its assistance applied, ready for a front end to display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPassage {
    pub level: ContentLevel,
    pub text: String,
    pub letter_spacing_px: u8,
    pub line_height: f32,
    pub background: &'static str,
    pub tts_hint: bool,
}

/// Hyphen after every lowercase vowel (and `y`), a rough stand-in for
/// syllable boundaries.
pub fn segment_syllables(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        out.push(c);
        if matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y') {
            out.push('-');
        }
    }
    out
}

pub fn render(level: ContentLevel, assistance: &AssistanceConfig) -> RenderedPassage {
    let mut text = level.passage().to_string();
    if assistance.has_cue(VisualCue::SyllableSegmentation) {
        text = segment_syllables(&text);
    }

    let (letter_spacing_px, line_height) = if assistance.has_cue(VisualCue::FontSpacingWide) {
        (3, 2.0)
    } else if assistance.has_cue(VisualCue::FontSpacingMedium) {
        (1, 1.5)
    } else {
        (0, 1.2)
    };

    RenderedPassage {
        level,
        text,
        letter_spacing_px,
        line_height,
        background: assistance.highlight_color.background(),
        tts_hint: assistance.tts_enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistance::AssistancePolicy;

    #[test]
    fn level_bands() {
        let t = ContentThresholds::default();
        assert_eq!(t.level(DifficultyIndex::clipped(0.1)), ContentLevel::Easy);
        assert_eq!(t.level(DifficultyIndex::clipped(0.3)), ContentLevel::Medium);
        assert_eq!(t.level(DifficultyIndex::clipped(0.7)), ContentLevel::Medium);
        assert_eq!(t.level(DifficultyIndex::clipped(0.71)), ContentLevel::Hard);
    }

    #[test]
    fn syllables_are_split_after_vowels() {
        assert_eq!(segment_syllables("The sky"), "The- sky-");
        assert_eq!(segment_syllables("Photo"), "Pho-to-");
    }

    #[test]
    fn heavy_assistance_segments_and_spaces_text() {
        let assistance = AssistancePolicy::default().assist(0.9);
        let rendered = render(ContentLevel::Hard, &assistance);
        assert!(rendered.text.starts_with("Pho-to-sy-"));
        assert_eq!(rendered.letter_spacing_px, 3);
        assert_eq!(rendered.background, "#fff9c4");
        assert!(rendered.tts_hint);
    }

    #[test]
    fn no_assistance_keeps_plain_text() {
        let assistance = AssistancePolicy::default().assist(0.1);
        let rendered = render(ContentLevel::Easy, &assistance);
        assert_eq!(rendered.text, ContentLevel::Easy.passage());
        assert_eq!(rendered.letter_spacing_px, 0);
        assert_eq!(rendered.background, "transparent");
        assert!(!rendered.tts_hint);
    }
}
