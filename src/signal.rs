use crate::error::{Result, TutorError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Words-per-minute multiplier used when the clip duration is unknown
/// (assumes roughly five seconds per read sentence).
pub const WPM_PER_WORD_UNTIMED: f64 = 12.0;

/// Error rate and wpm reported for an utterance the transcriber could not parse.
pub const UNINTELLIGIBLE_READING: (f64, f64) = (1.0, 0.0);

/// Error rate and wpm reported when the transcription service is down.
pub const SERVICE_UNAVAILABLE_READING: (f64, f64) = (0.5, 0.0);

/// One round of learner measurements, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Signal {
    error_rate: f64,
    wpm: f64,
    focus_score: f64,
}

impl Signal {
    /// Rejects NaN/infinite values and anything outside the documented ranges:
    /// `error_rate` and `focus_score` in [0, 1], `wpm` >= 0.
    pub fn new(error_rate: f64, wpm: f64, focus_score: f64) -> Result<Self> {
        check_unit("error_rate", error_rate)?;
        check_unit("focus_score", focus_score)?;
        if !wpm.is_finite() || wpm < 0.0 {
            return Err(TutorError::InvalidInput {
                field: "wpm",
                value: wpm,
            });
        }

        Ok(Self {
            error_rate,
            wpm,
            focus_score,
        })
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    pub fn wpm(&self) -> f64 {
        self.wpm
    }

    pub fn focus_score(&self) -> f64 {
        self.focus_score
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TutorError::InvalidInput { field, value })
    }
}

/// Ratcliff/Obershelp similarity of two strings, case-insensitive.
///
/// Returns `2 * matched / (len(a) + len(b))`, so the result is always in
/// [0, 1]. Two empty strings are considered identical.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    let mut pending = vec![(0, a.len(), 0, b.len())];
    let mut matched = 0;
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, len) =
            longest_common_block(&a[alo..ahi], &b[blo..bhi], &mut prev, &mut row);
        if len == 0 {
            continue;
        }
        let (i, j) = (alo + i, blo + j);
        matched += len;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + len < ahi && j + len < bhi {
            pending.push((i + len, ahi, j + len, bhi));
        }
    }
    matched
}

/// Earliest longest common substring as (start in a, start in b, length).
/// `prev` and `row` are scratch rows at least `b.len() + 1` long.
fn longest_common_block<'a>(
    a: &[char],
    b: &[char],
    prev: &'a mut [usize],
    row: &'a mut [usize],
) -> (usize, usize, usize) {
    let (mut prev, mut row) = (prev, row);
    let mut best = (0, 0, 0);
    prev[..=b.len()].fill(0);
    row[0] = 0;
    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            if row[j + 1] > best.2 {
                best = (i + 1 - row[j + 1], j + 1 - row[j + 1], row[j + 1]);
            }
        }
        std::mem::swap(&mut prev, &mut row);
    }
    best
}

/// Error rate of a transcript against the passage the learner was asked to read.
pub fn error_rate(target: &str, transcript: &str) -> f64 {
    1.0 - similarity_ratio(target, transcript)
}

/// Reading speed from a transcript. Without a clip duration every word is
/// counted as [`WPM_PER_WORD_UNTIMED`] words per minute.
pub fn estimate_wpm(transcript: &str, duration: Option<Duration>) -> f64 {
    let words = transcript.split_whitespace().count() as f64;
    match duration {
        Some(d) if d.as_secs_f64() > 0.0 => words * 60.0 / d.as_secs_f64(),
        _ => words * WPM_PER_WORD_UNTIMED,
    }
}

/// Normalized image coordinate of a detected facial landmark (nose tip).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Focus from how far the nose tip sits from the frame center.
///
/// A centered face scores 1.0, a deviation of 0.5 or more scores 0.0, and no
/// face at all scores exactly 0.0.
pub fn focus_score(point: Option<LandmarkPoint>) -> f64 {
    match point {
        Some(p) if p.x.is_finite() && p.y.is_finite() => {
            let deviation = (p.x - 0.5).hypot(p.y - 0.5);
            (1.0 - deviation * 2.0).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TranscriptionError {
    #[error("speech could not be understood")]
    Unintelligible,
    #[error("transcription service unavailable")]
    ServiceUnavailable,
}

/// Speech-to-text collaborator.
pub trait Transcriber {
    fn transcribe(&self, audio: &AudioClip) -> std::result::Result<String, TranscriptionError>;
}

/// Face landmark collaborator; `None` when no face is found.
pub trait FaceLandmarker {
    fn detect(&self, image: &[u8]) -> Option<LandmarkPoint>;
}

/// Recorded audio plus its length, when the recorder knows it.
#[derive(Debug, Clone, Default)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub duration: Option<Duration>,
}

/// Raw captures for one round. Missing captures are simulated.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    pub audio: Option<AudioClip>,
    pub image: Option<Vec<u8>>,
}

/// Transcriber that always answers with a preset outcome.
#[derive(Debug, Clone)]
pub struct StaticTranscriber(pub std::result::Result<String, TranscriptionError>);

impl Transcriber for StaticTranscriber {
    fn transcribe(&self, _audio: &AudioClip) -> std::result::Result<String, TranscriptionError> {
        self.0.clone()
    }
}

/// Landmarker that always reports a preset point (or no face).
#[derive(Debug, Clone, Copy)]
pub struct StaticLandmarker(pub Option<LandmarkPoint>);

impl FaceLandmarker for StaticLandmarker {
    fn detect(&self, _image: &[u8]) -> Option<LandmarkPoint> {
        self.0
    }
}

/// Reading stand-in when no audio was captured: error rate in [0, 0.2),
/// wpm in [60, 150).
pub fn simulated_reading<R: Rng + ?Sized>(rng: &mut R) -> (f64, f64) {
    (rng.gen_range(0.0..0.2), rng.gen_range(60..150) as f64)
}

/// Focus stand-in when no image was captured, in [0.4, 1.0).
pub fn simulated_focus<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(0.4..1.0)
}

/// Turns collaborator output into a well-formed [`Signal`], absorbing
/// collaborator failures into fixed fallback values.
pub struct SignalExtractor<T, L> {
    transcriber: T,
    landmarker: L,
}

impl<T: Transcriber, L: FaceLandmarker> SignalExtractor<T, L> {
    pub fn new(transcriber: T, landmarker: L) -> Self {
        Self {
            transcriber,
            landmarker,
        }
    }

    /// (error_rate, wpm) for a reading of `target`.
    pub fn reading<R: Rng + ?Sized>(
        &self,
        audio: Option<&AudioClip>,
        target: &str,
        rng: &mut R,
    ) -> (f64, f64) {
        let Some(clip) = audio else {
            let simulated = simulated_reading(rng);
            warn!(
                error_rate = simulated.0,
                wpm = simulated.1,
                "no audio captured, simulating reading"
            );
            return simulated;
        };

        match self.transcriber.transcribe(clip) {
            Ok(text) => {
                let reading = (error_rate(target, &text), estimate_wpm(&text, clip.duration));
                debug!(transcript = %text, error_rate = reading.0, wpm = reading.1, "reading analyzed");
                reading
            }
            Err(TranscriptionError::Unintelligible) => {
                warn!("transcriber could not understand audio");
                UNINTELLIGIBLE_READING
            }
            Err(TranscriptionError::ServiceUnavailable) => {
                warn!("transcription service unavailable, using degraded reading");
                SERVICE_UNAVAILABLE_READING
            }
        }
    }

    pub fn attention<R: Rng + ?Sized>(&self, image: Option<&[u8]>, rng: &mut R) -> f64 {
        let Some(image) = image else {
            let simulated = simulated_focus(rng);
            warn!(focus_score = simulated, "no image captured, simulating focus");
            return simulated;
        };

        let point = self.landmarker.detect(image);
        if point.is_none() {
            warn!("no face detected");
        }
        let focus = focus_score(point);
        debug!(?point, focus_score = focus, "attention analyzed");
        focus
    }

    pub fn extract<R: Rng + ?Sized>(
        &self,
        capture: &Capture,
        target: &str,
        rng: &mut R,
    ) -> Result<Signal> {
        let (error_rate, wpm) = self.reading(capture.audio.as_ref(), target, rng);
        let focus = self.attention(capture.image.as_deref(), rng);
        Signal::new(error_rate, wpm, focus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn clip() -> AudioClip {
        AudioClip {
            bytes: vec![0, 1, 2],
            duration: None,
        }
    }

    #[test]
    fn signal_rejects_nan_and_out_of_range() {
        assert_matches!(
            Signal::new(f64::NAN, 100.0, 0.5),
            Err(TutorError::InvalidInput {
                field: "error_rate",
                ..
            })
        );
        assert_matches!(
            Signal::new(0.1, -1.0, 0.5),
            Err(TutorError::InvalidInput { field: "wpm", .. })
        );
        assert_matches!(
            Signal::new(0.1, 100.0, 1.5),
            Err(TutorError::InvalidInput {
                field: "focus_score",
                ..
            })
        );
        assert!(Signal::new(0.0, 10000.0, 0.0).is_ok());
    }

    #[test]
    fn similarity_of_identical_and_disjoint_strings() {
        assert_eq!(similarity_ratio("The sun is hot.", "the sun is hot."), 1.0);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("abc", ""), 0.0);
    }

    #[test]
    fn similarity_matches_ratcliff_obershelp() {
        // "abcd" vs "bcde": block "bcd" matches, 2*3/8
        assert!((similarity_ratio("abcd", "bcde") - 0.75).abs() < 1e-12);
        // recursive matching on both sides of the longest block
        assert!((similarity_ratio("xaby", "aab") - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn similarity_of_long_fragmented_transcript() {
        // every other character matches, so each block is one char long
        let target = "ab".repeat(300);
        let transcript = "a".repeat(300);
        let ratio = similarity_ratio(&target, &transcript);
        assert!((ratio - 2.0 * 300.0 / 900.0).abs() < 1e-12);

        let passage = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        assert_eq!(similarity_ratio(&passage, &passage.to_uppercase()), 1.0);
    }

    #[test]
    fn wpm_with_and_without_duration() {
        assert_eq!(estimate_wpm("the sun is hot", None), 48.0);
        assert_eq!(
            estimate_wpm("the sun is hot", Some(Duration::from_secs(2))),
            120.0
        );
        assert_eq!(estimate_wpm("one two", Some(Duration::ZERO)), 24.0);
        assert_eq!(estimate_wpm("", None), 0.0);
    }

    #[test]
    fn focus_from_landmark() {
        assert_eq!(focus_score(Some(LandmarkPoint::new(0.5, 0.5))), 1.0);
        assert!((focus_score(Some(LandmarkPoint::new(0.6, 0.5))) - 0.8).abs() < 1e-12);
        assert_eq!(focus_score(Some(LandmarkPoint::new(0.0, 0.0))), 0.0);
        assert_eq!(focus_score(None), 0.0);
    }

    #[test]
    fn no_face_yields_zero_focus() {
        let extractor = SignalExtractor::new(
            StaticTranscriber(Ok("hi".into())),
            StaticLandmarker(None),
        );
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(extractor.attention(Some(&[1, 2, 3]), &mut rng), 0.0);
    }

    #[test]
    fn transcription_failures_use_fallbacks() {
        let mut rng = StdRng::seed_from_u64(1);
        let unintelligible = SignalExtractor::new(
            StaticTranscriber(Err(TranscriptionError::Unintelligible)),
            StaticLandmarker(None),
        );
        assert_eq!(
            unintelligible.reading(Some(&clip()), "text", &mut rng),
            (1.0, 0.0)
        );

        let unavailable = SignalExtractor::new(
            StaticTranscriber(Err(TranscriptionError::ServiceUnavailable)),
            StaticLandmarker(None),
        );
        assert_eq!(
            unavailable.reading(Some(&clip()), "text", &mut rng),
            (0.5, 0.0)
        );
    }

    #[test]
    fn missing_captures_are_simulated_in_range() {
        let extractor = SignalExtractor::new(
            StaticTranscriber(Ok(String::new())),
            StaticLandmarker(None),
        );
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let signal = extractor
                .extract(&Capture::default(), "text", &mut rng)
                .unwrap();
            assert!((0.0..0.2).contains(&signal.error_rate()));
            assert!((60.0..150.0).contains(&signal.wpm()));
            assert!((0.4..1.0).contains(&signal.focus_score()));
        }
    }

    #[test]
    fn extract_from_real_captures() {
        let extractor = SignalExtractor::new(
            StaticTranscriber(Ok("The sun is hot.".into())),
            StaticLandmarker(Some(LandmarkPoint::new(0.5, 0.5))),
        );
        let capture = Capture {
            audio: Some(clip()),
            image: Some(vec![9]),
        };
        let mut rng = StdRng::seed_from_u64(3);
        let signal = extractor
            .extract(&capture, "The sun is hot.", &mut rng)
            .unwrap();
        assert_eq!(signal.error_rate(), 0.0);
        assert_eq!(signal.wpm(), 48.0);
        assert_eq!(signal.focus_score(), 1.0);
    }
}
