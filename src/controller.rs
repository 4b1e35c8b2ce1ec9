use crate::model::DifficultyModel;
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Difficulty of the next round's content, always within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DifficultyIndex(f64);

impl DifficultyIndex {
    pub const MIN: DifficultyIndex = DifficultyIndex(0.0);
    pub const MAX: DifficultyIndex = DifficultyIndex(1.0);

    /// Clip any raw value into [0, 1]. NaN maps to the minimum.
    pub fn clipped(raw: f64) -> Self {
        if raw.is_nan() {
            return Self::MIN;
        }
        Self(raw.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for DifficultyIndex {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("difficulty {value} outside [0, 1]"))
        }
    }
}

impl From<DifficultyIndex> for f64 {
    fn from(d: DifficultyIndex) -> Self {
        d.0
    }
}

impl fmt::Display for DifficultyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Turns model predictions into a bounded difficulty and remembers the latest one.
///
/// The current difficulty is replaced on every step; there is no smoothing.
#[derive(Debug, Clone)]
pub struct DifficultyController<M> {
    model: M,
    current: DifficultyIndex,
}

impl<M: DifficultyModel> DifficultyController<M> {
    pub fn new(model: M, initial: DifficultyIndex) -> Self {
        Self {
            model,
            current: initial,
        }
    }

    pub fn step(&mut self, signal: &Signal) -> DifficultyIndex {
        let raw = self.model.predict(signal);
        let next = DifficultyIndex::clipped(raw);
        debug!(raw, previous = %self.current, next = %next, "difficulty step");
        self.current = next;
        next
    }

    /// Resume from a difficulty recorded elsewhere (e.g. a previous session).
    pub fn reset(&mut self, difficulty: DifficultyIndex) {
        self.current = difficulty;
    }

    pub fn current(&self) -> DifficultyIndex {
        self.current
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinearModel;

    struct Fixed(f64);

    impl DifficultyModel for Fixed {
        fn predict(&self, _signal: &Signal) -> f64 {
            self.0
        }
    }

    fn signal(e: f64, w: f64, f: f64) -> Signal {
        Signal::new(e, w, f).unwrap()
    }

    #[test]
    fn clips_raw_predictions() {
        let s = signal(0.1, 100.0, 0.7);
        for (raw, expected) in [(1.7, 1.0), (-0.3, 0.0), (0.42, 0.42), (f64::NAN, 0.0)] {
            let mut controller = DifficultyController::new(Fixed(raw), DifficultyIndex::clipped(0.5));
            assert_eq!(controller.step(&s).value(), expected);
        }
    }

    #[test]
    fn adversarial_signals_stay_in_bounds() {
        let model = LinearModel::seeded().unwrap();
        let mut controller = DifficultyController::new(model, DifficultyIndex::clipped(0.5));
        let signals = [
            signal(0.0, 10000.0, 0.0),
            signal(1.0, 0.0, 1.0),
            signal(0.0, 300.0, 1.0),
            signal(1.0, 0.0, 0.0),
            signal(0.5, 0.0, 0.5),
        ];
        for s in signals {
            let d = controller.step(&s).value();
            assert!((0.0..=1.0).contains(&d), "difficulty {d} out of bounds");
        }
        assert_eq!(controller.step(&signal(0.0, 10000.0, 0.0)).value(), 1.0);
        assert_eq!(controller.step(&signal(1.0, 0.0, 1.0)).value(), 0.0);
    }

    #[test]
    fn current_follows_last_step_without_smoothing() {
        let model = LinearModel::seeded().unwrap();
        let mut controller = DifficultyController::new(model, DifficultyIndex::clipped(0.5));
        assert_eq!(controller.current().value(), 0.5);

        let high = controller.step(&signal(0.0, 10000.0, 0.0));
        assert_eq!(controller.current(), high);
        let low = controller.step(&signal(1.0, 0.0, 1.0));
        assert_eq!(controller.current(), low);
        assert_eq!(low.value(), 0.0);
    }

    #[test]
    fn serde_rejects_out_of_range_index() {
        assert!(serde_json::from_str::<DifficultyIndex>("1.5").is_err());
        let d: DifficultyIndex = serde_json::from_str("0.25").unwrap();
        assert_eq!(d.value(), 0.25);
    }
}
