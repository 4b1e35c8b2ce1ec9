use crate::error::{Result, TutorError};
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A labelled example: (error_rate, wpm, focus_score) -> difficulty index.
pub type Example = ([f64; 3], f64);

/// Cold-start examples spanning the extremes of learner performance.
pub const SEED_DATASET: [Example; 4] = [
    // few errors, fast, focused
    ([0.0, 150.0, 0.9], 0.9),
    ([0.1, 100.0, 0.7], 0.6),
    ([0.3, 50.0, 0.4], 0.3),
    // many errors
    ([0.5, 30.0, 0.2], 0.1),
];

/// Anything that maps a signal to a raw (unbounded) difficulty prediction.
pub trait DifficultyModel {
    fn predict(&self, signal: &Signal) -> f64;
}

/// Ordinary least-squares linear regression over the three signal features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    /// Weights for error_rate, wpm, focus_score in that order.
    pub coefficients: [f64; 3],
}

impl LinearModel {
    pub fn fit(examples: &[Example]) -> Result<Self> {
        if examples.is_empty() {
            return Err(TutorError::Training("empty training set"));
        }
        let n = examples.len() as f64;

        // Center features and target so the intercept drops out of the system.
        let mut x_mean = [0.0; 3];
        let mut y_mean = 0.0;
        for (x, y) in examples {
            for k in 0..3 {
                x_mean[k] += x[k] / n;
            }
            y_mean += y / n;
        }

        let mut gram = [[0.0; 3]; 3];
        let mut rhs = [0.0; 3];
        for (x, y) in examples {
            let xc = [x[0] - x_mean[0], x[1] - x_mean[1], x[2] - x_mean[2]];
            let yc = y - y_mean;
            for r in 0..3 {
                for c in 0..3 {
                    gram[r][c] += xc[r] * xc[c];
                }
                rhs[r] += xc[r] * yc;
            }
        }

        let coefficients = solve3(gram, rhs)?;
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(x_mean.iter())
                .map(|(w, m)| w * m)
                .sum::<f64>();

        Ok(Self {
            intercept,
            coefficients,
        })
    }

    pub fn seeded() -> Result<Self> {
        Self::fit(&SEED_DATASET)
    }

    fn evaluate(&self, x: [f64; 3]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x.iter())
                .map(|(w, v)| w * v)
                .sum::<f64>()
    }
}

impl DifficultyModel for LinearModel {
    fn predict(&self, signal: &Signal) -> f64 {
        self.evaluate([signal.error_rate(), signal.wpm(), signal.focus_score()])
    }
}

/// Gaussian elimination with partial pivoting.
fn solve3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Result<[f64; 3]> {
    let scale = a
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(f64::MIN_POSITIVE);

    for col in 0..3 {
        let pivot = (col..3)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= scale * 1e-12 {
            return Err(TutorError::Training("features are collinear"));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..3 {
            let factor = a[row][col] / a[col][col];
            for k in col..3 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; 3];
    for row in (0..3).rev() {
        let tail: f64 = (row + 1..3).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

/// Persistence for the regression artifact.
pub trait ModelStore {
    /// `Ok(None)` when no artifact exists yet.
    fn load(&self) -> Result<Option<LinearModel>>;
    fn save(&self, model: &LinearModel) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileModelStore {
    path: PathBuf,
}

impl FileModelStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelStore for FileModelStore {
    fn load(&self) -> Result<Option<LinearModel>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let load_err = |reason: String| TutorError::ModelLoad {
            path: self.path.clone(),
            reason,
        };
        let bytes = fs::read(&self.path).map_err(|e| load_err(e.to_string()))?;
        let model: LinearModel =
            serde_json::from_slice(&bytes).map_err(|e| load_err(e.to_string()))?;
        if !model.intercept.is_finite() || model.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(load_err("non-finite coefficients".to_string()));
        }
        Ok(Some(model))
    }

    fn save(&self, model: &LinearModel) -> Result<()> {
        let save_err = |reason: String| TutorError::ModelSave {
            path: self.path.clone(),
            reason,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
        }
        let data = serde_json::to_vec_pretty(model).map_err(|e| save_err(e.to_string()))?;
        fs::write(&self.path, data).map_err(|e| save_err(e.to_string()))
    }
}

/// Startup step: reuse the stored model, or fit the seed dataset and store it.
///
/// A corrupt artifact is returned as [`TutorError::ModelLoad`]; callers that
/// prefer to recover can call [`retrain`] instead.
pub fn load_or_train<S: ModelStore>(store: &S) -> Result<LinearModel> {
    if let Some(model) = store.load()? {
        info!("loaded difficulty model");
        debug!(?model);
        return Ok(model);
    }
    retrain(store)
}

/// Fit the seed dataset and overwrite whatever the store holds.
pub fn retrain<S: ModelStore>(store: &S) -> Result<LinearModel> {
    let model = LinearModel::seeded()?;
    store.save(&model)?;
    info!(
        intercept = model.intercept,
        coefficients = ?model.coefficients,
        "trained difficulty model from seed dataset"
    );
    Ok(model)
}
