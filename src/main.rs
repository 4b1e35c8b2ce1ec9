use clap::Parser;
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::SeedableRng;
use readadapt::{
    config::{Config, ConfigStore, FileConfigStore},
    history::HistoryDb,
    model::{self, FileModelStore, LinearModel},
    signal::{
        AudioClip, Capture, LandmarkPoint, SignalExtractor, StaticLandmarker, StaticTranscriber,
        TranscriptionError,
    },
    RoundOutcome, Signal, Tutor,
};
use std::{error::Error, path::PathBuf, time::Duration};
use tracing_subscriber::EnvFilter;

/// adaptive reading tutor: difficulty, assistance and coaching feedback per round
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Runs reading-tutor rounds from measured or simulated signals. Each round predicts the next content difficulty, picks assistance settings for the next passage, and prints coaching feedback."
)]
pub struct Cli {
    /// error rate of the reading, 0-1 (requires --wpm and --focus)
    #[clap(long, requires = "wpm", requires = "focus")]
    error_rate: Option<f64>,

    /// words per minute of the reading
    #[clap(long, requires = "error_rate", requires = "focus")]
    wpm: Option<f64>,

    /// focus score, 0-1
    #[clap(long, requires = "error_rate", requires = "wpm")]
    focus: Option<f64>,

    /// what the learner said, scored against the current passage or --target
    #[clap(short = 't', long, conflicts_with = "error_rate")]
    transcript: Option<String>,

    /// text the transcript is scored against instead of the current passage
    #[clap(long, value_name = "TEXT", requires = "transcript")]
    target: Option<String>,

    /// length of the recording in seconds, used for wpm
    #[clap(long, requires = "transcript")]
    duration_secs: Option<f64>,

    /// treat the recording as unintelligible
    #[clap(long, conflicts_with_all = ["transcript", "service_unavailable", "error_rate"])]
    unintelligible: bool,

    /// treat the transcription service as unavailable
    #[clap(long, conflicts_with_all = ["transcript", "error_rate"])]
    service_unavailable: bool,

    /// normalized nose tip x coordinate
    #[clap(long, requires = "nose_y", conflicts_with = "focus")]
    nose_x: Option<f64>,

    /// normalized nose tip y coordinate
    #[clap(long, requires = "nose_x", conflicts_with = "focus")]
    nose_y: Option<f64>,

    /// an image was captured but no face was found
    #[clap(long, conflicts_with_all = ["nose_x", "focus"])]
    no_face: bool,

    /// number of rounds to run with the same inputs
    #[clap(short = 'r', long, default_value_t = 1)]
    rounds: usize,

    /// seed for template choice and simulated signals
    #[clap(short = 's', long)]
    seed: Option<u64>,

    /// discard any stored model and retrain from the seed dataset
    #[clap(long)]
    retrain: bool,

    /// print a summary of recorded rounds and exit
    #[clap(long)]
    history: bool,

    /// export recorded rounds as CSV and exit
    #[clap(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,

    /// do not read or write the round history database
    #[clap(long)]
    ephemeral: bool,

    /// print each round as JSON
    #[clap(long)]
    json: bool,

    /// config file to use instead of the platform default
    #[clap(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// model artifact location
    #[clap(long, value_name = "PATH")]
    model_path: Option<PathBuf>,

    /// round history database location
    #[clap(long, value_name = "PATH")]
    history_path: Option<PathBuf>,

    /// write the effective config (including path overrides) and exit
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn load_config(&self) -> Config {
        let mut config = self.config_store().load();
        if let Some(path) = &self.model_path {
            config.model_path = Some(path.clone());
        }
        if let Some(path) = &self.history_path {
            config.history_path = Some(path.clone());
        }
        config
    }

    fn direct_signal(&self) -> Option<readadapt::Result<Signal>> {
        match (self.error_rate, self.wpm, self.focus) {
            (Some(e), Some(w), Some(f)) => Some(Signal::new(e, w, f)),
            _ => None,
        }
    }

    fn capture(&self) -> Capture {
        let has_audio = self.transcript.is_some() || self.unintelligible || self.service_unavailable;
        let has_image = self.nose_x.is_some() || self.no_face;
        Capture {
            audio: has_audio.then(|| AudioClip {
                bytes: Vec::new(),
                duration: self
                    .duration_secs
                    .filter(|s| *s > 0.0)
                    .and_then(|s| Duration::try_from_secs_f64(s).ok()),
            }),
            image: has_image.then(Vec::new),
        }
    }

    fn extractor(&self) -> SignalExtractor<StaticTranscriber, StaticLandmarker> {
        let transcription = if self.unintelligible {
            Err(TranscriptionError::Unintelligible)
        } else if self.service_unavailable {
            Err(TranscriptionError::ServiceUnavailable)
        } else {
            Ok(self.transcript.clone().unwrap_or_default())
        };
        let point = match (self.nose_x, self.nose_y) {
            (Some(x), Some(y)) => Some(LandmarkPoint::new(x, y)),
            _ => None,
        };
        SignalExtractor::new(StaticTranscriber(transcription), StaticLandmarker(point))
    }
}

fn print_round(round: usize, outcome: &RoundOutcome) {
    let assistance = &outcome.assistance;
    let cues = if assistance.visual_cues.is_empty() {
        "none".to_string()
    } else {
        assistance.visual_cues.iter().join(", ")
    };
    println!("round {round}");
    println!(
        "  signal: error rate {:.2}, wpm {:.0}, focus {:.2}",
        outcome.signal.error_rate(),
        outcome.signal.wpm(),
        outcome.signal.focus_score()
    );
    println!("  difficulty: {}", outcome.difficulty);
    println!(
        "  assistance: cues [{cues}], tts {}, highlight {}",
        if assistance.tts_enabled { "on" } else { "off" },
        assistance.highlight_color
    );
    println!(
        "  next passage ({}): {}",
        outcome.next_passage.level, outcome.next_passage.text
    );
    println!("  feedback: {}", outcome.feedback);
}

fn print_history(db: &HistoryDb) -> Result<(), Box<dyn Error>> {
    let entries = db.all()?;
    match readadapt::history::HistorySummary::from_entries(&entries) {
        Some(summary) => {
            println!("rounds: {}", summary.rounds);
            println!(
                "difficulty: mean {:.2}, std dev {:.2}",
                summary.mean_difficulty, summary.difficulty_std_dev
            );
            println!("mean error rate: {:.2}", summary.mean_error_rate);
            println!("mean focus: {:.2}", summary.mean_focus);
            if let Some(last) = entries.last() {
                println!(
                    "last round: {} (difficulty {})",
                    last.timestamp.format("%c"),
                    last.difficulty
                );
            }
        }
        None => println!("no rounds recorded"),
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.load_config();
    if cli.save_config {
        let store = cli.config_store();
        store.save(&config)?;
        println!("saved config to {}", store.path().display());
        return Ok(());
    }

    let db = if cli.ephemeral {
        None
    } else {
        Some(HistoryDb::open(config.history_path())?)
    };

    if cli.history || cli.export_csv.is_some() {
        let Some(db) = &db else {
            return Err("history is unavailable with --ephemeral".into());
        };
        if let Some(path) = &cli.export_csv {
            let rows = db.export_csv(path)?;
            println!("exported {rows} rounds to {}", path.display());
        }
        if cli.history {
            print_history(db)?;
        }
        return Ok(());
    }

    let store = FileModelStore::with_path(config.model_path());
    let model: LinearModel = if cli.retrain {
        model::retrain(&store)?
    } else {
        model::load_or_train(&store)?
    };

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut sim_rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };

    let mut tutor = Tutor::new(model, &config, rng)?;
    if let Some(db) = &db {
        if let Some(latest) = db.latest_difficulty()? {
            tutor.resume(latest);
        }
    }

    let extractor = cli.extractor();
    let capture = cli.capture();
    for round in 1..=cli.rounds {
        let outcome = match (cli.direct_signal(), cli.target.as_deref()) {
            (Some(signal), _) => tutor.run_round(signal?),
            (None, Some(target)) => {
                tutor.run_capture_against(&extractor, &capture, target, &mut sim_rng)?
            }
            (None, None) => tutor.run_capture(&extractor, &capture, &mut sim_rng)?,
        };

        if let Some(db) = &db {
            db.record(&outcome.entry)?;
        }

        if cli.json {
            println!("{}", serde_json::to_string(&outcome)?);
        } else {
            print_round(round, &outcome);
        }
    }

    Ok(())
}
