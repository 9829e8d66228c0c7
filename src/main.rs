use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, stdout},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use crossterm::{event::KeyCode, tty::IsTty};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::Frame;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use wordpair::{
    analysis::{self, CategoryAccuracy},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    dataset::Dataset,
    experiment::Experiment,
    recorder::{Recorder, KEYPRESS_RESULTS_FILE, MOUSE_DATA_FILE},
    runtime::{is_abort_key, CrosstermEventSource, Devices, FixedTicker, Runner, StimulusEvent},
    session::{MouseTrial, ResponseMode, SessionOutcome},
    ui::{
        screen::TerminalSurface, terminal::TerminalGuard, AccuracyView, TrajectoryPanel,
        TrajectoryView,
    },
};

const TICK_RATE_MS: u64 = 100;
const FAREWELL: Duration = Duration::from_secs(2);

/// word-pair verification experiments in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Runs word-pair verification trials (keypress or mouse-tracking), saves the responses, and plots saved results."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// run an experiment session
    Run(RunArgs),

    /// accuracy per category from a keypress results file
    Accuracy {
        #[clap(default_value = KEYPRESS_RESULTS_FILE)]
        file: PathBuf,
    },

    /// plot recorded mouse trajectories
    Trajectories {
        #[clap(default_value = MOUSE_DATA_FILE)]
        file: PathBuf,
    },
}

/// Flags override the stored config
#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// number of trials to run
    #[clap(short = 'n', long)]
    max_trials: Option<usize>,

    /// word dataset csv
    #[clap(short = 'd', long)]
    dataset: Option<PathBuf>,

    /// response collection mode
    #[clap(short = 'm', long, value_enum)]
    mode: Option<ResponseMode>,

    /// directory results are written to
    #[clap(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// seed for word and category selection
    #[clap(long)]
    seed: Option<u64>,

    /// seconds the first word is shown at full opacity
    #[clap(long)]
    first_word_secs: Option<f64>,

    /// blank interval between the words, in seconds
    #[clap(long)]
    isi_secs: Option<f64>,

    /// mouse response window, in seconds
    #[clap(long)]
    response_window_secs: Option<f64>,

    /// mouse sampling interval, in milliseconds
    #[clap(long)]
    sample_interval_ms: Option<u64>,

    /// show words without fading
    #[clap(long)]
    no_fade: bool,

    /// let any unmapped key end a keypress wait as `unknown`
    #[clap(long = "accept-unmapped")]
    accept_unmapped_keys: bool,

    /// add a `correct` column to the keypress results
    #[clap(long = "score")]
    score_responses: bool,

    /// persist the merged settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl RunArgs {
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(n) = self.max_trials {
            cfg.max_trials = n;
        }
        if let Some(dataset) = &self.dataset {
            cfg.dataset = dataset.clone();
        }
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        cfg.seed = self.seed.or(cfg.seed);
        cfg.first_word_secs = self.first_word_secs.or(cfg.first_word_secs);
        cfg.isi_secs = self.isi_secs.or(cfg.isi_secs);
        cfg.response_window_secs = self.response_window_secs.or(cfg.response_window_secs);
        cfg.sample_interval_ms = self.sample_interval_ms.or(cfg.sample_interval_ms);
        if self.no_fade {
            cfg.fade = false;
        }
        cfg.accept_unmapped_keys |= self.accept_unmapped_keys;
        cfg.score_responses |= self.score_responses;
        cfg
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    match cli.command.unwrap_or(Command::Run(RunArgs::default())) {
        Command::Run(args) => run(args),
        Command::Accuracy { file } => accuracy(&file),
        Command::Trajectories { file } => trajectories(&file),
    }
}

/// The terminal belongs to the TUI, so logs go to a file
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let store = FileConfigStore::new();
    let config = args.apply(store.load());
    if args.save_config {
        store.save(&config)?;
        info!("saved config to {}", store.path().display());
    }

    let dataset = Dataset::load(&config.dataset).inspect_err(|e| {
        error!("dataset {}: {e}", config.dataset.display());
        eprintln!("An error occurred: {e}");
    })?;
    info!(
        "loaded {} words from {}",
        dataset.len(),
        config.dataset.display()
    );

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let session = config.session_config();
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let outcome = {
        let guard = TerminalGuard::enter(session.mode == ResponseMode::Mouse)?;
        let surface = TerminalSurface::new(guard.terminal()?)?;
        let runner = Runner::new(
            CrosstermEventSource::new(),
            FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
        );
        Experiment::new(&dataset, session, rng, Devices::new(runner, surface))
            .farewell(FAREWELL)
            .run()
    };

    let outcome = outcome.inspect_err(|e| {
        error!("session failed: {e}");
        eprintln!("An error occurred: {e}");
    })?;

    let saved = if outcome.results.is_empty() {
        warn!("no completed trials; nothing saved");
        Vec::new()
    } else {
        Recorder::new(&config.output_dir)
            .score_responses(config.score_responses)
            .save(&outcome.results)
            .inspect_err(|e| {
                error!("{e}");
                eprintln!("Error saving data: {e}");
            })?
    };

    for line in session_summary(&outcome, &saved) {
        println!("{line}");
    }
    Ok(())
}

fn session_summary(outcome: &SessionOutcome, saved: &[PathBuf]) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "--- EXPERIMENT SUMMARY ---".to_string(),
        format!("Total Trials: {}", outcome.results.len()),
    ];
    if let Some(shortfall) = outcome.shortfall {
        lines.push(shortfall.to_string());
    }
    if outcome.aborted {
        lines.push("Session aborted; completed trials were kept.".to_string());
    }
    match outcome.results.mode() {
        ResponseMode::Keys => {
            let trials: Vec<_> = outcome.results.keypress_trials().collect();
            if !trials.is_empty() {
                let correct = trials.iter().filter(|t| t.is_correct()).count();
                lines.push(format!("Correct: {}/{}", correct, trials.len()));
            }
        }
        ResponseMode::Mouse => {
            lines.push("No correctness check. Mouse data recorded for each trial.".to_string())
        }
    }
    lines.extend(
        saved
            .iter()
            .map(|p| format!("Results saved to {}", p.display())),
    );
    lines
}

fn accuracy(file: &Path) -> Result<(), Box<dyn Error>> {
    let tallies = match analysis::load_accuracy(file) {
        Ok(tallies) => tallies,
        Err(e) => {
            warn!("accuracy analysis of {}: {e}", file.display());
            println!("{e}");
            return Ok(());
        }
    };

    for line in accuracy_summary(&tallies) {
        println!("{line}");
    }

    if stdout().is_tty() {
        let view = AccuracyView { tallies: &tallies };
        browse(|f, _| f.render_widget(&view, f.area()))?;
    }
    Ok(())
}

fn accuracy_summary(tallies: &[CategoryAccuracy]) -> Vec<String> {
    tallies
        .iter()
        .map(|t| {
            format!(
                "{}: {}/{} ({:.1}%)",
                t.category,
                t.correct,
                t.total,
                t.percentage()
            )
        })
        .collect()
}

fn trajectories(file: &Path) -> Result<(), Box<dyn Error>> {
    let trials = match analysis::load_trajectories(file) {
        Ok(trials) => trials,
        Err(e) => {
            warn!("trajectory plot of {}: {e}", file.display());
            println!("{e}");
            return Ok(());
        }
    };

    for line in trajectory_summary(&trials) {
        println!("{line}");
    }

    if stdout().is_tty() {
        browse(|f, panel| {
            let view = TrajectoryView {
                trials: &trials,
                panel,
            };
            f.render_widget(&view, f.area());
        })?;
    }
    Ok(())
}

fn trajectory_summary(trials: &[MouseTrial]) -> Vec<String> {
    trials
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "Trial {}: {} -> {} ({}), {} samples",
                i + 1,
                t.initial_word,
                t.second_word,
                t.category,
                t.samples.len()
            )
        })
        .collect()
}

/// Show a plot until escape or `q`; tab switches panels
fn browse<F>(mut render: F) -> io::Result<()>
where
    F: FnMut(&mut Frame, TrajectoryPanel),
{
    let guard = TerminalGuard::enter(false)?;
    let mut terminal = guard.terminal()?;
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    let mut panel = TrajectoryPanel::default();
    terminal.draw(|f| render(f, panel))?;
    while let Some(event) = runner.next_event() {
        match event {
            StimulusEvent::Key(key) if is_abort_key(&key) || key.code == KeyCode::Char('q') => {
                break
            }
            StimulusEvent::Key(key) if key.code == KeyCode::Tab => {
                panel = panel.toggle();
                terminal.draw(|f| render(f, panel))?;
            }
            StimulusEvent::Resize => {
                terminal.draw(|f| render(f, panel))?;
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordpair::dataset::Category;
    use wordpair::sampler::InsufficientWords;
    use wordpair::session::{KeypressTrial, SessionResults, TrialRecord, UserResponse};
    use wordpair::trajectory::MouseSample;

    fn run_args(cli: Cli) -> RunArgs {
        match cli.command {
            Some(Command::Run(args)) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_no_subcommand_defaults_to_run() {
        let cli = Cli::parse_from(["wordpair"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_run_flags() {
        let args = run_args(Cli::parse_from([
            "wordpair", "run", "-n", "8", "-d", "words.csv", "-m", "mouse", "-o", "out", "--seed",
            "42",
        ]));
        assert_eq!(args.max_trials, Some(8));
        assert_eq!(args.dataset, Some(PathBuf::from("words.csv")));
        assert_eq!(args.mode, Some(ResponseMode::Mouse));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.seed, Some(42));
        assert!(!args.no_fade);
    }

    #[test]
    fn test_cli_run_switches() {
        let args = run_args(Cli::parse_from([
            "wordpair",
            "run",
            "--no-fade",
            "--accept-unmapped",
            "--score",
            "--save-config",
            "--isi-secs",
            "0.1",
        ]));
        assert!(args.no_fade);
        assert!(args.accept_unmapped_keys);
        assert!(args.score_responses);
        assert!(args.save_config);
        assert_eq!(args.isi_secs, Some(0.1));
    }

    #[test]
    fn test_cli_analyzer_default_files() {
        let cli = Cli::parse_from(["wordpair", "accuracy"]);
        assert!(matches!(
            cli.command,
            Some(Command::Accuracy { file }) if file == Path::new(KEYPRESS_RESULTS_FILE)
        ));

        let cli = Cli::parse_from(["wordpair", "trajectories", "runs/mouse.json"]);
        assert!(matches!(
            cli.command,
            Some(Command::Trajectories { file }) if file == Path::new("runs/mouse.json")
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        let res = Cli::try_parse_from(["wordpair", "run", "--mode", "eyetracker"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_run_args_override_only_given_fields() {
        let stored = Config {
            max_trials: 20,
            seed: Some(1),
            isi_secs: Some(0.4),
            ..Config::default()
        };
        let args = RunArgs {
            max_trials: Some(3),
            no_fade: true,
            ..RunArgs::default()
        };

        let merged = args.apply(stored);
        assert_eq!(merged.max_trials, 3);
        assert_eq!(merged.seed, Some(1));
        assert_eq!(merged.isi_secs, Some(0.4));
        assert!(!merged.fade);
        assert_eq!(merged.mode, ResponseMode::Keys);
    }

    #[test]
    fn test_session_summary_keys() {
        let mut results = SessionResults::new(ResponseMode::Keys);
        results.push(TrialRecord::Keypress(KeypressTrial {
            initial_word: "cat".into(),
            second_word: "feline".into(),
            category: Category::Similar,
            user_response: UserResponse::Similar,
            reaction_time: 0.8,
        }));
        let outcome = SessionOutcome {
            results,
            aborted: false,
            shortfall: None,
        };

        let lines = session_summary(&outcome, &[PathBuf::from("out/results.csv")]);
        assert_eq!(lines[1], "--- EXPERIMENT SUMMARY ---");
        assert_eq!(lines[2], "Total Trials: 1");
        assert!(lines.contains(&"Correct: 1/1".to_string()));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("Results saved to out/results.csv")
        );
    }

    #[test]
    fn test_session_summary_aborted_mouse() {
        let outcome = SessionOutcome {
            results: SessionResults::new(ResponseMode::Mouse),
            aborted: true,
            shortfall: Some(InsufficientWords {
                available: 2,
                requested: 5,
            }),
        };
        let lines = session_summary(&outcome, &[]);
        assert!(lines.contains(&"Warning: Only 2 words available for 5 trials".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("Session aborted")));
        assert!(lines.iter().any(|l| l.starts_with("No correctness check")));
    }

    #[test]
    fn test_accuracy_summary_format() {
        let tallies = vec![CategoryAccuracy {
            category: "similar".into(),
            correct: 2,
            total: 3,
        }];
        assert_eq!(accuracy_summary(&tallies), vec!["similar: 2/3 (66.7%)"]);
    }

    #[test]
    fn test_trajectory_summary_format() {
        let trials = vec![MouseTrial {
            initial_word: "dog".into(),
            second_word: "sofa".into(),
            category: Category::Unrelated,
            samples: vec![MouseSample::new(0.0, 0.0, 0.0), MouseSample::new(0.01, -1.0, 0.0)],
        }];
        assert_eq!(
            trajectory_summary(&trials),
            vec!["Trial 1: dog -> sofa (unrelated), 2 samples"]
        );
    }
}
