use std::fs;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::rngs::mock::StepRng;
use rand::rngs::StdRng;
use rand::SeedableRng;

use wordpair::analysis;
use wordpair::dataset::{Category, Dataset};
use wordpair::experiment::Experiment;
use wordpair::recorder::{self, Recorder};
use wordpair::runtime::{Devices, FixedTicker, Runner, StimulusEvent, TestEventSource};
use wordpair::session::{
    ResponseMode, SessionConfig, SessionOutcome, Timing, TrialRecord, UserResponse,
};
use wordpair::ui::screen::RecordingSurface;

const DATASET: &str = "\
initial_word,similar,unrelated,gibberish
cat,feline,table,zxq
dog,\"canine,puppy\",sofa,brrk
sun,star,spoon,qlth
";

fn key(c: char) -> StimulusEvent {
    StimulusEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn esc() -> StimulusEvent {
    StimulusEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))
}

fn quick(mode: ResponseMode, trials: usize) -> SessionConfig {
    let mut config = SessionConfig::new(mode, trials);
    config.timing = Timing {
        pre_trial: Duration::ZERO,
        first_word: Duration::ZERO,
        fade_steps: 3,
        fade_step: Duration::ZERO,
        isi: Duration::ZERO,
        response_window: Duration::from_millis(30),
        sample_interval: Duration::from_millis(5),
        fade_out_second: true,
        post_trial: Duration::ZERO,
    };
    config
}

fn run_session<R: rand::Rng>(
    dataset: &Dataset,
    config: SessionConfig,
    rng: R,
    events: Vec<StimulusEvent>,
) -> SessionOutcome {
    let (tx, rx) = mpsc::channel();
    for ev in events {
        tx.send(ev).unwrap();
    }
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    let devices = Devices::new(runner, RecordingSurface::new(80, 24));
    Experiment::new(dataset, config, rng, devices).run().unwrap()
}

// Headless keypress session: instructions, one trial, results on disk, accuracy read back
#[test]
fn headless_keypress_session_scores_and_reloads() {
    let dataset = Dataset::from_reader(DATASET.as_bytes()).unwrap();
    let only_cat = Dataset::from_entries([(
        "cat".to_string(),
        dataset.get("cat").unwrap().clone(),
    )]);

    let outcome = run_session(
        &only_cat,
        quick(ResponseMode::Keys, 1),
        StepRng::new(0, 0),
        vec![key(' '), key('1')],
    );
    assert!(!outcome.aborted);

    let trial = match &outcome.results.trials()[0] {
        TrialRecord::Keypress(t) => t,
        other => panic!("unexpected record {other:?}"),
    };
    assert_eq!(trial.initial_word, "cat");
    assert_eq!(trial.second_word, "feline");
    assert_eq!(trial.category, Category::Similar);
    assert_eq!(trial.user_response, UserResponse::Similar);
    assert!(trial.reaction_time >= 0.0);

    let dir = tempfile::tempdir().unwrap();
    let saved = Recorder::new(dir.path())
        .score_responses(true)
        .save(&outcome.results)
        .unwrap();
    assert_eq!(saved, vec![dir.path().join(recorder::KEYPRESS_RESULTS_FILE)]);

    let tallies = analysis::load_accuracy(&saved[0]).unwrap();
    assert_eq!(tallies.len(), 1);
    assert_eq!(tallies[0].category, "similar");
    assert_eq!(tallies[0].percentage(), 100.0);
}

#[test]
fn headless_session_runs_every_word_once() {
    let dataset = Dataset::from_reader(DATASET.as_bytes()).unwrap();
    let outcome = run_session(
        &dataset,
        quick(ResponseMode::Keys, 10),
        StdRng::seed_from_u64(3),
        vec![key('x'), key('1'), key('2'), key('3')],
    );

    // 3 words available for 10 requested trials
    assert_eq!(outcome.results.len(), 3);
    let mut words: Vec<_> = outcome
        .results
        .trials()
        .iter()
        .map(|t| t.stimulus_words().0.to_string())
        .collect();
    words.sort();
    assert_eq!(words, vec!["cat", "dog", "sun"]);

    for record in outcome.results.trials() {
        let (initial, second, category) = record.stimulus_words();
        let entry = dataset.get(initial).unwrap();
        assert!(entry.candidates(category).iter().any(|c| c == second));
    }
}

#[test]
fn headless_abort_keeps_completed_trials() {
    let dataset = Dataset::from_reader(DATASET.as_bytes()).unwrap();
    let outcome = run_session(
        &dataset,
        quick(ResponseMode::Keys, 3),
        StdRng::seed_from_u64(11),
        vec![key(' '), key('2'), esc()],
    );

    assert!(outcome.aborted);
    assert_eq!(outcome.results.len(), 1);

    let dir = tempfile::tempdir().unwrap();
    let saved = Recorder::new(dir.path()).save(&outcome.results).unwrap();
    let text = fs::read_to_string(&saved[0]).unwrap();
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn headless_mouse_session_writes_both_files() {
    let dataset = Dataset::from_reader(DATASET.as_bytes()).unwrap();
    let outcome = run_session(
        &dataset,
        quick(ResponseMode::Mouse, 2),
        StdRng::seed_from_u64(5),
        vec![key(' '), StimulusEvent::Pointer { column: 70, row: 12 }],
    );
    assert_eq!(outcome.results.len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let saved = Recorder::new(dir.path()).save(&outcome.results).unwrap();
    assert_eq!(saved.len(), 2);
    assert!(saved.iter().all(|p| p.exists()));

    let summary = fs::read_to_string(dir.path().join(recorder::MOUSE_SUMMARY_FILE)).unwrap();
    assert_eq!(summary.lines().count(), 3);

    let trials = analysis::load_trajectories(dir.path().join(recorder::MOUSE_DATA_FILE)).unwrap();
    assert_eq!(trials.len(), 2);
    for trial in &trials {
        assert!(!trial.samples.is_empty());
        assert!(trial
            .samples
            .iter()
            .all(|s| s.t >= 0.0 && s.t <= 0.03));
    }
    let recorded: Vec<_> = outcome.results.mouse_trials().cloned().collect();
    assert_eq!(trials, recorded);
}
