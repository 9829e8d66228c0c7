use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::session::{ResponseMode, SessionConfig, Timing};

/// Persisted operator settings. Timing fields are overrides on top of the
/// preset for the chosen mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub max_trials: usize,
    pub dataset: PathBuf,
    pub output_dir: PathBuf,
    pub mode: ResponseMode,
    pub seed: Option<u64>,
    pub first_word_secs: Option<f64>,
    pub isi_secs: Option<f64>,
    pub response_window_secs: Option<f64>,
    pub sample_interval_ms: Option<u64>,
    pub fade: bool,
    pub accept_unmapped_keys: bool,
    pub score_responses: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_trials: 5,
            dataset: PathBuf::from("word_dataset.csv"),
            output_dir: PathBuf::from("."),
            mode: ResponseMode::Keys,
            seed: None,
            first_word_secs: None,
            isi_secs: None,
            response_window_secs: None,
            sample_interval_ms: None,
            fade: true,
            accept_unmapped_keys: false,
            score_responses: false,
        }
    }
}

fn seconds(name: &str, value: Option<f64>, preset: Duration) -> Duration {
    match value.map(Duration::try_from_secs_f64) {
        None => preset,
        Some(Ok(d)) => d,
        Some(Err(e)) => {
            warn!("ignoring {name}={value:?}: {e}; using {preset:?}");
            preset
        }
    }
}

impl Config {
    /// The only configuration the session loop sees
    pub fn session_config(&self) -> SessionConfig {
        let preset = Timing::for_mode(self.mode);
        let mut timing = Timing {
            first_word: seconds("first_word_secs", self.first_word_secs, preset.first_word),
            isi: seconds("isi_secs", self.isi_secs, preset.isi),
            response_window: seconds(
                "response_window_secs",
                self.response_window_secs,
                preset.response_window,
            ),
            ..preset
        };

        match self.sample_interval_ms {
            Some(0) => warn!("ignoring sample_interval_ms=0; using {:?}", preset.sample_interval),
            Some(ms) => timing.sample_interval = Duration::from_millis(ms),
            None => {}
        }

        if !self.fade {
            timing.fade_steps = 0;
            timing.fade_out_second = false;
        }

        SessionConfig {
            mode: self.mode,
            max_trials: self.max_trials,
            timing,
            accept_unmapped_keys: self.accept_unmapped_keys,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "wordpair") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("wordpair_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("unreadable config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            max_trials: 12,
            dataset: PathBuf::from("words.csv"),
            output_dir: PathBuf::from("out"),
            mode: ResponseMode::Mouse,
            seed: Some(7),
            first_word_secs: Some(0.5),
            isi_secs: None,
            response_window_secs: Some(3.0),
            sample_interval_ms: Some(20),
            fade: false,
            accept_unmapped_keys: true,
            score_responses: true,
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_or_corrupt_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"max_trials": 9, "mode": "mouse"}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.max_trials, 9);
        assert_eq!(cfg.mode, ResponseMode::Mouse);
        assert!(cfg.fade);
        assert_eq!(cfg.dataset, PathBuf::from("word_dataset.csv"));
    }

    #[test]
    fn session_config_uses_mode_preset() {
        let cfg = Config {
            mode: ResponseMode::Mouse,
            ..Config::default()
        };
        let session = cfg.session_config();
        assert_eq!(session.mode, ResponseMode::Mouse);
        assert_eq!(session.max_trials, 5);
        assert_eq!(session.timing, Timing::mouse());
    }

    #[test]
    fn session_config_applies_overrides() {
        let cfg = Config {
            first_word_secs: Some(0.25),
            isi_secs: Some(0.0),
            sample_interval_ms: Some(50),
            fade: false,
            accept_unmapped_keys: true,
            ..Config::default()
        };
        let session = cfg.session_config();
        assert_eq!(session.timing.first_word, Duration::from_millis(250));
        assert_eq!(session.timing.isi, Duration::ZERO);
        assert_eq!(session.timing.sample_interval, Duration::from_millis(50));
        assert_eq!(session.timing.fade_steps, 0);
        assert!(!session.timing.fade_out_second);
        assert!(session.accept_unmapped_keys);
    }

    #[test]
    fn invalid_durations_fall_back_to_preset() {
        let cfg = Config {
            first_word_secs: Some(-1.0),
            isi_secs: Some(f64::NAN),
            sample_interval_ms: Some(0),
            ..Config::default()
        };
        let session = cfg.session_config();
        let preset = Timing::keys();
        assert_eq!(session.timing.first_word, preset.first_word);
        assert_eq!(session.timing.isi, preset.isi);
        assert_eq!(session.timing.sample_interval, preset.sample_interval);
    }
}
