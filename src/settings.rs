// Settings store: the small JSON record kept in the user's home directory.
//
// The record is loaded once per invocation, optionally mutated by the
// `target` / `user` commands and written back. Loading never touches the
// disk beyond a read; saving goes through a temp file in the same
// directory that is renamed over the real path.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Name of the settings file inside the home directory.
pub const SETTINGS_FILE_NAME: &str = ".gobeat";

/// Game recorded when nothing else is configured.
pub const DEFAULT_GAME: &str = "ping pong";

/// Errors raised while reading, writing or interpreting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// `$HOME` could not be determined.
    #[error("could not determine home directory for the settings file")]
    NoHomeDir,

    #[error("I/O error accessing settings at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not a valid settings record.
    #[error("failed to parse settings at {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize settings")]
    Serialize(#[source] serde_json::Error),

    #[error("could not look up current user")]
    UserLookup(#[source] io::Error),

    #[error("invalid target URL {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Persisted configuration. All keys are optional on disk so that files
/// written by older versions still load; empty values get backfilled by
/// [`Settings::apply_defaults`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Where results are POSTed. Empty means "not set yet".
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub game: String,
}

impl Settings {
    /// Fill empty `user` / `game` using the OS login name and
    /// [`DEFAULT_GAME`].
    pub fn apply_defaults(&mut self) -> Result<(), SettingsError> {
        self.apply_defaults_with(whoami::fallible::username)
    }

    /// Same as [`Settings::apply_defaults`] with the user lookup supplied by
    /// the caller. `lookup` is only invoked when `user` is empty.
    pub fn apply_defaults_with<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: FnOnce() -> io::Result<String>,
    {
        if self.user.is_empty() {
            self.user = lookup().map_err(SettingsError::UserLookup)?;
        }
        if self.game.is_empty() {
            self.game = DEFAULT_GAME.to_string();
        }
        Ok(())
    }

    /// Parse `target_url`. An empty target resolves to `None`.
    pub fn resolve_url(&self) -> Result<Option<Url>, SettingsError> {
        if self.target_url.is_empty() {
            return Ok(None);
        }
        Url::parse(&self.target_url)
            .map(Some)
            .map_err(|source| SettingsError::InvalidUrl {
                url: self.target_url.clone(),
                source,
            })
    }

    /// Check `target_url` before it is stored. Relative references such as
    /// `foo.gov` are accepted here and only rejected once `result` needs an
    /// absolute URL to post to.
    pub fn check_target(&self) -> Result<(), SettingsError> {
        match self.resolve_url() {
            Err(SettingsError::InvalidUrl {
                source: url::ParseError::RelativeUrlWithoutBase,
                ..
            }) => Ok(()),
            other => other.map(|_| ()),
        }
    }

    /// Text body posted for a match result.
    pub fn result_message(&self, opponent: &str, score: &str) -> String {
        format!(
            "{} beat {} at {} with score {}",
            self.user, opponent, self.game, score
        )
    }
}

/// Location of the settings file plus the load/save operations on it.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.gobeat`.
    pub fn default_location() -> Result<Self, SettingsError> {
        let home = dirs::home_dir().ok_or(SettingsError::NoHomeDir)?;
        Ok(Self::at(home.join(SETTINGS_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the settings file, or build a fresh record if it does not exist.
    /// Defaults are applied in both cases. Nothing is written.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        self.load_with(whoami::fallible::username)
    }

    /// [`SettingsStore::load`] with an explicit current-user lookup.
    pub fn load_with<F>(&self, lookup: F) -> Result<Settings, SettingsError>
    where
        F: FnOnce() -> io::Result<String>,
    {
        let mut settings: Settings = match std::fs::read(&self.path) {
            Ok(bytes) => {
                debug!(path = %self.path.display(), "read settings file");
                serde_json::from_slice(&bytes).map_err(|source| SettingsError::Parse {
                    path: self.path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file, using defaults");
                Settings::default()
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        settings.apply_defaults_with(lookup)?;
        Ok(settings)
    }

    /// Write `settings` to disk. The JSON goes to a temp file next to the
    /// target which is then renamed into place, so a crash mid-write never
    /// leaves a truncated settings file behind.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let bytes = serde_json::to_vec_pretty(settings).map_err(SettingsError::Serialize)?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|source| SettingsError::Io {
            path: dir.clone(),
            source,
        })?;

        let io_err = |source: io::Error| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(&bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        debug!(path = %self.path.display(), "saved settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alex() -> io::Result<String> {
        Ok("alex".to_string())
    }

    fn no_lookup() -> io::Result<String> {
        panic!("user lookup should not run when user is set");
    }

    #[test]
    fn defaults_fill_empty_fields() {
        let mut s = Settings::default();
        s.apply_defaults_with(alex).unwrap();
        assert_eq!(s.user, "alex");
        assert_eq!(s.game, DEFAULT_GAME);
        assert_eq!(s.target_url, "");
    }

    #[test]
    fn defaults_keep_existing_values() {
        let mut s = Settings {
            target_url: "http://scores.test".into(),
            user: "oleg".into(),
            game: "chess".into(),
        };
        let before = s.clone();
        s.apply_defaults_with(no_lookup).unwrap();
        assert_eq!(s, before);
    }

    #[test]
    fn defaults_are_idempotent() {
        let mut once = Settings::default();
        once.apply_defaults_with(alex).unwrap();
        let mut twice = once.clone();
        twice.apply_defaults_with(no_lookup).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn apply_defaults_only_fills_game_when_user_is_set() {
        let mut s = Settings {
            user: "alex".into(),
            ..Settings::default()
        };
        s.apply_defaults().unwrap();
        assert_eq!(s.user, "alex");
        assert_eq!(s.game, DEFAULT_GAME);
    }

    #[test]
    fn load_without_file_uses_os_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.json"));
        match (store.load(), whoami::fallible::username()) {
            (Ok(s), Ok(expected)) => assert_eq!(s.user, expected),
            (Err(SettingsError::UserLookup(_)), Err(_)) => {}
            (got, expected) => panic!("load {got:?} disagrees with lookup {expected:?}"),
        }
        assert!(!store.path().exists());
    }

    #[test]
    fn user_lookup_failure_is_reported() {
        let mut s = Settings::default();
        let err = s
            .apply_defaults_with(|| Err(io::Error::new(io::ErrorKind::Other, "no passwd entry")))
            .unwrap_err();
        assert!(matches!(err, SettingsError::UserLookup(_)));
    }

    #[test]
    fn empty_target_resolves_to_none() {
        assert_eq!(Settings::default().resolve_url().unwrap(), None);
    }

    #[test]
    fn malformed_target_is_an_error() {
        let s = Settings {
            target_url: "http://[::1".into(),
            ..Settings::default()
        };
        assert!(matches!(
            s.resolve_url(),
            Err(SettingsError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn relative_target_passes_check_but_not_resolve() {
        let s = Settings {
            target_url: "foo.gov".into(),
            ..Settings::default()
        };
        s.check_target().unwrap();
        assert!(matches!(
            s.resolve_url(),
            Err(SettingsError::InvalidUrl {
                source: url::ParseError::RelativeUrlWithoutBase,
                ..
            })
        ));
    }

    #[test]
    fn malformed_target_fails_check() {
        let s = Settings {
            target_url: "http://[::1".into(),
            ..Settings::default()
        };
        assert!(s.check_target().is_err());
    }

    #[test]
    fn invalid_url_chain_names_cause_once() {
        let s = Settings {
            target_url: "foo.gov".into(),
            ..Settings::default()
        };
        let err = anyhow::Error::from(s.resolve_url().unwrap_err());
        assert_eq!(
            format!("{err:#}"),
            "invalid target URL \"foo.gov\": relative URL without a base"
        );
    }

    #[test]
    fn result_message_format() {
        let s = Settings {
            target_url: String::new(),
            user: "alex".into(),
            game: "ping pong".into(),
        };
        assert_eq!(
            s.result_message("oleg", "9001-0"),
            "alex beat oleg at ping pong with score 9001-0"
        );
    }

    #[test]
    fn save_then_load_returns_same_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.json"));
        let saved = Settings {
            target_url: "http://scores.test/results".into(),
            user: "alex".into(),
            game: "foosball".into(),
        };
        store.save(&saved).unwrap();
        assert_eq!(store.load_with(no_lookup).unwrap(), saved);
    }

    #[test]
    fn save_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.json"));
        let mut s = Settings {
            target_url: String::new(),
            user: "alex".into(),
            game: DEFAULT_GAME.into(),
        };
        store.save(&s).unwrap();
        s.user = "oleg".into();
        store.save(&s).unwrap();

        assert_eq!(store.load_with(no_lookup).unwrap().user, "oleg");
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn save_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("nested").join("settings.json"));
        let s = Settings {
            target_url: String::new(),
            user: "alex".into(),
            game: DEFAULT_GAME.into(),
        };
        store.save(&s).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn load_missing_file_uses_defaults_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.json"));
        let s = store.load_with(alex).unwrap();
        assert_eq!(s.user, "alex");
        assert_eq!(s.game, DEFAULT_GAME);
        assert!(!store.path().exists());
    }

    #[test]
    fn load_backfills_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.json"));
        std::fs::write(store.path(), r#"{"target_url":"foo.gov","user":""}"#).unwrap();

        let s = store.load_with(alex).unwrap();
        assert_eq!(s.target_url, "foo.gov");
        assert_eq!(s.user, "alex");
        assert_eq!(s.game, DEFAULT_GAME);
    }

    #[test]
    fn load_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.json"));
        std::fs::write(store.path(), b"{ not json").unwrap();
        assert!(matches!(
            store.load_with(alex),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn saved_file_has_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.json"));
        store
            .save(&Settings {
                target_url: String::new(),
                user: "alex".into(),
                game: DEFAULT_GAME.into(),
            })
            .unwrap();
        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        for key in ["target_url", "user", "game"] {
            assert!(raw.get(key).is_some(), "missing key {key}");
        }
    }
}
