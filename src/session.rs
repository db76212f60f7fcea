use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

// Word pool for generated secret phrases. The phrase is a local
// convenience identity, not a key; it only has to be memorable and
// unlikely to collide between two players on the same node.
const PHRASE_WORDS: &[&str] = &[
    "anchor", "ballast", "bowline", "breaker", "compass", "current", "drift", "ensign",
    "fathom", "galley", "harbor", "jetty", "keel", "lantern", "mast", "moor",
    "pennant", "quarter", "rudder", "sextant", "spindrift", "squall", "tide", "windward",
];

/// Non-authoritative local state carried across runs: a generated secret
/// phrase and the display nickname. Read once at startup, written back
/// only when absent or changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub secret_phrase: String,
    #[serde(default)]
    pub nickname: String,
}

pub fn generate_phrase<R: Rng>(rng: &mut R) -> String {
    (0..4)
        .map(|_| *PHRASE_WORDS.choose(rng).expect("word pool is non-empty"))
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    session: Session,
}

impl SessionStore {
    /// Load the session file, or create it with a fresh phrase. A file
    /// that fails to parse is replaced rather than treated as fatal; the
    /// session is a cache, never required for correctness.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading session file {}", path.display()))?;
            match toml::from_str::<Session>(&raw) {
                Ok(session) => {
                    log::debug!("loaded session from {}", path.display());
                    return Ok(Self { path: path.to_path_buf(), session });
                }
                Err(e) => {
                    log::warn!("session file {} is unreadable ({e}); regenerating", path.display());
                }
            }
        }
        let session = Session {
            secret_phrase: generate_phrase(&mut rand::thread_rng()),
            nickname: String::new(),
        };
        let store = Self { path: path.to_path_buf(), session };
        store.persist()?;
        log::info!("created session file {}", store.path.display());
        Ok(store)
    }

    pub fn secret_phrase(&self) -> &str {
        &self.session.secret_phrase
    }

    pub fn nickname(&self) -> &str {
        &self.session.nickname
    }

    /// Persist a new nickname. No write happens when the value is unchanged.
    pub fn set_nickname(&mut self, name: &str) -> Result<()> {
        if self.session.nickname == name {
            return Ok(());
        }
        self.session.nickname = name.to_string();
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating session directory {}", dir.display()))?;
        }
        let body = toml::to_string_pretty(&self.session).context("encoding session")?;
        fs::write(&self.path, body)
            .with_context(|| format!("writing session file {}", self.path.display()))
    }
}

/// Default location under the home directory; `BROADSIDE_SESSION_FILE`
/// and `--session-file` override it through config.
pub fn default_session_path() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".broadside")
        .join("session.toml")
}
