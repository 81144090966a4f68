//! Session storage and flash messages

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Flash messages grouped by type (`notice`, `error`, ...)
pub type Flashes = BTreeMap<String, Vec<String>>;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid session file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// How flash messages expire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashMode {
    /// Messages stay until read with [`FlashBag::all`]
    #[default]
    Direct,
    /// Messages are shown on the next request only, read or not
    AutoExpire,
}

/// Per-session one-shot messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashBag {
    #[serde(default)]
    mode: FlashMode,
    #[serde(default)]
    display: Flashes,
    #[serde(default)]
    pending: Flashes,
}

impl FlashBag {
    /// An empty bag with the given expiry mode
    #[must_use]
    pub fn new(mode: FlashMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Expiry mode
    #[must_use]
    pub fn mode(&self) -> FlashMode {
        self.mode
    }

    /// Queue a message
    ///
    /// In auto-expire mode the message becomes visible on the next request.
    pub fn add(&mut self, kind: impl Into<String>, message: impl Into<String>) {
        let target = match self.mode {
            FlashMode::Direct => &mut self.display,
            FlashMode::AutoExpire => &mut self.pending,
        };
        target.entry(kind.into()).or_default().push(message.into());
    }

    /// Visible messages, without consuming them
    #[must_use]
    pub fn peek_all(&self) -> &Flashes {
        &self.display
    }

    /// Replace the queued messages
    ///
    /// In auto-expire mode this re-arms the given messages for the next request.
    pub fn set_all(&mut self, messages: Flashes) {
        match self.mode {
            FlashMode::Direct => self.display = messages,
            FlashMode::AutoExpire => self.pending = messages,
        }
    }

    /// Take every visible message
    pub fn all(&mut self) -> Flashes {
        std::mem::take(&mut self.display)
    }

    /// Move to the next request
    ///
    /// Auto-expiring bags drop what was visible and show what was queued.
    pub fn advance(&mut self) {
        if self.mode == FlashMode::AutoExpire {
            self.display = std::mem::take(&mut self.pending);
        }
    }
}

/// Key/value session shared across requests of one user
pub trait Session {
    /// A stored value
    fn get(&self, key: &str) -> Option<&str>;

    /// Store a value; `None` removes the key
    fn set(&mut self, key: &str, value: Option<String>);

    /// Flash messages
    fn flash_bag(&self) -> &FlashBag;

    /// Flash messages, mutably
    fn flash_bag_mut(&mut self) -> &mut FlashBag;
}

/// Session state as persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(default)]
    pub flashes: FlashBag,
}

impl SessionData {
    fn set(&mut self, key: &str, value: Option<String>) {
        match value {
            Some(value) => {
                self.values.insert(key.to_string(), value);
            }
            None => {
                self.values.remove(key);
            }
        }
    }
}

/// In-memory session
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    data: SessionData,
}

impl MemorySession {
    /// An empty session with direct flashes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty session whose flashes use the given mode
    #[must_use]
    pub fn with_flash_mode(mode: FlashMode) -> Self {
        Self {
            data: SessionData {
                values: BTreeMap::new(),
                flashes: FlashBag::new(mode),
            },
        }
    }
}

impl Session for MemorySession {
    fn get(&self, key: &str) -> Option<&str> {
        self.data.values.get(key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: Option<String>) {
        self.data.set(key, value);
    }

    fn flash_bag(&self) -> &FlashBag {
        &self.data.flashes
    }

    fn flash_bag_mut(&mut self) -> &mut FlashBag {
        &mut self.data.flashes
    }
}

/// Session persisted as a JSON file
///
/// Loading a file session starts a new request: auto-expiring flashes advance.
#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
    data: SessionData,
}

impl FileSession {
    /// Load the session at `path`; a missing file is an empty session
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let mut data = match fs::read_to_string(path) {
            Ok(content) => {
                serde_json::from_str::<SessionData>(&content).map_err(|source| {
                    SessionError::Json {
                        path: path.to_path_buf(),
                        source,
                    }
                })?
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => SessionData::default(),
            Err(source) => {
                return Err(SessionError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        data.flashes.advance();

        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Write the session back to its file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save(&self) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(&self.data).map_err(|source| SessionError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl Session for FileSession {
    fn get(&self, key: &str) -> Option<&str> {
        self.data.values.get(key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: Option<String>) {
        self.data.set(key, value);
    }

    fn flash_bag(&self) -> &FlashBag {
        &self.data.flashes
    }

    fn flash_bag_mut(&mut self) -> &mut FlashBag {
        &mut self.data.flashes
    }
}
