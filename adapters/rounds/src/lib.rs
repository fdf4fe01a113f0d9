#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Filesystem round source for Siege Replay.
//!
//! A match replay is a directory holding one subdirectory per round
//! (`Round 000`, `Round 001`, ...), each containing one subdirectory per
//! player with that player's serialized view of the world. The viewer
//! consumes the first player directory's document; player display names are
//! read once from round zero's directory names and fixed for the match.

use std::{
    fs,
    path::{Path, PathBuf},
};

use siege_replay_core::{ReplayError, Snapshot};

/// File inside each player directory holding the serialized world state.
const STATE_FILE: &str = "JsonMap.json";

/// Sequential, round-numbered source of match snapshots.
#[derive(Clone, Debug)]
pub struct RoundSource {
    root: PathBuf,
}

impl RoundSource {
    /// Creates a round source rooted at the provided replay directory.
    #[must_use]
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory this source reads rounds from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reports whether a snapshot exists for the provided round.
    #[must_use]
    pub fn has_round(&self, round: u32) -> bool {
        self.round_directory(round).is_dir()
    }

    /// Loads and parses the snapshot for the provided round.
    ///
    /// A round without a directory fails with
    /// [`ReplayError::SnapshotMissing`], which callers treat as the normal
    /// end of the match. An unreadable or malformed document fails with
    /// [`ReplayError::Deserialization`]; snapshots are produced once by an
    /// external process, so no retry is attempted.
    pub fn load_snapshot(&self, round: u32) -> Result<Snapshot, ReplayError> {
        if !self.has_round(round) {
            return Err(ReplayError::SnapshotMissing { round });
        }

        let players = self.player_directories(round)?;
        let first = players
            .first()
            .ok_or_else(|| malformed(round, "round directory holds no player directories"))?;

        let state_path = first.join(STATE_FILE);
        let document = fs::read_to_string(&state_path).map_err(|error| {
            ReplayError::Deserialization {
                round,
                source: Box::new(error),
            }
        })?;
        let snapshot: Snapshot =
            serde_json::from_str(&document).map_err(|error| ReplayError::Deserialization {
                round,
                source: Box::new(error),
            })?;

        Ok(snapshot.with_round(round))
    }

    /// Reads the fixed player identities from round zero's directory names.
    ///
    /// Identity is assigned once for the match duration; callers must not
    /// re-derive it on later rounds.
    pub fn roster(&self) -> Result<MatchRoster, ReplayError> {
        if !self.has_round(0) {
            return Err(ReplayError::SnapshotMissing { round: 0 });
        }

        let players = self.player_directories(0)?;
        let [first, second] = players.as_slice() else {
            return Err(malformed(
                0,
                "round zero must hold exactly two player directories",
            ));
        };

        Ok(MatchRoster {
            players: [
                PlayerIdentity::from_directory(first),
                PlayerIdentity::from_directory(second),
            ],
        })
    }

    fn round_directory(&self, round: u32) -> PathBuf {
        self.root.join(format!("Round {round:03}"))
    }

    fn player_directories(&self, round: u32) -> Result<Vec<PathBuf>, ReplayError> {
        let round_directory = self.round_directory(round);
        let entries = fs::read_dir(&round_directory).map_err(|error| {
            ReplayError::Deserialization {
                round,
                source: Box::new(error),
            }
        })?;

        let mut directories: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        // Directory enumeration order is platform-defined; sort so side A is
        // always the lexicographically first directory.
        directories.sort();
        Ok(directories)
    }
}

/// Fixed identities of the two players in a match, side A first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchRoster {
    players: [PlayerIdentity; 2],
}

impl MatchRoster {
    /// Identities of both players, side A first.
    #[must_use]
    pub const fn players(&self) -> &[PlayerIdentity; 2] {
        &self.players
    }
}

/// Display identity of one player, derived from a round directory name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerIdentity {
    display_name: String,
}

impl PlayerIdentity {
    /// Parses an identity from a player directory path.
    ///
    /// Directory names follow `"<id> - <name>"`; the display name is the
    /// segment after the first delimiter, trimmed. A name without the
    /// delimiter is used whole.
    #[must_use]
    pub fn from_directory(path: &Path) -> Self {
        let raw = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let display_name = match raw.split_once('-') {
            Some((_, name)) => name.trim().to_owned(),
            None => raw.trim().to_owned(),
        };
        Self { display_name }
    }

    /// Name shown for the player throughout the match.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

fn malformed(round: u32, message: &str) -> ReplayError {
    ReplayError::Deserialization {
        round,
        source: message.to_owned().into(),
    }
}
