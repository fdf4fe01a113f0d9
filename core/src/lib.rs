#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Siege Replay engine.
//!
//! This crate defines the message surface that connects the round source,
//! the authoritative scene, and pure systems. The reconciliation system
//! reads an immutable [`Snapshot`] together with scene occupancy queries and
//! responds with [`Command`] batches describing desired mutations; the scene
//! executes those commands via its `apply` entry point and broadcasts
//! [`Event`] values for adapters to present deterministically.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Distance in world units between the centers of adjacent grid cells.
pub const CELL_SPACING: f32 = 2.0;

/// Height in world units at which projectiles travel above the terrain.
pub const PROJECTILE_ALTITUDE: f32 = 1.0;

/// Uniform scale applied to a structure while it is still being built.
pub const CONSTRUCTION_SCALE: f32 = 0.5;

/// Uniform scale applied to a fully built structure.
pub const COMPLETE_SCALE: f32 = 1.0;

/// Lifetime of the transient demolition marker planted when a structure is
/// torn down.
pub const DEMOLITION_LIFETIME: Duration = Duration::from_secs(2);

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

/// Dimensions of the match map measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridSize {
    width: u32,
    height: u32,
}

impl GridSize {
    /// Creates a new grid size descriptor.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of cell columns in the map.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of cell rows in the map.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the provided cell lies within the map bounds.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.x() < self.width && cell.y() < self.height
    }
}

/// Unique handle allocated by the scene for a live rendered entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// The two entity classes with independent lifecycle rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityClass {
    /// Stationary structure occupying a cell across rounds.
    Structure,
    /// Transient projectile marker, single-round-lived unless re-declared.
    Projectile,
}

/// Types of structures that can appear on the match map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum BuildingKind {
    /// Offensive structure that launches projectiles.
    Attack,
    /// Defensive structure that absorbs incoming projectiles.
    Defense,
    /// Structure that generates energy for its owner.
    Energy,
    /// High-value structure with its own attack behavior.
    Tesla,
}

/// The two sides competing in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum OwnerSide {
    /// The player occupying the left half of the map.
    A,
    /// The player occupying the right half of the map.
    B,
}

/// Horizontal facing assigned to a projectile based on its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Travel toward increasing column indices.
    East,
    /// Travel toward decreasing column indices.
    West,
}

impl Facing {
    /// Derives the canonical facing for a projectile owned by the given side.
    ///
    /// Side A projectiles travel east across the map, side B projectiles
    /// travel west.
    #[must_use]
    pub const fn for_side(side: OwnerSide) -> Self {
        match side {
            OwnerSide::A => Self::East,
            OwnerSide::B => Self::West,
        }
    }
}

/// Build progress of a structure as declared by a snapshot or tracked by the
/// scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstructionState {
    /// The structure is still being built and renders at reduced scale.
    Building,
    /// The structure is fully built and renders at full scale.
    Complete,
}

/// Structure declared by a snapshot cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    building_type: BuildingKind,
    construction_time_left: i32,
}

impl Building {
    /// Creates a new building declaration.
    #[must_use]
    pub const fn new(kind: BuildingKind, construction_time_left: i32) -> Self {
        Self {
            building_type: kind,
            construction_time_left,
        }
    }

    /// Type of structure declared for the cell.
    #[must_use]
    pub const fn kind(&self) -> BuildingKind {
        self.building_type
    }

    /// Build progress derived from the remaining construction time.
    ///
    /// Any value above `-1` signals an unfinished build; the numeric value
    /// itself carries no finer-grained meaning for reconciliation.
    #[must_use]
    pub const fn construction_state(&self) -> ConstructionState {
        if self.construction_time_left > -1 {
            ConstructionState::Building
        } else {
            ConstructionState::Complete
        }
    }
}

/// Projectile declared by a snapshot cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Missile {
    player_type: OwnerSide,
}

impl Missile {
    /// Creates a new projectile declaration owned by the provided side.
    #[must_use]
    pub const fn new(owner: OwnerSide) -> Self {
        Self { player_type: owner }
    }

    /// Side that launched the projectile, determining its facing.
    #[must_use]
    pub const fn owner(&self) -> OwnerSide {
        self.player_type
    }
}

/// Declared contents of a single grid cell within a snapshot.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    x: u32,
    y: u32,
    #[serde(default)]
    buildings: Vec<Building>,
    #[serde(default)]
    missiles: Vec<Missile>,
}

impl Cell {
    /// Creates a new cell declaration with explicit occupant lists.
    #[must_use]
    pub fn new(x: u32, y: u32, buildings: Vec<Building>, missiles: Vec<Missile>) -> Self {
        Self {
            x,
            y,
            buildings,
            missiles,
        }
    }

    /// Creates an empty cell declaration at the provided coordinates.
    #[must_use]
    pub fn empty(x: u32, y: u32) -> Self {
        Self::new(x, y, Vec::new(), Vec::new())
    }

    /// Zero-based column index declared for the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index declared for the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Structure declared for this cell, if any.
    ///
    /// The wire format carries a sequence, but the domain guarantees at most
    /// one meaningful occupant per class per cell; only the first entry is
    /// consulted and any extras are ignored deterministically.
    #[must_use]
    pub fn building(&self) -> Option<&Building> {
        self.buildings.first()
    }

    /// Projectile declared for this cell, if any. First-entry convention as
    /// for [`Cell::building`].
    #[must_use]
    pub fn missile(&self) -> Option<&Missile> {
        self.missiles.first()
    }
}

/// Per-player scoreboard values declared by a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Remaining health of the player's base.
    pub health: i32,
    /// Energy available for the player to spend.
    pub energy: i32,
    /// Accumulated score.
    pub score: i32,
}

/// Map dimension block carried by a snapshot document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDetails {
    map_width: u32,
    map_height: u32,
}

impl GameDetails {
    /// Creates a new dimension block.
    #[must_use]
    pub const fn new(map_width: u32, map_height: u32) -> Self {
        Self {
            map_width,
            map_height,
        }
    }

    /// Declared grid size of the match map.
    #[must_use]
    pub const fn grid(&self) -> GridSize {
        GridSize::new(self.map_width, self.map_height)
    }
}

/// Complete declared world state for one round.
///
/// Snapshots are immutable; one is constructed per round and discarded once
/// reconciliation has run. The round number is not part of the document and
/// is attached by the round source after parsing.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(skip)]
    round_number: u32,
    players: [PlayerState; 2],
    game_details: GameDetails,
    game_map: Vec<Vec<Cell>>,
}

impl Snapshot {
    /// Assembles a snapshot from its parts.
    #[must_use]
    pub fn new(
        round_number: u32,
        players: [PlayerState; 2],
        game_details: GameDetails,
        game_map: Vec<Vec<Cell>>,
    ) -> Self {
        Self {
            round_number,
            players,
            game_details,
            game_map,
        }
    }

    /// Returns the snapshot with the provided round number attached.
    #[must_use]
    pub fn with_round(mut self, round: u32) -> Self {
        self.round_number = round;
        self
    }

    /// Round this snapshot describes.
    #[must_use]
    pub const fn round_number(&self) -> u32 {
        self.round_number
    }

    /// Scoreboard values for both players, side A first.
    #[must_use]
    pub const fn players(&self) -> &[PlayerState; 2] {
        &self.players
    }

    /// Declared grid size of the match map.
    #[must_use]
    pub const fn grid(&self) -> GridSize {
        self.game_details.grid()
    }

    /// Rows of the declared map, indexed `rows()[y][x]`.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.game_map
    }

    /// Declared cell at the provided coordinates, if within the supplied map
    /// data.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<&Cell> {
        self.game_map
            .get(cell.y() as usize)
            .and_then(|row| row.get(cell.x() as usize))
    }

    /// Verifies that the supplied map data matches the declared dimensions.
    ///
    /// A corrupt replay must not render a misleading partial board, so a
    /// mismatched row count or a ragged row is fatal.
    pub fn ensure_shape(&self) -> Result<(), ReplayError> {
        let declared = self.grid();
        if self.game_map.len() != declared.height() as usize {
            return Err(ReplayError::SnapshotShape {
                round: self.round_number,
                declared,
                mismatch: ShapeMismatch::RowCount {
                    supplied: self.game_map.len(),
                },
            });
        }

        for (index, row) in self.game_map.iter().enumerate() {
            if row.len() != declared.width() as usize {
                return Err(ReplayError::SnapshotShape {
                    round: self.round_number,
                    declared,
                    mismatch: ShapeMismatch::RowWidth {
                        row: index,
                        supplied: row.len(),
                    },
                });
            }
        }

        Ok(())
    }
}

/// Commands that express all permissible scene mutations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Requests that a structure be raised at the provided cell.
    SpawnStructure {
        /// Cell the structure occupies.
        cell: CellCoord,
        /// Type of structure to raise.
        kind: BuildingKind,
        /// Build progress the structure starts in.
        construction: ConstructionState,
    },
    /// Requests that the partially built structure at the cell be replaced
    /// by its completed form. This is a completion transition, not a
    /// destruction, and must never plant a demolition marker.
    CompleteStructure {
        /// Cell holding the structure to complete.
        cell: CellCoord,
    },
    /// Requests that the structure at the cell be torn down, planting a
    /// transient demolition marker in its place.
    DemolishStructure {
        /// Cell holding the structure to demolish.
        cell: CellCoord,
    },
    /// Requests that a projectile marker be placed at the provided cell.
    SpawnProjectile {
        /// Cell the projectile occupies this round.
        cell: CellCoord,
        /// Direction the projectile faces while in flight.
        facing: Facing,
    },
    /// Requests silent removal of the projectile marker at the cell.
    ClearProjectile {
        /// Cell holding the projectile to clear.
        cell: CellCoord,
    },
    /// Advances the scene clock, aging transient demolition markers.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the scene after processing commands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a structure was raised.
    StructureRaised {
        /// Handle allocated to the structure by the scene.
        id: EntityId,
        /// Cell the structure occupies.
        cell: CellCoord,
        /// Type of structure raised.
        kind: BuildingKind,
        /// Build progress the structure was raised in.
        construction: ConstructionState,
    },
    /// Confirms that a partially built structure transitioned to complete.
    StructureCompleted {
        /// Handle allocated to the completed structure.
        id: EntityId,
        /// Cell the structure occupies.
        cell: CellCoord,
        /// Type of the completed structure.
        kind: BuildingKind,
    },
    /// Confirms that a structure was torn down and a demolition marker
    /// planted at its cell.
    StructureDemolished {
        /// Cell the structure occupied.
        cell: CellCoord,
        /// Type of the demolished structure.
        kind: BuildingKind,
    },
    /// Confirms that a projectile marker was placed.
    ProjectileLaunched {
        /// Handle allocated to the projectile by the scene.
        id: EntityId,
        /// Cell the projectile occupies.
        cell: CellCoord,
        /// Direction the projectile faces.
        facing: Facing,
    },
    /// Confirms that a projectile marker was silently removed.
    ProjectileCleared {
        /// Handle of the removed projectile.
        id: EntityId,
        /// Cell the projectile occupied.
        cell: CellCoord,
    },
    /// Reports that a demolition marker reached the end of its lifetime.
    DemolitionExpired {
        /// Cell the marker occupied.
        cell: CellCoord,
    },
    /// Reports that a command was rejected instead of applied.
    CommandRejected {
        /// Cell named by the rejected command.
        cell: CellCoord,
        /// Entity class the command addressed.
        class: EntityClass,
        /// Specific reason the command failed.
        reason: RejectionReason,
    },
}

/// Reasons a scene command may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// A spawn addressed a cell already holding a live entity of the class.
    Occupied,
    /// A despawn or completion addressed a cell with no live entity of the
    /// class.
    Vacant,
    /// The command addressed a cell outside the configured grid.
    OutOfBounds,
}

/// Errors surfaced while loading or reconciling replay rounds.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The requested round has no snapshot on disk. Expected at end of
    /// match; treated as normal termination, not a fault.
    #[error("round {round} has no snapshot; match is over")]
    SnapshotMissing {
        /// Round that was requested.
        round: u32,
    },
    /// The supplied map data does not match the declared dimensions. Fatal.
    #[error(
        "snapshot for round {round} declares a {}x{} map but {mismatch}",
        .declared.width(),
        .declared.height()
    )]
    SnapshotShape {
        /// Round the malformed snapshot describes.
        round: u32,
        /// Dimensions the snapshot declared.
        declared: GridSize,
        /// Specific way the supplied data deviates.
        mismatch: ShapeMismatch,
    },
    /// The snapshot document could not be parsed. Fatal.
    #[error("snapshot for round {round} could not be parsed")]
    Deserialization {
        /// Round whose document was malformed.
        round: u32,
        /// Parser error describing the malformation.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Specific way supplied map data deviates from its declared dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ShapeMismatch {
    /// The map supplied a different number of rows than declared.
    #[error("supplies {supplied} rows")]
    RowCount {
        /// Number of rows actually supplied.
        supplied: usize,
    },
    /// A row supplied a different number of columns than declared.
    #[error("row {row} supplies {supplied} columns")]
    RowWidth {
        /// Zero-based index of the offending row.
        row: usize,
        /// Number of columns that row actually supplied.
        supplied: usize,
    },
}
