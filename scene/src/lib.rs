#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative rendered-world state for Siege Replay.
//!
//! The scene owns every live entity between rounds. No other component keeps
//! a registry of rendered entities; liveness is answered each round through
//! the occupancy index exposed by the [`query`] module. Mutation happens
//! exclusively through [`apply`], which executes a [`Command`] and broadcasts
//! the resulting [`Event`] values.

use std::time::Duration;

use siege_replay_core::{
    BuildingKind, CellCoord, Command, ConstructionState, EntityClass, EntityId, Event, Facing,
    GridSize, RejectionReason, DEMOLITION_LIFETIME,
};

/// Represents the authoritative rendered world of a replay session.
#[derive(Debug)]
pub struct Scene {
    grid: GridSize,
    structures: Vec<Structure>,
    projectiles: Vec<Projectile>,
    structure_occupancy: OccupancyGrid,
    projectile_occupancy: OccupancyGrid,
    demolitions: Vec<Demolition>,
    next_entity: u32,
}

impl Scene {
    /// Creates an empty scene sized to the provided grid.
    #[must_use]
    pub fn new(grid: GridSize) -> Self {
        Self {
            grid,
            structures: Vec::new(),
            projectiles: Vec::new(),
            structure_occupancy: OccupancyGrid::new(grid),
            projectile_occupancy: OccupancyGrid::new(grid),
            demolitions: Vec::new(),
            next_entity: 0,
        }
    }

    /// Removes every live entity and transient marker, returning the scene
    /// to its initial state. Supports playback restarts.
    pub fn reset(&mut self) {
        self.structures.clear();
        self.projectiles.clear();
        self.structure_occupancy.clear();
        self.projectile_occupancy.clear();
        self.demolitions.clear();
        self.next_entity = 0;
    }

    fn allocate(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.wrapping_add(1);
        id
    }

    fn structure_index(&self, cell: CellCoord) -> Option<usize> {
        let id = self.structure_occupancy.occupant(cell)?;
        self.structures
            .iter()
            .position(|structure| structure.id == id)
    }

    fn projectile_index(&self, cell: CellCoord) -> Option<usize> {
        let id = self.projectile_occupancy.occupant(cell)?;
        self.projectiles
            .iter()
            .position(|projectile| projectile.id == id)
    }

    fn spawn_structure(
        &mut self,
        cell: CellCoord,
        kind: BuildingKind,
        construction: ConstructionState,
    ) -> EntityId {
        let id = self.allocate();
        self.structures.push(Structure {
            id,
            cell,
            kind,
            construction,
        });
        self.structure_occupancy.occupy(id, cell);
        id
    }

    fn remove_structure(&mut self, index: usize) -> Structure {
        let structure = self.structures.remove(index);
        self.structure_occupancy.vacate(structure.cell);
        structure
    }
}

/// Applies the provided command to the scene, mutating state deterministically.
///
/// Occupancy reflects every mutation immediately: a query issued after a
/// command returns sees the new state, never a deferred one.
pub fn apply(scene: &mut Scene, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnStructure {
            cell,
            kind,
            construction,
        } => {
            if let Some(reason) = spawn_rejection(scene, cell, EntityClass::Structure) {
                out_events.push(Event::CommandRejected {
                    cell,
                    class: EntityClass::Structure,
                    reason,
                });
                return;
            }

            let id = scene.spawn_structure(cell, kind, construction);
            out_events.push(Event::StructureRaised {
                id,
                cell,
                kind,
                construction,
            });
        }
        Command::CompleteStructure { cell } => {
            let Some(index) = scene.structure_index(cell) else {
                out_events.push(Event::CommandRejected {
                    cell,
                    class: EntityClass::Structure,
                    reason: RejectionReason::Vacant,
                });
                return;
            };

            // Silent despawn followed by a full-scale respawn; never a
            // demolition marker.
            let partial = scene.remove_structure(index);
            let id = scene.spawn_structure(cell, partial.kind, ConstructionState::Complete);
            out_events.push(Event::StructureCompleted {
                id,
                cell,
                kind: partial.kind,
            });
        }
        Command::DemolishStructure { cell } => {
            let Some(index) = scene.structure_index(cell) else {
                out_events.push(Event::CommandRejected {
                    cell,
                    class: EntityClass::Structure,
                    reason: RejectionReason::Vacant,
                });
                return;
            };

            let structure = scene.remove_structure(index);
            scene.demolitions.push(Demolition {
                cell,
                remaining: DEMOLITION_LIFETIME,
            });
            out_events.push(Event::StructureDemolished {
                cell,
                kind: structure.kind,
            });
        }
        Command::SpawnProjectile { cell, facing } => {
            if let Some(reason) = spawn_rejection(scene, cell, EntityClass::Projectile) {
                out_events.push(Event::CommandRejected {
                    cell,
                    class: EntityClass::Projectile,
                    reason,
                });
                return;
            }

            let id = scene.allocate();
            scene.projectiles.push(Projectile { id, cell, facing });
            scene.projectile_occupancy.occupy(id, cell);
            out_events.push(Event::ProjectileLaunched { id, cell, facing });
        }
        Command::ClearProjectile { cell } => {
            let Some(index) = scene.projectile_index(cell) else {
                out_events.push(Event::CommandRejected {
                    cell,
                    class: EntityClass::Projectile,
                    reason: RejectionReason::Vacant,
                });
                return;
            };

            let projectile = scene.projectiles.remove(index);
            scene.projectile_occupancy.vacate(projectile.cell);
            out_events.push(Event::ProjectileCleared {
                id: projectile.id,
                cell: projectile.cell,
            });
        }
        Command::Tick { dt } => {
            let mut index = 0;
            while index < scene.demolitions.len() {
                let remaining = scene.demolitions[index].remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    let expired = scene.demolitions.remove(index);
                    out_events.push(Event::DemolitionExpired { cell: expired.cell });
                } else {
                    scene.demolitions[index].remaining = remaining;
                    index += 1;
                }
            }
        }
    }
}

fn spawn_rejection(scene: &Scene, cell: CellCoord, class: EntityClass) -> Option<RejectionReason> {
    if !scene.grid.contains(cell) {
        return Some(RejectionReason::OutOfBounds);
    }

    let occupied = match class {
        EntityClass::Structure => scene.structure_occupancy.occupant(cell).is_some(),
        EntityClass::Projectile => scene.projectile_occupancy.occupant(cell).is_some(),
    };
    occupied.then_some(RejectionReason::Occupied)
}

/// Query functions that provide read-only access to the scene state.
pub mod query {
    use super::{OccupancyGrid, Scene};
    use siege_replay_core::{
        BuildingKind, CellCoord, ConstructionState, EntityClass, EntityId, Facing, GridSize,
    };
    use std::time::Duration;

    /// Grid dimensions the scene was configured with.
    #[must_use]
    pub fn grid(scene: &Scene) -> GridSize {
        scene.grid
    }

    /// Returns the live entity of the provided class at the cell, if any.
    #[must_use]
    pub fn occupant(scene: &Scene, cell: CellCoord, class: EntityClass) -> Option<EntityId> {
        match class {
            EntityClass::Structure => scene.structure_occupancy.occupant(cell),
            EntityClass::Projectile => scene.projectile_occupancy.occupant(cell),
        }
    }

    /// Returns a snapshot of the structure occupying the cell, if any.
    #[must_use]
    pub fn structure_at(scene: &Scene, cell: CellCoord) -> Option<StructureSnapshot> {
        let id = scene.structure_occupancy.occupant(cell)?;
        scene
            .structures
            .iter()
            .find(|structure| structure.id == id)
            .map(|structure| StructureSnapshot {
                id: structure.id,
                cell: structure.cell,
                kind: structure.kind,
                construction: structure.construction,
            })
    }

    /// Returns a snapshot of the projectile occupying the cell, if any.
    #[must_use]
    pub fn projectile_at(scene: &Scene, cell: CellCoord) -> Option<ProjectileSnapshot> {
        let id = scene.projectile_occupancy.occupant(cell)?;
        scene
            .projectiles
            .iter()
            .find(|projectile| projectile.id == id)
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                cell: projectile.cell,
                facing: projectile.facing,
            })
    }

    /// Captures a read-only view of all live structures.
    #[must_use]
    pub fn structure_view(scene: &Scene) -> StructureView {
        let mut snapshots: Vec<StructureSnapshot> = scene
            .structures
            .iter()
            .map(|structure| StructureSnapshot {
                id: structure.id,
                cell: structure.cell,
                kind: structure.kind,
                construction: structure.construction,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        StructureView { snapshots }
    }

    /// Captures a read-only view of all live projectile markers.
    #[must_use]
    pub fn projectile_view(scene: &Scene) -> ProjectileView {
        let mut snapshots: Vec<ProjectileSnapshot> = scene
            .projectiles
            .iter()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                cell: projectile.cell,
                facing: projectile.facing,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        ProjectileView { snapshots }
    }

    /// Captures the transient demolition markers currently alive, in the
    /// order they were planted.
    #[must_use]
    pub fn demolition_view(scene: &Scene) -> Vec<DemolitionSnapshot> {
        scene
            .demolitions
            .iter()
            .map(|demolition| DemolitionSnapshot {
                cell: demolition.cell,
                remaining: demolition.remaining,
            })
            .collect()
    }

    /// Exposes the dense occupancy grid for the provided entity class.
    #[must_use]
    pub fn occupancy_view(scene: &Scene, class: EntityClass) -> OccupancyView<'_> {
        let grid = match class {
            EntityClass::Structure => &scene.structure_occupancy,
            EntityClass::Projectile => &scene.projectile_occupancy,
        };
        OccupancyView { grid }
    }

    /// Immutable representation of a single live structure.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct StructureSnapshot {
        /// Handle allocated to the structure by the scene.
        pub id: EntityId,
        /// Cell the structure occupies.
        pub cell: CellCoord,
        /// Type of the structure.
        pub kind: BuildingKind,
        /// Build progress the structure is rendered in.
        pub construction: ConstructionState,
    }

    /// Immutable representation of a single live projectile marker.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ProjectileSnapshot {
        /// Handle allocated to the projectile by the scene.
        pub id: EntityId,
        /// Cell the projectile occupies.
        pub cell: CellCoord,
        /// Direction the projectile faces.
        pub facing: Facing,
    }

    /// Immutable representation of a transient demolition marker.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DemolitionSnapshot {
        /// Cell the marker occupies.
        pub cell: CellCoord,
        /// Lifetime left before the marker self-removes.
        pub remaining: Duration,
    }

    /// Read-only view over all live structures in deterministic order.
    #[derive(Clone, Debug)]
    pub struct StructureView {
        snapshots: Vec<StructureSnapshot>,
    }

    impl StructureView {
        /// Iterator over the captured structure snapshots.
        pub fn iter(&self) -> impl Iterator<Item = &StructureSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<StructureSnapshot> {
            self.snapshots
        }
    }

    /// Read-only view over all live projectile markers in deterministic
    /// order.
    #[derive(Clone, Debug)]
    pub struct ProjectileView {
        snapshots: Vec<ProjectileSnapshot>,
    }

    impl ProjectileView {
        /// Iterator over the captured projectile snapshots.
        pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
            self.snapshots
        }
    }

    /// Read-only view into one dense occupancy grid.
    #[derive(Clone, Copy, Debug)]
    pub struct OccupancyView<'a> {
        grid: &'a OccupancyGrid,
    }

    impl OccupancyView<'_> {
        /// Returns the entity occupying the provided cell, if any.
        #[must_use]
        pub fn occupant(&self, cell: CellCoord) -> Option<EntityId> {
            self.grid.occupant(cell)
        }

        /// Reports whether the cell currently holds no entity of the class.
        #[must_use]
        pub fn is_free(&self, cell: CellCoord) -> bool {
            self.grid.occupant(cell).is_none()
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Structure {
    id: EntityId,
    cell: CellCoord,
    kind: BuildingKind,
    construction: ConstructionState,
}

#[derive(Clone, Copy, Debug)]
struct Projectile {
    id: EntityId,
    cell: CellCoord,
    facing: Facing,
}

#[derive(Clone, Copy, Debug)]
struct Demolition {
    cell: CellCoord,
    remaining: Duration,
}

#[derive(Clone, Debug)]
struct OccupancyGrid {
    grid: GridSize,
    cells: Vec<Option<EntityId>>,
}

impl OccupancyGrid {
    fn new(grid: GridSize) -> Self {
        let capacity_u64 = u64::from(grid.width()) * u64::from(grid.height());
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            grid,
            cells: vec![None; capacity],
        }
    }

    fn clear(&mut self) {
        self.cells.fill(None);
    }

    fn occupant(&self, cell: CellCoord) -> Option<EntityId> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn occupy(&mut self, id: EntityId, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = Some(id);
            }
        }
    }

    fn vacate(&mut self, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = None;
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.grid.contains(cell) {
            let row = usize::try_from(cell.y()).ok()?;
            let column = usize::try_from(cell.x()).ok()?;
            let width = usize::try_from(self.grid.width()).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
