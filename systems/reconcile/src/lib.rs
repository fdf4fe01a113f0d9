#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure reconciliation system that diffs a round snapshot against the
//! currently rendered scene.
//!
//! For every cell the system compares the declared occupant of each entity
//! class with the live occupant reported by the scene and emits the minimal
//! [`Command`] batch that brings the rendered state in line: a cell whose
//! declaration matches its occupancy produces nothing, so replaying an
//! unchanged round is a no-op (no flicker, no duplicate spawns, no stale
//! artifacts).
//!
//! Occupancy is supplied through closures so the system stays independent of
//! the scene crate; callers wire the closures to the scene's query module.

use siege_replay_core::{
    Building, CellCoord, Command, ConstructionState, Facing, Missile, ReplayError, Snapshot,
};

/// Diffs the snapshot against current occupancy and emits lifecycle commands.
///
/// `structure_at` reports the build progress of the live structure at a
/// cell, if one exists; `projectile_at` reports whether a live projectile
/// marker occupies a cell. Cells are walked column-major (x outer, y inner);
/// the order affects only on-screen sequencing, never the resulting state.
///
/// Shape validation runs first: a snapshot whose map data does not match its
/// declared dimensions fails with [`ReplayError::SnapshotShape`] before any
/// command is emitted, so a corrupt replay never renders a partial board.
pub fn reconcile<S, P>(
    snapshot: &Snapshot,
    mut structure_at: S,
    mut projectile_at: P,
    out: &mut Vec<Command>,
) -> Result<(), ReplayError>
where
    S: FnMut(CellCoord) -> Option<ConstructionState>,
    P: FnMut(CellCoord) -> bool,
{
    snapshot.ensure_shape()?;

    let grid = snapshot.grid();
    for x in 0..grid.width() {
        for y in 0..grid.height() {
            let coord = CellCoord::new(x, y);
            // Shape was verified above, so every coordinate resolves.
            let Some(cell) = snapshot.cell(coord) else {
                continue;
            };

            reconcile_structure(coord, cell.building(), structure_at(coord), out);
            reconcile_projectile(coord, cell.missile(), projectile_at(coord), out);
        }
    }

    Ok(())
}

fn reconcile_structure(
    coord: CellCoord,
    declared: Option<&Building>,
    live: Option<ConstructionState>,
    out: &mut Vec<Command>,
) {
    match (declared, live) {
        (Some(building), None) => out.push(Command::SpawnStructure {
            cell: coord,
            kind: building.kind(),
            construction: building.construction_state(),
        }),
        (Some(building), Some(current)) => {
            // The only in-place transition is partial to complete. A
            // structure that is still building, or already complete on both
            // sides, is left untouched so it spawns exactly once.
            if building.construction_state() == ConstructionState::Complete
                && current == ConstructionState::Building
            {
                out.push(Command::CompleteStructure { cell: coord });
            }
        }
        (None, Some(_)) => out.push(Command::DemolishStructure { cell: coord }),
        (None, None) => {}
    }
}

fn reconcile_projectile(
    coord: CellCoord,
    declared: Option<&Missile>,
    live: bool,
    out: &mut Vec<Command>,
) {
    match (declared, live) {
        (Some(missile), false) => out.push(Command::SpawnProjectile {
            cell: coord,
            facing: Facing::for_side(missile.owner()),
        }),
        // Re-declared at the same cell: still in flight this round.
        (Some(_), true) => {}
        (None, true) => out.push(Command::ClearProjectile { cell: coord }),
        (None, false) => {}
    }
}
