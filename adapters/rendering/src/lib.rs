#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared presentation contracts for Siege Replay renderers.
//!
//! This crate translates scene state into declarative presentation data: a
//! renderer draws what it is handed and owns nothing else. No windowing,
//! camera, or audio backend lives here.

use glam::Vec3;
use siege_replay_core::{
    BuildingKind, CellCoord, ConstructionState, Facing, PlayerState, CELL_SPACING, COMPLETE_SCALE,
    CONSTRUCTION_SCALE, PROJECTILE_ALTITUDE,
};
use siege_replay_scene::{query, Scene};
use std::time::Duration;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Flash color applied to a health read-out on the round it changes.
    pub const HEALTH_FLASH: Self = Self::new(1.0, 0.0, 0.0, 1.0);

    /// Steady color applied to an unchanged health read-out.
    pub const HEALTH_STEADY: Self = Self::new(1.0, 0.92, 0.016, 1.0);
}

/// World-space position of a cell's center on the terrain plane.
#[must_use]
pub fn world_position(cell: CellCoord) -> Vec3 {
    Vec3::new(
        cell.x() as f32 * CELL_SPACING,
        0.0,
        cell.y() as f32 * CELL_SPACING,
    )
}

/// World-space position of a projectile at a cell, raised above the terrain.
#[must_use]
pub fn projectile_position(cell: CellCoord) -> Vec3 {
    world_position(cell) + Vec3::new(0.0, PROJECTILE_ALTITUDE, 0.0)
}

/// Uniform scale a structure renders at for the given build progress.
#[must_use]
pub const fn structure_scale(construction: ConstructionState) -> f32 {
    match construction {
        ConstructionState::Building => CONSTRUCTION_SCALE,
        ConstructionState::Complete => COMPLETE_SCALE,
    }
}

/// Yaw rotation in degrees a projectile renders with for the given facing.
#[must_use]
pub const fn facing_yaw_degrees(facing: Facing) -> f32 {
    match facing {
        Facing::East => 90.0,
        Facing::West => -90.0,
    }
}

/// Declarative description of one structure to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructurePresentation {
    /// Type of structure, selecting the model to draw.
    pub kind: BuildingKind,
    /// World-space position of the structure.
    pub position: Vec3,
    /// Uniform scale to draw the structure at.
    pub scale: f32,
    /// Whether the ambient construction audio should be playing. Audio runs
    /// while a structure is being built and stops once it is complete.
    pub construction_audio: bool,
}

/// Declarative description of one projectile to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectilePresentation {
    /// World-space position of the projectile.
    pub position: Vec3,
    /// Yaw rotation in degrees orienting the projectile along its travel.
    pub yaw_degrees: f32,
}

/// Declarative description of one transient demolition effect to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DemolitionPresentation {
    /// World-space position of the effect.
    pub position: Vec3,
    /// Lifetime left before the effect self-removes.
    pub remaining: Duration,
}

/// Complete drawable description of the scene for one frame.
#[derive(Clone, Debug, Default)]
pub struct ScenePresentation {
    /// Structures to draw, in deterministic order.
    pub structures: Vec<StructurePresentation>,
    /// Projectiles to draw, in deterministic order.
    pub projectiles: Vec<ProjectilePresentation>,
    /// Transient demolition effects to draw.
    pub demolitions: Vec<DemolitionPresentation>,
}

/// Projects the live scene into declarative presentation data.
#[must_use]
pub fn scene_presentation(scene: &Scene) -> ScenePresentation {
    let structures = query::structure_view(scene)
        .into_vec()
        .into_iter()
        .map(|structure| StructurePresentation {
            kind: structure.kind,
            position: world_position(structure.cell),
            scale: structure_scale(structure.construction),
            construction_audio: structure.construction == ConstructionState::Building,
        })
        .collect();

    let projectiles = query::projectile_view(scene)
        .into_vec()
        .into_iter()
        .map(|projectile| ProjectilePresentation {
            position: projectile_position(projectile.cell),
            yaw_degrees: facing_yaw_degrees(projectile.facing),
        })
        .collect();

    let demolitions = query::demolition_view(scene)
        .into_iter()
        .map(|demolition| DemolitionPresentation {
            position: world_position(demolition.cell),
            remaining: demolition.remaining,
        })
        .collect();

    ScenePresentation {
        structures,
        projectiles,
        demolitions,
    }
}

/// Per-player read-out values presented alongside the board.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerReadout {
    /// Fixed display name of the player.
    pub name: String,
    /// Health value to display.
    pub health: i32,
    /// Energy value to display.
    pub energy: i32,
    /// Score value to display.
    pub score: i32,
    /// Color of the health read-out; flashes on the round health changes.
    pub health_color: Color,
}

/// Scoreboard that tracks displayed health to drive the change flash.
///
/// Player names are fixed from the round source's roster at match start and
/// never re-derived.
#[derive(Clone, Debug)]
pub struct Scoreboard {
    names: [String; 2],
    displayed_health: [Option<i32>; 2],
}

impl Scoreboard {
    /// Creates a scoreboard presenting the provided fixed player names.
    #[must_use]
    pub fn new(names: [String; 2]) -> Self {
        Self {
            names,
            displayed_health: [None, None],
        }
    }

    /// Produces the read-outs for one round, flashing any health value that
    /// differs from the one currently displayed.
    pub fn update(&mut self, players: &[PlayerState; 2]) -> [PlayerReadout; 2] {
        let readouts = [
            self.readout(0, &players[0]),
            self.readout(1, &players[1]),
        ];
        self.displayed_health = [Some(players[0].health), Some(players[1].health)];
        readouts
    }

    fn readout(&self, index: usize, player: &PlayerState) -> PlayerReadout {
        let changed = self.displayed_health[index] != Some(player.health);
        PlayerReadout {
            name: self.names[index].clone(),
            health: player.health,
            energy: player.energy,
            score: player.score,
            health_color: if changed {
                Color::HEALTH_FLASH
            } else {
                Color::HEALTH_STEADY
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(health: i32) -> PlayerState {
        PlayerState {
            health,
            energy: 20,
            score: 300,
        }
    }

    #[test]
    fn cell_positions_scale_linearly() {
        assert_eq!(world_position(CellCoord::new(0, 0)), Vec3::ZERO);
        assert_eq!(
            world_position(CellCoord::new(3, 2)),
            Vec3::new(6.0, 0.0, 4.0)
        );
    }

    #[test]
    fn projectiles_sit_above_the_terrain() {
        assert_eq!(
            projectile_position(CellCoord::new(1, 1)),
            Vec3::new(2.0, 1.0, 2.0)
        );
    }

    #[test]
    fn structure_scale_follows_build_progress() {
        assert_eq!(structure_scale(ConstructionState::Building), 0.5);
        assert_eq!(structure_scale(ConstructionState::Complete), 1.0);
    }

    #[test]
    fn facings_rotate_in_opposite_directions() {
        assert_eq!(facing_yaw_degrees(Facing::East), 90.0);
        assert_eq!(facing_yaw_degrees(Facing::West), -90.0);
    }

    #[test]
    fn health_flashes_only_on_change() {
        let mut scoreboard = Scoreboard::new(["Steady Bot".to_owned(), "Rushdown".to_owned()]);

        // Nothing was displayed yet, so the first round always flashes.
        let first = scoreboard.update(&[player(100), player(100)]);
        assert_eq!(first[0].health_color, Color::HEALTH_FLASH);

        let unchanged = scoreboard.update(&[player(100), player(100)]);
        assert_eq!(unchanged[0].health_color, Color::HEALTH_STEADY);
        assert_eq!(unchanged[1].health_color, Color::HEALTH_STEADY);

        let hit = scoreboard.update(&[player(100), player(85)]);
        assert_eq!(hit[0].health_color, Color::HEALTH_STEADY);
        assert_eq!(hit[1].health_color, Color::HEALTH_FLASH);
        assert_eq!(hit[1].health, 85);
    }

    #[test]
    fn readouts_carry_fixed_names() {
        let mut scoreboard = Scoreboard::new(["Steady Bot".to_owned(), "Rushdown".to_owned()]);
        let readouts = scoreboard.update(&[player(100), player(100)]);
        assert_eq!(readouts[0].name, "Steady Bot");
        assert_eq!(readouts[1].name, "Rushdown");
    }
}
