use siege_replay_core::{
    Building, BuildingKind, Cell, CellCoord, Command, ConstructionState, Facing, GameDetails,
    GridSize, Missile, OwnerSide, PlayerState, ReplayError, Snapshot,
};
use siege_replay_scene::{apply, query, Scene};
use siege_replay_system_reconcile::reconcile;

fn player() -> PlayerState {
    PlayerState {
        health: 100,
        energy: 0,
        score: 0,
    }
}

fn empty_map(width: u32, height: u32) -> Vec<Vec<Cell>> {
    (0..height)
        .map(|y| (0..width).map(|x| Cell::empty(x, y)).collect())
        .collect()
}

fn snapshot_with(round: u32, width: u32, height: u32, cells: Vec<Cell>) -> Snapshot {
    let mut map = empty_map(width, height);
    for cell in cells {
        let (x, y) = (cell.x() as usize, cell.y() as usize);
        map[y][x] = cell;
    }
    Snapshot::new(
        round,
        [player(), player()],
        GameDetails::new(width, height),
        map,
    )
}

/// Runs one reconciled round against the scene, returning the emitted
/// command batch.
fn play_round(scene: &mut Scene, snapshot: &Snapshot) -> Result<Vec<Command>, ReplayError> {
    let mut commands = Vec::new();
    {
        let probe = &*scene;
        reconcile(
            snapshot,
            |cell| query::structure_at(probe, cell).map(|snapshot| snapshot.construction),
            |cell| query::projectile_at(probe, cell).is_some(),
            &mut commands,
        )?;
    }

    let mut events = Vec::new();
    for command in &commands {
        apply(scene, *command, &mut events);
    }
    Ok(commands)
}

#[test]
fn lone_building_spawns_exactly_once() {
    let mut scene = Scene::new(GridSize::new(8, 8));
    let snapshot = snapshot_with(
        0,
        8,
        8,
        vec![Cell::new(
            2,
            3,
            vec![Building::new(BuildingKind::Attack, 5)],
            Vec::new(),
        )],
    );

    let commands = play_round(&mut scene, &snapshot).expect("round reconciles");
    assert_eq!(
        commands,
        vec![Command::SpawnStructure {
            cell: CellCoord::new(2, 3),
            kind: BuildingKind::Attack,
            construction: ConstructionState::Building,
        }],
        "a single declared building must produce exactly one spawn and nothing else",
    );
}

#[test]
fn unchanged_round_produces_no_commands() {
    let mut scene = Scene::new(GridSize::new(8, 8));
    let declared = vec![
        Cell::new(
            1,
            1,
            vec![Building::new(BuildingKind::Energy, -1)],
            Vec::new(),
        ),
        Cell::new(
            5,
            2,
            vec![Building::new(BuildingKind::Defense, 2)],
            Vec::new(),
        ),
    ];

    let round_zero = snapshot_with(0, 8, 8, declared.clone());
    let _ = play_round(&mut scene, &round_zero).expect("round reconciles");

    let round_one = snapshot_with(1, 8, 8, declared);
    let commands = play_round(&mut scene, &round_one).expect("round reconciles");
    assert!(
        commands.is_empty(),
        "an unchanged board must not flicker: {commands:?}",
    );
}

#[test]
fn completion_emits_exactly_one_replace() {
    let mut scene = Scene::new(GridSize::new(8, 8));
    let constructing = snapshot_with(
        0,
        8,
        8,
        vec![Cell::new(
            2,
            3,
            vec![Building::new(BuildingKind::Attack, 5)],
            Vec::new(),
        )],
    );
    let _ = play_round(&mut scene, &constructing).expect("round reconciles");

    let complete = snapshot_with(
        1,
        8,
        8,
        vec![Cell::new(
            2,
            3,
            vec![Building::new(BuildingKind::Attack, -1)],
            Vec::new(),
        )],
    );
    let commands = play_round(&mut scene, &complete).expect("round reconciles");
    assert_eq!(
        commands,
        vec![Command::CompleteStructure {
            cell: CellCoord::new(2, 3),
        }],
    );
    assert!(
        query::demolition_view(&scene).is_empty(),
        "completion must not be rendered as a demolition",
    );
}

#[test]
fn snapshot_still_building_leaves_scene_untouched() {
    let mut scene = Scene::new(GridSize::new(4, 4));
    let declared = vec![Cell::new(
        0,
        0,
        vec![Building::new(BuildingKind::Tesla, 9)],
        Vec::new(),
    )];
    let _ = play_round(&mut scene, &snapshot_with(0, 4, 4, declared.clone())).expect("reconciles");

    // Progress ticked down but the building is still unfinished: no rescale,
    // no respawn.
    let next = snapshot_with(
        1,
        4,
        4,
        vec![Cell::new(
            0,
            0,
            vec![Building::new(BuildingKind::Tesla, 8)],
            Vec::new(),
        )],
    );
    let commands = play_round(&mut scene, &next).expect("reconciles");
    assert!(commands.is_empty());
}

#[test]
fn vacated_cell_emits_exactly_one_demolition() {
    let mut scene = Scene::new(GridSize::new(4, 4));
    let occupied = snapshot_with(
        0,
        4,
        4,
        vec![Cell::new(
            3,
            1,
            vec![Building::new(BuildingKind::Defense, -1)],
            Vec::new(),
        )],
    );
    let _ = play_round(&mut scene, &occupied).expect("reconciles");

    let vacated = snapshot_with(1, 4, 4, Vec::new());
    let commands = play_round(&mut scene, &vacated).expect("reconciles");
    assert_eq!(
        commands,
        vec![Command::DemolishStructure {
            cell: CellCoord::new(3, 1),
        }],
    );
    assert_eq!(
        query::demolition_view(&scene).len(),
        1,
        "tearing a structure down plants its transient marker",
    );
}

#[test]
fn projectile_persists_only_while_redeclared() {
    let mut scene = Scene::new(GridSize::new(6, 2));
    let launched = snapshot_with(
        0,
        6,
        2,
        vec![Cell::new(
            4,
            0,
            Vec::new(),
            vec![Missile::new(OwnerSide::B)],
        )],
    );
    let commands = play_round(&mut scene, &launched).expect("reconciles");
    assert_eq!(
        commands,
        vec![Command::SpawnProjectile {
            cell: CellCoord::new(4, 0),
            facing: Facing::West,
        }],
    );

    // Re-declared at the same cell: still in flight, nothing to do.
    let still_flying = snapshot_with(
        1,
        6,
        2,
        vec![Cell::new(
            4,
            0,
            Vec::new(),
            vec![Missile::new(OwnerSide::B)],
        )],
    );
    let commands = play_round(&mut scene, &still_flying).expect("reconciles");
    assert!(commands.is_empty());

    // Gone from the declaration: exactly one silent removal.
    let gone = snapshot_with(2, 6, 2, Vec::new());
    let commands = play_round(&mut scene, &gone).expect("reconciles");
    assert_eq!(
        commands,
        vec![Command::ClearProjectile {
            cell: CellCoord::new(4, 0),
        }],
    );
    assert!(query::demolition_view(&scene).is_empty());
}

#[test]
fn side_a_projectiles_face_east() {
    let mut scene = Scene::new(GridSize::new(3, 1));
    let snapshot = snapshot_with(
        0,
        3,
        1,
        vec![Cell::new(
            1,
            0,
            Vec::new(),
            vec![Missile::new(OwnerSide::A)],
        )],
    );
    let commands = play_round(&mut scene, &snapshot).expect("reconciles");
    assert_eq!(
        commands,
        vec![Command::SpawnProjectile {
            cell: CellCoord::new(1, 0),
            facing: Facing::East,
        }],
    );
}

#[test]
fn malformed_shape_fails_before_any_command() {
    let snapshot = Snapshot::new(
        4,
        [player(), player()],
        GameDetails::new(10, 10),
        empty_map(10, 8),
    );

    let mut commands = Vec::new();
    let error = reconcile(&snapshot, |_| None, |_| false, &mut commands)
        .expect_err("mismatched dimensions are fatal");
    assert!(matches!(error, ReplayError::SnapshotShape { round: 4, .. }));
    assert!(
        commands.is_empty(),
        "no command may be emitted for a corrupt snapshot",
    );
}
