use std::fs;
use std::path::Path;

use siege_replay_core::{BuildingKind, CellCoord, ConstructionState, GridSize, ReplayError};
use siege_replay_rounds::RoundSource;
use tempfile::TempDir;

const DOCUMENT: &str = r#"{
    "players": [
        { "health": 100, "energy": 10, "score": 0 },
        { "health": 100, "energy": 12, "score": 5 }
    ],
    "gameDetails": { "mapWidth": 2, "mapHeight": 1 },
    "gameMap": [
        [
            {
                "x": 0, "y": 0,
                "buildings": [
                    { "buildingType": "Energy", "constructionTimeLeft": -1 }
                ],
                "missiles": []
            },
            { "x": 1, "y": 0, "buildings": [], "missiles": [] }
        ]
    ]
}"#;

fn write_round(root: &Path, round: u32, player_dirs: &[&str], document: &str) {
    let round_dir = root.join(format!("Round {round:03}"));
    for player in player_dirs {
        let player_dir = round_dir.join(player);
        fs::create_dir_all(&player_dir).expect("player directory creates");
        fs::write(player_dir.join("JsonMap.json"), document).expect("document writes");
    }
}

fn replay_with_rounds(count: u32) -> TempDir {
    let temp = TempDir::new().expect("temp dir creates");
    for round in 0..count {
        write_round(
            temp.path(),
            round,
            &["A - Steady Bot", "B - Rushdown"],
            DOCUMENT,
        );
    }
    temp
}

#[test]
fn has_round_tracks_directories_on_disk() {
    let replay = replay_with_rounds(2);
    let source = RoundSource::open(replay.path());

    assert!(source.has_round(0));
    assert!(source.has_round(1));
    assert!(!source.has_round(2));
}

#[test]
fn loaded_snapshot_carries_its_round_number() {
    let replay = replay_with_rounds(3);
    let source = RoundSource::open(replay.path());

    let snapshot = source.load_snapshot(2).expect("snapshot loads");
    assert_eq!(snapshot.round_number(), 2);
    assert_eq!(snapshot.grid(), GridSize::new(2, 1));

    let cell = snapshot.cell(CellCoord::new(0, 0)).expect("cell exists");
    let building = cell.building().expect("building declared");
    assert_eq!(building.kind(), BuildingKind::Energy);
    assert_eq!(building.construction_state(), ConstructionState::Complete);
}

#[test]
fn missing_round_is_reported_as_end_of_match() {
    let replay = replay_with_rounds(1);
    let source = RoundSource::open(replay.path());

    let error = source.load_snapshot(1).expect_err("round does not exist");
    assert!(matches!(error, ReplayError::SnapshotMissing { round: 1 }));
}

#[test]
fn malformed_document_fails_with_deserialization_error() {
    let temp = TempDir::new().expect("temp dir creates");
    write_round(temp.path(), 0, &["A - Bot", "B - Bot"], "{ not json");
    let source = RoundSource::open(temp.path());

    let error = source.load_snapshot(0).expect_err("document is malformed");
    assert!(matches!(error, ReplayError::Deserialization { round: 0, .. }));
}

#[test]
fn roster_parses_names_after_the_delimiter() {
    let replay = replay_with_rounds(1);
    let source = RoundSource::open(replay.path());

    let roster = source.roster().expect("roster reads");
    assert_eq!(roster.players()[0].display_name(), "Steady Bot");
    assert_eq!(roster.players()[1].display_name(), "Rushdown");
}

#[test]
fn roster_requires_round_zero() {
    let temp = TempDir::new().expect("temp dir creates");
    write_round(temp.path(), 1, &["A - Bot", "B - Bot"], DOCUMENT);
    let source = RoundSource::open(temp.path());

    let error = source.roster().expect_err("round zero is absent");
    assert!(matches!(error, ReplayError::SnapshotMissing { round: 0 }));
}

#[test]
fn roster_rejects_a_lone_player_directory() {
    let temp = TempDir::new().expect("temp dir creates");
    write_round(temp.path(), 0, &["A - Bot"], DOCUMENT);
    let source = RoundSource::open(temp.path());

    let error = source.roster().expect_err("one player is not a match");
    assert!(matches!(error, ReplayError::Deserialization { round: 0, .. }));
}
