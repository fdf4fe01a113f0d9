#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays a recorded match headlessly.
//!
//! The binary wires the filesystem round source, the reconciliation system,
//! the scene, and the playback scheduler together, printing a per-round
//! summary instead of drawing frames.

use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use siege_replay_core::{Command, ReplayError};
use siege_replay_rendering::{scene_presentation, Scoreboard};
use siege_replay_rounds::RoundSource;
use siege_replay_scene::{apply, query, Scene};
use siege_replay_system_playback::{Playback, PlaybackState};
use siege_replay_system_reconcile::reconcile;

/// Granularity of the driver loop while waiting for the next round.
const IDLE_SLEEP: Duration = Duration::from_millis(5);

/// Replays a recorded match from a round-numbered snapshot directory.
#[derive(Debug, Parser)]
#[command(name = "siege-replay", version)]
struct Args {
    /// Replay directory holding the `Round NNN` subdirectories.
    replay_dir: PathBuf,

    /// Playback rate control in [0, 1]; 1 is fastest, 0 means manual
    /// stepping (see --step).
    #[arg(long, default_value_t = 0.5)]
    rate: f32,

    /// Advance every round immediately instead of pacing by the rate.
    #[arg(long)]
    step: bool,

    /// Suppress per-round summaries; print only the final line.
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let source = RoundSource::open(&args.replay_dir);
    let roster = source
        .roster()
        .with_context(|| format!("reading match roster from {}", args.replay_dir.display()))?;
    let [side_a, side_b] = roster.players();
    let mut scoreboard = Scoreboard::new([
        side_a.display_name().to_owned(),
        side_b.display_name().to_owned(),
    ]);

    let mut playback = Playback::new();
    playback.set_rate(if args.step { 0.0 } else { args.rate });
    playback.start();

    let mut scene: Option<Scene> = None;
    let mut last_instant = Instant::now();

    while playback.state() == PlaybackState::Running {
        let now = Instant::now();
        let dt = now.duration_since(last_instant);
        last_instant = now;

        // Transient demolition markers age in real time, independent of the
        // round cadence.
        if let Some(scene) = scene.as_mut() {
            let mut events = Vec::new();
            apply(scene, Command::Tick { dt }, &mut events);
        }

        let advance = if args.step {
            playback.step()
        } else {
            playback.tick(dt)
        };
        let Some(advance) = advance else {
            thread::sleep(IDLE_SLEEP);
            continue;
        };

        match process_round(
            &source,
            &mut scene,
            advance.round,
            &mut scoreboard,
            args.quiet,
        ) {
            Ok(()) => playback.advance_confirmed(),
            Err(ReplayError::SnapshotMissing { .. }) => playback.finish(),
            Err(error) => {
                playback.finish();
                return Err(error).context("replay aborted");
            }
        }
    }

    println!("match complete after {} rounds", playback.next_round());
    Ok(())
}

/// Loads, reconciles, and applies one round, then prints its summary.
fn process_round(
    source: &RoundSource,
    scene_slot: &mut Option<Scene>,
    round: u32,
    scoreboard: &mut Scoreboard,
    quiet: bool,
) -> Result<(), ReplayError> {
    let snapshot = source.load_snapshot(round)?;
    let scene = scene_slot.get_or_insert_with(|| Scene::new(snapshot.grid()));

    let mut commands = Vec::new();
    {
        let probe = &*scene;
        reconcile(
            &snapshot,
            |cell| query::structure_at(probe, cell).map(|structure| structure.construction),
            |cell| query::projectile_at(probe, cell).is_some(),
            &mut commands,
        )?;
    }

    let mut events = Vec::new();
    let command_count = commands.len();
    for command in commands {
        apply(scene, command, &mut events);
    }

    let readouts = scoreboard.update(snapshot.players());
    if !quiet {
        let presentation = scene_presentation(scene);
        println!(
            "round {round:>3} | {} hp {:>3} en {:>4} sc {:>5} | {} hp {:>3} en {:>4} sc {:>5} | {} commands, {} structures, {} projectiles",
            readouts[0].name,
            readouts[0].health,
            readouts[0].energy,
            readouts[0].score,
            readouts[1].name,
            readouts[1].health,
            readouts[1].energy,
            readouts[1].score,
            command_count,
            presentation.structures.len(),
            presentation.projectiles.len(),
        );
    }

    Ok(())
}
