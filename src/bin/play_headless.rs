//! Headless Play Runner
//!
//! Run with: `cargo run --bin play-headless -- <project.json> [frames]`
//!
//! Loads a project file, enters play mode, steps the fixed-rate update for
//! `frames` frames (default 600, ten simulated seconds) while replaying the
//! project's input track, then prints the final HUD and stops.
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use blockplay_engine::game::{PlayRuntime, PlaybackInput, ProjectFile};
use blockplay_engine::world::MemoryScene;

const DEFAULT_FRAMES: u64 = 600;

fn apply(runtime: &mut PlayRuntime<MemoryScene>, input: PlaybackInput) {
    match input {
        PlaybackInput::KeyDown(key) => runtime.key_down(key),
        PlaybackInput::KeyUp(key) => runtime.key_up(key),
        PlaybackInput::Click([u, v]) => runtime.click(u, v),
        PlaybackInput::MouseMotion([dx, dy]) => runtime.mouse_motion(dx, dy),
        PlaybackInput::Fire => {
            runtime.fire();
        }
        PlaybackInput::AcknowledgeDialog => {
            runtime.acknowledge_dialog();
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: play-headless <project.json> [frames]");
    };
    let frames = match args.next() {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("frame count '{arg}' is not a number"))?,
        None => DEFAULT_FRAMES,
    };

    let project = ProjectFile::load(&path)?;
    let (scene, scripts, settings, playback) = project.into_parts();
    let mut runtime = PlayRuntime::new(scene, scripts);
    runtime
        .start(settings)
        .with_context(|| format!("failed to start {path}"))?;

    let mut pending = playback.into_iter().peekable();
    for frame in 0..frames {
        while let Some(event) = pending.next_if(|e| e.frame <= frame) {
            apply(&mut runtime, event.input);
        }
        runtime.update();

        for sound in runtime.take_sounds() {
            tracing::debug!("frame {}: sound '{}'", frame, sound);
        }
        if let Some(outcome) = runtime.outcome() {
            tracing::info!("frame {}: game over ({:?})", frame, outcome);
            break;
        }
    }

    if let Some(hud) = runtime.hud() {
        tracing::info!(
            "t={:.2}s health {}/{} lives {:?} score {} tasks {}",
            runtime.time(),
            hud.health,
            hud.max_health,
            hud.lives,
            hud.score,
            runtime.task_count()
        );
        for (name, value) in &hud.variables {
            tracing::info!("  {} = {}", name, value);
        }
        for (item, count) in &hud.inventory {
            tracing::info!("  {} x{}", item, count);
        }
    }
    runtime.stop();
    Ok(())
}
