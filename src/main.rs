//! Bubble Burst - headless demo
//!
//! Plays a built-in level with a fixed aiming script and logs every engine
//! event. Run with `RUST_LOG=info` (or `debug`) to see the game unfold.
//!
//! Usage: `bubble-burst [seed]`

use glam::Vec2;

use bubble_burst::sim::{GameEvent, GameEngine, GamePhase, HexLayout, TickInput, tick};
use bubble_burst::{EngineConfig, EngineError, LevelLayout};

const FRAME_DT: f32 = 1.0 / 60.0;
/// Frames allowed per shot before the demo gives up on it
const MAX_FRAMES_PER_SHOT: usize = 600;

const DEMO_LEVEL: &str = r#"{
    "cells": [
        [{"type":"colored","color":"red"},{"type":"colored","color":"red"},{"type":"colored","color":"blue"},{"type":"colored","color":"blue"},{"type":"special","power":"magnetic"},{"type":"colored","color":"green"},{"type":"colored","color":"green"},{"type":"colored","color":"orange"},{"type":"colored","color":"orange"},{"type":"colored","color":"red"},{"type":"colored","color":"red"},{"type":"colored","color":"blue"}],
        [{"type":"colored","color":"green"},{"type":"colored","color":"green"},{"type":"special","power":"bomb"},{"type":"colored","color":"red"},{"type":"colored","color":"orange"},null,{"type":"colored","color":"blue"},{"type":"special","power":"star"},{"type":"colored","color":"green"},{"type":"colored","color":"orange"},{"type":"colored","color":"red"}],
        [null,{"type":"colored","color":"blue"},{"type":"special","power":"indestructible"},{"type":"colored","color":"orange"},{"type":"colored","color":"red"},{"type":"special","power":"lightning"},{"type":"colored","color":"green"},{"type":"colored","color":"blue"},null,{"type":"colored","color":"red"}]
    ],
    "projectile_limit": 30
}"#;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), EngineError> {
    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u64>().ok())
        .unwrap_or(0xB0BB1E);
    log::info!("Bubble Burst (headless) starting with seed {seed}");

    let config = EngineConfig::default();
    let level = LevelLayout::from_json_str(DEMO_LEVEL)?;
    let specs = level.to_bubble_specs(&HexLayout::from_config(&config));

    let mut engine = GameEngine::new(config, seed)?;
    match level.projectile_limit {
        Some(limit) => engine.start_session(&specs, limit)?,
        None => engine.start_default_session(&specs)?,
    }
    report(&mut engine);

    let width = engine.config().screen_width;
    let mut shot = 0usize;
    while engine.phase() == GamePhase::AwaitingLaunch {
        // Sweep the aim across the top half of the screen
        let x = width * (0.1 + 0.8 * ((shot * 7) % 11) as f32 / 10.0);
        let origin = engine.config().launch_origin();
        let input = TickInput {
            launch: Some((origin, Vec2::new(x, origin.y * 0.25))),
            ..Default::default()
        };
        tick(&mut engine, &input, FRAME_DT);
        shot += 1;

        let mut frames = 0;
        while engine.phase() == GamePhase::InFlight && frames < MAX_FRAMES_PER_SHOT {
            tick(&mut engine, &TickInput::default(), FRAME_DT);
            frames += 1;
        }
        if engine.phase() == GamePhase::InFlight {
            log::warn!("Shot {shot} still flying after {frames} frames, stopping");
            break;
        }
        report(&mut engine);
    }

    log::info!(
        "Finished after {} shots: {:?}, score {}",
        shot,
        engine.phase(),
        engine.score()
    );
    for event in engine.teardown() {
        log::debug!("Undelivered: {event:?}");
    }
    Ok(())
}

fn report(engine: &mut GameEngine) {
    engine.dispatch_events(&mut |event: &GameEvent| match event {
        GameEvent::BubblePlaced { id, bubble } => {
            log::debug!("placed {id} {:?} at ({:.1}, {:.1})", bubble.color, bubble.center.x, bubble.center.y)
        }
        GameEvent::BubbleRemoved { id, reason, .. } => log::info!("{id} removed ({reason:?})"),
        GameEvent::ScoreChanged { score } => log::info!("score {score}"),
        GameEvent::Won { score } => log::info!("won with {score}"),
        GameEvent::Lost => log::info!("out of projectiles"),
        other => log::debug!("{other:?}"),
    });
}
