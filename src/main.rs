//! Tilehop entry point
//!
//! Headless runner: loads a level (JSON config path as the first argument,
//! or a built-in demo level), drives it with scripted input at the fixed
//! rate and prints the final frame snapshot as JSON.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::Path;

    use glam::IVec2;
    use tilehop::audio::LogAudio;
    use tilehop::config::{LevelConfig, PickupSpec};
    use tilehop::consts::*;
    use tilehop::effects::{DustConfig, DustTrail};
    use tilehop::sim::{LevelPhase, PickupKind, Rect, TickInput};
    use tilehop::{LevelLoop, LevelTransitionListener};

    /// Frames the death screen stays up before signalling completion
    const DEATH_SEQUENCE_FRAMES: u32 = 90;
    /// Give up after this many frames (60 seconds)
    const MAX_FRAMES: u32 = 60 * TICK_RATE;

    struct LogTransition;

    impl LevelTransitionListener for LogTransition {
        fn on_level_transition_requested(&mut self, level_name: &str) {
            log::info!("Transition requested out of '{}'", level_name);
        }
    }

    /// Default map with a few pickups along the floor and a portal by the
    /// right wall
    fn demo_config() -> LevelConfig {
        let floor = (DEFAULT_MAP_ROWS as i32 - 1) * TILE_SIZE;
        let pickup = |kind, x| PickupSpec {
            kind,
            x,
            y: floor - 32,
        };
        LevelConfig {
            name: "Demo".to_string(),
            spawn: IVec2::new(64, floor - AVATAR_HEIGHT),
            pickups: vec![
                pickup(PickupKind::DoubleJump, 400),
                pickup(PickupKind::Dash, 800),
                pickup(PickupKind::SpeedBoost, 1200),
            ],
            portal: Some(Rect::new(2300, floor - 96, 64, 96)),
            ..Default::default()
        }
    }

    /// Hold right, jump every 45 ticks, dash every 120
    fn scripted_input(frame: u32) -> TickInput {
        TickInput {
            horizontal: 1,
            jump: frame % 45 == 0,
            dash: frame % 120 == 60,
        }
    }

    pub fn run() {
        let config = match std::env::args().nth(1) {
            Some(path) => LevelConfig::load_or_default(Path::new(&path)),
            None => demo_config(),
        };

        let dust = DustTrail::new(DustConfig::default(), config.effect_seed);
        let mut level = LevelLoop::new(config)
            .with_audio(Box::new(LogAudio::new()))
            .with_listener(Box::new(LogTransition))
            .with_effect(Box::new(dust));
        level.start();

        let mut death_frames = 0;
        for frame in 0..MAX_FRAMES {
            match level.phase() {
                LevelPhase::TransitionRequested => break,
                LevelPhase::DeathSequence => {
                    death_frames += 1;
                    if death_frames >= DEATH_SEQUENCE_FRAMES {
                        death_frames = 0;
                        level.complete_death_sequence();
                    }
                    continue;
                }
                LevelPhase::Running | LevelPhase::PortalWait { .. } => {}
            }
            level.set_input(scripted_input(frame));
            level.advance(SIM_DT);
        }

        let snapshot = level.snapshot();
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to serialize snapshot: {}", e),
        }

        let stats = level.teardown();
        log::info!(
            "Finished after {} ticks: {} deaths, {} pickups",
            stats.ticks,
            stats.deaths,
            stats.pickups_collected
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Tilehop (headless) starting...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless runner on the web; the library is driven by the host page
}
