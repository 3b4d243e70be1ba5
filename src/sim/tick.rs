//! Fixed timestep simulation tick
//!
//! Core level step that advances the simulation deterministically.

use super::state::{LevelEvent, LevelPhase, LevelState, PickupKind};

/// Input intents for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Horizontal direction: -1 left, 1 right, 0 none
    pub horizontal: i32,
    /// Jump pressed this tick
    pub jump: bool,
    /// Dash pressed this tick
    pub dash: bool,
}

/// Advance the level by one fixed timestep
pub fn tick(state: &mut LevelState, input: &TickInput) {
    // Frozen during the death sequence and after the transition
    if !state.phase.is_simulating() {
        return;
    }

    state.stats.ticks += 1;

    if state.phase.accepts_input() {
        state.avatar.walk(input.horizontal);
        if input.jump && state.avatar.jump() {
            state.events.push(LevelEvent::Jumped);
        }
        if input.dash && state.avatar.dash() {
            state.events.push(LevelEvent::Dashed);
        }
    }

    // Kinematics, then collision correction against the pre-tick position
    let previous = state.avatar.position();
    state.avatar.advance();
    state
        .resolver
        .resolve(&mut state.avatar, previous, &state.index);
    state.avatar.update_animation();
    if state.avatar.take_landed() {
        state.events.push(LevelEvent::Landed);
    }

    // Age the HUD message before anything can replace it
    if let Some(message) = state.message.as_mut() {
        message.ticks_left = message.ticks_left.saturating_sub(1);
        if message.ticks_left == 0 {
            state.message = None;
        }
    }

    collect_pickups(state);

    if state.phase == LevelPhase::Running
        && state.resolver.hazard_contact(&state.avatar, &state.grid)
    {
        trigger_death(state);
        return;
    }

    match state.phase {
        LevelPhase::Running => {
            let touching = state
                .portal
                .is_some_and(|portal| portal.intersects(&state.avatar.body()));
            if touching {
                state.avatar.halt_horizontal();
                state.phase = LevelPhase::PortalWait {
                    ticks_left: state.config.portal_countdown_ticks,
                };
                state.events.push(LevelEvent::PortalEntered);
                log::info!(
                    "Portal reached at tick {}, transition in {} ticks",
                    state.stats.ticks,
                    state.config.portal_countdown_ticks
                );
            }
        }
        LevelPhase::PortalWait { ticks_left } => {
            let remaining = ticks_left.saturating_sub(1);
            if remaining == 0 {
                state.phase = LevelPhase::TransitionRequested;
                state.events.push(LevelEvent::TransitionRequested);
                log::info!("Level '{}' complete", state.config.name);
            } else {
                state.phase = LevelPhase::PortalWait {
                    ticks_left: remaining,
                };
            }
        }
        LevelPhase::DeathSequence | LevelPhase::TransitionRequested => {}
    }
}

/// Body-overlap test against every uncollected pickup
fn collect_pickups(state: &mut LevelState) {
    let body = state.avatar.body();
    let mut collected = Vec::new();
    for pickup in state.pickups.iter_mut() {
        if !pickup.collected && pickup.rect.intersects(&body) {
            pickup.collected = true;
            collected.push((pickup.id, pickup.kind));
        }
    }

    for (id, kind) in collected {
        apply_pickup(state, kind);
        state.stats.pickups_collected += 1;
        state.show_message(kind.message());
        state.events.push(LevelEvent::PickupCollected { id, kind });
        log::info!("Collected {:?} (pickup {})", kind, id);
    }
}

fn apply_pickup(state: &mut LevelState, kind: PickupKind) {
    let boost = state.avatar.tuning().speed_boost_multiplier;
    let progress = state.avatar.progress_mut();
    match kind {
        PickupKind::DoubleJump => progress.capabilities.double_jump = true,
        PickupKind::Dash => progress.capabilities.dash = true,
        PickupKind::SpeedBoost => progress.capabilities.speed_multiplier = boost,
        PickupKind::ExtraLife => progress.lives = progress.lives.saturating_add(1),
    }
}

fn trigger_death(state: &mut LevelState) {
    state.phase = LevelPhase::DeathSequence;
    state.stats.deaths += 1;
    state.events.push(LevelEvent::DeathTriggered);
    log::info!(
        "Hazard contact at {:?} (tick {}), level frozen",
        state.avatar.position(),
        state.stats.ticks
    );
}

/// Finish the death sequence: respawn at the spawn point with default
/// progress, restore pickups and resume. Returns false outside the death
/// sequence.
pub fn complete_death_sequence(state: &mut LevelState) -> bool {
    if state.phase != LevelPhase::DeathSequence {
        return false;
    }

    state.avatar.respawn(state.config.spawn);
    state.avatar.reset_progress(state.config.starting_lives);
    for pickup in state.pickups.iter_mut() {
        pickup.collected = false;
    }
    state.message = None;
    state.phase = LevelPhase::Running;
    state.events.push(LevelEvent::Respawned);
    log::info!("Respawned at {:?}", state.config.spawn);
    true
}
