//! Level loop
//!
//! Owns one level's simulation state plus its collaborators and drives it at
//! a fixed rate. Ticks never overlap: `advance` runs whole ticks to
//! completion, then the caller renders from `snapshot`.
//!
//! The death sequence is the one suspension point. Once a tick raises
//! `DeathTriggered` the loop stops ticking until `complete_death_sequence`
//! is called; nothing times it out.

use glam::{IVec2, Vec2};
use serde::Serialize;

use crate::audio::{AudioControl, AudioError, SilentAudio, SoundCue};
use crate::config::LevelConfig;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::effects::{ParticleEffect, ParticleSprite};
use crate::sim::{
    AnimState, Camera, Capabilities, Hitboxes, LevelEvent, LevelPhase, LevelState, LevelStats,
    TickInput, complete_death_sequence, tick,
};

/// Notified when the level asks to move on
pub trait LevelTransitionListener {
    /// Called exactly once per loop instance
    fn on_level_transition_requested(&mut self, level_name: &str);
}

/// Everything a renderer or HUD needs from the last completed tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub phase: LevelPhase,
    pub position: IVec2,
    pub velocity: IVec2,
    pub anim: AnimState,
    pub anim_frame: u32,
    pub hitboxes: Hitboxes,
    pub capabilities: Capabilities,
    pub lives: u8,
    pub camera: Camera,
    pub message: Option<String>,
    pub stats: LevelStats,
}

/// Fixed-step scheduler for one level
pub struct LevelLoop {
    state: LevelState,
    audio: Box<dyn AudioControl>,
    listener: Option<Box<dyn LevelTransitionListener>>,
    effects: Vec<Box<dyn ParticleEffect>>,
    camera: Camera,
    accumulator: f32,
    /// Intents applied at the next tick; jump/dash are one-shot
    input: TickInput,
}

impl LevelLoop {
    /// Load the level described by `config` with audio disabled
    pub fn new(config: LevelConfig) -> Self {
        Self::with_state(LevelState::new(config))
    }

    pub fn with_state(state: LevelState) -> Self {
        let mut level = Self {
            state,
            audio: Box::new(SilentAudio),
            listener: None,
            effects: Vec::new(),
            camera: Camera::default(),
            accumulator: 0.0,
            input: TickInput::default(),
        };
        level.update_camera();
        level
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioControl>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_listener(mut self, listener: Box<dyn LevelTransitionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn with_effect(mut self, effect: Box<dyn ParticleEffect>) -> Self {
        self.effects.push(effect);
        self
    }

    /// Begin play: start the ambient loop
    pub fn start(&mut self) {
        log::info!("Level '{}' started", self.state.config.name);
        let result = self.audio.play_loop(SoundCue::Ambient);
        audio_result("loop", SoundCue::Ambient, result);
    }

    /// Set the intents for upcoming ticks
    pub fn set_input(&mut self, input: TickInput) {
        self.input = input;
    }

    /// Feed real elapsed time; runs as many whole ticks as fit, capped at
    /// `MAX_SUBSTEPS`. Returns the number of ticks run. Non-finite frame
    /// times are dropped.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if !self.state.phase.is_simulating() {
            self.accumulator = 0.0;
            return 0;
        }
        if !frame_dt.is_finite() {
            log::warn!("Ignoring non-finite frame time {}", frame_dt);
            return 0;
        }

        self.accumulator += frame_dt.clamp(0.0, 0.1);
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = self.input.clone();
            self.step(&input);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.jump = false;
            self.input.dash = false;

            if !self.state.phase.is_simulating() {
                self.accumulator = 0.0;
                break;
            }
        }
        substeps
    }

    /// Run exactly one tick with the given input and dispatch its events
    pub fn step(&mut self, input: &TickInput) -> Vec<LevelEvent> {
        tick(&mut self.state, input);
        let events = self.state.drain_events();
        self.dispatch(&events);
        self.update_effects();
        self.update_camera();
        events
    }

    /// Completion signal from the death sequence: respawn and resume.
    /// Ignored outside the death sequence.
    pub fn complete_death_sequence(&mut self) -> Vec<LevelEvent> {
        if !complete_death_sequence(&mut self.state) {
            log::warn!("Death sequence completion outside of a death sequence, ignored");
            return Vec::new();
        }
        let events = self.state.drain_events();
        self.dispatch(&events);
        self.update_camera();
        events
    }

    /// Tear the level down: stops audio and cancels any pending death
    /// sequence. Returns the final counters.
    pub fn teardown(mut self) -> LevelStats {
        let result = self.audio.stop(SoundCue::Ambient);
        audio_result("stop", SoundCue::Ambient, result);
        if self.state.phase == LevelPhase::DeathSequence {
            log::info!("Level torn down during death sequence");
        }
        self.state.stats
    }

    fn dispatch(&mut self, events: &[LevelEvent]) {
        for event in events {
            log::debug!("tick {}: {:?}", self.state.stats.ticks, event);
            let (cue, result) = match event {
                LevelEvent::Jumped => (SoundCue::Jump, self.audio.play(SoundCue::Jump)),
                LevelEvent::Dashed => (SoundCue::Dash, self.audio.play(SoundCue::Dash)),
                LevelEvent::Landed => (SoundCue::Land, self.audio.play(SoundCue::Land)),
                LevelEvent::PickupCollected { .. } => {
                    (SoundCue::Pickup, self.audio.play(SoundCue::Pickup))
                }
                LevelEvent::DeathTriggered => {
                    let result = self.audio.stop(SoundCue::Ambient);
                    audio_result("stop", SoundCue::Ambient, result);
                    (SoundCue::Death, self.audio.play(SoundCue::Death))
                }
                LevelEvent::Respawned => {
                    (SoundCue::Ambient, self.audio.play_loop(SoundCue::Ambient))
                }
                LevelEvent::PortalEntered => {
                    (SoundCue::Portal, self.audio.play(SoundCue::Portal))
                }
                LevelEvent::TransitionRequested => {
                    if let Some(listener) = self.listener.as_mut() {
                        listener.on_level_transition_requested(&self.state.config.name);
                    }
                    (SoundCue::Ambient, self.audio.stop(SoundCue::Ambient))
                }
            };
            audio_result("request", cue, result);
        }
    }

    fn update_effects(&mut self) {
        let avatar = &self.state.avatar;
        let feet = avatar.feet();
        let anchor = Vec2::new(feet.center().x as f32, feet.bottom() as f32);
        let active = avatar.is_grounded() && avatar.velocity().x != 0;
        for effect in self.effects.iter_mut() {
            effect.update(anchor, active);
        }
    }

    fn update_camera(&mut self) {
        let target = self.state.avatar.body().center();
        self.camera = Camera::follow(target, self.state.config.viewport, self.state.world_size());
    }

    /// Sprites from every decorative effect, in screen space
    pub fn draw_effects(&self) -> Vec<ParticleSprite> {
        let offset = self.camera.offset().as_vec2();
        let mut sprites = Vec::new();
        for effect in &self.effects {
            effect.draw(offset, &mut sprites);
        }
        sprites
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let avatar = &self.state.avatar;
        FrameSnapshot {
            tick: self.state.stats.ticks,
            phase: self.state.phase,
            position: avatar.position(),
            velocity: avatar.velocity(),
            anim: avatar.anim_state(),
            anim_frame: avatar.anim_frame(),
            hitboxes: avatar.hitboxes(),
            capabilities: avatar.capabilities(),
            lives: avatar.progress().lives,
            camera: self.camera,
            message: self.state.message.as_ref().map(|m| m.text.clone()),
            stats: self.state.stats,
        }
    }

    pub fn phase(&self) -> LevelPhase {
        self.state.phase
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn state(&self) -> &LevelState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut LevelState {
        &mut self.state
    }
}

/// Audio failures are diagnostics only
fn audio_result(what: &str, cue: SoundCue, result: Result<(), AudioError>) {
    if let Err(e) = result {
        log::debug!("audio {} {:?} failed: {}", what, cue, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::effects::{DustConfig, DustTrail};
    use crate::sim::TileGrid;
    use crate::sim::rect::Rect;
    use std::cell::RefCell;
    use std::rc::Rc;

    const ROOM: &str = "\
1,1,1,1,1,1,1,1,1,1,1,1
1,0,0,0,0,0,0,0,0,0,0,1
1,0,0,0,0,0,0,0,0,0,0,1
1,0,0,0,0,0,0,0,0,0,0,1
1,0,0,0,0,0,0,0,0,0,0,1
1,0,0,0,0,0,0,0,0,0,0,1
1,0,0,0,0,2,0,0,0,0,0,1
1,1,1,1,1,1,1,1,1,1,1,1";

    const FLOOR_Y: i32 = 7 * TILE_SIZE - AVATAR_HEIGHT;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Request {
        Play(SoundCue),
        Stop(SoundCue),
        Loop(SoundCue),
    }

    /// Records requests; optionally fails every one of them
    struct RecordingAudio {
        log: Rc<RefCell<Vec<Request>>>,
        fail: bool,
    }

    impl RecordingAudio {
        fn record(&mut self, request: Request) -> Result<(), AudioError> {
            self.log.borrow_mut().push(request);
            if self.fail { Err(AudioError::Unavailable) } else { Ok(()) }
        }
    }

    impl AudioControl for RecordingAudio {
        fn play(&mut self, cue: SoundCue) -> Result<(), AudioError> {
            self.record(Request::Play(cue))
        }

        fn stop(&mut self, cue: SoundCue) -> Result<(), AudioError> {
            self.record(Request::Stop(cue))
        }

        fn play_loop(&mut self, cue: SoundCue) -> Result<(), AudioError> {
            self.record(Request::Loop(cue))
        }
    }

    struct CountingListener(Rc<RefCell<Vec<String>>>);

    impl LevelTransitionListener for CountingListener {
        fn on_level_transition_requested(&mut self, level_name: &str) {
            self.0.borrow_mut().push(level_name.to_string());
        }
    }

    struct Harness {
        level: LevelLoop,
        audio: Rc<RefCell<Vec<Request>>>,
        transitions: Rc<RefCell<Vec<String>>>,
    }

    fn harness(config: LevelConfig, fail_audio: bool) -> Harness {
        let config = LevelConfig {
            name: "Test Room".to_string(),
            spawn: IVec2::new(40, FLOOR_Y),
            ..config
        };
        let state = LevelState::with_grid(config, TileGrid::parse(ROOM, TILE_SIZE).unwrap());
        let audio = Rc::new(RefCell::new(Vec::new()));
        let transitions = Rc::new(RefCell::new(Vec::new()));
        let mut level = LevelLoop::with_state(state)
            .with_audio(Box::new(RecordingAudio {
                log: audio.clone(),
                fail: fail_audio,
            }))
            .with_listener(Box::new(CountingListener(transitions.clone())))
            .with_effect(Box::new(DustTrail::new(DustConfig::default(), 9)));
        level.start();
        Harness {
            level,
            audio,
            transitions,
        }
    }

    #[test]
    fn test_advance_runs_whole_ticks() {
        let mut h = harness(LevelConfig::default(), false);
        assert_eq!(h.level.advance(SIM_DT * 3.5), 3);
        assert_eq!(h.level.state().stats.ticks, 3);
        // Leftover half tick carries over
        assert_eq!(h.level.advance(SIM_DT * 0.6), 1);
        // Huge frame gaps are clamped to a bounded number of substeps
        let ran = h.level.advance(5.0);
        assert!(ran >= 5 && ran <= MAX_SUBSTEPS);
    }

    #[test]
    fn test_bad_frame_times_do_not_stall_the_loop() {
        let mut h = harness(LevelConfig::default(), false);
        assert_eq!(h.level.advance(f32::NAN), 0);
        assert_eq!(h.level.advance(f32::INFINITY), 0);
        assert_eq!(h.level.advance(-1.0), 0);
        assert_eq!(h.level.advance(SIM_DT * 4.5), 4);
        assert_eq!(h.level.state().stats.ticks, 4);
    }

    #[test]
    fn test_one_shot_inputs_clear_after_a_tick() {
        let mut h = harness(LevelConfig::default(), false);
        h.level.advance(SIM_DT * 2.0);
        h.level.set_input(TickInput {
            horizontal: 1,
            jump: true,
            dash: false,
        });
        h.level.advance(SIM_DT * 1.5);
        assert_eq!(h.level.state().avatar.jump_count(), 1);
        // Held direction persists, jump does not repeat
        h.level.advance(SIM_DT * 3.0);
        assert!(h.level.state().avatar.velocity().x > 0);
        assert_eq!(h.level.state().avatar.jump_count(), 1);
        let jumps = h
            .audio
            .borrow()
            .iter()
            .filter(|r| **r == Request::Play(SoundCue::Jump))
            .count();
        assert_eq!(jumps, 1);
    }

    #[test]
    fn test_death_freezes_until_completion() {
        let mut h = harness(LevelConfig::default(), false);
        h.level
            .state_mut()
            .avatar
            .place(IVec2::new(5 * TILE_SIZE + 2, FLOOR_Y));

        let mut deaths = 0;
        for _ in 0..10 {
            let events = h.level.step(&TickInput::default());
            deaths += events.iter().filter(|e| **e == LevelEvent::DeathTriggered).count();
        }
        assert_eq!(deaths, 1);
        assert_eq!(h.level.phase(), LevelPhase::DeathSequence);
        assert_eq!(h.level.advance(1.0), 0);
        {
            let audio = h.audio.borrow();
            assert!(audio.contains(&Request::Stop(SoundCue::Ambient)));
            assert!(audio.contains(&Request::Play(SoundCue::Death)));
        }

        let events = h.level.complete_death_sequence();
        assert_eq!(events, vec![LevelEvent::Respawned]);
        assert_eq!(h.level.phase(), LevelPhase::Running);
        assert_eq!(h.level.snapshot().position, IVec2::new(40, FLOOR_Y));
        assert_eq!(h.audio.borrow().last(), Some(&Request::Loop(SoundCue::Ambient)));
        assert!(h.level.advance(SIM_DT * 1.5) > 0);

        // A stray completion signal is ignored
        assert!(h.level.complete_death_sequence().is_empty());
    }

    #[test]
    fn test_transition_notifies_listener_once() {
        let mut h = harness(
            LevelConfig {
                portal: Some(Rect::new(0, 0, 12 * TILE_SIZE, 8 * TILE_SIZE)),
                portal_countdown_ticks: 10,
                ..Default::default()
            },
            false,
        );
        for _ in 0..60 {
            h.level.step(&TickInput::default());
        }
        assert_eq!(h.level.phase(), LevelPhase::TransitionRequested);
        assert_eq!(*h.transitions.borrow(), vec!["Test Room".to_string()]);
        assert_eq!(h.level.advance(1.0), 0);
        assert_eq!(h.transitions.borrow().len(), 1);
        assert_eq!(h.audio.borrow().last(), Some(&Request::Stop(SoundCue::Ambient)));
    }

    #[test]
    fn test_failing_audio_is_tolerated() {
        let mut h = harness(
            LevelConfig {
                portal: Some(Rect::new(0, 0, 12 * TILE_SIZE, 8 * TILE_SIZE)),
                portal_countdown_ticks: 2,
                ..Default::default()
            },
            true,
        );
        for _ in 0..5 {
            h.level.step(&TickInput {
                jump: true,
                ..Default::default()
            });
        }
        assert_eq!(h.level.phase(), LevelPhase::TransitionRequested);
        assert_eq!(h.transitions.borrow().len(), 1);
        assert!(!h.audio.borrow().is_empty());
    }

    #[test]
    fn test_snapshot_and_camera_follow_avatar() {
        let mut h = harness(
            LevelConfig {
                viewport: IVec2::new(160, 128),
                ..Default::default()
            },
            false,
        );
        let walk = TickInput {
            horizontal: 1,
            ..Default::default()
        };
        // Stops short of the hazard at column 5
        for _ in 0..12 {
            h.level.step(&walk);
        }
        let snap = h.level.snapshot();
        assert_eq!(snap.tick, 12);
        assert_eq!(snap.phase, LevelPhase::Running);
        assert_eq!(snap.anim, AnimState::WalkRight);
        assert_eq!(snap.hitboxes.body.origin(), snap.position);
        let center = snap.hitboxes.body.center();
        assert_eq!(snap.camera, Camera::follow(center, IVec2::new(160, 128), IVec2::new(384, 256)));
        // Walking on the ground kicks up dust
        assert!(!h.level.draw_effects().is_empty());

        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("WalkRight"));
    }

    #[test]
    fn test_teardown_stops_ambient() {
        let mut h = harness(LevelConfig::default(), false);
        for _ in 0..5 {
            h.level.step(&TickInput::default());
        }
        let audio = h.audio.clone();
        let stats = h.level.teardown();
        assert_eq!(
            stats,
            LevelStats {
                ticks: 5,
                ..Default::default()
            }
        );
        assert_eq!(audio.borrow().last(), Some(&Request::Stop(SoundCue::Ambient)));
    }
}
