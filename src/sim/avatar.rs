//! Avatar kinematics
//!
//! Owns position, velocity, jump/dash state, capabilities and the animation
//! state. One `advance` call integrates one tick; collision correction is
//! applied afterwards through `land`, `hit_ceiling` and `block_horizontal`.
//!
//! Invariants held at every mutation site:
//! - `0 <= x <= world_width - width`
//! - `0 <= jump_count <= max_jumps()`, reset only by floor contact

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use crate::config::PhysicsTuning;
use crate::consts::*;

/// Discrete animation state, selected once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnimState {
    #[default]
    Idle,
    WalkLeft,
    WalkRight,
    JumpLeft,
    JumpRight,
    Falling,
}

/// Abilities unlocked by pickups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub double_jump: bool,
    pub dash: bool,
    /// Walk speed scale (1.0 without a boost)
    pub speed_multiplier: f32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            double_jump: false,
            dash: false,
            speed_multiplier: 1.0,
        }
    }
}

impl Capabilities {
    /// Jumps allowed between floor contacts
    pub fn max_jumps(&self) -> u8 {
        if self.double_jump { 2 } else { 1 }
    }

    pub fn speed_boosted(&self) -> bool {
        self.speed_multiplier > 1.0
    }
}

/// Lives and unlocked abilities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub lives: u8,
    pub capabilities: Capabilities,
}

impl ProgressState {
    pub fn new(lives: u8) -> Self {
        Self {
            lives,
            capabilities: Capabilities::default(),
        }
    }
}

/// Collision rectangles derived from the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hitboxes {
    /// Full footprint, used for side collisions and interactions
    pub body: Rect,
    /// Bottom strip, used for landing
    pub feet: Rect,
    /// Top strip, used for ceiling bumps
    pub head: Rect,
}

/// The player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Avatar {
    pos: IVec2,
    vel: IVec2,
    size: IVec2,
    /// World extent in pixels, for the horizontal clamp and floor threshold
    world: IVec2,
    tuning: PhysicsTuning,

    /// Horizontal velocity requested by input, applied at the next tick
    intent_dx: i32,
    /// -1 or 1, last horizontal direction moved
    facing: i32,

    jumping: bool,
    jump_count: u8,
    dashing: bool,
    dash_ticks_left: u32,

    grounded: bool,
    grounded_at_tick_start: bool,
    landed_pending: bool,

    anim: AnimState,
    anim_frame: u32,
    anim_ticks: u32,

    progress: ProgressState,
}

impl Avatar {
    pub fn new(spawn: IVec2, world: IVec2, tuning: PhysicsTuning, lives: u8) -> Self {
        let mut avatar = Self {
            pos: spawn,
            vel: IVec2::ZERO,
            size: IVec2::new(AVATAR_WIDTH, AVATAR_HEIGHT),
            world,
            tuning,
            intent_dx: 0,
            facing: 1,
            jumping: false,
            jump_count: 0,
            dashing: false,
            dash_ticks_left: 0,
            // A spawn point counts as standing ground; an unsupported spawn
            // loses it on the first tick without a landing
            grounded: true,
            grounded_at_tick_start: false,
            landed_pending: false,
            anim: AnimState::Idle,
            anim_frame: 0,
            anim_ticks: 0,
            progress: ProgressState::new(lives),
        };
        avatar.clamp_x();
        avatar
    }

    // === Input intents ===

    /// Walk left (-1), right (1) or stand still (0)
    pub fn walk(&mut self, dir: i32) {
        let speed = (self.tuning.walk_speed as f32 * self.progress.capabilities.speed_multiplier)
            .round() as i32;
        self.intent_dx = dir.signum() * speed;
    }

    /// Request a raw horizontal velocity for the next tick
    pub fn set_horizontal_velocity(&mut self, dx: i32) {
        self.intent_dx = dx;
    }

    /// Drop any horizontal intent and motion immediately
    pub fn halt_horizontal(&mut self) {
        self.intent_dx = 0;
        self.vel.x = 0;
        self.dashing = false;
        self.dash_ticks_left = 0;
    }

    /// Start a jump if one is left. Returns whether it was honored.
    pub fn jump(&mut self) -> bool {
        if self.jump_count >= self.max_jumps() {
            return false;
        }
        self.jump_count += 1;
        self.jumping = true;
        self.vel.y = -self.tuning.jump_impulse;
        true
    }

    /// Start a dash in the facing direction. No-op without the capability or
    /// while already dashing.
    pub fn dash(&mut self) -> bool {
        if !self.progress.capabilities.dash || self.dashing {
            return false;
        }
        self.dashing = true;
        self.dash_ticks_left = self.tuning.dash_ticks;
        self.vel.x = self.facing * self.tuning.dash_speed;
        true
    }

    // === Tick ===

    /// Integrate one tick: horizontal intent or dash override, gravity,
    /// position, horizontal clamp and the world floor threshold
    pub fn advance(&mut self) {
        self.grounded_at_tick_start = self.grounded;
        self.grounded = false;

        if self.dashing {
            if self.dash_ticks_left == 0 {
                self.dashing = false;
                self.vel.x = 0;
            } else {
                self.dash_ticks_left -= 1;
                self.vel.x = self.facing * self.tuning.dash_speed;
            }
        } else {
            self.vel.x = self.intent_dx;
            if self.vel.x != 0 {
                self.facing = self.vel.x.signum();
            }
        }

        self.vel.y = (self.vel.y + self.tuning.gravity).min(self.tuning.terminal_velocity);

        self.pos += self.vel;
        self.clamp_x();

        let floor = self.world.y - self.size.y;
        if self.pos.y > floor && self.vel.y >= 0 {
            self.land(self.world.y);
        }
    }

    /// Rest the feet on a surface at `surface_y`: zero vertical speed and
    /// restore all jumps. Flags a landing when the avatar was airborne.
    pub fn land(&mut self, surface_y: i32) {
        self.pos.y = surface_y - self.size.y;
        self.vel.y = 0;
        self.jumping = false;
        self.jump_count = 0;
        if !self.grounded && !self.grounded_at_tick_start {
            self.landed_pending = true;
        }
        self.grounded = true;
    }

    /// Stop upward motion under a ceiling whose underside is at `ceiling_y`.
    /// Jumps already spent stay spent.
    pub fn hit_ceiling(&mut self, ceiling_y: i32) {
        self.pos.y = ceiling_y;
        self.vel.y = 0;
        self.jumping = false;
    }

    /// Hard stop against a wall: restore the pre-tick x
    pub fn block_horizontal(&mut self, previous_x: i32) {
        self.pos.x = previous_x;
        self.vel.x = 0;
        self.clamp_x();
    }

    /// Consume the one-shot landing signal
    pub fn take_landed(&mut self) -> bool {
        std::mem::take(&mut self.landed_pending)
    }

    /// Select the animation state for the settled position of this tick
    pub fn update_animation(&mut self) {
        let next = if self.jumping {
            if self.direction() < 0 {
                AnimState::JumpLeft
            } else {
                AnimState::JumpRight
            }
        } else if self.vel.y > 0 && !self.grounded {
            AnimState::Falling
        } else if self.vel.x < 0 {
            AnimState::WalkLeft
        } else if self.vel.x > 0 {
            AnimState::WalkRight
        } else {
            AnimState::Idle
        };

        if next != self.anim {
            self.anim = next;
            self.anim_frame = 0;
            self.anim_ticks = 0;
            return;
        }

        if matches!(self.anim, AnimState::WalkLeft | AnimState::WalkRight) {
            self.anim_ticks += 1;
            if self.anim_ticks >= TICKS_PER_FRAME {
                self.anim_ticks = 0;
                self.anim_frame = (self.anim_frame + 1) % WALK_FRAMES;
            }
        }
    }

    /// Horizontal sign for jump animations: velocity if moving, else facing
    fn direction(&self) -> i32 {
        if self.vel.x != 0 { self.vel.x.signum() } else { self.facing }
    }

    fn clamp_x(&mut self) {
        let max_x = (self.world.x - self.size.x).max(0);
        self.pos.x = self.pos.x.clamp(0, max_x);
    }

    // === Lifecycle ===

    /// Put the avatar back at a spawn point with no motion. Progress is
    /// untouched; see `reset_progress`.
    pub fn respawn(&mut self, spawn: IVec2) {
        self.pos = spawn;
        self.vel = IVec2::ZERO;
        self.intent_dx = 0;
        self.facing = 1;
        self.jumping = false;
        self.jump_count = 0;
        self.dashing = false;
        self.dash_ticks_left = 0;
        self.grounded = true;
        self.grounded_at_tick_start = false;
        self.landed_pending = false;
        self.anim = AnimState::Idle;
        self.anim_frame = 0;
        self.anim_ticks = 0;
        self.clamp_x();
    }

    /// Restore lives and drop every unlocked capability
    pub fn reset_progress(&mut self, lives: u8) {
        self.progress = ProgressState::new(lives);
        self.jump_count = self.jump_count.min(self.max_jumps());
    }

    /// Move without physics (editor/debug teleport); keeps the clamp
    pub fn place(&mut self, pos: IVec2) {
        self.pos = pos;
        self.clamp_x();
    }

    // === Queries ===

    pub fn position(&self) -> IVec2 {
        self.pos
    }

    pub fn velocity(&self) -> IVec2 {
        self.vel
    }

    pub fn size(&self) -> IVec2 {
        self.size
    }

    pub fn world_size(&self) -> IVec2 {
        self.world
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    pub fn is_dashing(&self) -> bool {
        self.dashing
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn jump_count(&self) -> u8 {
        self.jump_count
    }

    pub fn max_jumps(&self) -> u8 {
        self.progress.capabilities.max_jumps()
    }

    pub fn facing(&self) -> i32 {
        self.facing
    }

    pub fn anim_state(&self) -> AnimState {
        self.anim
    }

    pub fn anim_frame(&self) -> u32 {
        self.anim_frame
    }

    pub fn capabilities(&self) -> Capabilities {
        self.progress.capabilities
    }

    pub fn capabilities_mut(&mut self) -> &mut Capabilities {
        &mut self.progress.capabilities
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressState {
        &mut self.progress
    }

    pub fn tuning(&self) -> &PhysicsTuning {
        &self.tuning
    }

    pub fn body(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size.x, self.size.y)
    }

    pub fn feet(&self) -> Rect {
        Rect::new(
            self.pos.x,
            self.pos.y + self.size.y - STRIP_HEIGHT,
            self.size.x,
            STRIP_HEIGHT,
        )
    }

    pub fn head(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size.x, STRIP_HEIGHT)
    }

    pub fn hitboxes(&self) -> Hitboxes {
        Hitboxes {
            body: self.body(),
            feet: self.feet(),
            head: self.head(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WORLD: IVec2 = IVec2::new(2400, 864);

    fn avatar_at(x: i32, y: i32) -> Avatar {
        Avatar::new(IVec2::new(x, y), WORLD, PhysicsTuning::default(), 3)
    }

    /// Avatar resting on the world floor
    fn grounded_avatar(x: i32) -> Avatar {
        let mut a = avatar_at(x, WORLD.y - AVATAR_HEIGHT);
        a.advance();
        a.take_landed();
        assert!(a.is_grounded());
        a
    }

    #[test]
    fn test_clamp_at_left_edge() {
        let mut a = avatar_at(0, 100);
        a.set_horizontal_velocity(-7);
        a.advance();
        assert_eq!(a.position().x, 0);
    }

    #[test]
    fn test_clamp_at_right_edge() {
        let mut a = avatar_at(WORLD.x - AVATAR_WIDTH - 2, 100);
        a.set_horizontal_velocity(9);
        a.advance();
        assert_eq!(a.position().x, WORLD.x - AVATAR_WIDTH);
    }

    #[test]
    fn test_gravity_clamps_to_terminal_velocity() {
        let mut a = avatar_at(100, 0);
        for _ in 0..40 {
            a.advance();
            assert!(a.velocity().y <= a.tuning().terminal_velocity);
        }
    }

    #[test]
    fn test_single_jump_without_capability() {
        let mut a = grounded_avatar(100);
        assert!(a.jump());
        assert_eq!(a.jump_count(), 1);
        a.advance();
        let vel = a.velocity();

        // Second jump while airborne is refused and changes nothing
        assert!(!a.jump());
        assert_eq!(a.jump_count(), 1);
        assert_eq!(a.velocity(), vel);
    }

    #[test]
    fn test_double_jump_with_capability() {
        let mut a = grounded_avatar(100);
        a.capabilities_mut().double_jump = true;
        assert!(a.jump());
        a.advance();
        assert!(a.jump());
        assert_eq!(a.jump_count(), 2);
        assert_eq!(a.velocity().y, -a.tuning().jump_impulse);
        assert!(!a.jump());
    }

    #[test]
    fn test_ceiling_does_not_restore_jumps() {
        let mut a = grounded_avatar(100);
        a.jump();
        a.advance();
        a.hit_ceiling(a.position().y);
        assert!(!a.is_jumping());
        assert_eq!(a.jump_count(), 1);
        assert!(!a.jump());
    }

    #[test]
    fn test_landed_fires_once_per_landing() {
        let mut a = avatar_at(100, WORLD.y - AVATAR_HEIGHT - 40);
        let mut landings = 0;
        for _ in 0..60 {
            a.advance();
            if a.take_landed() {
                landings += 1;
            }
        }
        assert_eq!(landings, 1);
        assert!(a.is_grounded());
        assert_eq!(a.position().y, WORLD.y - AVATAR_HEIGHT);

        // Jump and come back down: exactly one more
        a.jump();
        for _ in 0..80 {
            a.advance();
            if a.take_landed() {
                landings += 1;
            }
        }
        assert_eq!(landings, 2);
        assert_eq!(a.jump_count(), 0);
    }

    #[test]
    fn test_dash_requires_capability_and_expires() {
        let mut a = grounded_avatar(100);
        assert!(!a.dash());

        a.capabilities_mut().dash = true;
        a.walk(-1);
        a.advance();
        a.walk(0);
        assert!(a.dash());
        // Already dashing
        assert!(!a.dash());

        let dash_ticks = a.tuning().dash_ticks;
        for _ in 0..dash_ticks {
            a.advance();
            assert_eq!(a.velocity().x, -a.tuning().dash_speed);
        }
        a.advance();
        assert!(!a.is_dashing());
        assert_eq!(a.velocity().x, 0);
        assert!(a.dash());
    }

    #[test]
    fn test_speed_boost_scales_walk() {
        let mut a = grounded_avatar(100);
        a.capabilities_mut().speed_multiplier = 1.5;
        a.walk(1);
        a.advance();
        assert_eq!(a.velocity().x, 8);
    }

    #[test]
    fn test_animation_states() {
        let mut a = grounded_avatar(500);
        a.update_animation();
        assert_eq!(a.anim_state(), AnimState::Idle);

        a.walk(-1);
        a.advance();
        a.update_animation();
        assert_eq!(a.anim_state(), AnimState::WalkLeft);

        a.walk(1);
        a.jump();
        a.advance();
        a.update_animation();
        assert_eq!(a.anim_state(), AnimState::JumpRight);

        // Walk off into the air without jumping
        let mut b = avatar_at(500, 100);
        b.advance();
        b.update_animation();
        assert_eq!(b.anim_state(), AnimState::Falling);
    }

    #[test]
    fn test_walk_animation_cycles_frames() {
        let mut a = grounded_avatar(100);
        a.walk(1);
        a.advance();
        a.update_animation();
        assert_eq!(a.anim_frame(), 0);
        for _ in 0..TICKS_PER_FRAME {
            a.advance();
            a.update_animation();
        }
        assert_eq!(a.anim_frame(), 1);
    }

    #[test]
    fn test_reset_progress_clears_capabilities() {
        let mut a = grounded_avatar(100);
        a.capabilities_mut().double_jump = true;
        a.capabilities_mut().dash = true;
        a.progress_mut().lives = 9;
        a.reset_progress(3);
        assert_eq!(a.capabilities(), Capabilities::default());
        assert_eq!(a.progress().lives, 3);
    }

    proptest! {
        #[test]
        fn prop_x_stays_in_world(
            start_x in -50i32..2500,
            moves in proptest::collection::vec(-40i32..40, 1..120),
        ) {
            let mut a = avatar_at(start_x, 200);
            prop_assert!(a.position().x >= 0 && a.position().x <= WORLD.x - AVATAR_WIDTH);
            for dx in moves {
                a.set_horizontal_velocity(dx);
                a.advance();
                prop_assert!(a.position().x >= 0);
                prop_assert!(a.position().x <= WORLD.x - AVATAR_WIDTH);
            }
        }

        #[test]
        fn prop_jump_count_bounded(
            double_jump in any::<bool>(),
            actions in proptest::collection::vec(0u8..3, 1..200),
        ) {
            let mut a = avatar_at(300, 500);
            a.capabilities_mut().double_jump = double_jump;
            for action in actions {
                let before = a.jump_count();
                match action {
                    0 => { a.jump(); }
                    1 => a.walk(1),
                    _ => {}
                }
                a.advance();
                prop_assert!(a.jump_count() <= a.max_jumps());
                // The counter only drops on floor contact
                if a.jump_count() < before {
                    prop_assert!(a.is_grounded());
                    prop_assert_eq!(a.jump_count(), 0);
                }
            }
        }
    }
}
