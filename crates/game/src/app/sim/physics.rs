use glam::Vec2;

use super::components::{Motion, Registry};
use super::factory::BULLET_SPEED;
use super::world::RunState;
use super::WINDOW_HEIGHT_PX;

const PROJECTILE_SPIN_DEG_PER_S: f32 = -30.0;
const FALL_ACCEL_PER_STEP: f32 = 12.0;
const ITEM_BOB_FREQ: f32 = 0.2;
const ITEM_BOB_AMPLITUDE: f32 = 0.7;

pub fn bounding_box(motion: &Motion) -> Vec2 {
    motion.scale.abs()
}

/// Axis-aligned overlap test on half-extents. Strict on every edge, so
/// boxes that merely touch do not collide.
pub fn collides(a: &Motion, b: &Motion) -> bool {
    let half_a = bounding_box(a) / 2.0;
    let half_b = bounding_box(b) / 2.0;

    a.position.x - half_a.x < b.position.x + half_b.x
        && b.position.x - half_b.x < a.position.x + half_a.x
        && a.position.y - half_a.y < b.position.y + half_b.y
        && b.position.y - half_b.y < a.position.y + half_a.y
}

/// One motion step: projectile gravity and spin, integration, item bobbing,
/// gun tracking, contact detection, then the player's vertical clamp.
pub fn step(registry: &mut Registry, state: &mut RunState, elapsed_ms: f32) {
    let step_s = elapsed_ms / 1000.0;

    // Lobbed projectiles arc down and tumble as they fly.
    let spin = PROJECTILE_SPIN_DEG_PER_S * step_s * (2.0 * std::f32::consts::PI / 180.0);
    for (entity, grenade) in registry.grenades.iter() {
        let motion = registry.motions.get_mut(entity);
        motion.velocity.y += grenade.delta_vy * step_s;
        motion.angle += spin;
    }
    for (entity, snowball) in registry.snowballs.iter() {
        let motion = registry.motions.get_mut(entity);
        motion.velocity.y += snowball.delta_vy * step_s;
        motion.angle += spin;
    }

    // Integrate everything that is not frozen mid-death.
    for (entity, motion) in registry.motions.iter_mut() {
        if !registry.death_timers.has(entity) {
            motion.position += motion.velocity * step_s;
        }
    }

    // Items bob in place, phase-shifted so neighbours alternate.
    state.item_anim_counter = state.item_anim_counter.wrapping_add(1);
    let mut phase = 0.0_f32;
    for (entity, _) in registry.items.iter() {
        let motion = registry.motions.get_mut(entity);
        motion.position.y +=
            ((phase + state.item_anim_counter as f32) * ITEM_BOB_FREQ).sin() * ITEM_BOB_AMPLITUDE;
        phase += std::f32::consts::PI;
    }

    // The gun rides the player and mirrors with them; bullets keep flying
    // the way they were fired.
    if let Some(player) = registry.first_player() {
        let player_motion = *registry.motions.get(player);
        let facing = player_motion.direction();
        for (entity, _) in registry.guns.iter() {
            let motion = registry.motions.get_mut(entity);
            motion.position = player_motion.position;
            motion.scale = facing * motion.scale.abs();
        }
    }
    for (entity, _) in registry.bullets.iter() {
        let motion = registry.motions.get_mut(entity);
        motion.velocity = motion.direction() * Vec2::new(BULLET_SPEED, 0.0);
    }

    // All-pairs contact sweep. Each overlap is logged both ways.
    let count = registry.motions.len();
    for i in 0..count {
        let (entity, motion) = registry.motions.entry(i);
        for j in (i + 1)..count {
            let (other, other_motion) = registry.motions.entry(j);
            if collides(motion, other_motion) {
                registry.collisions.push(entity, other);
                registry.collisions.push(other, entity);
            }
        }
    }

    // Keep the player on screen and pull them back down to their current
    // rest height (the ground, or the top of a rock they stand on).
    if let Some(player) = registry.first_player() {
        let half_height = bounding_box(registry.motions.get(player)).y / 2.0;
        let motion = registry.motions.get_mut(player);

        if motion.position.y < half_height {
            motion.position.y = half_height;
            motion.velocity.y = 0.0;
        }
        if motion.position.y > WINDOW_HEIGHT_PX - half_height {
            motion.position.y = WINDOW_HEIGHT_PX - half_height;
            motion.velocity.y = 0.0;
        }

        if motion.position.y < state.protagonist_rest_y {
            motion.velocity.y += FALL_ACCEL_PER_STEP;
        } else {
            motion.velocity.y = 0.0;
        }
        if motion.position.y > state.protagonist_rest_y {
            motion.position.y = state.protagonist_rest_y;
        }
    }
}
