use engine::{Color, DrawCall, EffectId, GeometryId, RenderFrame, TextDraw, TextureId};
use glam::Vec2;

use super::ecs::Entity;
use super::factory::{BULLET_DAMAGE, MAX_ARMOR_LEVEL, PLAYER_HP, TIER_COLORS};
use super::world::WorldSim;
use super::{WINDOW_HEIGHT_PX, WINDOW_WIDTH_PX};

const INVENTORY_BOXES: u32 = 6;
const BOX_DIM: f32 = 64.0;
const ITEM_DIM: f32 = 48.0;
const LINE_DIM: f32 = 4.0;
const HEART_DIM: f32 = 24.0;
const HEART_SPACING: f32 = 32.0;

/// Rebuilds the render frame for the current simulation state: world
/// sprites back to front, the inventory bar, help text, then overlays.
pub fn assemble(sim: &WorldSim, frame: &mut RenderFrame) {
    frame.clear();

    if sim.state.display_fps {
        frame.title = format!("  FPS: {}", sim.state.fps);
    }

    // Scrolling tiles first so everything else draws over them.
    for entity in sim.level.backgrounds.iter().chain(&sim.level.foregrounds) {
        push_entity(sim, frame, *entity);
    }
    for (entity, _) in sim.registry.render_requests.iter() {
        if sim.level.backgrounds.contains(&entity) || sim.level.foregrounds.contains(&entity) {
            continue;
        }
        push_entity(sim, frame, entity);
    }

    push_inventory(sim, frame);

    for (entity, help) in sim.registry.help_texts.iter() {
        let Some(motion) = sim.registry.motions.try_get(entity) else {
            continue;
        };
        frame.texts.push(TextDraw {
            text: help.text.clone(),
            position: motion.position,
        });
    }

    if sim.state.show_help {
        push_quad(
            frame,
            Some(TextureId::HelpPanel),
            Vec2::new(WINDOW_WIDTH_PX / 2.0, WINDOW_HEIGHT_PX / 2.0),
            Vec2::new(WINDOW_WIDTH_PX, WINDOW_HEIGHT_PX),
            None,
        );
    }

    let screen = sim.registry.screen_states.get(sim.screen);
    frame.darken_factor = screen.darken_factor.max(0.0);
}

fn push_entity(sim: &WorldSim, frame: &mut RenderFrame, entity: Entity) {
    let Some(request) = sim.registry.render_requests.try_get(entity) else {
        return;
    };
    let Some(motion) = sim.registry.motions.try_get(entity) else {
        return;
    };
    frame.push(DrawCall {
        entity: Some(entity),
        texture: request.texture,
        effect: request.effect,
        geometry: request.geometry,
        position: motion.position,
        scale: motion.scale,
        angle: motion.angle,
        color: sim.registry.colors.try_get(entity).copied(),
    });
}

/// A screen-space quad, centered on `position`. Untextured quads go through
/// the colored effect like rocks do.
fn push_quad(
    frame: &mut RenderFrame,
    texture: Option<TextureId>,
    position: Vec2,
    scale: Vec2,
    color: Option<Color>,
) {
    let effect = if texture.is_some() {
        EffectId::Textured
    } else {
        EffectId::Colored
    };
    frame.push(DrawCall {
        entity: None,
        texture,
        effect,
        geometry: GeometryId::Sprite,
        position,
        scale,
        angle: 0.0,
        color,
    });
}

fn push_corner_quad(
    frame: &mut RenderFrame,
    texture: Option<TextureId>,
    corner: Vec2,
    dim: Vec2,
    color: Option<Color>,
) {
    push_quad(frame, texture, corner + dim / 2.0, dim, color);
}

/// The inventory bar: a backing strip, six outlined boxes, the sword and
/// shield tier icons, and one heart per three hit points.
fn push_inventory(sim: &WorldSim, frame: &mut RenderFrame) {
    let background_color = Color::new(163.0 / 255.0, 124.0 / 255.0, 73.0 / 255.0) * 0.7;
    let background_dim = Vec2::new(BOX_DIM * INVENTORY_BOXES as f32, BOX_DIM);
    let background_pos =
        Vec2::new(WINDOW_WIDTH_PX, 460.0 + WINDOW_HEIGHT_PX) * 0.5 - background_dim * 0.5;
    push_corner_quad(frame, None, background_pos, background_dim, Some(background_color));

    let box_color = Color::new(240.0 / 255.0, 216.0 / 255.0, 180.0 / 255.0) * 0.7;
    for box_index in 0..INVENTORY_BOXES {
        let box_x = background_pos.x + box_index as f32 * BOX_DIM;
        let horizontal = Vec2::new(BOX_DIM, LINE_DIM);
        let vertical = Vec2::new(LINE_DIM, BOX_DIM);
        push_corner_quad(
            frame,
            None,
            Vec2::new(box_x, background_pos.y),
            horizontal,
            Some(box_color),
        );
        push_corner_quad(
            frame,
            None,
            Vec2::new(box_x, background_pos.y + BOX_DIM),
            horizontal,
            Some(box_color),
        );
        push_corner_quad(
            frame,
            None,
            Vec2::new(box_x + BOX_DIM, background_pos.y),
            vertical,
            Some(box_color),
        );
        push_corner_quad(
            frame,
            None,
            Vec2::new(box_x, background_pos.y),
            vertical,
            Some(box_color),
        );
    }

    let Some(player) = sim.registry.first_player() else {
        return;
    };
    let health = sim.registry.healths.get(player);

    let damage_tier = sim
        .registry
        .first_gun()
        .map(|gun| sim.registry.guns.get(gun).damage)
        .map(|damage| ((damage / BULLET_DAMAGE).floor() as i32).clamp(0, MAX_ARMOR_LEVEL))
        .unwrap_or(0);
    let armor_tier = health.armor_level;

    let offset = BOX_DIM / 2.0 - ITEM_DIM / 2.0;
    let item_dim = Vec2::new(ITEM_DIM, ITEM_DIM);
    push_corner_quad(
        frame,
        Some(TextureId::Sword),
        background_pos + Vec2::new(offset, offset),
        item_dim,
        Some(TIER_COLORS[damage_tier.max(1) as usize - 1]),
    );
    push_corner_quad(
        frame,
        Some(TextureId::Shield),
        background_pos + Vec2::new(BOX_DIM + offset, offset),
        item_dim,
        Some(TIER_COLORS[armor_tier.max(1) as usize - 1]),
    );

    let num_lives = ((health.hp as f32 / PLAYER_HP as f32).ceil() as i32).max(0);
    for life_index in 0..num_lives {
        push_corner_quad(
            frame,
            Some(TextureId::Heart),
            Vec2::new(
                background_pos.x + life_index as f32 * HEART_SPACING,
                background_pos.y - 32.0,
            ),
            Vec2::new(HEART_DIM, HEART_DIM),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::sim::level::LevelKind;
    use crate::app::sim::world::WorldSim;
    use engine::MeshRegistry;

    fn sim() -> WorldSim {
        WorldSim::new(7, LevelKind::Forest, MeshRegistry::builtin())
    }

    fn heart_calls(frame: &RenderFrame) -> usize {
        frame
            .calls
            .iter()
            .filter(|call| call.texture == Some(TextureId::Heart))
            .count()
    }

    #[test]
    fn one_heart_per_three_hit_points_rounded_up() {
        let mut world = sim();
        let mut frame = RenderFrame::default();

        assemble(&world, &mut frame);
        assert_eq!(heart_calls(&frame), 1);

        let player = world.level.player;
        world.registry.healths.get_mut(player).hp = 7;
        assemble(&world, &mut frame);
        assert_eq!(heart_calls(&frame), 3);

        world.registry.healths.get_mut(player).hp = 0;
        assemble(&world, &mut frame);
        assert_eq!(heart_calls(&frame), 0);
    }

    #[test]
    fn sword_icon_tint_tracks_gun_damage() {
        let mut world = sim();
        let mut frame = RenderFrame::default();
        let gun = world.registry.first_gun().unwrap();
        world.registry.guns.get_mut(gun).damage = 3.0 * BULLET_DAMAGE;

        assemble(&world, &mut frame);

        let sword = frame
            .calls
            .iter()
            .find(|call| call.texture == Some(TextureId::Sword))
            .unwrap();
        assert_eq!(sword.color, Some(TIER_COLORS[2]));
    }

    #[test]
    fn tiles_draw_before_everything_else() {
        let world = sim();
        let mut frame = RenderFrame::default();

        assemble(&world, &mut frame);

        let first = &frame.calls[0];
        assert_eq!(first.texture, Some(TextureId::ForestBackground));
        assert_eq!(frame.calls[2].texture, Some(TextureId::ForestForeground));
    }

    #[test]
    fn help_overlay_draws_only_when_requested() {
        let mut world = sim();
        let mut frame = RenderFrame::default();

        assemble(&world, &mut frame);
        assert!(frame
            .calls
            .iter()
            .all(|call| call.texture != Some(TextureId::HelpPanel)));

        world.state.show_help = true;
        assemble(&world, &mut frame);
        let last = frame.calls.last().unwrap();
        assert_eq!(last.texture, Some(TextureId::HelpPanel));
    }

    #[test]
    fn fps_title_follows_the_toggle() {
        let mut world = sim();
        let mut frame = RenderFrame::default();

        assemble(&world, &mut frame);
        assert!(frame.title.is_empty());

        world.state.display_fps = true;
        world.state.fps = 60.0;
        assemble(&world, &mut frame);
        assert_eq!(frame.title, "  FPS: 60");
    }

    #[test]
    fn tutorial_text_reaches_the_frame() {
        let world = sim();
        let mut frame = RenderFrame::default();

        assemble(&world, &mut frame);

        assert_eq!(frame.texts.len(), 3);
        assert!(frame
            .texts
            .iter()
            .any(|draw| draw.text.contains("Space to shoot")));
    }
}
