use engine::{Color, EffectId, GeometryId, MeshRegistry, RenderRequest, TextureId};
use glam::Vec2;

use super::ecs::Entity;
use super::components::{
    Boss, BossKind, Bullet, Deadly, DebugShape, Enemy, EnemyKind, Explosion, Grenade, Gun, Health,
    HelpText, Item, ItemKind, MeshRef, Motion, Obstacle, Player, Registry, Snowball, Tornado,
};

// Bounding boxes, sprite pixel sizes scaled down to world units.
pub const PLAYER_BB: Vec2 = Vec2::new(0.6 * 65.0, 0.6 * 170.0);
pub const SCORPION_BB: Vec2 = Vec2::new(0.6 * 300.0, 0.6 * 202.0);
pub const SNAKE_BB: Vec2 = Vec2::new(0.6 * 300.0, 0.6 * 202.0);
pub const SPIDER_BB: Vec2 = Vec2::new(0.2 * 578.0, 0.2 * 421.0);
pub const ICE_CRAWLER_BB: Vec2 = Vec2::new(0.6 * 320.0, 0.6 * 275.0);
pub const ICE_BRUTE_BB: Vec2 = Vec2::new(0.6 * 360.0, 0.6 * 275.0);
pub const FOREST_BOSS_BB: Vec2 = Vec2::new(0.6 * 850.0, 0.6 * 702.0);
pub const DESERT_BOSS_BB: Vec2 = Vec2::new(0.6 * 850.0, 0.6 * 850.0);
pub const ICE_BOSS_BB: Vec2 = Vec2::new(0.6 * 850.0, 0.6 * 650.0);
pub const GUN_BB: Vec2 = Vec2::new(0.6 * 100.0, 0.6 * 75.0);
pub const BULLET_BB: Vec2 = Vec2::new(0.6 * 50.0, 0.6 * 25.0);
pub const GRENADE_BB: Vec2 = Vec2::new(0.6 * 50.0, 0.6 * 50.0);
pub const SNOWBALL_BB: Vec2 = Vec2::new(0.6 * 75.0, 0.6 * 75.0);
pub const EXPLOSION_BB: Vec2 = Vec2::new(0.6 * 100.0, 0.6 * 75.0);
pub const TORNADO_BB: Vec2 = Vec2::new(0.6 * 120.0, 0.6 * 100.0);

// Starting hit points.
pub const PLAYER_HP: i32 = 3;
pub const MAX_PLAYER_HP: i32 = 9;
pub const SCORPION_HP: i32 = 6;
pub const SNAKE_HP: i32 = 8;
pub const SPIDER_HP: i32 = 3;
pub const ICE_CRAWLER_HP: i32 = 9;
pub const ICE_BRUTE_HP: i32 = 10;
pub const FOREST_BOSS_HP: i32 = 40;
pub const DESERT_BOSS_HP: i32 = 50;
pub const ICE_BOSS_HP: i32 = 60;

// Damage, before armor division.
pub const BULLET_DAMAGE: f32 = 1.0;
pub const GRENADE_DAMAGE: f32 = 2.0;
pub const TORNADO_DAMAGE: f32 = 4.0;
pub const SNOWBALL_DAMAGE: f32 = 6.0;
pub const SCORPION_CONTACT_DAMAGE: i32 = 2;
pub const SPIDER_CONTACT_DAMAGE: i32 = 4;
pub const ICE_CRAWLER_CONTACT_DAMAGE: i32 = 5;
pub const FOREST_BOSS_CONTACT_DAMAGE: i32 = 5;
pub const DESERT_BOSS_CONTACT_DAMAGE: i32 = 10;
pub const ICE_BOSS_CONTACT_DAMAGE: i32 = 15;

pub const MAX_ARMOR_LEVEL: i32 = 4;
pub const BULLET_SPEED: f32 = 400.0;

/// Loot tint tiers, dimmest to brightest: bronze, silver, gold, diamond.
pub const TIER_COLORS: [Color; 4] = [
    Color::new(205.0 / 255.0, 127.0 / 255.0, 50.0 / 255.0),
    Color::new(192.0 / 255.0, 192.0 / 255.0, 192.0 / 255.0),
    Color::new(234.0 / 255.0, 190.0 / 255.0, 63.0 / 255.0),
    Color::new(145.0 / 255.0, 252.0 / 255.0, 265.0 / 255.0),
];

const PROJECTILE_FLIGHT_TIME_S: f32 = 1.5;
const PROJECTILE_INITIAL_VY: f32 = -100.0;
const DEFAULT_DELTA_VY: f32 = 50.0;

fn sprite(texture: TextureId) -> RenderRequest {
    RenderRequest {
        texture: Some(texture),
        effect: EffectId::Textured,
        geometry: GeometryId::Sprite,
    }
}

pub fn create_player(registry: &mut Registry, position: Vec2) -> Entity {
    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position,
            scale: PLAYER_BB,
            ..Motion::default()
        },
    );
    registry.players.emplace(entity, Player);
    registry.healths.emplace(
        entity,
        Health {
            hp: PLAYER_HP,
            armor_level: 1,
        },
    );
    registry
        .render_requests
        .emplace(entity, sprite(TextureId::PlayerIdle));
    entity
}

pub fn create_enemy(
    registry: &mut Registry,
    kind: EnemyKind,
    position: Vec2,
    ground_velocity: Vec2,
) -> Entity {
    let (scale, hp, speed, texture) = match kind {
        EnemyKind::Scorpion => (SCORPION_BB, SCORPION_HP, -155.0, TextureId::Scorpion),
        EnemyKind::Snake => (SNAKE_BB, SNAKE_HP, -155.0, TextureId::Snake),
        EnemyKind::Spider => (SPIDER_BB, SPIDER_HP, -150.0, TextureId::SpiderBug),
        EnemyKind::IceCrawler => (ICE_CRAWLER_BB, ICE_CRAWLER_HP, -150.0, TextureId::IceCrawler),
        EnemyKind::IceBrute => (ICE_BRUTE_BB, ICE_BRUTE_HP, -150.0, TextureId::IceBrute),
    };
    let position = match kind {
        // The spider sprite rides higher on its box than the others.
        EnemyKind::Spider => position + Vec2::new(0.0, SPIDER_BB.y / 4.0),
        _ => position,
    };

    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position,
            velocity: ground_velocity + Vec2::new(speed, 0.0),
            scale,
            ..Motion::default()
        },
    );
    registry.enemies.emplace(entity, Enemy { kind });
    registry.deadlys.emplace(entity, Deadly::default());
    registry.healths.emplace(
        entity,
        Health {
            hp,
            armor_level: 1,
        },
    );
    registry.render_requests.emplace(entity, sprite(texture));
    entity
}

pub fn create_boss(
    registry: &mut Registry,
    kind: BossKind,
    position: Vec2,
    ground_velocity: Vec2,
) -> Entity {
    let (scale, hp, texture) = match kind {
        BossKind::Forest => (FOREST_BOSS_BB, FOREST_BOSS_HP, TextureId::ForestBoss),
        BossKind::Desert => (DESERT_BOSS_BB, DESERT_BOSS_HP, TextureId::Dragon0),
        BossKind::Ice => (ICE_BOSS_BB, ICE_BOSS_HP, TextureId::IceBoss),
    };

    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position,
            velocity: ground_velocity + Vec2::new(-150.0, 0.0),
            scale,
            ..Motion::default()
        },
    );
    registry.bosses.emplace(entity, Boss { kind });
    registry.deadlys.emplace(entity, Deadly::default());
    registry.healths.emplace(
        entity,
        Health {
            hp,
            armor_level: 1,
        },
    );
    registry.render_requests.emplace(entity, sprite(texture));
    entity
}

/// The gun follows the player; position and flip are refreshed by the
/// physics pass every step.
pub fn create_gun(registry: &mut Registry) -> Option<Entity> {
    let player = registry.first_player()?;
    let player_motion = *registry.motions.get(player);

    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position: player_motion.position,
            velocity: player_motion.velocity,
            scale: GUN_BB,
            ..Motion::default()
        },
    );
    registry.guns.emplace(
        entity,
        Gun {
            damage: BULLET_DAMAGE,
        },
    );
    registry.render_requests.emplace(entity, sprite(TextureId::Gun));
    Some(entity)
}

pub fn create_bullet(registry: &mut Registry) -> Option<Entity> {
    let gun = registry.first_gun()?;
    let gun_motion = *registry.motions.get(gun);
    let direction = gun_motion.direction();

    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position: gun_motion.position,
            velocity: direction * Vec2::new(BULLET_SPEED, 0.0),
            scale: direction * BULLET_BB,
            ..Motion::default()
        },
    );
    registry.bullets.emplace(entity, Bullet);
    registry
        .render_requests
        .emplace(entity, sprite(TextureId::Bullet));
    Some(entity)
}

/// Flight solution shared by grenades and snowballs: fixed horizontal speed
/// to reach the player in 1.5 s, launched slightly upward, pulled down by a
/// per-projectile gravity picked so it lands near the player's height.
fn lob_at(boss: &Motion, player: &Motion) -> (Vec2, Vec2, Vec2, f32) {
    let direction = boss.direction();
    let t = PROJECTILE_FLIGHT_TIME_S;
    let vel_x = (player.position.x - boss.position.x).abs() / t;
    let dist_y = (player.position.y - boss.position.y).abs();

    let delta_vy = if player.position.y - boss.position.y < 0.0 {
        DEFAULT_DELTA_VY
    } else {
        2.0 * (dist_y - PROJECTILE_INITIAL_VY * t) / (t * t)
    };

    let position = boss.position + Vec2::new(direction.x * -100.0, 0.0);
    let velocity = direction * Vec2::new(-vel_x, PROJECTILE_INITIAL_VY);
    (position, velocity, direction, delta_vy)
}

pub fn create_grenade(registry: &mut Registry, boss: Entity, player: Entity) -> Entity {
    let boss_motion = *registry.motions.get(boss);
    let player_motion = *registry.motions.get(player);
    let (position, velocity, direction, delta_vy) = lob_at(&boss_motion, &player_motion);

    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position,
            velocity,
            scale: direction * GRENADE_BB,
            ..Motion::default()
        },
    );
    registry.grenades.emplace(
        entity,
        Grenade {
            damage: GRENADE_DAMAGE,
            delta_vy,
        },
    );
    registry
        .render_requests
        .emplace(entity, sprite(TextureId::Grenade));
    entity
}

pub fn create_snowball(registry: &mut Registry, boss: Entity, player: Entity) -> Entity {
    let boss_motion = *registry.motions.get(boss);
    let player_motion = *registry.motions.get(player);
    let (position, velocity, direction, delta_vy) = lob_at(&boss_motion, &player_motion);

    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position,
            velocity,
            scale: direction * SNOWBALL_BB,
            ..Motion::default()
        },
    );
    registry.snowballs.emplace(
        entity,
        Snowball {
            damage: SNOWBALL_DAMAGE,
            delta_vy,
        },
    );
    registry
        .render_requests
        .emplace(entity, sprite(TextureId::Snowball));
    entity
}

/// Tornadoes fly straight at the player instead of lobbing.
pub fn create_tornado(registry: &mut Registry, boss: Entity, player: Entity) -> Entity {
    let boss_motion = *registry.motions.get(boss);
    let player_motion = *registry.motions.get(player);
    let direction = boss_motion.direction();
    let t = PROJECTILE_FLIGHT_TIME_S;
    let vel_x = (player_motion.position.x - boss_motion.position.x).abs() / t;
    let vel_y = (player_motion.position.y - boss_motion.position.y) / t;

    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position: boss_motion.position + Vec2::new(direction.x * -100.0, 0.0),
            velocity: direction * Vec2::new(-vel_x, vel_y),
            scale: direction * TORNADO_BB,
            ..Motion::default()
        },
    );
    registry.tornados.emplace(
        entity,
        Tornado {
            damage: TORNADO_DAMAGE,
            frame_switch_ms: 250.0,
            ms_since_switch: 0.0,
            frame: 0,
        },
    );
    registry
        .render_requests
        .emplace(entity, sprite(TextureId::Tornado0));
    entity
}

pub fn create_explosion(registry: &mut Registry, position: Vec2) -> Entity {
    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position,
            scale: EXPLOSION_BB,
            ..Motion::default()
        },
    );
    registry.explosions.emplace(entity, Explosion);
    registry
        .render_requests
        .emplace(entity, sprite(TextureId::Explosion0));
    entity
}

/// Drops swords to the right of the corpse, shields and hearts to the left.
pub fn create_item(registry: &mut Registry, kind: ItemKind, at: Vec2, color: Color) -> Entity {
    let (texture, offset) = match kind {
        ItemKind::Sword => (TextureId::Sword, Vec2::new(24.0, 0.0)),
        ItemKind::Shield => (TextureId::Shield, Vec2::new(-24.0, 0.0)),
        ItemKind::Heart => (TextureId::Heart, Vec2::new(-24.0, 0.0)),
    };

    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position: at + offset,
            scale: Vec2::new(48.0, 48.0),
            ..Motion::default()
        },
    );
    registry.items.emplace(entity, Item { kind });
    registry.colors.emplace(entity, color);
    registry.render_requests.emplace(entity, sprite(texture));
    entity
}

/// Rocks are mesh-shaped obstacles. The mesh is placed by its top-left
/// corner and flipped vertically, so the anchor shifts to keep `position`
/// meaning "where the rock meets the ground line".
pub fn create_rock(
    registry: &mut Registry,
    meshes: &MeshRegistry,
    geometry: GeometryId,
    mut position: Vec2,
    size_multiplier: f32,
    velocity: Vec2,
    color: Color,
) -> Entity {
    let mesh = meshes.mesh(geometry);
    let mut scale = mesh.original_size * size_multiplier;
    scale.y *= -1.0;
    position.x += scale.x.abs() / 2.0;
    position.y -= scale.y.abs() / 2.0;

    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position,
            velocity,
            scale,
            ..Motion::default()
        },
    );
    registry.obstacles.emplace(entity, Obstacle);
    registry.mesh_refs.emplace(entity, MeshRef(geometry));
    registry.colors.emplace(entity, color);
    registry.render_requests.emplace(
        entity,
        RenderRequest {
            texture: None,
            effect: EffectId::Colored,
            geometry,
        },
    );
    entity
}

pub fn create_line(registry: &mut Registry, position: Vec2, scale: Vec2) -> Entity {
    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position,
            scale,
            ..Motion::default()
        },
    );
    registry.debug_shapes.emplace(entity, DebugShape);
    registry.render_requests.emplace(
        entity,
        RenderRequest {
            texture: None,
            effect: EffectId::Colored,
            geometry: GeometryId::DebugLine,
        },
    );
    entity
}

pub fn create_help_text(
    registry: &mut Registry,
    text: &str,
    position: Vec2,
    velocity: Vec2,
) -> Entity {
    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position,
            velocity,
            ..Motion::default()
        },
    );
    registry.help_texts.emplace(
        entity,
        HelpText {
            text: text.to_owned(),
        },
    );
    entity
}

pub fn create_background(
    registry: &mut Registry,
    position: Vec2,
    size: Vec2,
    texture: TextureId,
) -> Entity {
    let entity = registry.spawn();
    registry.motions.emplace(
        entity,
        Motion {
            position,
            scale: size,
            ..Motion::default()
        },
    );
    registry.render_requests.emplace(entity, sprite(texture));
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::MeshRegistry;

    #[test]
    fn bullet_inherits_gun_facing() {
        let mut registry = Registry::default();
        create_player(&mut registry, Vec2::new(600.0, 400.0));
        let gun = create_gun(&mut registry).unwrap();
        registry.motions.get_mut(gun).scale.x *= -1.0;

        let bullet = create_bullet(&mut registry).unwrap();
        let motion = registry.motions.get(bullet);
        assert_eq!(motion.velocity.x, -BULLET_SPEED);
        assert!(motion.scale.x < 0.0);
    }

    #[test]
    fn rock_is_anchored_to_the_ground_line() {
        let mut registry = Registry::default();
        let meshes = MeshRegistry::builtin();
        let ground = Vec2::new(100.0, 650.0);
        let rock = create_rock(
            &mut registry,
            &meshes,
            GeometryId::Rock0,
            ground,
            50.0,
            Vec2::ZERO,
            Color::new(0.3, 0.2, 0.1),
        );

        let motion = registry.motions.get(rock);
        assert!(motion.scale.y < 0.0);
        assert!(motion.position.x > ground.x);
        assert!(motion.position.y < ground.y);
        assert!(registry.obstacles.has(rock));
        assert!(registry.mesh_refs.has(rock));
    }

    #[test]
    fn lobbed_projectile_flies_backwards_from_boss_facing() {
        let mut registry = Registry::default();
        let player = create_player(&mut registry, Vec2::new(200.0, 565.0));
        let boss = create_boss(
            &mut registry,
            BossKind::Forest,
            Vec2::new(900.0, 439.4),
            Vec2::ZERO,
        );

        let grenade = create_grenade(&mut registry, boss, player);
        let motion = registry.motions.get(grenade);
        // Boss faces +x by default, so the grenade is pushed toward -x.
        assert!(motion.velocity.x < 0.0);
        assert_eq!(motion.velocity.y, -100.0);
        assert!(registry.grenades.get(grenade).delta_vy > 0.0);
    }
}
