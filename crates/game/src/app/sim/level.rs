use engine::{Color, TextureId};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::components::Registry;
use super::ecs::Entity;
use super::factory;
use super::{GROUND_POSITION_Y, PLATFORM_CENTER_Y, PLATFORM_HEIGHT_PX, WINDOW_HEIGHT_PX,
    WINDOW_WIDTH_PX};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Forest,
    Desert,
    Ice,
}

/// A built level: the fixed entities plus the spawner schedule. Spawn
/// countdowns tick in milliseconds; a disabled spawner never fires.
pub struct Level {
    pub kind: LevelKind,

    pub next_scorpion_spawn_ms: f32,
    pub scorpion_spawn_enabled: bool,
    pub next_snake_spawn_ms: f32,
    pub snake_spawn_enabled: bool,
    pub next_desert_boss_spawn_ms: f32,
    pub desert_boss_enabled: bool,
    pub next_spider_spawn_ms: f32,
    pub spider_spawn_enabled: bool,
    pub next_forest_boss_spawn_ms: f32,
    pub forest_boss_enabled: bool,
    pub next_ice_crawler_spawn_ms: f32,
    pub ice_crawler_spawn_enabled: bool,
    pub next_ice_brute_spawn_ms: f32,
    pub ice_brute_spawn_enabled: bool,
    pub next_ice_boss_spawn_ms: f32,
    pub ice_boss_enabled: bool,

    pub player: Entity,
    pub backgrounds: [Entity; 2],
    pub foregrounds: [Entity; 2],
    pub help_texts: Option<[Entity; 3]>,

    pub rocks_color: Color,
}

struct LevelScaffold {
    player: Entity,
    backgrounds: [Entity; 2],
    foregrounds: [Entity; 2],
}

/// Two screen-wide background tiles side by side (they leapfrog each other
/// as the world scrolls), two foreground platform tiles, and the player.
fn build_scaffold(
    registry: &mut Registry,
    background: TextureId,
    foreground: TextureId,
    platform_height: f32,
    player_y: f32,
) -> LevelScaffold {
    let background_y = WINDOW_HEIGHT_PX / 2.0 - PLATFORM_HEIGHT_PX * 3.0 / 4.0;
    let background_size = Vec2::new(WINDOW_WIDTH_PX, WINDOW_HEIGHT_PX);
    let backgrounds = [
        factory::create_background(
            registry,
            Vec2::new(WINDOW_WIDTH_PX / 2.0, background_y),
            background_size,
            background,
        ),
        factory::create_background(
            registry,
            Vec2::new(WINDOW_WIDTH_PX + WINDOW_WIDTH_PX / 2.0, background_y),
            background_size,
            background,
        ),
    ];

    let foreground_size = Vec2::new(WINDOW_WIDTH_PX, platform_height);
    let foregrounds = [
        factory::create_background(
            registry,
            Vec2::new(WINDOW_WIDTH_PX / 2.0, PLATFORM_CENTER_Y),
            foreground_size,
            foreground,
        ),
        factory::create_background(
            registry,
            Vec2::new(WINDOW_WIDTH_PX + WINDOW_WIDTH_PX / 2.0, PLATFORM_CENTER_Y),
            foreground_size,
            foreground,
        ),
    ];

    let player = factory::create_player(registry, Vec2::new(WINDOW_WIDTH_PX / 2.0, player_y));
    registry.colors.emplace(player, Color::new(1.0, 0.8, 0.8));

    LevelScaffold {
        player,
        backgrounds,
        foregrounds,
    }
}

fn base_level(kind: LevelKind, scaffold: LevelScaffold, rocks_color: Color) -> Level {
    Level {
        kind,
        next_scorpion_spawn_ms: 0.0,
        scorpion_spawn_enabled: false,
        next_snake_spawn_ms: 0.0,
        snake_spawn_enabled: false,
        next_desert_boss_spawn_ms: 100.0,
        desert_boss_enabled: false,
        next_spider_spawn_ms: 0.0,
        spider_spawn_enabled: false,
        next_forest_boss_spawn_ms: 100.0,
        forest_boss_enabled: false,
        next_ice_crawler_spawn_ms: 0.0,
        ice_crawler_spawn_enabled: false,
        next_ice_brute_spawn_ms: 0.0,
        ice_brute_spawn_enabled: false,
        next_ice_boss_spawn_ms: 100.0,
        ice_boss_enabled: false,
        player: scaffold.player,
        backgrounds: scaffold.backgrounds,
        foregrounds: scaffold.foregrounds,
        help_texts: None,
        rocks_color,
    }
}

pub fn create_level(registry: &mut Registry, kind: LevelKind) -> Level {
    match kind {
        LevelKind::Forest => create_forest_level(registry),
        LevelKind::Desert => create_desert_level(registry),
        LevelKind::Ice => create_ice_level(registry),
    }
}

pub fn create_forest_level(registry: &mut Registry) -> Level {
    let rest_y = GROUND_POSITION_Y - factory::PLAYER_BB.y / 2.0;
    let scaffold = build_scaffold(
        registry,
        TextureId::ForestBackground,
        TextureId::ForestForeground,
        PLATFORM_HEIGHT_PX,
        rest_y + 50.0,
    );

    let help_texts = [
        factory::create_help_text(
            registry,
            "Use Left and Right arrow keys to move,       ",
            Vec2::new(WINDOW_WIDTH_PX / 6.0, WINDOW_HEIGHT_PX * 1.0 / 10.0),
            Vec2::ZERO,
        ),
        factory::create_help_text(
            registry,
            "                              Up key to jump,",
            Vec2::new(WINDOW_WIDTH_PX / 6.0, WINDOW_HEIGHT_PX * 2.0 / 10.0),
            Vec2::ZERO,
        ),
        factory::create_help_text(
            registry,
            "           And Space to shoot enemies        ",
            Vec2::new(WINDOW_WIDTH_PX / 6.0, WINDOW_HEIGHT_PX * 3.0 / 10.0),
            Vec2::ZERO,
        ),
    ];

    let mut level = base_level(
        LevelKind::Forest,
        scaffold,
        Color::new(82.0 / 255.0, 41.0 / 255.0, 6.0 / 255.0),
    );
    level.next_spider_spawn_ms = 100.0;
    level.spider_spawn_enabled = true;
    level.forest_boss_enabled = true;
    level.help_texts = Some(help_texts);
    level
}

pub fn create_desert_level(registry: &mut Registry) -> Level {
    let rest_y = GROUND_POSITION_Y - factory::PLAYER_BB.y / 2.0;
    let scaffold = build_scaffold(
        registry,
        TextureId::DesertBackground,
        TextureId::DesertForeground,
        PLATFORM_HEIGHT_PX,
        rest_y,
    );

    let mut level = base_level(
        LevelKind::Desert,
        scaffold,
        Color::new(1.0, 0.8, 0.8),
    );
    level.scorpion_spawn_enabled = true;
    level.snake_spawn_enabled = true;
    level.desert_boss_enabled = true;
    level
}

pub fn create_ice_level(registry: &mut Registry) -> Level {
    let rest_y = GROUND_POSITION_Y - factory::PLAYER_BB.y / 2.0;
    let scaffold = build_scaffold(
        registry,
        TextureId::IceBackground,
        TextureId::IceForeground,
        PLATFORM_HEIGHT_PX + 15.0,
        rest_y,
    );

    let mut level = base_level(LevelKind::Ice, scaffold, Color::new(0.0, 128.0, 128.0));
    level.next_ice_crawler_spawn_ms = 100.0;
    level.ice_crawler_spawn_enabled = true;
    level.next_ice_brute_spawn_ms = 100.0;
    level.ice_brute_spawn_enabled = true;
    level.ice_boss_enabled = true;
    level
}
