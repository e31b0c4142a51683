use engine::{
    AudioSink, Color, MeshRegistry, RenderFrame, SoundId, DRAGON_FRAMES, EXPLOSION_FRAMES,
    PLAYER_WALK_FRAMES, TORNADO_FRAMES,
};
use engine::input::{ButtonState, Key, KeyInput};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::{debug, info};

use super::collision;
use super::components::{BossKind, DeathTimer, EnemyKind, ItemKind, Registry, ScreenState};
use super::ecs::Entity;
use super::factory::{
    self, BULLET_DAMAGE, GRENADE_BB, MAX_ARMOR_LEVEL, MAX_PLAYER_HP, PLAYER_BB, SCORPION_BB,
    SNAKE_BB, SNOWBALL_BB, TIER_COLORS, TORNADO_BB, ICE_BRUTE_BB, ICE_CRAWLER_BB, FOREST_BOSS_BB,
    ICE_BOSS_BB,
};
use super::hud;
use super::level::{self, Level, LevelKind};
use super::physics;
use super::{GROUND_POSITION_Y, LEVEL_TRANSITION_TIME_MS, WINDOW_WIDTH_PX};

pub const MAX_SCORPIONS: u32 = 10;
pub const MAX_SNAKES: u32 = 10;
pub const MAX_SPIDERS: u32 = 10;
pub const MAX_ICE_CRAWLERS: u32 = 10;
pub const MAX_ICE_BRUTES: u32 = 10;
pub const MAX_BOSSES_PER_LEVEL: u32 = 1;
pub const MAX_ROCKS: u32 = 50;

const SCORPION_DELAY_MS: f32 = 9000.0;
const SNAKE_DELAY_MS: f32 = 7500.0;
const ICE_CRAWLER_DELAY_MS: f32 = 9000.0;
const ICE_BRUTE_DELAY_MS: f32 = 7500.0;
const PROJECTILE_PERIOD_MS: f32 = 5000.0;
const EXPLOSION_FRAME_MS: f32 = 500.0;
const DRAGON_FRAME_MS: f32 = 1000.0;
const WALK_FRAME_MS: f32 = 500.0;
const BULLET_COOLDOWN_MS: f32 = 500.0;
const DEATH_FADE_MS: f32 = 3000.0;
const DAMAGE_FLASH_PERIOD: f32 = 4000.0;
const FAIL_PAUSE_MS: f32 = 3000.0;
const SUCCESS_PAUSE_MS: f32 = 5000.0;

const JUMP_VELOCITY: f32 = -300.0;
const WALK_SPEED: f32 = 200.0;
const SCROLL_SPEED: f32 = 100.0;

/// All run-wide mutable state that is not a component: kill tallies, spawner
/// bookkeeping, animation cursors and the simulation speed knob.
#[derive(Debug)]
pub struct RunState {
    pub scorpions_killed: u32,
    pub snakes_killed: u32,
    pub spiders_killed: u32,
    pub ice_crawlers_killed: u32,
    pub ice_brutes_killed: u32,
    pub forest_bosses_killed: u32,
    pub desert_bosses_killed: u32,
    pub ice_bosses_killed: u32,

    pub scorpions_spawned: u32,
    pub snakes_spawned: u32,
    pub spiders_spawned: u32,
    pub ice_crawlers_spawned: u32,
    pub ice_brutes_spawned: u32,
    pub forest_boss_count: u32,
    pub desert_boss_count: u32,
    pub ice_boss_count: u32,

    pub forest_boss_alive: bool,
    pub desert_boss_alive: bool,
    pub ice_boss_alive: bool,
    pub forest_boss: Option<Entity>,
    pub desert_boss: Option<Entity>,
    pub ice_boss: Option<Entity>,

    /// Counts down; firing is allowed at or below zero.
    pub bullet_cooldown_ms: f32,
    pub time_since_grenade_ms: f32,
    pub time_since_snowball_ms: f32,
    pub time_since_tornado_ms: f32,
    pub time_since_explosion_switch_ms: f32,
    pub time_since_dragon_switch_ms: f32,
    pub time_since_player_walk_ms: f32,

    pub explosion_frame: usize,
    pub dragon_frame: usize,
    pub prev_dragon_frame: usize,
    pub player_walk_frame: usize,
    pub item_anim_counter: u32,

    pub player_moving: bool,
    pub num_rocks: u32,
    pub foreground_velocity: Vec2,
    /// Height the player falls back to: the ground, or the top of a rock
    /// they are standing on.
    pub protagonist_rest_y: f32,
    pub current_speed: f32,
    pub level_transition_timer_ms: f32,

    pub did_user_fail: bool,
    pub did_user_succeed: bool,
    pub fail_screen_pause_ms: f32,
    pub success_screen_pause_ms: f32,

    pub debug_mode: bool,
    pub display_fps: bool,
    pub show_help: bool,
    pub fps: f32,
}

impl Default for RunState {
    fn default() -> Self {
        RunState {
            scorpions_killed: 0,
            snakes_killed: 0,
            spiders_killed: 0,
            ice_crawlers_killed: 0,
            ice_brutes_killed: 0,
            forest_bosses_killed: 0,
            desert_bosses_killed: 0,
            ice_bosses_killed: 0,
            scorpions_spawned: 0,
            snakes_spawned: 0,
            spiders_spawned: 0,
            ice_crawlers_spawned: 0,
            ice_brutes_spawned: 0,
            forest_boss_count: 0,
            desert_boss_count: 0,
            ice_boss_count: 0,
            forest_boss_alive: false,
            desert_boss_alive: false,
            ice_boss_alive: false,
            forest_boss: None,
            desert_boss: None,
            ice_boss: None,
            bullet_cooldown_ms: 0.0,
            time_since_grenade_ms: 0.0,
            time_since_snowball_ms: 0.0,
            time_since_tornado_ms: 0.0,
            time_since_explosion_switch_ms: 0.0,
            time_since_dragon_switch_ms: 0.0,
            time_since_player_walk_ms: WALK_FRAME_MS,
            explosion_frame: 0,
            dragon_frame: 0,
            prev_dragon_frame: 1,
            player_walk_frame: 0,
            item_anim_counter: 0,
            player_moving: false,
            num_rocks: 0,
            foreground_velocity: Vec2::ZERO,
            protagonist_rest_y: GROUND_POSITION_Y - PLAYER_BB.y / 2.0,
            current_speed: 1.0,
            level_transition_timer_ms: 0.0,
            did_user_fail: false,
            did_user_succeed: false,
            fail_screen_pause_ms: 0.0,
            success_screen_pause_ms: 0.0,
            debug_mode: false,
            display_fps: false,
            show_help: false,
            fps: 0.0,
        }
    }
}

/// The whole simulation: component stores, run state, the current level and
/// a seeded RNG so runs are reproducible.
pub struct WorldSim {
    pub registry: Registry,
    pub state: RunState,
    pub level: Level,
    pub meshes: MeshRegistry,
    pub screen: Entity,
    rng: Pcg64,
}

impl WorldSim {
    pub fn new(seed: u64, start: LevelKind, meshes: MeshRegistry) -> WorldSim {
        let mut registry = Registry::default();
        let screen = registry.spawn();
        registry.screen_states.emplace(screen, ScreenState::default());

        let level = level::create_level(&mut registry, start);
        factory::create_gun(&mut registry);

        info!(seed, level = ?start, "world created");
        WorldSim {
            registry,
            state: RunState::default(),
            level,
            meshes,
            screen,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    fn rand(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// One full simulated frame: motion, world logic, contact resolution,
    /// then render frame assembly.
    pub fn frame(&mut self, elapsed_ms: f32, audio: &mut dyn AudioSink, frame: &mut RenderFrame) {
        self.step(elapsed_ms, audio);
        physics::step(&mut self.registry, &mut self.state, elapsed_ms);
        collision::resolve(self, audio);
        hud::assemble(self, frame);
    }

    pub fn step(&mut self, elapsed_ms: f32, audio: &mut dyn AudioSink) {
        self.state.did_user_fail = false;
        self.state.did_user_succeed = false;

        self.state.bullet_cooldown_ms -= elapsed_ms;
        self.state.time_since_grenade_ms += elapsed_ms;
        self.state.time_since_snowball_ms += elapsed_ms;
        self.state.time_since_tornado_ms += elapsed_ms;
        self.state.time_since_explosion_switch_ms += elapsed_ms;
        self.state.time_since_dragon_switch_ms += elapsed_ms;
        for (_, tornado) in self.registry.tornados.iter_mut() {
            tornado.ms_since_switch += elapsed_ms;
        }

        self.remove_grounded_projectiles(audio);
        self.spawn_boss_projectiles();
        self.animate_explosions();
        self.animate_dragon();
        self.animate_tornados();
        self.animate_player(elapsed_ms);

        // Clear last step's debug geometry before this step redraws it.
        while let Some(&entity) = self.registry.debug_shapes.entities().last() {
            self.registry.remove_all(entity);
        }

        self.wrap_scrolling_tiles();
        self.update_rest_height();
        self.state.foreground_velocity = self
            .registry
            .motions
            .get(self.level.foregrounds[0])
            .velocity;

        self.steer_deadlys();
        self.run_spawners(elapsed_ms);
        self.spawn_rocks();
        if self.state.debug_mode {
            self.draw_debug_boxes();
        }

        if self.tick_death_timers(elapsed_ms) {
            return;
        }

        let damage_ids = self.registry.damage_timers.entities().to_vec();
        for entity in damage_ids {
            let timer = self.registry.damage_timers.get_mut(entity);
            timer.counter_ms -= elapsed_ms;
            if timer.counter_ms < 0.0 {
                self.registry.damage_timers.remove(entity);
            }
        }

        let light_ids = self.registry.light_ups.entities().to_vec();
        for entity in light_ids {
            let light = self.registry.light_ups.get_mut(entity);
            light.counter_ms -= elapsed_ms;
            if light.counter_ms < 0.0 {
                self.registry.light_ups.remove(entity);
            }
        }

        let player = self.level.player;
        if !self.registry.death_timers.has(player)
            && self.state.ice_bosses_killed >= MAX_BOSSES_PER_LEVEL
        {
            self.state.did_user_succeed = true;
            self.state.success_screen_pause_ms = SUCCESS_PAUSE_MS;
            audio.play(SoundId::Clapping);
            self.restart_game(LevelKind::Forest, true);
            return;
        }

        if self.state.level_transition_timer_ms > 0.0 {
            self.state.level_transition_timer_ms -= elapsed_ms;
            let screen = self.registry.screen_states.get_mut(self.screen);
            screen.darken_factor =
                1.0 - self.state.level_transition_timer_ms / LEVEL_TRANSITION_TIME_MS;
            if self.state.level_transition_timer_ms <= 0.0 {
                if self.state.forest_bosses_killed >= MAX_BOSSES_PER_LEVEL
                    && self.state.desert_bosses_killed < MAX_BOSSES_PER_LEVEL
                {
                    self.restart_game(LevelKind::Desert, false);
                } else if self.state.desert_bosses_killed >= MAX_BOSSES_PER_LEVEL
                    && self.state.ice_bosses_killed < MAX_BOSSES_PER_LEVEL
                {
                    self.restart_game(LevelKind::Ice, false);
                }
                self.registry
                    .screen_states
                    .get_mut(self.screen)
                    .darken_factor = 0.0;
            }
        }
    }

    /// Lobbed projectiles detonate or melt when they reach the platform;
    /// tornadoes also die against the top of the screen.
    fn remove_grounded_projectiles(&mut self, audio: &mut dyn AudioSink) {
        let grenade_ids = self.registry.grenades.entities().to_vec();
        for entity in grenade_ids {
            let position = self.registry.motions.get(entity).position;
            if position.y >= GROUND_POSITION_Y - GRENADE_BB.y / 2.0 {
                self.state.time_since_explosion_switch_ms = 0.0;
                audio.play(SoundId::Explosion);
                factory::create_explosion(&mut self.registry, position);
                self.registry.remove_all(entity);
            }
        }

        let snowball_ids = self.registry.snowballs.entities().to_vec();
        for entity in snowball_ids {
            let position = self.registry.motions.get(entity).position;
            if position.y >= GROUND_POSITION_Y - SNOWBALL_BB.y / 2.0 {
                self.registry.remove_all(entity);
            }
        }

        let tornado_ids = self.registry.tornados.entities().to_vec();
        for entity in tornado_ids {
            let position = self.registry.motions.get(entity).position;
            if position.y >= GROUND_POSITION_Y - TORNADO_BB.y / 2.0
                || position.y <= TORNADO_BB.y / 2.0
            {
                self.registry.remove_all(entity);
            }
        }
    }

    fn spawn_boss_projectiles(&mut self) {
        let player = self.level.player;

        if self.state.forest_boss_alive
            && self.state.time_since_grenade_ms >= PROJECTILE_PERIOD_MS
        {
            self.state.time_since_grenade_ms = 0.0;
            if let Some(boss) = self.state.forest_boss {
                factory::create_grenade(&mut self.registry, boss, player);
            }
        }

        if self.state.ice_boss_alive
            && self.state.time_since_snowball_ms >= PROJECTILE_PERIOD_MS
        {
            self.state.time_since_snowball_ms = 0.0;
            if let Some(boss) = self.state.ice_boss {
                factory::create_snowball(&mut self.registry, boss, player);
            }
        }

        if self.state.desert_boss_alive
            && self.state.time_since_tornado_ms >= PROJECTILE_PERIOD_MS
        {
            self.state.time_since_tornado_ms = 0.0;
            if let Some(boss) = self.state.desert_boss {
                factory::create_tornado(&mut self.registry, boss, player);
            }
        }
    }

    /// All explosions share one frame cursor. After the last frame the
    /// explosion entity is removed and the cursor rewinds.
    fn animate_explosions(&mut self) {
        let ids = self.registry.explosions.entities().to_vec();
        for entity in ids {
            if self.state.time_since_explosion_switch_ms >= EXPLOSION_FRAME_MS {
                self.state.time_since_explosion_switch_ms = 0.0;
                if self.state.explosion_frame == EXPLOSION_FRAMES.len() {
                    self.state.explosion_frame = 0;
                    self.registry.remove_all(entity);
                    return;
                }
                let request = self.registry.render_requests.get_mut(entity);
                request.texture = Some(EXPLOSION_FRAMES[self.state.explosion_frame]);
                self.state.explosion_frame += 1;
            }
        }
    }

    /// The dragon flaps by ping-ponging through its three frames.
    fn animate_dragon(&mut self) {
        let Some(boss) = self.state.desert_boss else {
            return;
        };
        if !self.registry.bosses.has(boss) {
            return;
        }
        if self.state.time_since_dragon_switch_ms < DRAGON_FRAME_MS {
            return;
        }
        self.state.time_since_dragon_switch_ms = 0.0;

        let prev = self.state.prev_dragon_frame;
        self.state.prev_dragon_frame = self.state.dragon_frame;
        match self.state.dragon_frame {
            1 if prev == 0 => self.state.dragon_frame += 1,
            1 if prev == 2 => self.state.dragon_frame -= 1,
            0 => self.state.dragon_frame += 1,
            2 => self.state.dragon_frame -= 1,
            _ => {}
        }
        let request = self.registry.render_requests.get_mut(boss);
        request.texture = Some(DRAGON_FRAMES[self.state.dragon_frame]);
    }

    fn animate_tornados(&mut self) {
        for (entity, tornado) in self.registry.tornados.iter_mut() {
            if tornado.ms_since_switch >= tornado.frame_switch_ms {
                tornado.ms_since_switch = 0.0;
                tornado.frame = (tornado.frame + 1) % TORNADO_FRAMES.len();
                let request = self.registry.render_requests.get_mut(entity);
                request.texture = Some(TORNADO_FRAMES[tornado.frame]);
            }
        }
    }

    fn animate_player(&mut self, elapsed_ms: f32) {
        let player = self.level.player;

        let request = self.registry.render_requests.get_mut(player);
        if !self.state.player_moving {
            request.texture = Some(PLAYER_WALK_FRAMES[3]);
            self.state.time_since_player_walk_ms = WALK_FRAME_MS;
        } else {
            self.state.time_since_player_walk_ms -= elapsed_ms;
            if self.state.time_since_player_walk_ms <= 0.0 {
                self.state.player_walk_frame = (self.state.player_walk_frame + 1) % 3;
                request.texture = Some(PLAYER_WALK_FRAMES[self.state.player_walk_frame]);
                self.state.time_since_player_walk_ms = WALK_FRAME_MS;
            }
        }

        // Red flash while the damage grace period runs; the tint is dropped
        // entirely once it expires.
        if let Some(timer) = self.registry.damage_timers.try_get(player) {
            let f = ((timer.counter_ms / DAMAGE_FLASH_PERIOD) * 100.0).sin();
            let f = (f + 1.0) / 2.0;
            let flash = Color::new(1.0, 0.0, 0.0) * f + Color::new(1.0, 1.0, 1.0) * (1.0 - f);
            self.registry.colors.upsert(player, flash);
        } else {
            self.registry.colors.remove(player);
        }
    }

    /// The two background tiles (and the two foreground tiles) leapfrog each
    /// other whenever one scrolls a full screen away from the player.
    fn wrap_scrolling_tiles(&mut self) {
        let player_x = self.registry.motions.get(self.level.player).position.x;
        for pair in [self.level.backgrounds, self.level.foregrounds] {
            for (tile, other) in [(pair[0], pair[1]), (pair[1], pair[0])] {
                let other_motion = *self.registry.motions.get(other);
                let motion = self.registry.motions.get_mut(tile);
                if motion.position.x + motion.scale.x / 2.0 < player_x - WINDOW_WIDTH_PX / 2.0 {
                    motion.position.x = other_motion.position.x + other_motion.scale.x;
                } else if motion.position.x - motion.scale.x / 2.0
                    > player_x + WINDOW_WIDTH_PX / 2.0
                {
                    motion.position.x = other_motion.position.x - other_motion.scale.x;
                }
            }
        }
    }

    /// Probes rock vertices just under the player's feet. Standing on a rock
    /// keeps the current rest height; otherwise it snaps back to the ground.
    fn update_rest_height(&mut self) {
        let player_motion = *self.registry.motions.get(self.level.player);
        let left = player_motion.position.x - PLAYER_BB.x / 2.0;
        let right = player_motion.position.x + PLAYER_BB.x / 2.0;
        let top = player_motion.position.y - PLAYER_BB.y / 2.0;
        let bottom = player_motion.position.y + PLAYER_BB.y / 2.0;

        let mut is_standing = false;
        'obstacles: for (entity, _) in self.registry.obstacles.iter() {
            let Some(mesh_ref) = self.registry.mesh_refs.try_get(entity) else {
                continue;
            };
            let motion = self.registry.motions.get(entity);
            for vertex in &self.meshes.mesh(mesh_ref.0).vertices {
                let v = *vertex * motion.scale + motion.position;
                if v.x < right && v.x > left && v.y < bottom + 1.0 && v.y > bottom && v.y > top {
                    is_standing = true;
                    break 'obstacles;
                }
            }
        }

        if !is_standing {
            self.state.protagonist_rest_y = GROUND_POSITION_Y - PLAYER_BB.y / 2.0;
        }
    }

    /// Enemies chase the player horizontally unless a rock stands between
    /// them. Also draws the floating health bar above each live deadly.
    fn steer_deadlys(&mut self) {
        let player = self.level.player;
        if self.registry.death_timers.has(player) {
            return;
        }
        let player_position = self.registry.motions.get(player).position;

        let deadly_ids = self.registry.deadlys.entities().to_vec();
        for entity in deadly_ids {
            if self.registry.death_timers.has(entity) {
                continue;
            }
            let deadly_position = self.registry.motions.get(entity).position;

            let mut rock_between = false;
            for (rock, _) in self.registry.obstacles.iter() {
                let rock_x = self.registry.motions.get(rock).position.x;
                if (rock_x < player_position.x && rock_x > deadly_position.x)
                    || (rock_x > player_position.x && rock_x < deadly_position.x)
                {
                    rock_between = true;
                    break;
                }
            }

            let deadly = self.registry.deadlys.get_mut(entity);
            if rock_between {
                deadly.following_player = false;
                continue;
            }
            deadly.following_player = true;

            let to_player = player_position - deadly_position;
            let direction = Vec2::new(to_player.x, 0.0).normalize_or_zero();
            let foreground_velocity = self.state.foreground_velocity;
            let motion = self.registry.motions.get_mut(entity);
            motion.velocity = foreground_velocity + direction * motion.velocity.abs();
            if to_player.x > 0.0 {
                motion.scale = Vec2::new(-motion.scale.x.abs(), motion.scale.y.abs());
            } else {
                motion.scale = Vec2::new(motion.scale.x.abs(), motion.scale.y.abs());
            }

            let motion = *self.registry.motions.get(entity);
            let mut bar_length = motion.scale.x - 20.0;
            if let Some(health) = self.registry.healths.try_get(entity) {
                let boss_kind = self.registry.bosses.try_get(entity).map(|b| b.kind);
                if self.state.forest_boss_alive && boss_kind == Some(BossKind::Forest) {
                    bar_length *= health.hp as f32 / 40.0;
                } else if self.state.desert_boss_alive && boss_kind == Some(BossKind::Desert) {
                    bar_length *= health.hp as f32 / 50.0;
                } else if self.state.ice_boss_alive && boss_kind == Some(BossKind::Ice) {
                    bar_length *= health.hp as f32 / 60.0;
                } else {
                    bar_length *= health.hp as f32 / 2.0;
                }
            }
            factory::create_line(
                &mut self.registry,
                Vec2::new(
                    motion.position.x,
                    motion.position.y - motion.scale.y * 0.5 - 10.0,
                ),
                Vec2::new(bar_length, 2.0),
            );
        }
    }

    /// Picks a spawn x half a screen to a random side of the player.
    fn random_flank_x(&mut self, player_x: f32) -> f32 {
        if self.rand() < 0.5 {
            player_x + WINDOW_WIDTH_PX / 2.0
        } else {
            player_x - WINDOW_WIDTH_PX / 2.0
        }
    }

    /// Timed enemy waves, then the level boss once the wave is cleared.
    /// Countdowns scale with the simulation speed knob.
    fn run_spawners(&mut self, elapsed_ms: f32) {
        let scaled = elapsed_ms * self.state.current_speed;
        let player_x = self.registry.motions.get(self.level.player).position.x;
        let player = self.level.player;
        let foreground_velocity = self.state.foreground_velocity;

        self.level.next_scorpion_spawn_ms -= scaled;
        if self.level.scorpion_spawn_enabled
            && self.state.scorpions_spawned < MAX_SCORPIONS
            && self.level.next_scorpion_spawn_ms < 0.0
        {
            self.level.next_scorpion_spawn_ms =
                SCORPION_DELAY_MS / 2.0 + self.rand() * (SCORPION_DELAY_MS / 2.0);
            let x = self.random_flank_x(player_x);
            factory::create_enemy(
                &mut self.registry,
                EnemyKind::Scorpion,
                Vec2::new(x, GROUND_POSITION_Y - SCORPION_BB.y / 3.0),
                foreground_velocity,
            );
            self.state.scorpions_spawned += 1;
        }

        self.level.next_spider_spawn_ms -= scaled;
        if self.level.spider_spawn_enabled
            && self.state.spiders_spawned < MAX_SPIDERS
            && self.level.next_spider_spawn_ms < 0.0
        {
            self.level.next_spider_spawn_ms =
                SCORPION_DELAY_MS / 2.0 + self.rand() * (SCORPION_DELAY_MS / 2.0);
            let x = self.random_flank_x(player_x);
            factory::create_enemy(
                &mut self.registry,
                EnemyKind::Spider,
                Vec2::new(x, GROUND_POSITION_Y - SCORPION_BB.y / 3.0),
                foreground_velocity,
            );
            self.state.spiders_spawned += 1;
        }

        if self.level.forest_boss_enabled
            && self.state.spiders_killed == MAX_SPIDERS
            && self.state.forest_boss_count < MAX_BOSSES_PER_LEVEL
        {
            self.level.next_forest_boss_spawn_ms -= scaled;
            if self.level.next_forest_boss_spawn_ms < 0.0 {
                let boss = factory::create_boss(
                    &mut self.registry,
                    BossKind::Forest,
                    Vec2::new(
                        player_x + WINDOW_WIDTH_PX / 2.0 + 100.0,
                        GROUND_POSITION_Y - FOREST_BOSS_BB.y / 2.0,
                    ),
                    foreground_velocity,
                );
                self.state.forest_boss = Some(boss);
                self.state.time_since_grenade_ms = 0.0;
                factory::create_grenade(&mut self.registry, boss, player);
                self.state.forest_boss_count += 1;
                self.state.forest_boss_alive = true;
                info!("forest boss spawned");
            }
        }

        self.level.next_snake_spawn_ms -= scaled;
        if self.level.snake_spawn_enabled
            && self.state.scorpions_killed == MAX_SCORPIONS
            && self.state.snakes_spawned < MAX_SNAKES
            && self.level.next_snake_spawn_ms < 0.0
        {
            self.level.next_snake_spawn_ms =
                SNAKE_DELAY_MS / 2.0 + self.rand() * (SNAKE_DELAY_MS / 2.0);
            factory::create_enemy(
                &mut self.registry,
                EnemyKind::Snake,
                Vec2::new(
                    player_x + WINDOW_WIDTH_PX / 2.0,
                    GROUND_POSITION_Y - SNAKE_BB.y / 3.0 + 10.0,
                ),
                foreground_velocity,
            );
            self.state.snakes_spawned += 1;
        }

        if self.level.desert_boss_enabled
            && self.state.snakes_killed == MAX_SNAKES
            && self.state.desert_boss_count < MAX_BOSSES_PER_LEVEL
        {
            self.level.next_desert_boss_spawn_ms -= scaled;
            if self.level.next_desert_boss_spawn_ms < 0.0 {
                self.state.time_since_dragon_switch_ms = 0.0;
                let boss = factory::create_boss(
                    &mut self.registry,
                    BossKind::Desert,
                    Vec2::new(
                        player_x + WINDOW_WIDTH_PX / 2.0 + 100.0,
                        GROUND_POSITION_Y - 250.0,
                    ),
                    foreground_velocity,
                );
                self.state.desert_boss = Some(boss);
                self.state.desert_boss_count += 1;
                self.state.desert_boss_alive = true;
                self.state.time_since_tornado_ms = 0.0;
                factory::create_tornado(&mut self.registry, boss, player);
                info!("desert boss spawned");
            }
        }

        self.level.next_ice_crawler_spawn_ms -= scaled;
        if self.level.ice_crawler_spawn_enabled
            && self.state.ice_crawlers_spawned < MAX_ICE_CRAWLERS
            && self.level.next_ice_crawler_spawn_ms < 0.0
        {
            self.level.next_ice_crawler_spawn_ms =
                ICE_CRAWLER_DELAY_MS / 2.0 + self.rand() * (ICE_CRAWLER_DELAY_MS / 2.0);
            let x = self.random_flank_x(player_x);
            factory::create_enemy(
                &mut self.registry,
                EnemyKind::IceCrawler,
                Vec2::new(x, GROUND_POSITION_Y - ICE_CRAWLER_BB.y / 3.0 - 5.0),
                foreground_velocity,
            );
            self.state.ice_crawlers_spawned += 1;
        }

        self.level.next_ice_brute_spawn_ms -= scaled;
        if self.level.ice_brute_spawn_enabled
            && self.state.ice_crawlers_killed == MAX_ICE_CRAWLERS
            && self.state.ice_brutes_spawned < MAX_ICE_BRUTES
            && self.level.next_ice_brute_spawn_ms < 0.0
        {
            self.level.next_ice_brute_spawn_ms =
                ICE_BRUTE_DELAY_MS / 2.0 + self.rand() * (ICE_BRUTE_DELAY_MS / 2.0);
            factory::create_enemy(
                &mut self.registry,
                EnemyKind::IceBrute,
                Vec2::new(
                    player_x + WINDOW_WIDTH_PX / 2.0,
                    GROUND_POSITION_Y - ICE_BRUTE_BB.y / 3.0,
                ),
                foreground_velocity,
            );
            self.state.ice_brutes_spawned += 1;
        }

        if self.level.ice_boss_enabled
            && self.state.ice_brutes_killed == MAX_ICE_BRUTES
            && self.state.ice_boss_count < MAX_BOSSES_PER_LEVEL
        {
            self.level.next_ice_boss_spawn_ms -= scaled;
            if self.level.next_ice_boss_spawn_ms < 0.0 {
                let boss = factory::create_boss(
                    &mut self.registry,
                    BossKind::Ice,
                    Vec2::new(
                        player_x + WINDOW_WIDTH_PX / 2.0 + 100.0,
                        GROUND_POSITION_Y - ICE_BOSS_BB.y / 2.0 + 20.0,
                    ),
                    foreground_velocity,
                );
                self.state.ice_boss = Some(boss);
                self.state.time_since_snowball_ms = 0.0;
                factory::create_snowball(&mut self.registry, boss, player);
                self.state.ice_boss_count += 1;
                self.state.ice_boss_alive = true;
                info!("ice boss spawned");
            }
        }
    }

    /// Tops the rock field back up to its quota, scattering rocks away from
    /// the level origin in both directions.
    fn spawn_rocks(&mut self) {
        use engine::GeometryId;

        let mut left_cursor = 0.0_f32;
        let mut right_cursor = WINDOW_WIDTH_PX;
        let foreground_velocity = self.state.foreground_velocity;
        let rocks_color = self.level.rocks_color;

        while self.state.num_rocks < MAX_ROCKS {
            let roll = self.rand();
            let x = if roll < 0.5 {
                left_cursor -= WINDOW_WIDTH_PX / 0.9 + self.rand() * (WINDOW_WIDTH_PX / 0.9);
                left_cursor
            } else {
                right_cursor += WINDOW_WIDTH_PX / 0.9 + self.rand() * (WINDOW_WIDTH_PX / 0.9);
                right_cursor
            };

            let (geometry, multiplier) = if roll < 0.2 {
                (GeometryId::Rock0, 50.0)
            } else if roll < 0.4 {
                (GeometryId::Rock1, 20.0)
            } else if roll < 0.6 {
                (GeometryId::Rock2, 1.0)
            } else if roll < 0.8 {
                (GeometryId::Rock3, 1.0)
            } else {
                (GeometryId::Rock4, 1.0)
            };

            factory::create_rock(
                &mut self.registry,
                &self.meshes,
                geometry,
                Vec2::new(x, GROUND_POSITION_Y),
                multiplier,
                foreground_velocity,
                rocks_color,
            );
            self.state.num_rocks += 1;
        }
    }

    fn draw_box_around(&mut self, position: Vec2, scale: Vec2) {
        let half = scale.abs() / 2.0;
        factory::create_line(
            &mut self.registry,
            Vec2::new(position.x - half.x, position.y),
            Vec2::new(5.0, scale.y),
        );
        factory::create_line(
            &mut self.registry,
            Vec2::new(position.x + half.x, position.y),
            Vec2::new(5.0, scale.y),
        );
        factory::create_line(
            &mut self.registry,
            Vec2::new(position.x, position.y - half.y),
            Vec2::new(scale.x, 5.0),
        );
        factory::create_line(
            &mut self.registry,
            Vec2::new(position.x, position.y + half.y),
            Vec2::new(scale.x, 5.0),
        );
    }

    fn draw_debug_boxes(&mut self) {
        let mut boxes: Vec<(Vec2, Vec2)> = Vec::new();
        for (entity, _) in self.registry.items.iter() {
            let motion = self.registry.motions.get(entity);
            boxes.push((motion.position, motion.scale));
        }
        for (entity, _) in self.registry.deadlys.iter() {
            let motion = self.registry.motions.get(entity);
            boxes.push((motion.position, motion.scale));
        }
        for (entity, _) in self.registry.obstacles.iter() {
            let motion = self.registry.motions.get(entity);
            boxes.push((motion.position, motion.scale));
        }
        let player_position = self.registry.motions.get(self.level.player).position;
        boxes.push((player_position, PLAYER_BB));

        for (position, scale) in boxes {
            self.draw_box_around(position, scale);
        }
    }

    /// Advances every death countdown. Returns true when an expiry ended the
    /// step early (the original frame is abandoned after any removal).
    fn tick_death_timers(&mut self, elapsed_ms: f32) -> bool {
        let player = self.level.player;
        let mut min_counter_ms = DEATH_FADE_MS;

        let dying = self.registry.death_timers.entities().to_vec();
        for entity in dying {
            let timer = self.registry.death_timers.get_mut(entity);
            timer.counter_ms -= elapsed_ms;
            let counter_ms = timer.counter_ms;

            let percent_dead = 1.0 - counter_ms / DEATH_FADE_MS;
            if let Some(color) = self.registry.colors.try_get_mut(entity) {
                *color = Color::new(1.0, 0.0, 0.0) * percent_dead
                    + Color::new(1.0, 1.0, 1.0) * (1.0 - percent_dead);
            }
            if counter_ms < min_counter_ms && self.registry.players.has(entity) {
                min_counter_ms = counter_ms;
            }

            if counter_ms < 0.0 {
                self.registry.death_timers.remove(entity);
                if self.registry.players.has(entity) {
                    self.registry
                        .screen_states
                        .get_mut(self.screen)
                        .darken_factor = 0.0;
                    self.state.fail_screen_pause_ms = FAIL_PAUSE_MS;
                    self.restart_game(LevelKind::Forest, true);
                    self.state.did_user_fail = true;
                } else if self.registry.enemies.has(entity) {
                    self.drop_loot(entity, player);
                    self.registry.remove_all(entity);
                } else {
                    self.registry.remove_all(entity);
                }
                return true;
            }
        }

        self.registry
            .screen_states
            .get_mut(self.screen)
            .darken_factor = 1.0 - min_counter_ms / DEATH_FADE_MS;
        false
    }

    /// Half the time a dead enemy drops something: a sword, a shield or a
    /// heart, tinted by the tier the player would move up to.
    fn drop_loot(&mut self, corpse: Entity, player: Entity) {
        let health = *self.registry.healths.get(player);
        let next_shield_color = (health.armor_level).clamp(0, MAX_ARMOR_LEVEL - 1) as usize;

        let Some(gun) = self.registry.first_gun() else {
            return;
        };
        let sword_count = (self.registry.guns.get(gun).damage / BULLET_DAMAGE).floor() as i32;
        let next_sword_color = sword_count.clamp(0, MAX_ARMOR_LEVEL - 1) as usize;

        let corpse_position = self.registry.motions.get(corpse).position;
        let choice = self.rand() * 3.0;
        let roll = self.rand() * 100.0;
        if roll > 50.0 {
            return;
        }

        if choice < 1.0 {
            if sword_count < MAX_ARMOR_LEVEL {
                factory::create_item(
                    &mut self.registry,
                    ItemKind::Sword,
                    corpse_position,
                    TIER_COLORS[next_sword_color],
                );
            } else {
                // Tier is maxed; the drop fizzles.
                let _ = self.rand();
            }
        } else if choice < 2.0 {
            if health.armor_level < MAX_ARMOR_LEVEL {
                factory::create_item(
                    &mut self.registry,
                    ItemKind::Shield,
                    corpse_position,
                    TIER_COLORS[next_shield_color],
                );
            } else {
                let _ = self.rand();
            }
        } else if health.hp < MAX_PLAYER_HP {
            factory::create_item(
                &mut self.registry,
                ItemKind::Heart,
                corpse_position,
                Color::new(1.0, 1.0, 1.0),
            );
        }
    }

    /// Tears the world down to the screen entity and rebuilds the requested
    /// level. `reset_stats` keeps or wipes the player's health and gun.
    pub fn restart_game(&mut self, kind: LevelKind, reset_stats: bool) {
        info!(level = ?kind, reset_stats, "restarting");
        self.state.current_speed = 1.0;

        let saved = if reset_stats {
            None
        } else {
            let health = *self.registry.healths.get(self.level.player);
            let gun = self.registry.first_gun().map(|g| *self.registry.guns.get(g));
            Some((health, gun))
        };

        while let Some(&entity) = self.registry.motions.entities().last() {
            self.registry.remove_all(entity);
        }

        self.level = level::create_level(&mut self.registry, kind);

        let state = &mut self.state;
        state.level_transition_timer_ms = 0.0;
        state.scorpions_killed = 0;
        state.snakes_killed = 0;
        state.spiders_killed = 0;
        state.ice_crawlers_killed = 0;
        state.ice_brutes_killed = 0;
        state.forest_bosses_killed = 0;
        state.desert_bosses_killed = 0;
        state.ice_bosses_killed = 0;
        state.forest_boss_count = 0;
        state.desert_boss_count = 0;
        state.ice_boss_count = 0;
        state.scorpions_spawned = 0;
        state.snakes_spawned = 0;
        state.spiders_spawned = 0;
        state.ice_crawlers_spawned = 0;
        state.ice_brutes_spawned = 0;
        state.num_rocks = 0;
        state.time_since_grenade_ms = 0.0;
        state.time_since_tornado_ms = 0.0;
        state.time_since_snowball_ms = 0.0;
        state.forest_boss_alive = false;
        state.desert_boss_alive = false;
        state.ice_boss_alive = false;
        state.forest_boss = None;
        state.desert_boss = None;
        state.ice_boss = None;

        factory::create_gun(&mut self.registry);

        if let Some((health, gun)) = saved {
            *self.registry.healths.get_mut(self.level.player) = health;
            if let (Some(gun_entity), Some(gun)) = (self.registry.first_gun(), gun) {
                *self.registry.guns.get_mut(gun_entity) = gun;
            }
        }
    }

    /// Keyboard handling. Movement is ignored while the player is dying;
    /// meta keys (restart, debug, speed) always work.
    pub fn on_key(&mut self, input: KeyInput, audio: &mut dyn AudioSink) {
        let player = self.level.player;
        let player_dying = self.registry.death_timers.has(player);

        if !player_dying {
            match (input.key, input.state) {
                (Key::Up, ButtonState::Pressed) => {
                    self.registry.motions.get_mut(player).velocity.y = JUMP_VELOCITY;
                    audio.play(SoundId::Jump);
                }
                (Key::Left, ButtonState::Pressed) => {
                    let motion = self.registry.motions.get_mut(player);
                    motion.scale.x = -motion.scale.x.abs();
                    motion.velocity.x = -WALK_SPEED;
                    self.set_scroll_velocity(-SCROLL_SPEED);
                    self.state.player_moving = true;
                }
                (Key::Right, ButtonState::Pressed) => {
                    let motion = self.registry.motions.get_mut(player);
                    motion.scale.x = motion.scale.x.abs();
                    motion.velocity.x = WALK_SPEED;
                    self.set_scroll_velocity(SCROLL_SPEED);
                    self.state.player_moving = true;
                }
                (Key::Left, ButtonState::Released) => {
                    if self.registry.motions.get(player).velocity.x < 0.0 {
                        self.registry.motions.get_mut(player).velocity.x = 0.0;
                        self.set_scroll_velocity(0.0);
                        self.state.player_moving = false;
                    }
                }
                (Key::Right, ButtonState::Released) => {
                    if self.registry.motions.get(player).velocity.x > 0.0 {
                        self.registry.motions.get_mut(player).velocity.x = 0.0;
                        self.set_scroll_velocity(0.0);
                        self.state.player_moving = false;
                    }
                }
                _ => {}
            }
        }

        match (input.key, input.state) {
            (Key::Space, ButtonState::Pressed) => {
                if self.state.bullet_cooldown_ms <= 0.0 {
                    factory::create_bullet(&mut self.registry);
                    self.state.bullet_cooldown_ms = BULLET_COOLDOWN_MS;
                    audio.play(SoundId::Attack);
                }
            }
            (Key::KeyR, ButtonState::Released) => {
                self.restart_game(LevelKind::Forest, true);
            }
            (Key::KeyD, ButtonState::Released) => {
                self.state.debug_mode = !self.state.debug_mode;
                debug!(debug_mode = self.state.debug_mode, "debug toggled");
            }
            (Key::KeyF, ButtonState::Pressed) => {
                self.state.display_fps = !self.state.display_fps;
            }
            (Key::KeyH, ButtonState::Pressed) => {
                self.state.show_help = !self.state.show_help;
            }
            (Key::Comma, ButtonState::Released) if input.shift => {
                self.state.current_speed -= 0.1;
            }
            (Key::Period, ButtonState::Released) if input.shift => {
                self.state.current_speed += 0.1;
            }
            _ => {}
        }
        self.state.current_speed = self.state.current_speed.max(0.0);
    }

    /// Backgrounds scroll at half the player's walk speed for parallax.
    fn set_scroll_velocity(&mut self, vx: f32) {
        for tile in self.level.backgrounds {
            self.registry.motions.get_mut(tile).velocity.x = vx;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{NullAudio, RecordingAudio};

    fn sim() -> WorldSim {
        WorldSim::new(7, LevelKind::Forest, MeshRegistry::builtin())
    }

    #[test]
    fn first_step_fills_the_rock_quota() {
        let mut world = sim();
        let mut audio = NullAudio;
        world.step(16.0, &mut audio);
        assert_eq!(world.state.num_rocks, MAX_ROCKS);
        assert_eq!(world.registry.obstacles.len() as u32, MAX_ROCKS);
    }

    #[test]
    fn spiders_spawn_in_the_forest_but_scorpions_do_not() {
        let mut world = sim();
        let mut audio = NullAudio;
        // Two short steps cross the initial 100 ms countdown.
        world.step(80.0, &mut audio);
        world.step(80.0, &mut audio);
        assert_eq!(world.state.spiders_spawned, 1);
        assert_eq!(world.state.scorpions_spawned, 0);
    }

    #[test]
    fn forest_boss_waits_for_the_full_spider_wave() {
        let mut world = sim();
        let mut audio = NullAudio;
        world.state.spiders_killed = MAX_SPIDERS - 1;
        for _ in 0..10 {
            world.step(100.0, &mut audio);
        }
        assert_eq!(world.state.forest_boss_count, 0);

        world.state.spiders_killed = MAX_SPIDERS;
        world.step(60.0, &mut audio);
        world.step(60.0, &mut audio);
        assert_eq!(world.state.forest_boss_count, 1);
        assert!(world.state.forest_boss_alive);
        // The boss opens with a grenade the moment it appears.
        assert_eq!(world.registry.grenades.len(), 1);
    }

    #[test]
    fn snakes_wait_for_all_scorpion_kills() {
        let mut world = WorldSim::new(3, LevelKind::Desert, MeshRegistry::builtin());
        let mut audio = NullAudio;
        world.level.next_snake_spawn_ms = -1.0;
        world.step(16.0, &mut audio);
        assert_eq!(world.state.snakes_spawned, 0);

        world.state.scorpions_killed = MAX_SCORPIONS;
        world.level.next_snake_spawn_ms = -1.0;
        world.step(16.0, &mut audio);
        assert_eq!(world.state.snakes_spawned, 1);
    }

    #[test]
    fn player_death_restarts_the_forest_with_fresh_stats() {
        let mut world = sim();
        let mut audio = RecordingAudio::default();
        let player = world.level.player;
        world.registry.healths.get_mut(player).hp = 9;
        world
            .registry
            .death_timers
            .emplace(player, DeathTimer::default());

        world.step(3100.0, &mut audio);

        assert!(world.state.did_user_fail);
        assert_eq!(world.level.kind, LevelKind::Forest);
        let new_player = world.level.player;
        assert_ne!(new_player, player);
        assert_eq!(world.registry.healths.get(new_player).hp, 3);
        assert!(world.registry.guns.len() == 1);
    }

    #[test]
    fn level_transition_carries_player_stats_over() {
        let mut world = sim();
        let mut audio = NullAudio;
        let player = world.level.player;
        world.registry.healths.get_mut(player).hp = 7;
        world.registry.healths.get_mut(player).armor_level = 3;
        let gun = world.registry.first_gun().unwrap();
        world.registry.guns.get_mut(gun).damage = 3.0;

        world.state.forest_bosses_killed = 1;
        world.state.level_transition_timer_ms = 50.0;
        world.step(60.0, &mut audio);

        assert_eq!(world.level.kind, LevelKind::Desert);
        let player = world.level.player;
        assert_eq!(world.registry.healths.get(player).hp, 7);
        assert_eq!(world.registry.healths.get(player).armor_level, 3);
        let gun = world.registry.first_gun().unwrap();
        assert_eq!(world.registry.guns.get(gun).damage, 3.0);
    }

    #[test]
    fn clearing_the_ice_boss_wins_the_run() {
        let mut world = WorldSim::new(5, LevelKind::Ice, MeshRegistry::builtin());
        let mut audio = RecordingAudio::default();
        world.state.ice_bosses_killed = 1;

        world.step(16.0, &mut audio);

        assert!(world.state.did_user_succeed);
        assert_eq!(world.level.kind, LevelKind::Forest);
        assert_eq!(audio.count(SoundId::Clapping), 1);
    }

    #[test]
    fn grounded_grenade_explodes() {
        let mut world = sim();
        let mut audio = RecordingAudio::default();
        let player = world.level.player;
        let boss = factory::create_boss(
            &mut world.registry,
            BossKind::Forest,
            Vec2::new(2000.0, 400.0),
            Vec2::ZERO,
        );
        let grenade = factory::create_grenade(&mut world.registry, boss, player);
        world.registry.motions.get_mut(grenade).position.y = GROUND_POSITION_Y;

        world.step(16.0, &mut audio);

        assert!(!world.registry.grenades.has(grenade));
        assert_eq!(world.registry.explosions.len(), 1);
        assert_eq!(audio.count(SoundId::Explosion), 1);
    }

    #[test]
    fn walk_animation_cycles_only_while_moving() {
        let mut world = sim();
        let mut audio = NullAudio;

        world.step(600.0, &mut audio);
        let idle = world
            .registry
            .render_requests
            .get(world.level.player)
            .texture;
        assert_eq!(idle, Some(PLAYER_WALK_FRAMES[3]));

        world.on_key(KeyInput::pressed(Key::Right), &mut audio);
        world.step(600.0, &mut audio);
        let walking = world
            .registry
            .render_requests
            .get(world.level.player)
            .texture;
        assert_eq!(walking, Some(PLAYER_WALK_FRAMES[1]));
    }

    #[test]
    fn shooting_respects_the_cooldown() {
        let mut world = sim();
        let mut audio = NullAudio;
        world.on_key(KeyInput::pressed(Key::Space), &mut audio);
        world.on_key(KeyInput::pressed(Key::Space), &mut audio);
        assert_eq!(world.registry.bullets.len(), 1);

        world.step(600.0, &mut audio);
        world.on_key(KeyInput::pressed(Key::Space), &mut audio);
        assert_eq!(world.registry.bullets.len(), 2);
    }

    #[test]
    fn speed_knob_never_goes_negative() {
        let mut world = sim();
        let mut audio = NullAudio;
        for _ in 0..20 {
            world.on_key(KeyInput::released(Key::Comma).with_shift(), &mut audio);
        }
        assert_eq!(world.state.current_speed, 0.0);
    }

    #[test]
    fn movement_is_ignored_while_dying() {
        let mut world = sim();
        let mut audio = NullAudio;
        let player = world.level.player;
        world
            .registry
            .death_timers
            .emplace(player, DeathTimer::default());

        world.on_key(KeyInput::pressed(Key::Right), &mut audio);
        assert_eq!(world.registry.motions.get(player).velocity.x, 0.0);
        assert!(!world.state.player_moving);
    }
}
