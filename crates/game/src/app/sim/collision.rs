use engine::{AudioSink, Color, SoundId};
use glam::Vec2;
use tracing::info;

use super::components::{BossKind, DamageTimer, DeathTimer, EnemyKind, ItemKind};
use super::ecs::Entity;
use super::factory::{self, BULLET_DAMAGE, MAX_ARMOR_LEVEL, PLAYER_BB};
use super::level::LevelKind;
use super::physics;
use super::world::WorldSim;
use super::{LEVEL_TRANSITION_TIME_MS, WINDOW_HEIGHT_PX, WINDOW_WIDTH_PX};

const HINT_TEXT_LIFETIME_MS: f32 = 20000.0;

/// Per-level contact damage, doubled up while that level's boss is on
/// screen.
fn contact_damage(sim: &WorldSim) -> i32 {
    match sim.level.kind {
        LevelKind::Forest => {
            if sim.state.forest_boss_alive {
                factory::FOREST_BOSS_CONTACT_DAMAGE
            } else {
                factory::SPIDER_CONTACT_DAMAGE
            }
        }
        LevelKind::Desert => {
            if sim.state.desert_boss_alive {
                factory::DESERT_BOSS_CONTACT_DAMAGE
            } else {
                factory::SCORPION_CONTACT_DAMAGE
            }
        }
        LevelKind::Ice => {
            if sim.state.ice_boss_alive {
                factory::ICE_BOSS_CONTACT_DAMAGE
            } else {
                factory::ICE_CRAWLER_CONTACT_DAMAGE
            }
        }
    }
}

/// Drains the contact log and applies every gameplay rule, then clears it.
/// Pairs are handled one at a time; a rule that consumes the pair returns
/// out of the handler so later rules never see a half-dead entity.
pub fn resolve(sim: &mut WorldSim, audio: &mut dyn AudioSink) {
    let pairs = sim.registry.collisions.pairs().to_vec();
    for (entity, other) in pairs {
        handle_pair(sim, audio, entity, other);
    }
    sim.registry.collisions.clear();
}

fn handle_pair(sim: &mut WorldSim, audio: &mut dyn AudioSink, entity: Entity, other: Entity) {
    let registry = &sim.registry;

    if registry.grenades.has(entity)
        && (registry.players.has(other) || registry.obstacles.has(other))
    {
        let damage = registry.grenades.get(entity).damage;
        projectile_hits(sim, audio, entity, other, damage, true);
        return;
    }

    if registry.snowballs.has(entity)
        && (registry.players.has(other) || registry.obstacles.has(other))
    {
        let damage = registry.snowballs.get(entity).damage;
        projectile_hits(sim, audio, entity, other, damage, false);
        return;
    }

    if registry.tornados.has(entity)
        && (registry.players.has(other) || registry.obstacles.has(other))
    {
        let damage = registry.tornados.get(entity).damage;
        projectile_hits(sim, audio, entity, other, damage, false);
        return;
    }

    if registry.obstacles.has(other) && registry.enemies.has(entity) {
        enemy_hits_rock(sim, entity, other);
        return;
    }

    if registry.obstacles.has(other) {
        if let Some(boss) = registry.bosses.try_get(entity) {
            // The forest and ice bosses plow straight through rocks. The
            // dragon flies over them, so it never needs to.
            if matches!(boss.kind, BossKind::Forest | BossKind::Ice) {
                sim.registry.remove_all(other);
            }
            return;
        }
    }

    if registry.bullets.has(entity) && registry.obstacles.has(other) {
        sim.registry.remove_all(entity);
        return;
    }

    if registry.bullets.has(entity) && registry.deadlys.has(other) {
        bullet_hits_deadly(sim, audio, entity, other);
        return;
    }

    if registry.players.has(entity) {
        if registry.items.has(other) {
            player_picks_up_item(sim, entity, other);
        } else if registry.deadlys.has(other) {
            player_touches_deadly(sim, audio, entity, other);
        } else if registry.obstacles.has(other) {
            player_pushes_against_rock(sim, entity, other);
        }
    }
}

/// Lethal-hit bookkeeping shared by every way the player can die.
fn kill_player(sim: &mut WorldSim, audio: &mut dyn AudioSink, player: Entity) {
    audio.play(SoundId::GameOver);
    sim.registry
        .death_timers
        .emplace(player, DeathTimer::default());
    sim.registry
        .colors
        .upsert(player, Color::new(1.0, 1.0, 1.0));
    // The world freezes horizontally while the death fade runs.
    for motion in sim.registry.motions.components_mut() {
        motion.velocity.x = 0.0;
    }
}

/// A boss projectile bursting against the player or a rock. Grenades leave
/// an explosion behind; snowballs and tornadoes just vanish.
fn projectile_hits(
    sim: &mut WorldSim,
    audio: &mut dyn AudioSink,
    projectile: Entity,
    target: Entity,
    damage: f32,
    explodes: bool,
) {
    let position = sim.registry.motions.get(projectile).position;

    if !sim.registry.death_timers.has(target) && sim.registry.players.has(target) {
        let health = sim.registry.healths.get_mut(target);
        health.hp -= damage as i32 / health.armor_level;
        if health.hp <= 0 {
            kill_player(sim, audio, target);
        }
    }

    if explodes {
        sim.state.time_since_explosion_switch_ms = 0.0;
        audio.play(SoundId::Explosion);
        factory::create_explosion(&mut sim.registry, position);
    }
    sim.registry.remove_all(projectile);
}

/// Walking enemies are flushed out of the rock they ran into, and bounce
/// off it unless they are mid-chase.
fn enemy_hits_rock(sim: &mut WorldSim, enemy: Entity, rock: Entity) {
    if sim.registry.death_timers.has(enemy) {
        return;
    }

    let rock_motion = *sim.registry.motions.get(rock);
    let motion = sim.registry.motions.get_mut(enemy);
    let clearance = rock_motion.scale.x.abs() / 2.0 + motion.scale.x.abs() / 2.0;
    if motion.position.x < rock_motion.position.x {
        motion.position.x = rock_motion.position.x - clearance;
    } else {
        motion.position.x = rock_motion.position.x + clearance;
    }

    if !sim.registry.deadlys.get(enemy).following_player {
        let motion = sim.registry.motions.get_mut(enemy);
        motion.velocity.x = -motion.velocity.x;
        if motion.velocity.x > 0.0 {
            motion.scale.x = -motion.scale.x.abs();
        } else {
            motion.scale.x = motion.scale.x.abs();
        }
    }
}

/// One bullet, one target. Bosses and enemies soak damage until their hit
/// points run out; a non-lethal hit consumes the pair with no other effect.
fn bullet_hits_deadly(
    sim: &mut WorldSim,
    audio: &mut dyn AudioSink,
    bullet: Entity,
    target: Entity,
) {
    if sim.registry.death_timers.has(target) {
        return;
    }
    sim.registry.remove_all(bullet);

    let Some(gun) = sim.registry.first_gun() else {
        return;
    };
    let damage = sim.registry.guns.get(gun).damage as i32;

    if let Some(kind) = sim.registry.bosses.try_get(target).map(|b| b.kind) {
        match kind {
            BossKind::Forest if sim.state.forest_boss_alive => {
                let health = sim.registry.healths.get_mut(target);
                health.hp -= damage;
                if health.hp > 0 {
                    return;
                }
                sim.state.forest_bosses_killed += 1;
                sim.state.forest_boss_alive = false;
                info!("forest boss down");
                if sim.level.forest_boss_enabled {
                    audio.play(SoundId::Win);
                    sim.state.level_transition_timer_ms = LEVEL_TRANSITION_TIME_MS;
                }
            }
            BossKind::Desert if sim.state.desert_boss_alive => {
                let health = sim.registry.healths.get_mut(target);
                health.hp -= damage;
                if health.hp > 0 {
                    return;
                }
                sim.state.desert_bosses_killed += 1;
                sim.state.desert_boss_alive = false;
                info!("desert boss down");
                if sim.level.desert_boss_enabled {
                    audio.play(SoundId::Win);
                    sim.state.level_transition_timer_ms = LEVEL_TRANSITION_TIME_MS;
                }
            }
            BossKind::Ice if sim.state.ice_boss_alive => {
                let health = sim.registry.healths.get_mut(target);
                health.hp -= damage;
                if health.hp > 0 {
                    return;
                }
                sim.state.ice_bosses_killed += 1;
                sim.state.ice_boss_alive = false;
                info!("ice boss down");
                // The run ends here; the win check in the world step picks
                // this up instead of a level transition.
            }
            _ => {}
        }
    }

    if let Some(kind) = sim.registry.enemies.try_get(target).map(|e| e.kind) {
        let health = sim.registry.healths.get_mut(target);
        health.hp -= damage;
        if health.hp > 0 {
            return;
        }
        match kind {
            EnemyKind::Scorpion => sim.state.scorpions_killed += 1,
            EnemyKind::Snake => sim.state.snakes_killed += 1,
            EnemyKind::Spider => {
                sim.state.spiders_killed += 1;
                if sim.state.spiders_killed == 1 && sim.level.kind == LevelKind::Forest {
                    swap_in_hint_texts(sim);
                }
            }
            EnemyKind::IceCrawler => sim.state.ice_crawlers_killed += 1,
            EnemyKind::IceBrute => sim.state.ice_brutes_killed += 1,
        }
    }

    if !sim.registry.death_timers.has(target) {
        sim.registry
            .death_timers
            .emplace(target, DeathTimer::default());
        sim.registry.motions.get_mut(target).velocity = sim.state.foreground_velocity;
        sim.registry
            .colors
            .upsert(target, Color::new(1.0, 1.0, 1.0));
        sim.registry.deadlys.remove(target);
    }
}

/// After the first kill the tutorial text makes way for gameplay hints,
/// which fade out on their own death timers.
fn swap_in_hint_texts(sim: &mut WorldSim) {
    if let Some(old) = sim.level.help_texts.take() {
        for entity in old {
            sim.registry.remove_all(entity);
        }
    }

    let hints = [
        "Dead enemies can drop damage boosts, armour, and hearts                ",
        "           Kill the enemies and bosses of all 3 levels to win          ",
        "                                           Press H for Help. Good Luck!",
    ];
    let mut created = [sim.level.player; 3];
    for (i, text) in hints.iter().enumerate() {
        let entity = factory::create_help_text(
            &mut sim.registry,
            text,
            Vec2::new(
                WINDOW_WIDTH_PX / 90.0,
                WINDOW_HEIGHT_PX * (i + 1) as f32 / 10.0,
            ),
            Vec2::ZERO,
        );
        sim.registry.death_timers.emplace(
            entity,
            DeathTimer {
                counter_ms: HINT_TEXT_LIFETIME_MS,
            },
        );
        created[i] = entity;
    }
    sim.level.help_texts = Some(created);
}

fn player_picks_up_item(sim: &mut WorldSim, player: Entity, item: Entity) {
    match sim.registry.items.get(item).kind {
        ItemKind::Sword => {
            if let Some(gun) = sim.registry.first_gun() {
                sim.registry.guns.get_mut(gun).damage += BULLET_DAMAGE;
            }
        }
        ItemKind::Shield => {
            let health = sim.registry.healths.get_mut(player);
            if health.armor_level < MAX_ARMOR_LEVEL {
                health.armor_level += 1;
            }
        }
        ItemKind::Heart => {
            // Round down to a whole heart, then add one.
            let health = sim.registry.healths.get_mut(player);
            health.hp -= (health.hp + factory::PLAYER_HP) % factory::PLAYER_HP;
            health.hp += factory::PLAYER_HP;
        }
    }
    sim.registry.remove_all(item);
}

/// Contact damage, re-checked against the precise bounding boxes because
/// the broad sweep also reports grazing contacts.
fn player_touches_deadly(
    sim: &mut WorldSim,
    audio: &mut dyn AudioSink,
    player: Entity,
    deadly: Entity,
) {
    let player_motion = *sim.registry.motions.get(player);
    let other_motion = *sim.registry.motions.get(deadly);
    if !physics::collides(&player_motion, &other_motion) {
        return;
    }

    if sim.registry.death_timers.has(player) || sim.registry.damage_timers.has(player) {
        return;
    }

    let damage = contact_damage(sim);
    let health = sim.registry.healths.get_mut(player);
    health.hp -= damage / health.armor_level;
    let lethal = health.hp <= 0;

    // Grace period so one brush with an enemy is one hit.
    sim.registry
        .damage_timers
        .emplace(player, DamageTimer::default());

    if lethal {
        kill_player(sim, audio, player);
    }
}

/// Rocks are solid: the player is pushed back out and the scroll stops.
/// Standing on top instead nudges the player upward and raises their rest
/// height, which is how rock-climbing works.
fn player_pushes_against_rock(sim: &mut WorldSim, player: Entity, rock: Entity) {
    let rock_motion = *sim.registry.motions.get(rock);
    let player_motion = *sim.registry.motions.get(player);
    let left = player_motion.position.x - PLAYER_BB.x / 2.0;
    let right = player_motion.position.x + PLAYER_BB.x / 2.0;
    let top = player_motion.position.y - PLAYER_BB.y / 2.0;
    let bottom = player_motion.position.y + PLAYER_BB.y / 2.0;

    let Some(mesh_ref) = sim.registry.mesh_refs.try_get(rock) else {
        return;
    };
    let mesh = sim.meshes.mesh(mesh_ref.0);
    let touching = mesh.vertices.iter().any(|vertex| {
        let v = *vertex * rock_motion.scale + rock_motion.position;
        v.x < right && v.x > left && v.y < bottom && v.y > top
    });
    if !touching {
        return;
    }

    sim.registry.motions.get_mut(player).velocity.x = 0.0;
    for tile in sim.level.backgrounds {
        sim.registry.motions.get_mut(tile).velocity.x = 0.0;
    }
    sim.state.player_moving = false;

    let rock_left = rock_motion.position.x - rock_motion.scale.x.abs() / 2.0;
    let rock_right = rock_motion.position.x + rock_motion.scale.x.abs() / 2.0;
    let clearance = rock_motion.scale.x.abs() / 2.0 + player_motion.scale.x.abs() / 2.0;

    if player_motion.position.x < rock_left {
        // Shunt the whole world right a step, then pin the player flush
        // against the rock and drag the parallax layers after them.
        for motion in sim.registry.motions.components_mut() {
            motion.position.x += 1.0;
        }
        let old_x = sim.registry.motions.get(player).position.x;
        let new_x = rock_motion.position.x - clearance;
        sim.registry.motions.get_mut(player).position.x = new_x;
        for tile in sim.level.backgrounds {
            sim.registry.motions.get_mut(tile).position.x += (new_x - old_x) / 2.0;
        }
    } else if player_motion.position.x < rock_right {
        let motion = sim.registry.motions.get_mut(player);
        motion.position.y -= 1.0;
        sim.state.protagonist_rest_y = motion.position.y;
    } else {
        for motion in sim.registry.motions.components_mut() {
            motion.position.x -= 1.0;
        }
        let old_x = sim.registry.motions.get(player).position.x;
        let new_x = rock_motion.position.x + clearance;
        sim.registry.motions.get_mut(player).position.x = new_x;
        for tile in sim.level.backgrounds {
            sim.registry.motions.get_mut(tile).position.x += (new_x - old_x) / 2.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::sim::factory::{
        create_boss, create_bullet, create_enemy, create_item, FOREST_BOSS_HP, SCORPION_HP,
    };
    use crate::app::sim::level::LevelKind;
    use crate::app::sim::world::WorldSim;
    use crate::app::sim::GROUND_POSITION_Y;
    use engine::{MeshRegistry, NullAudio, RecordingAudio};

    fn sim(kind: LevelKind) -> WorldSim {
        WorldSim::new(11, kind, MeshRegistry::builtin())
    }

    fn fire_bullet_at(world: &mut WorldSim, target: Entity, audio: &mut dyn AudioSink) {
        let bullet = create_bullet(&mut world.registry).unwrap();
        world.registry.collisions.push(bullet, target);
        resolve(world, audio);
    }

    #[test]
    fn armor_division_rounds_damage_down_to_zero() {
        let mut world = sim(LevelKind::Forest);
        let mut audio = NullAudio;
        let player = world.level.player;
        world.registry.healths.get_mut(player).armor_level = 3;

        let boss = create_boss(
            &mut world.registry,
            BossKind::Forest,
            Vec2::new(3000.0, 400.0),
            Vec2::ZERO,
        );
        // Grenade damage 2 against armor 3 truncates to nothing.
        let grenade = factory::create_grenade(&mut world.registry, boss, player);
        world.registry.collisions.push(grenade, player);
        resolve(&mut world, &mut audio);

        assert_eq!(world.registry.healths.get(player).hp, factory::PLAYER_HP);
        assert!(!world.registry.grenades.has(grenade));
        assert_eq!(world.registry.explosions.len(), 1);
    }

    #[test]
    fn scorpion_falls_on_the_sixth_bullet() {
        let mut world = sim(LevelKind::Desert);
        let mut audio = NullAudio;
        let scorpion = create_enemy(
            &mut world.registry,
            EnemyKind::Scorpion,
            Vec2::new(3000.0, 500.0),
            Vec2::ZERO,
        );

        for _ in 0..SCORPION_HP - 1 {
            fire_bullet_at(&mut world, scorpion, &mut audio);
        }
        assert_eq!(world.state.scorpions_killed, 0);
        assert!(!world.registry.death_timers.has(scorpion));

        fire_bullet_at(&mut world, scorpion, &mut audio);
        assert_eq!(world.state.scorpions_killed, 1);
        assert!(world.registry.death_timers.has(scorpion));
        assert!(!world.registry.deadlys.has(scorpion));
        // Every bullet was consumed on impact.
        assert!(world.registry.bullets.is_empty());
    }

    #[test]
    fn dying_enemies_ignore_further_bullets() {
        let mut world = sim(LevelKind::Desert);
        let mut audio = NullAudio;
        let scorpion = create_enemy(
            &mut world.registry,
            EnemyKind::Scorpion,
            Vec2::new(3000.0, 500.0),
            Vec2::ZERO,
        );
        world
            .registry
            .death_timers
            .emplace(scorpion, DeathTimer::default());

        let bullet = create_bullet(&mut world.registry).unwrap();
        world.registry.collisions.push(bullet, scorpion);
        resolve(&mut world, &mut audio);

        // The bullet flies on; the corpse soaked nothing.
        assert!(world.registry.bullets.has(bullet));
        assert_eq!(world.registry.healths.get(scorpion).hp, SCORPION_HP);
    }

    #[test]
    fn forest_boss_kill_arms_the_level_transition() {
        let mut world = sim(LevelKind::Forest);
        let mut audio = RecordingAudio::default();
        let boss = create_boss(
            &mut world.registry,
            BossKind::Forest,
            Vec2::new(3000.0, 400.0),
            Vec2::ZERO,
        );
        world.state.forest_boss = Some(boss);
        world.state.forest_boss_alive = true;

        for _ in 0..FOREST_BOSS_HP {
            fire_bullet_at(&mut world, boss, &mut audio);
        }

        assert_eq!(world.state.forest_bosses_killed, 1);
        assert!(!world.state.forest_boss_alive);
        assert_eq!(
            world.state.level_transition_timer_ms,
            LEVEL_TRANSITION_TIME_MS
        );
        assert_eq!(audio.count(SoundId::Win), 1);
        assert!(world.registry.death_timers.has(boss));
    }

    #[test]
    fn first_spider_kill_swaps_the_tutorial_for_hints() {
        let mut world = sim(LevelKind::Forest);
        let mut audio = NullAudio;
        let old = world.level.help_texts.unwrap();
        let spider = create_enemy(
            &mut world.registry,
            EnemyKind::Spider,
            Vec2::new(3000.0, 500.0),
            Vec2::ZERO,
        );

        for _ in 0..3 {
            fire_bullet_at(&mut world, spider, &mut audio);
        }

        assert_eq!(world.state.spiders_killed, 1);
        for entity in old {
            assert!(!world.registry.help_texts.has(entity));
        }
        let hints = world.level.help_texts.unwrap();
        for entity in hints {
            assert!(world.registry.help_texts.has(entity));
            assert!(world.registry.death_timers.has(entity));
        }
    }

    #[test]
    fn sword_pickup_raises_gun_damage() {
        let mut world = sim(LevelKind::Forest);
        let mut audio = NullAudio;
        let player = world.level.player;
        let sword = create_item(
            &mut world.registry,
            ItemKind::Sword,
            Vec2::new(600.0, 500.0),
            Color::new(1.0, 1.0, 1.0),
        );

        world.registry.collisions.push(player, sword);
        resolve(&mut world, &mut audio);

        let gun = world.registry.first_gun().unwrap();
        assert_eq!(world.registry.guns.get(gun).damage, 2.0 * BULLET_DAMAGE);
        assert!(!world.registry.items.has(sword));
    }

    #[test]
    fn shield_pickup_caps_at_max_armor() {
        let mut world = sim(LevelKind::Forest);
        let mut audio = NullAudio;
        let player = world.level.player;
        world.registry.healths.get_mut(player).armor_level = MAX_ARMOR_LEVEL;
        let shield = create_item(
            &mut world.registry,
            ItemKind::Shield,
            Vec2::new(600.0, 500.0),
            Color::new(1.0, 1.0, 1.0),
        );

        world.registry.collisions.push(player, shield);
        resolve(&mut world, &mut audio);

        assert_eq!(
            world.registry.healths.get(player).armor_level,
            MAX_ARMOR_LEVEL
        );
    }

    #[test]
    fn heart_pickup_rounds_up_to_the_next_full_heart() {
        let mut world = sim(LevelKind::Forest);
        let mut audio = NullAudio;
        let player = world.level.player;
        world.registry.healths.get_mut(player).hp = 7;
        let heart = create_item(
            &mut world.registry,
            ItemKind::Heart,
            Vec2::new(600.0, 500.0),
            Color::new(1.0, 1.0, 1.0),
        );

        world.registry.collisions.push(player, heart);
        resolve(&mut world, &mut audio);

        assert_eq!(world.registry.healths.get(player).hp, 9);
    }

    #[test]
    fn contact_damage_respects_the_grace_period() {
        let mut world = sim(LevelKind::Forest);
        let mut audio = RecordingAudio::default();
        let player = world.level.player;
        world.registry.healths.get_mut(player).hp = 9;
        let player_position = world.registry.motions.get(player).position;
        let spider = create_enemy(
            &mut world.registry,
            EnemyKind::Spider,
            player_position,
            Vec2::ZERO,
        );

        world.registry.collisions.push(player, spider);
        resolve(&mut world, &mut audio);
        assert_eq!(world.registry.healths.get(player).hp, 5);
        assert!(world.registry.damage_timers.has(player));

        // A second brush in the same grace period costs nothing.
        world.registry.collisions.push(player, spider);
        resolve(&mut world, &mut audio);
        assert_eq!(world.registry.healths.get(player).hp, 5);
    }

    #[test]
    fn lethal_contact_freezes_the_world() {
        let mut world = sim(LevelKind::Forest);
        let mut audio = RecordingAudio::default();
        let player = world.level.player;
        let player_position = world.registry.motions.get(player).position;
        let spider = create_enemy(
            &mut world.registry,
            EnemyKind::Spider,
            player_position,
            Vec2::ZERO,
        );
        world.registry.motions.get_mut(spider).velocity = Vec2::new(-150.0, 0.0);

        world.registry.collisions.push(player, spider);
        resolve(&mut world, &mut audio);

        assert!(world.registry.death_timers.has(player));
        assert_eq!(audio.count(SoundId::GameOver), 1);
        for motion in world.registry.motions.components() {
            assert_eq!(motion.velocity.x, 0.0);
        }
    }

    #[test]
    fn forest_boss_destroys_rocks_but_the_dragon_does_not() {
        let mut world = sim(LevelKind::Forest);
        let mut audio = NullAudio;
        world.step(16.0, &mut audio);
        let rock = *world.registry.obstacles.entities().first().unwrap();

        let dragon = create_boss(
            &mut world.registry,
            BossKind::Desert,
            Vec2::new(3000.0, 400.0),
            Vec2::ZERO,
        );
        world.registry.collisions.push(dragon, rock);
        resolve(&mut world, &mut audio);
        assert!(world.registry.obstacles.has(rock));

        let boss = create_boss(
            &mut world.registry,
            BossKind::Forest,
            Vec2::new(3000.0, 400.0),
            Vec2::ZERO,
        );
        world.registry.collisions.push(boss, rock);
        resolve(&mut world, &mut audio);
        assert!(!world.registry.obstacles.has(rock));
    }

    #[test]
    fn bullets_shatter_on_rocks() {
        let mut world = sim(LevelKind::Forest);
        let mut audio = NullAudio;
        world.step(16.0, &mut audio);
        let rock = *world.registry.obstacles.entities().first().unwrap();

        let bullet = create_bullet(&mut world.registry).unwrap();
        world.registry.collisions.push(bullet, rock);
        resolve(&mut world, &mut audio);

        assert!(!world.registry.bullets.has(bullet));
        assert!(world.registry.obstacles.has(rock));
    }

    #[test]
    fn patrolling_enemy_bounces_off_a_rock() {
        let mut world = sim(LevelKind::Desert);
        let mut audio = NullAudio;
        world.step(16.0, &mut audio);
        let rock = *world.registry.obstacles.entities().first().unwrap();
        let rock_x = world.registry.motions.get(rock).position.x;

        let scorpion = create_enemy(
            &mut world.registry,
            EnemyKind::Scorpion,
            Vec2::new(rock_x - 10.0, GROUND_POSITION_Y - 50.0),
            Vec2::ZERO,
        );
        world.registry.motions.get_mut(scorpion).velocity = Vec2::new(150.0, 0.0);
        world.registry.deadlys.get_mut(scorpion).following_player = false;

        world.registry.collisions.push(scorpion, rock);
        resolve(&mut world, &mut audio);

        let motion = world.registry.motions.get(scorpion);
        // Flushed out to the left of the rock, now walking away from it.
        assert!(motion.position.x < rock_x);
        assert_eq!(motion.velocity.x, -150.0);
        assert!(motion.scale.x > 0.0);
    }
}
