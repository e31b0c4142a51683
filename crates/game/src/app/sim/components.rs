use engine::{Color, GeometryId, RenderRequest};
use glam::Vec2;

use super::ecs::{CollisionLog, ComponentStore, Entity, EntityIdAllocator};

/// Position, orientation and velocity of anything placed in the world.
/// `scale` doubles as the axis-aligned bounding box; a negative component
/// mirrors the sprite along that axis.
#[derive(Debug, Clone, Copy)]
pub struct Motion {
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub scale: Vec2,
}

impl Default for Motion {
    fn default() -> Self {
        Motion {
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            scale: Vec2::new(10.0, 10.0),
        }
    }
}

impl Motion {
    /// Componentwise sign of the scale, used as a facing vector.
    pub fn direction(&self) -> Vec2 {
        self.scale.signum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Player;

#[derive(Debug, Clone, Copy, Default)]
pub struct Obstacle;

#[derive(Debug, Clone, Copy, Default)]
pub struct Bullet;

/// Hit points plus the armor tier that divides incoming damage.
#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub hp: i32,
    pub armor_level: i32,
}

impl Default for Health {
    fn default() -> Self {
        Health {
            hp: 0,
            armor_level: 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Gun {
    pub damage: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Grenade {
    pub damage: f32,
    /// Downward acceleration applied each physics step, px/s^2.
    pub delta_vy: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Snowball {
    pub damage: f32,
    pub delta_vy: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Tornado {
    pub damage: f32,
    pub frame_switch_ms: f32,
    pub ms_since_switch: f32,
    pub frame: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Explosion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyKind {
    Scorpion,
    Snake,
    Spider,
    IceCrawler,
    IceBrute,
}

#[derive(Debug, Clone, Copy)]
pub struct Enemy {
    pub kind: EnemyKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossKind {
    Forest,
    Desert,
    Ice,
}

#[derive(Debug, Clone, Copy)]
pub struct Boss {
    pub kind: BossKind,
}

/// Anything that hurts the player on contact. `following_player` is cleared
/// while an obstacle stands between the enemy and the player.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadly {
    pub following_player: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Sword,
    Shield,
    Heart,
}

#[derive(Debug, Clone, Copy)]
pub struct Item {
    pub kind: ItemKind,
}

#[derive(Debug, Clone)]
pub struct HelpText {
    pub text: String,
}

/// Tag for per-frame debug geometry; cleared at the start of every step.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugShape;

/// Countdown to removal after a lethal hit. The holder is frozen by the
/// physics pass and fades to red while the counter runs.
#[derive(Debug, Clone, Copy)]
pub struct DeathTimer {
    pub counter_ms: f32,
}

impl Default for DeathTimer {
    fn default() -> Self {
        DeathTimer { counter_ms: 3000.0 }
    }
}

/// Invulnerability window after taking contact damage.
#[derive(Debug, Clone, Copy)]
pub struct DamageTimer {
    pub counter_ms: f32,
}

impl Default for DamageTimer {
    fn default() -> Self {
        DamageTimer { counter_ms: 4000.0 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LightUp {
    pub counter_ms: f32,
}

impl Default for LightUp {
    fn default() -> Self {
        LightUp { counter_ms: 1000.0 }
    }
}

/// Full-screen fade driven by death and level transitions. Negative means
/// no fade is active.
#[derive(Debug, Clone, Copy)]
pub struct ScreenState {
    pub darken_factor: f32,
}

impl Default for ScreenState {
    fn default() -> Self {
        ScreenState {
            darken_factor: -1.0,
        }
    }
}

/// Geometry used for vertex-accurate checks against mesh-shaped entities.
#[derive(Debug, Clone, Copy)]
pub struct MeshRef(pub GeometryId);

/// Every component store in the simulation, one field per component type.
///
/// Stores are plain public fields so systems can split-borrow them; there is
/// no runtime type registry.
#[derive(Default)]
pub struct Registry {
    pub motions: ComponentStore<Motion>,
    pub players: ComponentStore<Player>,
    pub healths: ComponentStore<Health>,
    pub guns: ComponentStore<Gun>,
    pub bullets: ComponentStore<Bullet>,
    pub grenades: ComponentStore<Grenade>,
    pub snowballs: ComponentStore<Snowball>,
    pub tornados: ComponentStore<Tornado>,
    pub explosions: ComponentStore<Explosion>,
    pub enemies: ComponentStore<Enemy>,
    pub bosses: ComponentStore<Boss>,
    pub deadlys: ComponentStore<Deadly>,
    pub items: ComponentStore<Item>,
    pub obstacles: ComponentStore<Obstacle>,
    pub help_texts: ComponentStore<HelpText>,
    pub debug_shapes: ComponentStore<DebugShape>,
    pub death_timers: ComponentStore<DeathTimer>,
    pub damage_timers: ComponentStore<DamageTimer>,
    pub light_ups: ComponentStore<LightUp>,
    pub colors: ComponentStore<Color>,
    pub render_requests: ComponentStore<RenderRequest>,
    pub mesh_refs: ComponentStore<MeshRef>,
    pub screen_states: ComponentStore<ScreenState>,
    pub collisions: CollisionLog,
    allocator: EntityIdAllocator,
}

impl Registry {
    pub fn spawn(&mut self) -> Entity {
        self.allocator.allocate()
    }

    /// Strips the entity from every store. Safe to call on half-built or
    /// already-removed entities.
    pub fn remove_all(&mut self, entity: Entity) {
        self.motions.remove(entity);
        self.players.remove(entity);
        self.healths.remove(entity);
        self.guns.remove(entity);
        self.bullets.remove(entity);
        self.grenades.remove(entity);
        self.snowballs.remove(entity);
        self.tornados.remove(entity);
        self.explosions.remove(entity);
        self.enemies.remove(entity);
        self.bosses.remove(entity);
        self.deadlys.remove(entity);
        self.items.remove(entity);
        self.obstacles.remove(entity);
        self.help_texts.remove(entity);
        self.debug_shapes.remove(entity);
        self.death_timers.remove(entity);
        self.damage_timers.remove(entity);
        self.light_ups.remove(entity);
        self.colors.remove(entity);
        self.render_requests.remove(entity);
        self.mesh_refs.remove(entity);
        self.screen_states.remove(entity);
    }

    pub fn first_player(&self) -> Option<Entity> {
        self.players.entities().first().copied()
    }

    pub fn first_gun(&self) -> Option<Entity> {
        self.guns.entities().first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_all_clears_every_store() {
        let mut registry = Registry::default();
        let entity = registry.spawn();
        registry.motions.emplace(entity, Motion::default());
        registry.players.emplace(entity, Player);
        registry.healths.emplace(
            entity,
            Health {
                hp: 3,
                armor_level: 1,
            },
        );
        registry.colors.emplace(entity, Color::new(1.0, 0.8, 0.8));

        registry.remove_all(entity);

        assert!(!registry.motions.has(entity));
        assert!(!registry.players.has(entity));
        assert!(!registry.healths.has(entity));
        assert!(!registry.colors.has(entity));
    }

    #[test]
    fn spawned_entities_are_distinct() {
        let mut registry = Registry::default();
        let a = registry.spawn();
        let b = registry.spawn();
        assert_ne!(a, b);
    }
}
