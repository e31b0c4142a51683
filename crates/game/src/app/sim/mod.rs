//! The entity-component simulation: stores and registry, entity factories,
//! motion and contact detection, per-level content, the world step, contact
//! resolution, and render frame assembly.

pub mod collision;
pub mod components;
pub mod ecs;
pub mod factory;
pub mod hud;
pub mod level;
pub mod physics;
pub mod world;

pub const WINDOW_WIDTH_PX: f32 = 1200.0;
pub const WINDOW_HEIGHT_PX: f32 = 800.0;

pub const PLATFORM_HEIGHT_PX: f32 = 150.0;
pub const PLATFORM_CENTER_Y: f32 = WINDOW_HEIGHT_PX - PLATFORM_HEIGHT_PX / 2.0;
pub const GROUND_POSITION_Y: f32 = WINDOW_HEIGHT_PX - PLATFORM_HEIGHT_PX;

pub const LEVEL_TRANSITION_TIME_MS: f32 = 3000.0;
