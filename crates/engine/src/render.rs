use glam::{Vec2, Vec3};

use crate::assets::{EffectId, GeometryId, TextureId};
use crate::entity::EntityId;

pub type Color = Vec3;

/// Per-entity render payload. `texture` is `None` for untextured geometry
/// (rocks, debug lines) drawn with the `Colored` effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequest {
    pub texture: Option<TextureId>,
    pub effect: EffectId,
    pub geometry: GeometryId,
}

/// One draw submission, fully resolved to world placement and tint.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall {
    pub entity: Option<EntityId>,
    pub texture: Option<TextureId>,
    pub effect: EffectId,
    pub geometry: GeometryId,
    pub position: Vec2,
    pub scale: Vec2,
    pub angle: f32,
    pub color: Option<Color>,
}

/// A string drawn by the text path rather than a textured quad.
#[derive(Debug, Clone)]
pub struct TextDraw {
    pub text: String,
    pub position: Vec2,
}

/// Everything a renderer backend needs for one frame, in draw order.
#[derive(Debug, Default)]
pub struct RenderFrame {
    pub calls: Vec<DrawCall>,
    pub texts: Vec<TextDraw>,
    pub darken_factor: f32,
    pub title: String,
}

impl RenderFrame {
    pub fn clear(&mut self) {
        self.calls.clear();
        self.texts.clear();
        self.darken_factor = 0.0;
        self.title.clear();
    }

    pub fn push(&mut self, call: DrawCall) {
        self.calls.push(call);
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_frame_state() {
        let mut frame = RenderFrame::default();
        frame.push(DrawCall {
            entity: None,
            texture: Some(TextureId::Bullet),
            effect: EffectId::Textured,
            geometry: GeometryId::Sprite,
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            angle: 0.0,
            color: None,
        });
        frame.darken_factor = 0.5;
        frame.title.push_str("FPS: 60");

        frame.clear();
        assert!(frame.is_empty());
        assert_eq!(frame.darken_factor, 0.0);
        assert!(frame.title.is_empty());
    }
}
