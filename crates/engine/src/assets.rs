use serde::{Deserialize, Serialize};

/// Every texture the renderer can be asked for. Animated entities cycle
/// through the frame tables at the bottom of this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureId {
    PlayerWalk0,
    PlayerWalk1,
    PlayerWalk2,
    PlayerIdle,
    Scorpion,
    Snake,
    SpiderBug,
    IceCrawler,
    IceBrute,
    ForestBoss,
    Dragon0,
    Dragon1,
    Dragon2,
    IceBoss,
    Gun,
    Bullet,
    Grenade,
    Snowball,
    Tornado0,
    Tornado1,
    Tornado2,
    Tornado3,
    Explosion0,
    Explosion1,
    Explosion2,
    Explosion3,
    Explosion4,
    Explosion5,
    Explosion6,
    Explosion7,
    Explosion8,
    Explosion9,
    Sword,
    Shield,
    Heart,
    ForestBackground,
    DesertBackground,
    IceBackground,
    ForestForeground,
    DesertForeground,
    IceForeground,
    HelpPanel,
    HintPanel,
    HudFrame,
}

impl TextureId {
    pub fn file_name(self) -> &'static str {
        match self {
            TextureId::PlayerWalk0 => "player_walk_0.png",
            TextureId::PlayerWalk1 => "player_walk_1.png",
            TextureId::PlayerWalk2 => "player_walk_2.png",
            TextureId::PlayerIdle => "player_idle.png",
            TextureId::Scorpion => "scorpion.png",
            TextureId::Snake => "snake.png",
            TextureId::SpiderBug => "spider_bug.png",
            TextureId::IceCrawler => "ice_crawler.png",
            TextureId::IceBrute => "ice_brute.png",
            TextureId::ForestBoss => "forest_boss.png",
            TextureId::Dragon0 => "dragon_0.png",
            TextureId::Dragon1 => "dragon_1.png",
            TextureId::Dragon2 => "dragon_2.png",
            TextureId::IceBoss => "ice_boss.png",
            TextureId::Gun => "gun.png",
            TextureId::Bullet => "bullet.png",
            TextureId::Grenade => "grenade.png",
            TextureId::Snowball => "snowball.png",
            TextureId::Tornado0 => "tornado_0.png",
            TextureId::Tornado1 => "tornado_1.png",
            TextureId::Tornado2 => "tornado_2.png",
            TextureId::Tornado3 => "tornado_3.png",
            TextureId::Explosion0 => "explosion_0.png",
            TextureId::Explosion1 => "explosion_1.png",
            TextureId::Explosion2 => "explosion_2.png",
            TextureId::Explosion3 => "explosion_3.png",
            TextureId::Explosion4 => "explosion_4.png",
            TextureId::Explosion5 => "explosion_5.png",
            TextureId::Explosion6 => "explosion_6.png",
            TextureId::Explosion7 => "explosion_7.png",
            TextureId::Explosion8 => "explosion_8.png",
            TextureId::Explosion9 => "explosion_9.png",
            TextureId::Sword => "sword.png",
            TextureId::Shield => "shield.png",
            TextureId::Heart => "heart.png",
            TextureId::ForestBackground => "forest_background.png",
            TextureId::DesertBackground => "desert_background.png",
            TextureId::IceBackground => "ice_background.png",
            TextureId::ForestForeground => "forest_foreground.png",
            TextureId::DesertForeground => "desert_foreground.png",
            TextureId::IceForeground => "ice_foreground.png",
            TextureId::HelpPanel => "help_panel.png",
            TextureId::HintPanel => "hint_panel.png",
            TextureId::HudFrame => "hud_frame.png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectId {
    Textured,
    /// Untextured geometry tinted by the entity color (rocks, debug lines).
    Colored,
    Wind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryId {
    Sprite,
    DebugLine,
    ScreenTriangle,
    Rock0,
    Rock1,
    Rock2,
    Rock3,
    Rock4,
}

impl GeometryId {
    pub const ALL: [GeometryId; 8] = [
        GeometryId::Sprite,
        GeometryId::DebugLine,
        GeometryId::ScreenTriangle,
        GeometryId::Rock0,
        GeometryId::Rock1,
        GeometryId::Rock2,
        GeometryId::Rock3,
        GeometryId::Rock4,
    ];

    pub fn file_stem(self) -> &'static str {
        match self {
            GeometryId::Sprite => "sprite",
            GeometryId::DebugLine => "debug_line",
            GeometryId::ScreenTriangle => "screen_triangle",
            GeometryId::Rock0 => "rock_0",
            GeometryId::Rock1 => "rock_1",
            GeometryId::Rock2 => "rock_2",
            GeometryId::Rock3 => "rock_3",
            GeometryId::Rock4 => "rock_4",
        }
    }

    pub fn from_file_stem(stem: &str) -> Option<GeometryId> {
        GeometryId::ALL.into_iter().find(|id| id.file_stem() == stem)
    }
}

pub const PLAYER_WALK_FRAMES: [TextureId; 4] = [
    TextureId::PlayerWalk0,
    TextureId::PlayerWalk1,
    TextureId::PlayerWalk2,
    TextureId::PlayerIdle,
];

pub const EXPLOSION_FRAMES: [TextureId; 10] = [
    TextureId::Explosion0,
    TextureId::Explosion1,
    TextureId::Explosion2,
    TextureId::Explosion3,
    TextureId::Explosion4,
    TextureId::Explosion5,
    TextureId::Explosion6,
    TextureId::Explosion7,
    TextureId::Explosion8,
    TextureId::Explosion9,
];

pub const DRAGON_FRAMES: [TextureId; 3] =
    [TextureId::Dragon0, TextureId::Dragon1, TextureId::Dragon2];

pub const TORNADO_FRAMES: [TextureId; 4] = [
    TextureId::Tornado0,
    TextureId::Tornado1,
    TextureId::Tornado2,
    TextureId::Tornado3,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_file_stems_round_trip() {
        for id in GeometryId::ALL {
            assert_eq!(GeometryId::from_file_stem(id.file_stem()), Some(id));
        }
    }

    #[test]
    fn unknown_geometry_stem_is_rejected() {
        assert_eq!(GeometryId::from_file_stem("rock_99"), None);
    }
}
