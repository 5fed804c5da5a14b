//! Theme Lookups
//!
//! Read-only labels, colors and icons keyed by tile value or skill.
//! The core only queries these for descriptions; it never mutates them.

use crate::game::skill::Skill;

/// 24-bit color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#rrggbb` form.
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Swappable visual theme.
pub trait Theme {
    /// Theme name.
    fn name(&self) -> &'static str;

    /// Display label for a tile value.
    fn tile_label(&self, value: u32) -> String;

    /// Background color for a tile value.
    fn tile_color(&self, value: u32) -> Rgb;

    /// Display name of a skill.
    fn skill_label(&self, skill: Skill) -> &'static str;

    /// Short icon glyph for a skill.
    fn skill_icon(&self, skill: Skill) -> &'static str;
}

/// Colors by rank (2 = rank 1), shared by the bundled themes.
const RANK_COLORS: [Rgb; 12] = [
    Rgb(0xee, 0xe4, 0xda), // empty / fallback
    Rgb(0xfd, 0xe2, 0xe4),
    Rgb(0xfa, 0xc6, 0xc9),
    Rgb(0xf5, 0x9e, 0x8b),
    Rgb(0xf2, 0x7b, 0x5a),
    Rgb(0xe8, 0x5d, 0x3f),
    Rgb(0xd9, 0x3f, 0x2a),
    Rgb(0xc2, 0x2d, 0x1f),
    Rgb(0xe6, 0xb4, 0x2e),
    Rgb(0xd4, 0x9a, 0x1a),
    Rgb(0xb8, 0x86, 0x0b),
    Rgb(0x9b, 0x1b, 0x30),
];

fn rank_color(value: u32) -> Rgb {
    let rank = value.max(1).trailing_zeros() as usize;
    RANK_COLORS.get(rank).copied().unwrap_or(Rgb(0x3c, 0x3a, 0x32))
}

/// Mythic Nezha theme.
#[derive(Clone, Copy, Debug, Default)]
pub struct NezhaTheme;

const NEZHA_LABELS: [&str; 11] = [
    "Lotus Seed",
    "Lotus Bud",
    "Lotus Bloom",
    "Red Sash",
    "Universe Ring",
    "Fire Spear",
    "Fire Wheels",
    "Gold Brick",
    "Chentang Pass",
    "Three Heads",
    "Nezha",
];

impl Theme for NezhaTheme {
    fn name(&self) -> &'static str {
        "nezha"
    }

    fn tile_label(&self, value: u32) -> String {
        let rank = value.max(1).trailing_zeros() as usize;
        match rank {
            0 => String::new(),
            r if r <= NEZHA_LABELS.len() => NEZHA_LABELS[r - 1].to_string(),
            _ => format!("Lotus Avatar {}", value),
        }
    }

    fn tile_color(&self, value: u32) -> Rgb {
        rank_color(value)
    }

    fn skill_label(&self, skill: Skill) -> &'static str {
        match skill {
            Skill::FireWheel => "Wind Fire Wheels",
            Skill::UniverseRing => "Universe Ring",
            Skill::RedSash => "Red Armillary Sash",
            Skill::ThreeHeads => "Three Heads Six Arms",
        }
    }

    fn skill_icon(&self, skill: Skill) -> &'static str {
        match skill {
            Skill::FireWheel => "🔥",
            Skill::UniverseRing => "⭕",
            Skill::RedSash => "🎀",
            Skill::ThreeHeads => "👹",
        }
    }
}

/// Plain numeric theme.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassicTheme;

impl Theme for ClassicTheme {
    fn name(&self) -> &'static str {
        "classic"
    }

    fn tile_label(&self, value: u32) -> String {
        value.to_string()
    }

    fn tile_color(&self, value: u32) -> Rgb {
        rank_color(value)
    }

    fn skill_label(&self, skill: Skill) -> &'static str {
        match skill {
            Skill::FireWheel => "Burn",
            Skill::UniverseRing => "Upgrade",
            Skill::RedSash => "Double Score",
            Skill::ThreeHeads => "Freeze Spawns",
        }
    }

    fn skill_icon(&self, skill: Skill) -> &'static str {
        match skill {
            Skill::FireWheel => "B",
            Skill::UniverseRing => "U",
            Skill::RedSash => "D",
            Skill::ThreeHeads => "F",
        }
    }
}

/// Look up a bundled theme by name.
pub fn theme_by_name(name: &str) -> Option<Box<dyn Theme>> {
    match name {
        "nezha" => Some(Box::new(NezhaTheme)),
        "classic" => Some(Box::new(ClassicTheme)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nezha_labels() {
        assert_eq!(NezhaTheme.tile_label(2), "Lotus Seed");
        assert_eq!(NezhaTheme.tile_label(2048), "Nezha");
        assert_eq!(NezhaTheme.tile_label(4096), "Lotus Avatar 4096");
    }

    #[test]
    fn test_classic_labels() {
        assert_eq!(ClassicTheme.tile_label(64), "64");
        assert_eq!(ClassicTheme.skill_label(Skill::RedSash), "Double Score");
    }

    #[test]
    fn test_colors() {
        assert_eq!(NezhaTheme.tile_color(2), ClassicTheme.tile_color(2));
        assert_eq!(Rgb(0xab, 0x01, 0xff).hex(), "#ab01ff");
        // Past the table falls back to a dark tone
        assert_eq!(NezhaTheme.tile_color(1 << 20), Rgb(0x3c, 0x3a, 0x32));
    }

    #[test]
    fn test_theme_by_name() {
        assert_eq!(theme_by_name("classic").unwrap().name(), "classic");
        assert_eq!(theme_by_name("nezha").unwrap().name(), "nezha");
        assert!(theme_by_name("neon").is_none());
    }
}
