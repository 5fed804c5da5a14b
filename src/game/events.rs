//! Game Events
//!
//! Events generated by a session for the UI layer and for logging.

use serde::{Serialize, Deserialize};

use crate::game::moves::Direction;
use crate::game::skill::Skill;
use crate::game::theme::Theme;
use crate::game::tile::Position;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A new tile appeared
    TileSpawned {
        position: Position,
        value: u32,
    },

    /// A move was resolved
    Moved {
        direction: Direction,
        merges: u32,
        points: u32,
    },

    /// Two tiles merged
    TilesMerged {
        position: Position,
        value: u32,
    },

    /// Nezha level went up
    LevelUp {
        level: u32,
    },

    /// The winning tile was reached for the first time
    Won {
        value: u32,
    },

    /// No moves remain
    GameOver {
        score: u32,
    },

    /// A skill was used
    SkillActivated {
        skill: Skill,
    },

    /// A skill's active window closed
    SkillExpired {
        skill: Skill,
    },

    /// Session was reset
    Reset,
}

/// A game event stamped with the move counter at the time it happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Moves made when the event occurred
    pub moves: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(moves: u32, data: GameEventData) -> Self {
        Self { moves, data }
    }

    /// Create tile spawned event.
    pub fn tile_spawned(moves: u32, position: Position, value: u32) -> Self {
        Self::new(moves, GameEventData::TileSpawned { position, value })
    }

    /// Create tiles merged event.
    pub fn tiles_merged(moves: u32, position: Position, value: u32) -> Self {
        Self::new(moves, GameEventData::TilesMerged { position, value })
    }

    /// Create skill activated event.
    pub fn skill_activated(moves: u32, skill: Skill) -> Self {
        Self::new(moves, GameEventData::SkillActivated { skill })
    }

    /// Create skill expired event.
    pub fn skill_expired(moves: u32, skill: Skill) -> Self {
        Self::new(moves, GameEventData::SkillExpired { skill })
    }

    /// Render a one-line description using a theme's labels.
    pub fn describe(&self, theme: &dyn Theme) -> String {
        match &self.data {
            GameEventData::TileSpawned { position, value } => {
                format!("{} appears at ({}, {})", theme.tile_label(*value), position.x, position.y)
            }
            GameEventData::Moved { direction, merges, points } => {
                format!("moved {:?}: {} merges, +{}", direction, merges, points)
            }
            GameEventData::TilesMerged { position, value } => {
                format!("merged into {} at ({}, {})", theme.tile_label(*value), position.x, position.y)
            }
            GameEventData::LevelUp { level } => format!("reached level {}", level),
            GameEventData::Won { value } => format!("won with {}", theme.tile_label(*value)),
            GameEventData::GameOver { score } => format!("game over, score {}", score),
            GameEventData::SkillActivated { skill } => {
                format!("{} {} activated", theme.skill_icon(*skill), theme.skill_label(*skill))
            }
            GameEventData::SkillExpired { skill } => {
                format!("{} faded", theme.skill_label(*skill))
            }
            GameEventData::Reset => "session reset".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::theme::{ClassicTheme, NezhaTheme};

    #[test]
    fn test_describe_uses_theme() {
        let event = GameEvent::tiles_merged(3, Position::new(1, 2), 8);
        assert_eq!(event.describe(&ClassicTheme), "merged into 8 at (1, 2)");
        assert!(event.describe(&NezhaTheme).contains(&NezhaTheme.tile_label(8)));
    }

    #[test]
    fn test_event_serializes() {
        let event = GameEvent::skill_activated(7, Skill::RedSash);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("redSash"));
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
