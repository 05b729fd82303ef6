use serde::{Deserialize, Serialize};

/// Label reported for a player that carries no weapon.
pub const NO_WEAPON: &str = "None";

/// One player as handed over by the game when saving, and as rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub name: String,
    pub health: u32,
    pub weapon: Option<String>,
}

impl PlayerSnapshot {
    pub fn new(name: impl Into<String>, health: u32, weapon: Option<&str>) -> Self {
        Self {
            name: name.into(),
            health,
            weapon: weapon.map(str::to_string),
        }
    }

    /// Weapon name for display, `"None"` when unarmed.
    pub fn weapon_label(&self) -> &str {
        self.weapon.as_deref().unwrap_or(NO_WEAPON)
    }
}

/// Everything written to a slot by a single save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub location: String,
    pub playtime_secs: u32,
    pub players: Vec<PlayerSnapshot>,
}

impl SlotSnapshot {
    pub fn new(location: impl Into<String>, players: Vec<PlayerSnapshot>) -> Self {
        Self {
            location: location.into(),
            playtime_secs: 0,
            players,
        }
    }

    pub fn with_playtime(mut self, secs: u32) -> Self {
        self.playtime_secs = secs;
        self
    }
}

/// A committed slot as returned by load. `last_saved` is assigned by the
/// database (`YYYY-MM-DD HH:MM:SS`, UTC).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedSlot {
    pub slot: u32,
    pub last_saved: String,
    pub snapshot: SlotSnapshot,
}

/// Per-slot summary for a save/load menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotSummary {
    pub slot: u32,
    pub location: String,
    pub playtime_secs: u32,
    pub last_saved: String,
    pub player_count: u32,
}

/// A row of the weapon catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeaponRecord {
    pub id: i64,
    pub name: String,
}
