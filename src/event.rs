use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One on-ball action from the event log.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub match_id: u64,
    pub team_id: Option<u32>,
    /// Filled in by normalization; `None` for ids missing from the directory.
    pub team_name: Option<String>,
    pub player_name: Option<String>,
    pub event_type: EventType,
    pub outcome: Option<Outcome>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub end_x: Option<f64>,
    pub end_y: Option<f64>,
    pub x_threat: f64,
    pub flags: EventFlags,
}

impl Event {
    pub fn new(match_id: u64, event_type: EventType) -> Self {
        Self {
            match_id,
            team_id: None,
            team_name: None,
            player_name: None,
            event_type,
            outcome: None,
            x: None,
            y: None,
            end_x: None,
            end_y: None,
            x_threat: 0.0,
            flags: EventFlags::default(),
        }
    }

    pub fn is_team(&self, team: &str) -> bool {
        self.team_name.as_deref() == Some(team)
    }

    pub fn is_successful(&self) -> bool {
        self.outcome == Some(Outcome::Successful)
    }

    pub fn x_above(&self, line: f64) -> bool {
        self.x.is_some_and(|x| x > line)
    }

    pub fn x_below(&self, line: f64) -> bool {
        self.x.is_some_and(|x| x < line)
    }

    pub fn has(&self, flag: Flag) -> bool {
        self.flags.contains(flag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Pass,
    OffsidePass,
    Carry,
    TakeOn,
    Tackle,
    Challenge,
    Interception,
    Foul,
    Clearance,
    BallRecovery,
    BlockedPass,
    Aerial,
    Dispossessed,
    SavedShot,
    MissedShots,
    ShotOnPost,
    Goal,
    Save,
    Claim,
    KeeperPickup,
    CornerAwarded,
    Card,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Pass => "Pass",
            EventType::OffsidePass => "OffsidePass",
            EventType::Carry => "Carry",
            EventType::TakeOn => "TakeOn",
            EventType::Tackle => "Tackle",
            EventType::Challenge => "Challenge",
            EventType::Interception => "Interception",
            EventType::Foul => "Foul",
            EventType::Clearance => "Clearance",
            EventType::BallRecovery => "BallRecovery",
            EventType::BlockedPass => "BlockedPass",
            EventType::Aerial => "Aerial",
            EventType::Dispossessed => "Dispossessed",
            EventType::SavedShot => "SavedShot",
            EventType::MissedShots => "MissedShots",
            EventType::ShotOnPost => "ShotOnPost",
            EventType::Goal => "Goal",
            EventType::Save => "Save",
            EventType::Claim => "Claim",
            EventType::KeeperPickup => "KeeperPickup",
            EventType::CornerAwarded => "CornerAwarded",
            EventType::Card => "Card",
            EventType::Other(raw) => raw.as_str(),
        }
    }
}

impl From<&str> for EventType {
    fn from(raw: &str) -> Self {
        match raw.trim() {
            "Pass" => EventType::Pass,
            "OffsidePass" => EventType::OffsidePass,
            "Carry" => EventType::Carry,
            "TakeOn" => EventType::TakeOn,
            "Tackle" => EventType::Tackle,
            "Challenge" => EventType::Challenge,
            "Interception" => EventType::Interception,
            "Foul" => EventType::Foul,
            "Clearance" => EventType::Clearance,
            "BallRecovery" => EventType::BallRecovery,
            "BlockedPass" => EventType::BlockedPass,
            "Aerial" => EventType::Aerial,
            "Dispossessed" => EventType::Dispossessed,
            "SavedShot" => EventType::SavedShot,
            "MissedShots" => EventType::MissedShots,
            "ShotOnPost" => EventType::ShotOnPost,
            "Goal" => EventType::Goal,
            "Save" => EventType::Save,
            "Claim" => EventType::Claim,
            "KeeperPickup" => EventType::KeeperPickup,
            "CornerAwarded" => EventType::CornerAwarded,
            "Card" => EventType::Card,
            other => EventType::Other(other.to_string()),
        }
    }
}

impl From<String> for EventType {
    fn from(raw: String) -> Self {
        EventType::from(raw.as_str())
    }
}

impl From<EventType> for String {
    fn from(kind: EventType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Successful,
    Unsuccessful,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Successful => "Successful",
            Outcome::Unsuccessful => "Unsuccessful",
        }
    }
}

impl FromStr for Outcome {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "Successful" => Ok(Outcome::Successful),
            "Unsuccessful" => Ok(Outcome::Unsuccessful),
            _ => Err(()),
        }
    }
}

/// Boolean indicator columns of the event log.
///
/// Each variant maps to exactly one source column; anything not listed here
/// is ignored at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    IsGoal,
    IsShot,
    ShotOnTarget,
    ShotOffTarget,
    ShotBlocked,
    Assist,
    KeyPass,
    BigChanceCreated,
    BigChanceMissed,
    BigChanceScored,
    PassAccurate,
    PassInaccurate,
    PassCrossAccurate,
    PassCrossInaccurate,
    PassCorner,
    PassCornerAccurate,
    PassCornerInaccurate,
    ProgressiveAction,
    BoxEntry,
    LastThirdEntry,
    DribbleWon,
    DribbleLost,
    TackleWon,
    TackleLost,
    InterceptionWon,
    ClearanceTotal,
    BallRecovery,
    DuelAerialWon,
    DuelAerialLost,
    FoulCommitted,
}

impl Flag {
    pub const ALL: [Flag; 30] = [
        Flag::IsGoal,
        Flag::IsShot,
        Flag::ShotOnTarget,
        Flag::ShotOffTarget,
        Flag::ShotBlocked,
        Flag::Assist,
        Flag::KeyPass,
        Flag::BigChanceCreated,
        Flag::BigChanceMissed,
        Flag::BigChanceScored,
        Flag::PassAccurate,
        Flag::PassInaccurate,
        Flag::PassCrossAccurate,
        Flag::PassCrossInaccurate,
        Flag::PassCorner,
        Flag::PassCornerAccurate,
        Flag::PassCornerInaccurate,
        Flag::ProgressiveAction,
        Flag::BoxEntry,
        Flag::LastThirdEntry,
        Flag::DribbleWon,
        Flag::DribbleLost,
        Flag::TackleWon,
        Flag::TackleLost,
        Flag::InterceptionWon,
        Flag::ClearanceTotal,
        Flag::BallRecovery,
        Flag::DuelAerialWon,
        Flag::DuelAerialLost,
        Flag::FoulCommitted,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Flag::IsGoal => "isGoal",
            Flag::IsShot => "isShot",
            Flag::ShotOnTarget => "shotOnTarget",
            Flag::ShotOffTarget => "shotOffTarget",
            Flag::ShotBlocked => "shotBlocked",
            Flag::Assist => "assist",
            Flag::KeyPass => "keyPass",
            Flag::BigChanceCreated => "bigChanceCreated",
            Flag::BigChanceMissed => "bigChanceMissed",
            Flag::BigChanceScored => "bigChanceScored",
            Flag::PassAccurate => "passAccurate",
            Flag::PassInaccurate => "passInaccurate",
            Flag::PassCrossAccurate => "passCrossAccurate",
            Flag::PassCrossInaccurate => "passCrossInaccurate",
            Flag::PassCorner => "passCorner",
            Flag::PassCornerAccurate => "passCornerAccurate",
            Flag::PassCornerInaccurate => "passCornerInaccurate",
            Flag::ProgressiveAction => "progressive_action",
            Flag::BoxEntry => "box_entry",
            Flag::LastThirdEntry => "last_third_entry",
            Flag::DribbleWon => "dribbleWon",
            Flag::DribbleLost => "dribbleLost",
            Flag::TackleWon => "tackleWon",
            Flag::TackleLost => "tackleLost",
            Flag::InterceptionWon => "interceptionWon",
            Flag::ClearanceTotal => "clearanceTotal",
            Flag::BallRecovery => "ballRecovery",
            Flag::DuelAerialWon => "duelAerialWon",
            Flag::DuelAerialLost => "duelAerialLost",
            Flag::FoulCommitted => "foulCommitted",
        }
    }

    pub fn from_column(name: &str) -> Option<Flag> {
        Flag::ALL.into_iter().find(|flag| flag.column() == name)
    }

    fn bit(self) -> u64 {
        1u64 << (self as u32)
    }
}

/// Set of [`Flag`]s raised on one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EventFlags(u64);

impl EventFlags {
    pub fn contains(self, flag: Flag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: Flag) {
        self.0 |= flag.bit();
    }

    pub fn remove(&mut self, flag: Flag) {
        self.0 &= !flag.bit();
    }

    pub fn set(&mut self, flag: Flag, on: bool) {
        if on {
            self.insert(flag);
        } else {
            self.remove(flag);
        }
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Flag> {
        Flag::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }
}

impl FromIterator<Flag> for EventFlags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut flags = EventFlags::default();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_columns_round_trip() {
        for flag in Flag::ALL {
            assert_eq!(Flag::from_column(flag.column()), Some(flag));
        }
        assert_eq!(Flag::from_column("notAFlag"), None);
    }

    #[test]
    fn flags_set_and_clear() {
        let mut flags: EventFlags = [Flag::IsGoal, Flag::FoulCommitted].into_iter().collect();
        assert!(flags.contains(Flag::IsGoal));
        assert!(flags.contains(Flag::FoulCommitted));
        assert!(!flags.contains(Flag::Assist));
        flags.set(Flag::IsGoal, false);
        assert_eq!(flags.iter().collect::<Vec<_>>(), vec![Flag::FoulCommitted]);
    }

    #[test]
    fn unknown_event_type_is_preserved() {
        assert_eq!(EventType::from("Pass"), EventType::Pass);
        let odd = EventType::from("FormationChange");
        assert_eq!(odd, EventType::Other("FormationChange".to_string()));
        assert_eq!(odd.as_str(), "FormationChange");
    }
}
