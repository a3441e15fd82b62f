//! Built-in default configuration.
//!
//! [`defaults`] builds a brand-new document on every call from the constant
//! tables below.  There is no shared canonical instance, so a caller that
//! mutates its copy can never leak that change into another caller or into
//! the store.

use indexmap::IndexMap;

use super::document::{ConfigDocument, Meta, SettingValue, VisionSettings};
use super::fields::{CURRENT_SCHEMA_VERSION, KNOWN_TASKS};

/// Default match confidence for template searches.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;
/// Default template wait, in seconds.
pub const DEFAULT_TIMEOUT_SECS: i64 = 10;
/// Default delay between template match attempts, in seconds.
pub const DEFAULT_INTERVAL_SECS: f64 = 0.5;

/// Tasks enabled out of the box.  Every other known task starts disabled.
const ENABLED_TASKS: [&str; 1] = ["test_task"];

enum NumericDefault {
    Int(i64),
    Text(&'static str),
}

const DEFAULT_NUMERIC: [(&str, NumericDefault); 9] = [
    ("StartupPath", NumericDefault::Text("")),
    ("StartupTime", NumericDefault::Text("")),
    ("InterceptionBoss", NumericDefault::Int(1)),
    ("InterceptionBossNormal", NumericDefault::Int(1)),
    ("UserLevel", NumericDefault::Int(0)),
    ("UserGroup", NumericDefault::Text("Free")),
    ("doroGuiX", NumericDefault::Int(0)),
    ("doroGuiY", NumericDefault::Int(0)),
    ("TestModeValue", NumericDefault::Int(0)),
];

const DEFAULT_TOGGLES: [(&str, i64); 89] = [
    ("AutoStartNikke", 0),
    ("Timedstart", 0),
    ("ShopCash", 1),
    ("ShopCashFree", 0),
    ("ShopCashFreePackage", 0),
    ("ShopGeneral", 1),
    ("ShopGeneralFree", 0),
    ("ShopGeneralDust", 0),
    ("ShopGeneralPackage", 0),
    ("ShopArena", 1),
    ("ShopArenaBookFire", 0),
    ("ShopArenaBookWater", 0),
    ("ShopArenaBookWind", 0),
    ("ShopArenaBookElec", 0),
    ("ShopArenaBookIron", 0),
    ("ShopArenaBookBox", 0),
    ("ShopArenaPackage", 0),
    ("ShopArenaFurnace", 0),
    ("ShopRecycling", 1),
    ("ShopRecyclingGem", 0),
    ("ShopRecyclingVoucher", 0),
    ("ShopRecyclingResources", 0),
    ("ShopRecyclingTeamworkBox", 0),
    ("ShopRecyclingKitBox", 0),
    ("ShopRecyclingArms", 0),
    ("SimulationNormal", 1),
    ("SimulationOverClock", 0),
    ("AwardArena", 1),
    ("ArenaRookie", 0),
    ("ArenaSpecial", 0),
    ("ArenaChampion", 0),
    ("TowerCompany", 1),
    ("TowerUniversal", 1),
    ("InterceptionNormal", 1),
    ("InterceptionAnomaly", 0),
    ("InterceptionScreenshot", 0),
    ("InterceptionRedCircle", 0),
    ("InterceptionExit7", 0),
    ("InterceptionReminder", 0),
    ("AwardOutpost", 1),
    ("AwardOutpostDispatch", 0),
    ("AwardAdvise", 0),
    ("AwardAdviseAward", 0),
    ("AwardAppreciation", 0),
    ("AwardFriendPoint", 1),
    ("AwardMail", 1),
    ("AwardRanking", 0),
    ("AwardDaily", 1),
    ("AwardPass", 0),
    ("AwardFreeRecruit", 0),
    ("AwardCooperate", 0),
    ("AwardSoloRaid", 0),
    ("AutoFill", 0),
    ("EventSmall", 0),
    ("EventSmallChallenge", 0),
    ("EventSmallStory", 0),
    ("EventSmallMission", 0),
    ("EventLarge", 0),
    ("EventLargeSign", 0),
    ("EventLargeChallenge", 0),
    ("EventLargeStory", 0),
    ("EventLargeCooperate", 0),
    ("EventLargeMinigame", 0),
    ("EventLargeDaily", 0),
    ("EventSpecial", 0),
    ("EventSpecialSign", 0),
    ("EventSpecialChallenge", 0),
    ("EventSpecialStory", 0),
    ("EventSpecialCooperate", 0),
    ("EventSpecialMinigame", 0),
    ("EventSpecialDaily", 0),
    ("ClearRed", 1),
    ("ClearRedRecycling", 0),
    ("ClearRedSynchro", 0),
    ("ClearRedSynchroForce", 0),
    ("ClearRedLimit", 0),
    ("ClearRedCube", 0),
    ("ClearRedNotice", 0),
    ("ClearRedShop", 0),
    ("ClearRedWallpaper", 0),
    ("ClearRedProfile", 0),
    ("ClearRedBla", 0),
    ("OpenBlablalink", 0),
    ("CheckEvent", 0),
    ("DoroClosing", 0),
    ("CheckAuto", 0),
    ("StoryModeAutoChoose", 0),
    ("StoryModeAutoStar", 0),
    ("TestModeInitialization", 0),
];

/// Returns a fresh copy of the default configuration.
pub fn defaults() -> ConfigDocument {
    ConfigDocument {
        meta: Meta {
            version: CURRENT_SCHEMA_VERSION,
            extra: IndexMap::new(),
        },
        vision: VisionSettings {
            default_confidence: DEFAULT_CONFIDENCE,
            default_timeout: DEFAULT_TIMEOUT_SECS,
            default_interval: DEFAULT_INTERVAL_SECS,
            extra: IndexMap::new(),
        },
        tasks: KNOWN_TASKS
            .iter()
            .map(|name| (name.to_string(), ENABLED_TASKS.contains(name)))
            .collect(),
        toggles: DEFAULT_TOGGLES
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect(),
        numeric_settings: DEFAULT_NUMERIC
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    NumericDefault::Int(i) => SettingValue::Integer(*i),
                    NumericDefault::Text(s) => SettingValue::Text(s.to_string()),
                };
                (name.to_string(), value)
            })
            .collect(),
        extra: IndexMap::new(),
    }
}
