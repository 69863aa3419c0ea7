// src/domain/mod.rs
//
// Domain records exchanged with the backend and held by the store.
//
// These are plain data: no I/O, no state transitions.

pub mod circuit;
pub mod constructor;
pub mod driver;
pub mod notification;
pub mod prediction;
pub mod race;
pub mod standings;
pub mod strategy;
pub mod user;

use serde::{Deserialize, Deserializer, Serialize};

pub use circuit::{Circuit, Location};
pub use constructor::Constructor;
pub use driver::Driver;
pub use notification::{Notification, NotificationKind, NotificationsPage, RemoteNotification};
pub use prediction::{
    DriverPrediction, PredictionHistoryItem, PredictionHistoryPage, PredictionKind,
    RacePrediction, SinglePrediction,
};
pub use race::{AverageSpeed, FastestLap, LapTime, Race, RaceResult, ResultTime, Session};
pub use standings::{ConstructorStanding, DriverStanding, Season};
pub use strategy::{
    BestStrategy, CompoundStrategy, StrategyParams, StrategyRanking, StrategyResult,
    TacticalRecommendation,
};
pub use user::{
    PreferencesUpdate, ProfileStats, ProfileUpdate, Theme, User, UserPreferences, UserProfile,
};

/// Read an explicit `null` the same as a missing field: as the type's
/// default (an empty collection for `Vec` fields).
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Paging block carried next to `data` in list responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub total_pages: u32,
}
