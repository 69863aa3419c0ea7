// src/domain/race.rs
//
// Race weekend and classification records.
//
// The backend emits camelCase keys (`circuit`, `firstPractice`, `results`);
// the rest of the crate works with the Ergast PascalCase layout. Both are
// accepted on the way in, PascalCase is written on the way out.

use serde::{Deserialize, Serialize};

use super::{Circuit, Constructor, Driver};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub round: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default)]
    pub race_name: String,
    #[serde(rename = "Circuit", alias = "circuit", default)]
    pub circuit: Circuit,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(
        rename = "FirstPractice",
        alias = "firstPractice",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub first_practice: Option<Session>,
    #[serde(
        rename = "SecondPractice",
        alias = "secondPractice",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub second_practice: Option<Session>,
    #[serde(
        rename = "ThirdPractice",
        alias = "thirdPractice",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub third_practice: Option<Session>,
    #[serde(
        rename = "Qualifying",
        alias = "qualifying",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub qualifying: Option<Session>,
    #[serde(
        rename = "Sprint",
        alias = "sprint",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sprint: Option<Session>,
    #[serde(
        rename = "Results",
        alias = "results",
        default,
        deserialize_with = "crate::domain::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub results: Vec<RaceResult>,
}

impl Race {
    /// Sprint weekends carry a sprint session in the schedule.
    pub fn is_sprint_weekend(&self) -> bool {
        self.sprint.is_some()
    }

    pub fn winner(&self) -> Option<&RaceResult> {
        self.results.iter().find(|r| r.position == "1")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResult {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub number: String,
    #[serde(default)]
    pub position: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub position_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub points: String,
    #[serde(rename = "Driver", alias = "driver", default)]
    pub driver: Driver,
    #[serde(rename = "Constructor", alias = "constructor", default)]
    pub constructor: Constructor,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub grid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub laps: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(
        rename = "Time",
        alias = "time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<ResultTime>,
    #[serde(
        rename = "FastestLap",
        alias = "fastestLap",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fastest_lap: Option<FastestLap>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub millis: Option<String>,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FastestLap {
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub lap: String,
    #[serde(rename = "Time", alias = "time", default)]
    pub time: LapTime,
    #[serde(
        rename = "AverageSpeed",
        alias = "averageSpeed",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub average_speed: Option<AverageSpeed>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LapTime {
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageSpeed {
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub speed: String,
}
