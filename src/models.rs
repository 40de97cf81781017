use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Athlete discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AthleteType {
    Runner,
    Cyclist,
    Swimmer,
    Triathlete,
    TeamSport,
    Strength,
    Other,
}

impl fmt::Display for AthleteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AthleteType::Runner => "runner",
            AthleteType::Cyclist => "cyclist",
            AthleteType::Swimmer => "swimmer",
            AthleteType::Triathlete => "triathlete",
            AthleteType::TeamSport => "team_sport",
            AthleteType::Strength => "strength",
            AthleteType::Other => "other",
        };
        f.write_str(name)
    }
}

impl FromStr for AthleteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "runner" | "running" => Ok(AthleteType::Runner),
            "cyclist" | "cycling" => Ok(AthleteType::Cyclist),
            "swimmer" | "swimming" => Ok(AthleteType::Swimmer),
            "triathlete" | "triathlon" => Ok(AthleteType::Triathlete),
            "team_sport" | "team" => Ok(AthleteType::TeamSport),
            "strength" => Ok(AthleteType::Strength),
            "other" => Ok(AthleteType::Other),
            _ => Err(format!("Unknown athlete type: {}", s)),
        }
    }
}

/// Basic athlete profile kept alongside the metric snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteProfile {
    /// Athlete's display name
    pub name: String,

    /// Age in years
    pub age: u8,

    /// Primary discipline
    pub athlete_type: AthleteType,
}
