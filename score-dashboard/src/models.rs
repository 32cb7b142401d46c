use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contestant {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(default)]
    pub contestant_name: Option<String>,
    pub game_name: String,
    pub score: f64,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GamePopularity {
    pub id: i64,
    pub name: String,
    pub popularity_score: f64,
    pub total_scores: u64,
    pub unique_players: u64,
    pub recent_scores: u64,
    #[serde(default)]
    pub last_played: Option<String>,
    pub score_trend: f64,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Up,
    Flat,
    Down,
}

impl Trend {
    pub fn from_score_trend(score_trend: f64) -> Self {
        if score_trend > 0.0 {
            Trend::Up
        } else if score_trend < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

impl GamePopularity {
    pub fn trend(&self) -> Trend {
        Trend::from_score_trend(self.score_trend)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewScore {
    pub contestant_id: i64,
    pub game_id: i64,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewContestant {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewGame {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}
