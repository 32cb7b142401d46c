//! Markup for every dashboard region. Each call renders the whole region;
//! nothing is patched incrementally.

use chrono::{DateTime, NaiveDateTime};

use crate::models::{Contestant, Game, GamePopularity, LeaderboardEntry, Trend};

pub const RECENT_SCORES_LIMIT: usize = 10;

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Backend timestamps are naive ISO-8601; offsets are accepted too.
/// Unparseable input is shown as-is.
pub fn format_timestamp(value: &str) -> String {
    let trimmed = value.trim();
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return parsed.naive_local().format("%Y-%m-%d %H:%M:%S").to_string();
    }
    trimmed.to_string()
}

pub fn games_list(games: &[Game]) -> String {
    games
        .iter()
        .map(|game| {
            let (status_class, status_label) = if game.is_active {
                ("btn-success", "Active")
            } else {
                ("btn-secondary", "Inactive")
            };
            format!(
                "<div class=\"list-group-item d-flex justify-content-between align-items-center\" data-game-id=\"{id}\">\
                 <span>{name}</span>\
                 <div>\
                 <button type=\"button\" class=\"btn btn-sm {status_class}\" data-action=\"toggle-game\" data-game-id=\"{id}\" data-activate=\"{activate}\">{status_label}</button> \
                 <button type=\"button\" class=\"btn btn-sm btn-primary\" data-action=\"select-game\" data-game-id=\"{id}\">Select</button> \
                 <button type=\"button\" class=\"btn btn-sm btn-danger\" data-action=\"delete-game\" data-game-id=\"{id}\">Delete</button>\
                 </div>\
                 </div>",
                id = game.id,
                name = escape_html(&game.name),
                status_class = status_class,
                status_label = status_label,
                activate = !game.is_active,
            )
        })
        .collect()
}

/// Only active games can take scores.
pub fn game_options(games: &[Game]) -> String {
    let mut html = String::from("<option value=\"\">Select Game</option>");
    for game in games.iter().filter(|game| game.is_active) {
        html.push_str(&format!(
            "<option value=\"{}\">{}</option>",
            game.id,
            escape_html(&game.name)
        ));
    }
    html
}

/// First [`RECENT_SCORES_LIMIT`] entries, in the order the backend returned.
pub fn recent_scores(entries: &[LeaderboardEntry]) -> String {
    entries
        .iter()
        .take(RECENT_SCORES_LIMIT)
        .map(|entry| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&entry.game_name),
                entry.score,
                escape_html(&format_timestamp(&entry.timestamp))
            )
        })
        .collect()
}

pub fn trend_cell(score_trend: f64) -> String {
    let (icon, tone) = match Trend::from_score_trend(score_trend) {
        Trend::Up => ("bi-arrow-up-circle", "text-success"),
        Trend::Flat => ("bi-dash-circle-fill", "text-secondary"),
        Trend::Down => ("bi-arrow-down-circle", "text-danger"),
    };
    let percent = if score_trend.is_finite() {
        (score_trend * 100.0).abs()
    } else {
        0.0
    };
    format!("<i class=\"bi {} {}\"></i> {:.1}%", icon, tone, percent)
}

pub fn popularity_table(records: &[GamePopularity]) -> String {
    let rows: String = records
        .iter()
        .map(|record| {
            format!(
                "<tr><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&record.name),
                record.popularity_score,
                record.total_scores,
                record.unique_players,
                record.recent_scores,
                trend_cell(record.score_trend)
            )
        })
        .collect();
    format!(
        "<div class=\"table-responsive\"><table class=\"table\">\
         <thead><tr>\
         <th>Game</th><th>Popularity Score</th><th>Total Scores</th>\
         <th>Unique Players</th><th>Recent Activity</th><th>Trend</th>\
         </tr></thead>\
         <tbody>{}</tbody></table></div>",
        rows
    )
}

pub fn contestants_table(contestants: &[Contestant]) -> String {
    contestants
        .iter()
        .map(|contestant| {
            let created = contestant
                .created_at
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string());
            format!(
                "<tr data-contestant-id=\"{id}\"><td>{name}</td><td>{email}</td><td>{created}</td>\
                 <td><button type=\"button\" class=\"btn btn-sm btn-danger\" data-action=\"delete-contestant\" data-contestant-id=\"{id}\">Delete</button></td></tr>",
                id = contestant.id,
                name = escape_html(&contestant.name),
                email = escape_html(&contestant.email),
                created = escape_html(&created),
            )
        })
        .collect()
}

pub fn contestant_options(contestants: &[Contestant], selected: Option<i64>) -> String {
    let mut html = String::from("<option value=\"\">Select Contestant</option>");
    for contestant in contestants {
        let marker = if selected == Some(contestant.id) {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            contestant.id,
            marker,
            escape_html(&contestant.name)
        ));
    }
    html
}

pub fn current_user(username: &str) -> String {
    escape_html(username)
}
