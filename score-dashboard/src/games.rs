use crate::alert::Alert;
use crate::dashboard::{Dashboard, Form, Region};
use crate::errors::FormError;
use crate::models::{NewGame, NewScore};
use crate::render;

/// Raw values of `#scoreForm`.
#[derive(Clone, Debug, Default)]
pub struct ScoreForm {
    pub contestant_id: String,
    pub game_id: String,
    pub score: String,
}

impl ScoreForm {
    pub fn parse(&self) -> Result<NewScore, FormError> {
        Ok(NewScore {
            contestant_id: parse_id("contestant", &self.contestant_id)?,
            game_id: parse_id("game", &self.game_id)?,
            score: parse_score(&self.score)?,
        })
    }
}

/// Raw values of `#gameForm`.
#[derive(Clone, Debug, Default)]
pub struct GameForm {
    pub name: String,
}

fn parse_id(field: &'static str, value: &str) -> Result<i64, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::Missing(field));
    }
    trimmed.parse::<i64>().map_err(|_| FormError::Invalid {
        field,
        value: trimmed.to_string(),
    })
}

fn parse_score(value: &str) -> Result<f64, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::Missing("score"));
    }
    match trimmed.parse::<f64>() {
        Ok(score) if score.is_finite() => Ok(score),
        _ => Err(FormError::Invalid {
            field: "score",
            value: trimmed.to_string(),
        }),
    }
}

impl Dashboard {
    pub async fn load_active_games(&self) {
        match self.api.list_games().await {
            Ok(games) => {
                self.view
                    .render(Region::ActiveGames, &render::games_list(&games));
                self.view
                    .render(Region::GameSelect, &render::game_options(&games));
            }
            Err(err) => self
                .view
                .show(Alert::danger(err.alert_message("Failed to load active games"))),
        }
    }

    pub async fn toggle_game_status(&self, game_id: i64, active: bool) {
        match self.api.set_game_active(game_id, active).await {
            Ok(_) => {
                let verb = if active { "activated" } else { "deactivated" };
                self.view
                    .show(Alert::success(format!("Game {} successfully", verb)));
                self.load_active_games().await;
            }
            Err(err) => self
                .view
                .show(Alert::danger(err.alert_message("Failed to update game status"))),
        }
    }

    pub fn select_game(&self, game_id: i64) {
        self.view
            .set_field(Form::Score, "game_id", &game_id.to_string());
        self.view.focus_field(Form::Score, "score");
    }

    pub async fn delete_game(&self, game_id: i64) {
        if !self
            .view
            .confirm("Are you sure you want to delete this game?")
        {
            return;
        }
        match self.api.delete_game(game_id).await {
            Ok(_) => {
                self.view.show(Alert::success("Game deleted successfully"));
                self.load_active_games().await;
            }
            Err(err) => self
                .view
                .show(Alert::danger(err.alert_message("Failed to delete game"))),
        }
    }

    pub async fn create_game(&self, form: GameForm) {
        let name = form.name.trim();
        if name.is_empty() {
            self.view
                .show(Alert::danger(FormError::Missing("name").to_string()));
            return;
        }
        let game = NewGame {
            name: name.to_string(),
        };
        match self.api.create_game(&game).await {
            Ok(_) => {
                self.view.show(Alert::success("Game created successfully!"));
                self.view.reset_form(Form::Game);
                self.load_active_games().await;
            }
            Err(err) => self
                .view
                .show(Alert::danger(err.alert_message("Failed to create game"))),
        }
    }

    pub async fn submit_score(&self, form: ScoreForm) {
        let score = match form.parse() {
            Ok(score) => score,
            Err(err) => {
                self.view.show(Alert::danger(err.to_string()));
                return;
            }
        };

        match self.api.submit_score(&score).await {
            Ok(_) => {
                self.view
                    .show(Alert::success("Score submitted successfully!"));
                self.session.remember_contestant(score.contestant_id);
                self.view.reset_form(Form::Score);
                self.view.set_field(
                    Form::Score,
                    "contestant_id",
                    &score.contestant_id.to_string(),
                );
                self.load_recent_scores().await;
            }
            Err(err) => self
                .view
                .show(Alert::danger(err.alert_message("Failed to submit score"))),
        }
    }

    pub async fn load_recent_scores(&self) {
        match self.api.leaderboard().await {
            Ok(entries) => self
                .view
                .render(Region::RecentScores, &render::recent_scores(&entries)),
            Err(err) => self
                .view
                .show(Alert::danger(err.alert_message("Failed to load recent scores"))),
        }
    }
}
