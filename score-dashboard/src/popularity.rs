use std::rc::Rc;

use tracing::debug;

use crate::alert::Alert;
use crate::dashboard::{Dashboard, Region, REFRESH_INTERVAL_MS};
use crate::render;

impl Dashboard {
    pub async fn load_game_popularity(&self) {
        match self.api.game_popularity().await {
            Ok(records) => self.view.render(
                Region::PopularityContent,
                &render::popularity_table(&records),
            ),
            Err(err) => self
                .view
                .show(Alert::danger(err.alert_message("Failed to load game popularity"))),
        }
    }

    /// Replaces any running popularity schedule with a fresh 30 s one and
    /// loads immediately. A failed load leaves the schedule running.
    pub async fn start_popularity_refresh(self: &Rc<Self>) {
        self.session.stop_popularity_timer();

        let weak = Rc::downgrade(self);
        let scheduler = Rc::clone(&self.scheduler);
        let timer = self.scheduler.every(
            REFRESH_INTERVAL_MS,
            Box::new(move || {
                if let Some(dashboard) = weak.upgrade() {
                    scheduler.spawn(Box::pin(async move {
                        dashboard.load_game_popularity().await;
                    }));
                }
            }),
        );
        self.session.replace_popularity_timer(timer);
        debug!(period_ms = REFRESH_INTERVAL_MS, "popularity refresh started");

        self.load_game_popularity().await;
    }

    pub fn stop_popularity_refresh(&self) {
        self.session.stop_popularity_timer();
    }
}
