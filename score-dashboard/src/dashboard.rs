use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use tracing::{info, warn};

use crate::alert::AlertPresenter;
use crate::api::ApiClient;
use crate::render;
use crate::session::{Session, Timer};

pub const REFRESH_INTERVAL_MS: u32 = 30_000;
pub const LOGIN_PATH: &str = "/";
pub const DASHBOARD_PATH: &str = "/game-dashboard/";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    ActiveGames,
    GameSelect,
    RecentScores,
    PopularityContent,
    ContestantsList,
    ContestantSelects,
    CurrentUser,
}

impl Region {
    pub fn selector(self) -> &'static str {
        match self {
            Region::ActiveGames => "#activeGames",
            Region::GameSelect => "select[name=\"game_id\"]",
            Region::RecentScores => "#recentScores",
            Region::PopularityContent => "#popularityContent",
            Region::ContestantsList => "#contestantsList",
            Region::ContestantSelects => "select[name=\"contestant_id\"]",
            Region::CurrentUser => "#currentUser",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Form {
    Login,
    Register,
    Score,
    Contestant,
    Game,
}

impl Form {
    pub fn selector(self) -> &'static str {
        match self {
            Form::Login => "#loginForm",
            Form::Register => "#registerForm",
            Form::Score => "#scoreForm",
            Form::Contestant => "#contestantForm",
            Form::Game => "#gameForm",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tab {
    Login,
    Register,
    Popularity,
    Other(String),
}

impl Tab {
    /// Tabs are anchors whose `href` is `#<name>`.
    pub fn from_href(href: &str) -> Self {
        match href.trim().trim_start_matches('#') {
            "login" => Tab::Login,
            "register" => Tab::Register,
            "popularity" => Tab::Popularity,
            other => Tab::Other(other.to_string()),
        }
    }

    pub fn href(&self) -> String {
        match self {
            Tab::Login => "#login".to_string(),
            Tab::Register => "#register".to_string(),
            Tab::Popularity => "#popularity".to_string(),
            Tab::Other(name) => format!("#{}", name),
        }
    }
}

/// Everything the managers need from the page. Selectors are fixed by
/// [`Region`] and [`Form`].
pub trait View: AlertPresenter {
    /// Replaces the content of every element matching `region`.
    fn render(&self, region: Region, html: &str);
    fn confirm(&self, message: &str) -> bool;
    fn navigate(&self, path: &str);
    fn reset_form(&self, form: Form);
    fn set_field(&self, form: Form, field: &str, value: &str);
    fn focus_field(&self, form: Form, field: &str);
    fn show_tab(&self, tab: &Tab);
}

pub trait Scheduler {
    fn every(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> Timer;
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Shared context for the dashboard page: one API client, one session, one
/// view. Manager operations live in `games`, `contestants` and `popularity`.
pub struct Dashboard {
    pub(crate) api: ApiClient,
    pub(crate) session: Rc<Session>,
    pub(crate) view: Rc<dyn View>,
    pub(crate) scheduler: Rc<dyn Scheduler>,
}

impl Dashboard {
    pub fn new(
        api: ApiClient,
        session: Rc<Session>,
        view: Rc<dyn View>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Rc<Self> {
        let api = api.with_token(session.token().map(str::to_string));
        Rc::new(Self {
            api,
            session,
            view,
            scheduler,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Page-load sequence. Returns `false` after redirecting an
    /// unauthenticated visitor to the login page.
    pub async fn init(self: &Rc<Self>, active_tab: Option<Tab>) -> bool {
        if !self.session.is_authenticated() {
            info!("no auth token; redirecting to login");
            self.view.navigate(LOGIN_PATH);
            return false;
        }

        futures_util::join!(
            self.load_active_games(),
            self.load_recent_scores(),
            self.load_contestants(),
            self.load_current_user(),
        );
        self.start_leaderboard_refresh();

        if active_tab == Some(Tab::Popularity) {
            self.start_popularity_refresh().await;
        }
        true
    }

    /// Popularity polls only while its tab is shown.
    pub async fn activate_tab(self: &Rc<Self>, tab: Tab) {
        if tab == Tab::Popularity {
            self.start_popularity_refresh().await;
        } else {
            self.stop_popularity_refresh();
        }
    }

    pub fn logout(&self) {
        self.session.clear();
        self.view.navigate(LOGIN_PATH);
    }

    fn start_leaderboard_refresh(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let scheduler = Rc::clone(&self.scheduler);
        let timer = self.scheduler.every(
            REFRESH_INTERVAL_MS,
            Box::new(move || {
                if let Some(dashboard) = weak.upgrade() {
                    scheduler.spawn(Box::pin(async move {
                        dashboard.load_recent_scores().await;
                    }));
                }
            }),
        );
        self.session.set_leaderboard_timer(timer);
    }

    async fn load_current_user(&self) {
        match self.api.current_user().await {
            Ok(user) => self
                .view
                .render(Region::CurrentUser, &render::current_user(&user.username)),
            Err(err) => warn!(%err, "failed to load current user"),
        }
    }
}
