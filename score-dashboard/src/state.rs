use std::sync::Arc;

use bytes::Bytes;

use score_dashboard::{render_dashboard_page, render_login_page};

use crate::config::Config;
use crate::util::now_ms;

/// Pages are rendered once at startup and served from memory.
pub(crate) struct AppState {
    pub(crate) login_html: Bytes,
    pub(crate) dashboard_html: Bytes,
    pub(crate) cache_bust: String,
}

impl AppState {
    pub(crate) fn new(config: &Config) -> Arc<Self> {
        let cache_bust = now_ms().to_string();
        let api_base = config.api_base.as_deref().unwrap_or("");
        Arc::new(Self {
            login_html: Bytes::from(render_login_page(api_base, &cache_bust)),
            dashboard_html: Bytes::from(render_dashboard_page(api_base, &cache_bust)),
            cache_bust,
        })
    }
}
