use crate::render::escape_html;

const LOGIN_TEMPLATE: &str = include_str!("login.html");
const DASHBOARD_TEMPLATE: &str = include_str!("dashboard.html");
const API_BASE_TOKEN: &str = "{{api_base}}";
const CACHE_BUST_TOKEN: &str = "{{cache_bust}}";

/// An empty `api_base` leaves resolution to the browser.
pub fn render_login_page(api_base: &str, cache_bust: &str) -> String {
    fill(LOGIN_TEMPLATE, api_base, cache_bust)
}

pub fn render_dashboard_page(api_base: &str, cache_bust: &str) -> String {
    fill(DASHBOARD_TEMPLATE, api_base, cache_bust)
}

fn fill(template: &str, api_base: &str, cache_bust: &str) -> String {
    template
        .replace(API_BASE_TOKEN, &escape_html(api_base))
        .replace(CACHE_BUST_TOKEN, cache_bust)
}
