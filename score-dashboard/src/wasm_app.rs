use std::rc::Rc;

use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use gloo_timers::callback::{Interval, Timeout};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Document, Element, FormData, Headers, HtmlElement, HtmlFormElement, HtmlInputElement,
    HtmlSelectElement, RequestInit,
};

use crate::alert::{Alert, AlertPresenter};
use crate::api::{resolve_api_base, ApiClient, ApiRequest, ApiResponse, RequestBody, Transport};
use crate::auth::{AuthFlow, LoginForm, RegisterForm};
use crate::contestants::ContestantForm;
use crate::dashboard::{Dashboard, Form, Region, Scheduler, Tab, View};
use crate::errors::ApiError;
use crate::games::{GameForm, ScoreForm};
use crate::session::{Session, Storage, Timer, TimerHandle};

fn window() -> web_sys::Window {
    web_sys::window().expect("window")
}

fn js_error_message(err: JsValue, fallback: &str) -> String {
    if let Some(message) = err.as_string() {
        return message;
    }
    if let Ok(error) = err.dyn_into::<js_sys::Error>() {
        return error.message().into();
    }
    fallback.to_string()
}

struct FetchTransport;

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        fetch(request)
            .await
            .map_err(|err| ApiError::Transport(js_error_message(err, "Failed to fetch")))
    }
}

async fn fetch(request: ApiRequest) -> Result<ApiResponse, JsValue> {
    let headers = Headers::new()?;
    for (name, value) in &request.headers {
        headers.append(name, value)?;
    }

    let init = RequestInit::new();
    init.set_method(request.method.as_str());
    init.set_headers(&headers);
    match &request.body {
        RequestBody::Empty => {}
        RequestBody::Json(value) => init.set_body(&JsValue::from_str(&value.to_string())),
        RequestBody::Form(fields) => {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields.iter())
                .finish();
            init.set_body(&JsValue::from_str(&encoded));
        }
    }

    let js_request = web_sys::Request::new_with_str_and_init(request.url.as_str(), &init)?;
    let response = JsFuture::from(window().fetch_with_request(&js_request)).await?;
    let response: web_sys::Response = response.dyn_into()?;
    let text = JsFuture::from(response.text()?).await?;
    Ok(ApiResponse {
        status: response.status(),
        body: text.as_string().unwrap_or_default(),
    })
}

struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

impl LocalStorage {
    fn new(window: &web_sys::Window) -> Self {
        Self {
            storage: window.local_storage().ok().flatten(),
        }
    }
}

impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.set_item(key, value);
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.remove_item(key);
        }
    }
}

impl TimerHandle for Interval {}

struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn every(&self, period_ms: u32, mut tick: Box<dyn FnMut()>) -> Timer {
        Box::new(Interval::new(period_ms, move || tick()))
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        spawn_local(task);
    }
}

struct BrowserView {
    document: Document,
}

impl BrowserView {
    fn form(&self, form: Form) -> Option<HtmlFormElement> {
        self.document
            .query_selector(form.selector())
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlFormElement>().ok())
    }

    fn field(&self, form: Form, field: &str) -> Option<Element> {
        self.form(form)?
            .query_selector(&format!("[name=\"{}\"]", field))
            .ok()
            .flatten()
    }
}

impl AlertPresenter for BrowserView {
    fn show(&self, alert: Alert) {
        let container = match self.document.get_element_by_id("alerts") {
            Some(el) => el,
            None => {
                tracing::warn!(alert = %alert.message, "no #alerts container");
                return;
            }
        };
        let notice = match self.document.create_element("div") {
            Ok(el) => el,
            Err(_) => return,
        };
        notice.set_class_name(&alert.class_name());
        let _ = notice.set_attribute("role", "alert");
        notice.set_inner_html(&alert.inner_html());
        let _ = container.append_child(&notice);

        if let Ok(Some(button)) = notice.query_selector(".btn-close") {
            let target = notice.clone();
            let handler = Closure::wrap(Box::new(move |_event: web_sys::Event| {
                target.remove();
            }) as Box<dyn FnMut(web_sys::Event)>);
            let _ = button.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref());
            handler.forget();
        }

        let target = notice.clone();
        Timeout::new(alert.lifetime_ms(), move || {
            if target.is_connected() {
                target.remove();
            }
        })
        .forget();
    }
}

impl View for BrowserView {
    fn render(&self, region: Region, html: &str) {
        if let Ok(nodes) = self.document.query_selector_all(region.selector()) {
            for index in 0..nodes.length() {
                if let Some(node) = nodes.item(index) {
                    if let Ok(el) = node.dyn_into::<Element>() {
                        el.set_inner_html(html);
                    }
                }
            }
        }
    }

    fn confirm(&self, message: &str) -> bool {
        window().confirm_with_message(message).unwrap_or(false)
    }

    fn navigate(&self, path: &str) {
        let _ = window().location().set_href(path);
    }

    fn reset_form(&self, form: Form) {
        if let Some(form) = self.form(form) {
            form.reset();
        }
    }

    fn set_field(&self, form: Form, field: &str, value: &str) {
        let el = match self.field(form, field) {
            Some(el) => el,
            None => return,
        };
        match el.dyn_into::<HtmlSelectElement>() {
            Ok(select) => select.set_value(value),
            Err(el) => {
                if let Ok(input) = el.dyn_into::<HtmlInputElement>() {
                    input.set_value(value);
                }
            }
        }
    }

    fn focus_field(&self, form: Form, field: &str) {
        if let Some(el) = self
            .field(form, field)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        {
            let _ = el.focus();
        }
    }

    fn show_tab(&self, tab: &Tab) {
        let selector = format!("a[href=\"{}\"]", tab.href());
        if let Some(link) = self
            .document
            .query_selector(&selector)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        {
            link.click();
        }
    }
}

fn meta_content(document: &Document, name: &str) -> Option<String> {
    document
        .query_selector(&format!("meta[name=\"{}\"]", name))
        .ok()
        .flatten()
        .and_then(|meta| meta.get_attribute("content"))
}

fn form_value(form: &HtmlFormElement, name: &str) -> String {
    FormData::new_with_form(form)
        .ok()
        .and_then(|data| data.get(name).as_string())
        .unwrap_or_default()
}

fn data_id(el: &Element, attribute: &str) -> Option<i64> {
    el.get_attribute(attribute)?.parse::<i64>().ok()
}

fn on_submit<F>(document: &Document, form: Form, handler: F)
where
    F: Fn(HtmlFormElement) + 'static,
{
    let element = match document
        .query_selector(form.selector())
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlFormElement>().ok())
    {
        Some(element) => element,
        None => return,
    };
    let target = element.clone();
    let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
        event.prevent_default();
        handler(target.clone());
    }) as Box<dyn FnMut(web_sys::Event)>);
    let _ = element.add_event_listener_with_callback("submit", closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Delegated clicks on `[data-action]` descendants of `root`.
fn on_action<F>(root: &Element, handler: F)
where
    F: Fn(&str, &Element) + 'static,
{
    let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
        let target = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .and_then(|target| target.closest("[data-action]").ok().flatten());
        if let Some(target) = target {
            if let Some(action) = target.get_attribute("data-action") {
                handler(&action, &target);
            }
        }
    }) as Box<dyn FnMut(web_sys::Event)>);
    let _ = root.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn on_click<F>(el: &Element, handler: F)
where
    F: Fn(&Element) + 'static,
{
    let target = el.clone();
    let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
        handler(&target);
    }) as Box<dyn FnMut(web_sys::Event)>);
    let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn wire_dashboard(document: &Document, dashboard: &Rc<Dashboard>) {
    let d = Rc::clone(dashboard);
    on_submit(document, Form::Score, move |form| {
        let values = ScoreForm {
            contestant_id: form_value(&form, "contestant_id"),
            game_id: form_value(&form, "game_id"),
            score: form_value(&form, "score"),
        };
        let d = Rc::clone(&d);
        spawn_local(async move { d.submit_score(values).await });
    });

    let d = Rc::clone(dashboard);
    on_submit(document, Form::Game, move |form| {
        let values = GameForm {
            name: form_value(&form, "name"),
        };
        let d = Rc::clone(&d);
        spawn_local(async move { d.create_game(values).await });
    });

    let d = Rc::clone(dashboard);
    on_submit(document, Form::Contestant, move |form| {
        let values = ContestantForm {
            name: form_value(&form, "name"),
            email: form_value(&form, "email"),
        };
        let d = Rc::clone(&d);
        spawn_local(async move { d.create_contestant(values).await });
    });

    if let Some(games) = document.get_element_by_id("activeGames") {
        let d = Rc::clone(dashboard);
        on_action(&games, move |action, target| {
            let game_id = match data_id(target, "data-game-id") {
                Some(id) => id,
                None => return,
            };
            let d = Rc::clone(&d);
            match action {
                "toggle-game" => {
                    let activate = target.get_attribute("data-activate").as_deref() == Some("true");
                    spawn_local(async move { d.toggle_game_status(game_id, activate).await });
                }
                "select-game" => d.select_game(game_id),
                "delete-game" => spawn_local(async move { d.delete_game(game_id).await }),
                _ => {}
            }
        });
    }

    if let Some(contestants) = document.get_element_by_id("contestantsList") {
        let d = Rc::clone(dashboard);
        on_action(&contestants, move |action, target| {
            if action != "delete-contestant" {
                return;
            }
            if let Some(contestant_id) = data_id(target, "data-contestant-id") {
                let d = Rc::clone(&d);
                spawn_local(async move { d.delete_contestant(contestant_id).await });
            }
        });
    }

    if let Ok(buttons) = document.query_selector_all("[data-action=\"logout\"]") {
        for index in 0..buttons.length() {
            if let Some(button) = buttons.item(index).and_then(|node| node.dyn_into::<Element>().ok()) {
                let d = Rc::clone(dashboard);
                on_click(&button, move |_| d.logout());
            }
        }
    }

    if let Ok(tabs) = document.query_selector_all(".nav-link") {
        for index in 0..tabs.length() {
            if let Some(tab) = tabs.item(index).and_then(|node| node.dyn_into::<Element>().ok()) {
                let d = Rc::clone(dashboard);
                on_click(&tab, move |link| {
                    let href = link.get_attribute("href").unwrap_or_default();
                    let d = Rc::clone(&d);
                    spawn_local(async move { d.activate_tab(Tab::from_href(&href)).await });
                });
            }
        }
    }
}

fn start_dashboard(document: &Document, dashboard: Rc<Dashboard>) {
    if dashboard.session().is_authenticated() {
        wire_dashboard(document, &dashboard);
    }
    let active_tab = document
        .query_selector(".nav-link.active")
        .ok()
        .flatten()
        .and_then(|tab| tab.get_attribute("href"))
        .map(|href| Tab::from_href(&href));
    spawn_local(async move {
        dashboard.init(active_tab).await;
    });
}

fn start_login(document: &Document, path: &str, flow: Rc<AuthFlow>) {
    if flow.redirect_if_authenticated(path) {
        return;
    }

    let login_flow = Rc::clone(&flow);
    on_submit(document, Form::Login, move |form| {
        let values = LoginForm {
            username: form_value(&form, "username"),
            password: form_value(&form, "password"),
        };
        let flow = Rc::clone(&login_flow);
        spawn_local(async move { flow.login(values).await });
    });

    on_submit(document, Form::Register, move |form| {
        let values = RegisterForm {
            username: form_value(&form, "username"),
            email: form_value(&form, "email"),
            password: form_value(&form, "password"),
        };
        let flow = Rc::clone(&flow);
        spawn_local(async move { flow.register(values).await });
    });
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = window();
    let document = window.document().expect("document");
    let location = window.location();

    let api_base = resolve_api_base(
        meta_content(&document, "api-base").as_deref(),
        &location.hostname().unwrap_or_default(),
        &location.origin().unwrap_or_default(),
    );
    let storage: Rc<dyn Storage> = Rc::new(LocalStorage::new(&window));
    let session = Rc::new(Session::load(storage));
    let view: Rc<dyn View> = Rc::new(BrowserView {
        document: document.clone(),
    });
    let api = ApiClient::new(Rc::new(FetchTransport), &api_base);

    if document.query_selector(Form::Score.selector())?.is_some() {
        let dashboard = Dashboard::new(api, session, view, Rc::new(BrowserScheduler));
        start_dashboard(&document, dashboard);
    } else {
        let path = location.pathname().unwrap_or_default();
        start_login(&document, &path, Rc::new(AuthFlow::new(api, session, view)));
    }

    Ok(())
}
