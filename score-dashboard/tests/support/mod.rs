#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::process::{Child, Command, Stdio};
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use futures_util::future::LocalBoxFuture;
use portpicker::pick_unused_port;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use score_dashboard::session::TOKEN_KEY;
use score_dashboard::{
    Alert, AlertPresenter, ApiClient, Dashboard, Form, MemoryStorage, ReqwestTransport, Region,
    Scheduler, Session, Storage, Tab, Timer, TimerHandle, View,
};

pub struct TestServer {
    child: Child,
    base_url: String,
}

impl TestServer {
    pub async fn spawn(api_base: Option<&str>) -> Self {
        let port = pick_unused_port().expect("free port");
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("score-dashboard"));
        cmd.env("PORT", port.to_string())
            .env("RUST_LOG", "warn")
            .env_remove("API_BASE_URL")
            .env_remove("SCORE_API_URL")
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(api_base) = api_base {
            cmd.env("API_BASE_URL", api_base);
        }

        let child = cmd.spawn().expect("spawn score-dashboard");
        let base_url = format!("http://127.0.0.1:{}", port);
        wait_for_ready(&base_url).await;

        Self { child, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

async fn wait_for_ready(base_url: &str) {
    let client = Client::new();
    let health_url = format!("{}/health", base_url);
    for _ in 0..50 {
        if let Ok(response) = client.get(&health_url).send().await {
            if response.status().is_success() {
                return;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not become ready at {}", health_url);
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("json request body")
    }
}

#[derive(Default)]
struct BackendState {
    routes: HashMap<String, (u16, Value)>,
    requests: Vec<RecordedRequest>,
}

/// A stand-in for the score API: canned JSON per `METHOD /path`, and a log
/// of every request it saw. Unknown routes answer 404 with a `detail`.
pub struct MockBackend {
    state: Arc<Mutex<BackendState>>,
    base_url: String,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend addr");
        let state = Arc::new(Mutex::new(BackendState::default()));
        let app = Router::new()
            .fallback(record_request)
            .with_state(Arc::clone(&state));
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            state,
            base_url: format!("http://{}", addr),
            handle,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.state
            .lock()
            .expect("backend state")
            .routes
            .insert(route_key(method, path), (status, body));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().expect("backend state").requests.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.path == path)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.lock().expect("backend state").requests.clear();
    }

    pub fn client(&self) -> ApiClient {
        let transport = ReqwestTransport::new(Duration::from_secs(5)).expect("transport");
        ApiClient::new(Rc::new(transport), &self.base_url)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn route_key(method: &str, path: &str) -> String {
    format!("{} {}", method, path)
}

async fn record_request(
    State(state): State<Arc<Mutex<BackendState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let request = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    let mut state = state.lock().expect("backend state");
    let reply = state
        .routes
        .get(&route_key(&request.method, &request.path))
        .cloned();
    state.requests.push(request);
    drop(state);

    match reply {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Not Found" })),
        )
            .into_response(),
    }
}

/// Records everything the controllers ask of the page.
pub struct RecordingView {
    pub alerts: RefCell<Vec<Alert>>,
    pub rendered: RefCell<Vec<(Region, String)>>,
    pub navigations: RefCell<Vec<String>>,
    pub confirmations: RefCell<Vec<String>>,
    pub resets: RefCell<Vec<Form>>,
    pub fields: RefCell<Vec<(Form, String, String)>>,
    pub focused: RefCell<Vec<(Form, String)>>,
    pub tabs: RefCell<Vec<Tab>>,
    confirm_answer: Cell<bool>,
}

impl Default for RecordingView {
    fn default() -> Self {
        Self {
            alerts: RefCell::new(Vec::new()),
            rendered: RefCell::new(Vec::new()),
            navigations: RefCell::new(Vec::new()),
            confirmations: RefCell::new(Vec::new()),
            resets: RefCell::new(Vec::new()),
            fields: RefCell::new(Vec::new()),
            focused: RefCell::new(Vec::new()),
            tabs: RefCell::new(Vec::new()),
            confirm_answer: Cell::new(true),
        }
    }
}

impl RecordingView {
    pub fn answer_confirm(&self, answer: bool) {
        self.confirm_answer.set(answer);
    }

    /// Latest markup written to `region`.
    pub fn region(&self, region: Region) -> Option<String> {
        self.rendered
            .borrow()
            .iter()
            .rev()
            .find(|(rendered, _)| *rendered == region)
            .map(|(_, html)| html.clone())
    }

    pub fn render_count(&self, region: Region) -> usize {
        self.rendered
            .borrow()
            .iter()
            .filter(|(rendered, _)| *rendered == region)
            .count()
    }

    pub fn last_alert(&self) -> Option<Alert> {
        self.alerts.borrow().last().cloned()
    }
}

impl AlertPresenter for RecordingView {
    fn show(&self, alert: Alert) {
        self.alerts.borrow_mut().push(alert);
    }
}

impl View for RecordingView {
    fn render(&self, region: Region, html: &str) {
        self.rendered.borrow_mut().push((region, html.to_string()));
    }

    fn confirm(&self, message: &str) -> bool {
        self.confirmations.borrow_mut().push(message.to_string());
        self.confirm_answer.get()
    }

    fn navigate(&self, path: &str) {
        self.navigations.borrow_mut().push(path.to_string());
    }

    fn reset_form(&self, form: Form) {
        self.resets.borrow_mut().push(form);
    }

    fn set_field(&self, form: Form, field: &str, value: &str) {
        self.fields
            .borrow_mut()
            .push((form, field.to_string(), value.to_string()));
    }

    fn focus_field(&self, form: Form, field: &str) {
        self.focused.borrow_mut().push((form, field.to_string()));
    }

    fn show_tab(&self, tab: &Tab) {
        self.tabs.borrow_mut().push(tab.clone());
    }
}

type Tick = Rc<RefCell<Box<dyn FnMut()>>>;

#[derive(Default)]
struct SchedulerState {
    next_id: Cell<u64>,
    timers: RefCell<BTreeMap<u64, (u32, Tick)>>,
    spawned: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

/// Timers fire only when the test says so; spawned tasks run on demand.
#[derive(Default)]
pub struct ManualScheduler {
    state: Rc<SchedulerState>,
}

struct ManualTimer {
    id: u64,
    state: Weak<SchedulerState>,
}

impl TimerHandle for ManualTimer {}

impl Drop for ManualTimer {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.timers.borrow_mut().remove(&self.id);
        }
    }
}

impl ManualScheduler {
    pub fn live_timers(&self) -> usize {
        self.state.timers.borrow().len()
    }

    pub fn periods(&self) -> Vec<u32> {
        self.state
            .timers
            .borrow()
            .values()
            .map(|(period, _)| *period)
            .collect()
    }

    /// Runs one tick of every live timer.
    pub fn fire_all(&self) {
        let ticks: Vec<Tick> = self
            .state
            .timers
            .borrow()
            .values()
            .map(|(_, tick)| Rc::clone(tick))
            .collect();
        for tick in ticks {
            (*tick.borrow_mut())();
        }
    }

    pub async fn run_spawned(&self) {
        loop {
            let tasks: Vec<_> = self.state.spawned.borrow_mut().drain(..).collect();
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                task.await;
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> Timer {
        let id = self.state.next_id.get();
        self.state.next_id.set(id + 1);
        self.state
            .timers
            .borrow_mut()
            .insert(id, (period_ms, Rc::new(RefCell::new(tick))));
        Box::new(ManualTimer {
            id,
            state: Rc::downgrade(&self.state),
        })
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.state.spawned.borrow_mut().push(task);
    }
}

pub struct Harness {
    pub backend: MockBackend,
    pub storage: Rc<MemoryStorage>,
    pub session: Rc<Session>,
    pub view: Rc<RecordingView>,
    pub scheduler: Rc<ManualScheduler>,
}

impl Harness {
    /// A backend with empty lists for every page-load request.
    pub async fn new(token: Option<&str>) -> Self {
        let backend = MockBackend::start().await;
        backend.respond("GET", "/games/", 200, json!([]));
        backend.respond("GET", "/leaderboard/", 200, json!([]));
        backend.respond("GET", "/contestants/", 200, json!([]));
        backend.respond("GET", "/games/popularity/", 200, json!([]));
        backend.respond(
            "GET",
            "/users/me",
            200,
            json!({ "id": 1, "username": "alice", "email": "alice@example.com" }),
        );

        let storage = Rc::new(match token {
            Some(token) => MemoryStorage::with_token(token),
            None => MemoryStorage::new(),
        });
        let session = Rc::new(Session::load(Rc::clone(&storage) as Rc<dyn Storage>));
        Self {
            backend,
            storage,
            session,
            view: Rc::new(RecordingView::default()),
            scheduler: Rc::new(ManualScheduler::default()),
        }
    }

    pub fn dashboard(&self) -> Rc<Dashboard> {
        Dashboard::new(
            self.backend.client(),
            Rc::clone(&self.session),
            Rc::clone(&self.view) as Rc<dyn View>,
            Rc::clone(&self.scheduler) as Rc<dyn Scheduler>,
        )
    }

    pub fn stored_token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY)
    }
}

pub fn game(id: i64, name: &str, is_active: bool) -> Value {
    json!({ "id": id, "name": name, "is_active": is_active })
}

pub fn leaderboard_entry(game_name: &str, score: f64) -> Value {
    json!({
        "contestant_name": "alice",
        "game_name": game_name,
        "score": score,
        "timestamp": "2024-03-01T12:30:00"
    })
}
