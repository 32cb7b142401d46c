use std::rc::Rc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::errors::ApiError;
use crate::models::{
    Contestant, Credentials, Game, GamePopularity, LeaderboardEntry, NewContestant, NewGame,
    NewScore, Registration, TokenResponse, User,
};

const LOCAL_API_BASE: &str = "http://localhost:8000";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::Get)
    }

    pub fn put() -> Self {
        Self::new(Method::Put)
    }

    pub fn delete() -> Self {
        Self::new(Method::Delete)
    }

    pub fn post_json<T: Serialize>(payload: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(payload).map_err(|err| ApiError::Decode(err.to_string()))?;
        Ok(Self::new(Method::Post)
            .header("Content-Type", "application/json")
            .body(RequestBody::Json(value)))
    }

    pub fn post_form(fields: Vec<(String, String)>) -> Self {
        Self::new(Method::Post)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(RequestBody::Form(fields))
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }
}

#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves one request over the wire. Transport errors only; status handling
/// belongs to [`ApiClient`].
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Rc<dyn Transport>,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(transport: Rc<dyn Transport>, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}{}", self.base_url, endpoint))?)
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.endpoint_url(endpoint)?;
        self.call_url(url, options).await
    }

    async fn call_url<T: DeserializeOwned>(
        &self,
        url: Url,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let RequestOptions {
            method,
            mut headers,
            body,
        } = options;
        if let Some(token) = &self.token {
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        debug!(method = method.as_str(), url = %url, "api request");
        let response = self
            .transport
            .send(ApiRequest {
                method,
                url: url.clone(),
                headers,
                body,
            })
            .await
            .inspect_err(|err| warn!(url = %url, %err, "api transport failed"))?;

        let body = parse_body(&response.body);
        if !response.is_success() {
            warn!(url = %url, status = response.status, "api request rejected");
            return Err(ApiError::Status {
                status: response.status,
                body,
            });
        }

        serde_json::from_value(body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    pub async fn list_games(&self) -> Result<Vec<Game>, ApiError> {
        self.call("/games/", RequestOptions::get()).await
    }

    pub async fn create_game(&self, game: &NewGame) -> Result<Value, ApiError> {
        self.call("/games/", RequestOptions::post_json(game)?).await
    }

    pub async fn delete_game(&self, game_id: i64) -> Result<Value, ApiError> {
        self.call(&format!("/games/{}", game_id), RequestOptions::delete())
            .await
    }

    /// `start` when `active`, `end` otherwise.
    pub async fn set_game_active(
        &self,
        game_id: i64,
        active: bool,
    ) -> Result<Value, ApiError> {
        let action = if active { "start" } else { "end" };
        self.call(&format!("/games/{}/{}", game_id, action), RequestOptions::put())
            .await
    }

    pub async fn submit_score(&self, score: &NewScore) -> Result<Value, ApiError> {
        self.call("/scores/", RequestOptions::post_json(score)?).await
    }

    /// Recent scores, newest first as the backend orders them.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ApiError> {
        self.call("/leaderboard/", RequestOptions::get()).await
    }

    pub async fn game_popularity(&self) -> Result<Vec<GamePopularity>, ApiError> {
        self.call("/games/popularity/", RequestOptions::get()).await
    }

    pub async fn list_contestants(&self) -> Result<Vec<Contestant>, ApiError> {
        self.call("/contestants/", RequestOptions::get()).await
    }

    pub async fn create_contestant(
        &self,
        contestant: &NewContestant,
    ) -> Result<Value, ApiError> {
        self.call("/contestants/", RequestOptions::post_json(contestant)?)
            .await
    }

    pub async fn delete_contestant(&self, contestant_id: i64) -> Result<Value, ApiError> {
        self.call(
            &format!("/contestants/{}", contestant_id),
            RequestOptions::delete(),
        )
        .await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let fields = vec![
            ("username".to_string(), credentials.username.clone()),
            ("password".to_string(), credentials.password.clone()),
        ];
        self.call("/token", RequestOptions::post_form(fields)).await
    }

    pub async fn register(&self, registration: &Registration) -> Result<Value, ApiError> {
        self.call("/register", RequestOptions::post_json(registration)?)
            .await
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.call("/users/me", RequestOptions::get()).await
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or(Value::Null)
}

/// Picks the backend address: a configured value wins, a page served from
/// `localhost` talks to the local backend, anything else to its own origin.
pub fn resolve_api_base(configured: Option<&str>, hostname: &str, origin: &str) -> String {
    if let Some(value) = configured {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return trimmed.trim_end_matches('/').to_string();
        }
    }
    if hostname == "localhost" {
        return LOCAL_API_BASE.to_string();
    }
    origin.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::executor::block_on;
    use serde_json::json;

    use super::*;

    struct StubTransport {
        status: u16,
        body: String,
        seen: RefCell<Vec<ApiRequest>>,
    }

    impl StubTransport {
        fn new(status: u16, body: &str) -> Rc<Self> {
            Rc::new(Self {
                status,
                body: body.to_string(),
                seen: RefCell::new(Vec::new()),
            })
        }
    }

    #[async_trait(?Send)]
    impl Transport for StubTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
            self.seen.borrow_mut().push(request);
            Ok(ApiResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn header<'a>(request: &'a ApiRequest, name: &str) -> Option<&'a str> {
        request
            .headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn attaches_bearer_token_and_json_body() {
        let transport = StubTransport::new(
            200,
            r#"{"id": 9, "contestant_id": 2, "game_id": 3, "score": 42.5}"#,
        );
        let client = ApiClient::new(transport.clone(), "http://api.test/")
            .with_token(Some("tok".to_string()));
        let score = NewScore {
            contestant_id: 2,
            game_id: 3,
            score: 42.5,
        };
        let echo = block_on(client.submit_score(&score)).expect("score");
        assert_eq!(echo["id"], json!(9));

        let seen = transport.seen.borrow();
        let request = &seen[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url.as_str(), "http://api.test/scores/");
        assert_eq!(header(request, "authorization"), Some("Bearer tok"));
        assert_eq!(header(request, "content-type"), Some("application/json"));
        assert_eq!(
            request.body,
            RequestBody::Json(json!({ "contestant_id": 2, "game_id": 3, "score": 42.5 }))
        );
    }

    #[test]
    fn login_posts_form_without_token() {
        let transport = StubTransport::new(200, r#"{"access_token": "abc", "token_type": "bearer"}"#);
        let client = ApiClient::new(transport.clone(), "http://api.test");
        let token = block_on(client.login(&Credentials {
            username: "alice".to_string(),
            password: "secret".to_string(),
        }))
        .expect("token");
        assert_eq!(token.access_token, "abc");

        let seen = transport.seen.borrow();
        assert!(header(&seen[0], "authorization").is_none());
        assert_eq!(
            seen[0].body,
            RequestBody::Form(vec![
                ("username".to_string(), "alice".to_string()),
                ("password".to_string(), "secret".to_string()),
            ])
        );
    }

    #[test]
    fn failed_status_carries_parsed_body() {
        let transport = StubTransport::new(404, r#"{"detail": "Game not found"}"#);
        let client = ApiClient::new(transport, "http://api.test");
        let err = block_on(client.delete_game(7)).expect_err("should fail");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.detail(), Some(&json!("Game not found")));
    }

    #[test]
    fn non_json_failure_has_no_detail() {
        let transport = StubTransport::new(502, "<html>bad gateway</html>");
        let client = ApiClient::new(transport, "http://api.test");
        let err = block_on(client.list_games()).expect_err("should fail");
        assert!(err.detail().is_none());
    }

    #[test]
    fn write_replies_of_any_shape_are_accepted() {
        let client =
            |status: u16, body: &str| ApiClient::new(StubTransport::new(status, body), "http://api.test");
        let registration = Registration {
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let reply = block_on(
            client(200, r#"{"message": "User created"}"#).register(&registration),
        )
        .expect("register");
        assert_eq!(reply["message"], json!("User created"));

        let score = NewScore {
            contestant_id: 2,
            game_id: 3,
            score: 42.5,
        };
        let echo = r#"{"contestant_id": 2, "game_id": 3, "score": 42.5}"#;
        block_on(client(201, echo).submit_score(&score)).expect("score without id");
        block_on(client(204, "").delete_game(4)).expect("empty delete reply");
        block_on(client(200, "null").set_game_active(4, true)).expect("null start reply");
        block_on(client(200, r#"{"ok": true}"#).create_game(&NewGame {
            name: "Darts".to_string(),
        }))
        .expect("game without id");
    }

    #[test]
    fn recent_scores_use_the_bare_leaderboard_endpoint() {
        let transport = StubTransport::new(200, "[]");
        let client = ApiClient::new(transport.clone(), "http://api.test");
        let rows = block_on(client.leaderboard()).expect("rows");
        assert!(rows.is_empty());
        assert_eq!(
            transport.seen.borrow()[0].url.as_str(),
            "http://api.test/leaderboard/"
        );
    }

    #[test]
    fn toggle_maps_to_start_and_end() {
        let transport = StubTransport::new(200, r#"{"message": "Game ended"}"#);
        let client = ApiClient::new(transport.clone(), "http://api.test");
        block_on(client.set_game_active(3, false)).expect("end");
        block_on(client.set_game_active(3, true)).expect("start");
        let seen = transport.seen.borrow();
        assert_eq!(seen[0].method, Method::Put);
        assert_eq!(seen[0].url.path(), "/games/3/end");
        assert_eq!(seen[1].url.path(), "/games/3/start");
    }

    #[test]
    fn api_base_resolution() {
        assert_eq!(
            resolve_api_base(Some(" https://scores.example/ "), "localhost", "http://localhost:8080"),
            "https://scores.example"
        );
        assert_eq!(
            resolve_api_base(Some(""), "localhost", "http://localhost:8080"),
            "http://localhost:8000"
        );
        assert_eq!(
            resolve_api_base(None, "scores.example", "https://scores.example"),
            "https://scores.example"
        );
    }
}
