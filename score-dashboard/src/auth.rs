use std::rc::Rc;

use tracing::info;

use crate::alert::{Alert, AlertMessage};
use crate::api::ApiClient;
use crate::dashboard::{Tab, View, DASHBOARD_PATH, LOGIN_PATH};
use crate::errors::ApiError;
use crate::models::{Credentials, Registration};
use crate::session::Session;

/// Raw values of `#loginForm`.
#[derive(Clone, Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Raw values of `#registerForm`.
#[derive(Clone, Debug, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login page controller. Requests carry no token.
pub struct AuthFlow {
    api: ApiClient,
    session: Rc<Session>,
    view: Rc<dyn View>,
}

impl AuthFlow {
    pub fn new(api: ApiClient, session: Rc<Session>, view: Rc<dyn View>) -> Self {
        Self {
            api: api.with_token(None),
            session,
            view,
        }
    }

    /// Sends an already signed-in visitor of `/` straight to the dashboard.
    pub fn redirect_if_authenticated(&self, path: &str) -> bool {
        if self.session.is_authenticated() && path == LOGIN_PATH {
            self.view.navigate(DASHBOARD_PATH);
            return true;
        }
        false
    }

    pub async fn login(&self, form: LoginForm) {
        let credentials = Credentials {
            username: form.username,
            password: form.password,
        };
        match self.api.login(&credentials).await {
            Ok(token) => {
                info!(username = %credentials.username, "logged in");
                self.session.store_token(&token.access_token);
                self.view.navigate(DASHBOARD_PATH);
            }
            Err(err) => self.view.show(Alert::danger(failure_message(&err, "Login failed"))),
        }
    }

    pub async fn register(&self, form: RegisterForm) {
        let registration = Registration {
            username: form.username,
            email: form.email,
            password: form.password,
        };
        match self.api.register(&registration).await {
            Ok(_) => {
                self.view
                    .show(Alert::success("Registration successful! Please login."));
                self.view.show_tab(&Tab::Login);
            }
            Err(err) => self
                .view
                .show(Alert::danger(failure_message(&err, "Registration failed"))),
        }
    }
}

/// Server detail first, then the transport's own message, then `fallback`.
fn failure_message(err: &ApiError, fallback: &str) -> AlertMessage {
    match err {
        ApiError::Transport(message) => AlertMessage::Text(message.clone()),
        _ => err.alert_message(fallback),
    }
}
