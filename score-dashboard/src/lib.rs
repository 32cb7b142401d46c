pub mod alert;
pub mod api;
pub mod auth;
pub mod contestants;
pub mod dashboard;
pub mod errors;
pub mod games;
pub mod models;
pub mod popularity;
pub mod render;
pub mod session;

pub use alert::{Alert, AlertKind, AlertMessage, AlertPresenter};
pub use api::{resolve_api_base, ApiClient, Transport};
pub use auth::{AuthFlow, LoginForm, RegisterForm};
pub use contestants::ContestantForm;
pub use dashboard::{Dashboard, Form, Region, Scheduler, Tab, View};
pub use errors::{ApiError, FormError};
pub use games::{GameForm, ScoreForm};
pub use session::{MemoryStorage, Session, Storage, Timer, TimerHandle};

#[cfg(target_arch = "wasm32")]
mod wasm_app;

#[cfg(target_arch = "wasm32")]
pub use wasm_app::*;

#[cfg(not(target_arch = "wasm32"))]
mod template;

#[cfg(not(target_arch = "wasm32"))]
mod transport;

#[cfg(not(target_arch = "wasm32"))]
pub use template::{render_dashboard_page, render_login_page};

#[cfg(not(target_arch = "wasm32"))]
pub use transport::ReqwestTransport;
