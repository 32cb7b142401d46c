use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

pub const TOKEN_KEY: &str = "authToken";
pub const CONTESTANT_ID_KEY: &str = "contestantId";

/// Durable key-value storage (`localStorage` in the browser).
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let storage = Self::new();
        storage.set(TOKEN_KEY, token);
        storage
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// A live periodic schedule. Dropping the handle cancels it.
pub trait TimerHandle {}

pub type Timer = Box<dyn TimerHandle>;

pub struct Session {
    storage: Rc<dyn Storage>,
    token: Option<String>,
    popularity_timer: RefCell<Option<Timer>>,
    leaderboard_timer: RefCell<Option<Timer>>,
}

impl Session {
    /// Reads the token once; later writes to storage do not change it.
    pub fn load(storage: Rc<dyn Storage>) -> Self {
        let token = storage
            .get(TOKEN_KEY)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Self {
            storage,
            token,
            popularity_timer: RefCell::new(None),
            leaderboard_timer: RefCell::new(None),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn store_token(&self, token: &str) {
        self.storage.set(TOKEN_KEY, token);
    }

    pub fn remembered_contestant(&self) -> Option<i64> {
        self.storage
            .get(CONTESTANT_ID_KEY)
            .and_then(|value| value.trim().parse::<i64>().ok())
    }

    pub fn remember_contestant(&self, contestant_id: i64) {
        self.storage
            .set(CONTESTANT_ID_KEY, &contestant_id.to_string());
    }

    /// Drops every persisted key and cancels both timers.
    pub fn clear(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(CONTESTANT_ID_KEY);
        self.stop_popularity_timer();
        self.leaderboard_timer.borrow_mut().take();
    }

    pub fn stop_popularity_timer(&self) -> bool {
        let stopped = self.popularity_timer.borrow_mut().take().is_some();
        if stopped {
            debug!("popularity refresh stopped");
        }
        stopped
    }

    /// Installs `timer` as the only popularity schedule. Callers stop the
    /// previous one before creating `timer`; anything still installed is
    /// dropped here regardless.
    pub fn replace_popularity_timer(&self, timer: Timer) {
        let previous = self.popularity_timer.borrow_mut().replace(timer);
        drop(previous);
    }

    pub fn is_popularity_polling(&self) -> bool {
        self.popularity_timer.borrow().is_some()
    }

    pub fn set_leaderboard_timer(&self, timer: Timer) {
        self.leaderboard_timer.borrow_mut().replace(timer);
    }

    pub fn has_leaderboard_timer(&self) -> bool {
        self.leaderboard_timer.borrow().is_some()
    }
}
