//! Session Lifecycle
//!
//! The bearer token and the query cache live and die together: login,
//! logout and an expired session (401) all clear both, so nothing cached
//! for one user is visible to the next.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use async_trait::async_trait;

use crate::cache::QueryKey;
use crate::error::{ApiError, ApiResult};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, User};
use crate::query::QueryClient;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Persistence of the session's tokens
pub trait TokenStore {
    fn access_token(&self) -> Option<String>;
    fn store(&self, access: &str, refresh: Option<&str>);
    fn clear(&self);
}

/// Key-value storage the tokens persist to across reloads
pub trait TokenStorage {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<(), String>;
    fn remove(&self, key: &str) -> Result<(), String>;
}

impl TokenStorage for web_sys::Storage {
    fn read(&self, key: &str) -> Option<String> {
        self.get_item(key).ok().flatten()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), String> {
        self.set_item(key, value).map_err(|e| format!("{:?}", e))
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        self.remove_item(key).map_err(|e| format!("{:?}", e))
    }
}

/// Tokens kept for the page and mirrored to a `TokenStorage`.
/// A failed write only loses the session on the next reload.
pub struct PersistedTokenStore<S> {
    storage: S,
    memory: MemoryTokenStore,
}

/// Tokens in the browser's localStorage
pub type BrowserTokenStore = PersistedTokenStore<web_sys::Storage>;

impl BrowserTokenStore {
    /// None when the page has no localStorage
    pub fn open() -> Option<Self> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .map(PersistedTokenStore::new)
    }
}

impl<S: TokenStorage> PersistedTokenStore<S> {
    /// Picks up the tokens a previous page load persisted
    pub fn new(storage: S) -> Self {
        let memory = MemoryTokenStore::default();
        if let Some(access) = storage.read(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty()) {
            memory.store(&access, storage.read(REFRESH_TOKEN_KEY).as_deref());
        }
        Self { storage, memory }
    }
}

impl<S: TokenStorage> TokenStore for PersistedTokenStore<S> {
    fn access_token(&self) -> Option<String> {
        self.memory.access_token()
    }

    fn store(&self, access: &str, refresh: Option<&str>) {
        self.memory.store(access, refresh);
        if let Err(e) = self.storage.write(ACCESS_TOKEN_KEY, access) {
            log::warn!("[SESSION] failed to persist access token, session will not survive a reload: {}", e);
        }
        let refresh_write = match refresh {
            Some(refresh) => self.storage.write(REFRESH_TOKEN_KEY, refresh),
            None => self.storage.remove(REFRESH_TOKEN_KEY),
        };
        if let Err(e) = refresh_write {
            log::warn!("[SESSION] failed to persist refresh token: {}", e);
        }
    }

    fn clear(&self) {
        self.memory.clear();
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.storage.remove(key) {
                log::warn!("[SESSION] failed to remove {} from storage: {}", key, e);
            }
        }
    }
}

/// Tokens held in memory
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RefCell<Option<(String, Option<String>)>>,
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        self.tokens.borrow().as_ref().map(|(a, _)| a.clone())
    }

    fn store(&self, access: &str, refresh: Option<&str>) {
        *self.tokens.borrow_mut() = Some((access.to_string(), refresh.map(str::to_string)));
    }

    fn clear(&self) {
        *self.tokens.borrow_mut() = None;
    }
}

/// Unauthenticated auth endpoints
#[async_trait(?Send)]
pub trait AuthApi {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse>;
    async fn register(&self, request: &RegisterRequest) -> ApiResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Logout,
    Expired,
}

type EndListener = Rc<dyn Fn(SessionEnd)>;

struct SessionInner {
    tokens: Rc<dyn TokenStore>,
    client: QueryClient,
    auth: Rc<dyn AuthApi>,
    listeners: RefCell<Vec<EndListener>>,
}

#[derive(Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
}

#[derive(Clone)]
pub struct WeakSession {
    inner: Weak<SessionInner>,
}

impl WeakSession {
    pub fn upgrade(&self) -> Option<Session> {
        self.inner.upgrade().map(|inner| Session { inner })
    }
}

impl Session {
    pub fn new(tokens: Rc<dyn TokenStore>, client: QueryClient, auth: Rc<dyn AuthApi>) -> Self {
        Self {
            inner: Rc::new(SessionInner {
                tokens,
                client,
                auth,
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakSession {
        WeakSession { inner: Rc::downgrade(&self.inner) }
    }

    pub fn client(&self) -> &QueryClient {
        &self.inner.client
    }

    /// Run after the session ends, e.g. to show the login view
    pub fn on_end(&self, listener: impl Fn(SessionEnd) + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn has_token(&self) -> bool {
        self.inner.tokens.access_token().is_some()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.client.get(&QueryKey::CurrentUser)
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<User> {
        let request = LoginRequest { email: email.trim().to_string(), password: password.to_string() };
        let response = self.inner.auth.login(&request).await?;

        self.inner.client.clear();
        self.inner.tokens.store(&response.access_token, response.refresh_token.as_deref());
        log::info!("[SESSION] logged in as {}", response.username.as_deref().unwrap_or(&request.email));

        match self.load_user().await {
            Ok(user) => Ok(user),
            Err(err) => {
                self.end(SessionEnd::Expired);
                Err(err)
            }
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<String> {
        self.inner.auth.register(request).await
    }

    /// Resume a session from a stored token. None when there is nothing to
    /// resume or the token is no longer accepted.
    pub async fn restore(&self) -> Option<User> {
        if !self.has_token() {
            return None;
        }
        match self.load_user().await {
            Ok(user) => Some(user),
            Err(err) => {
                log::info!("[SESSION] stored token rejected: {}", err);
                self.end(SessionEnd::Expired);
                None
            }
        }
    }

    async fn load_user(&self) -> ApiResult<User> {
        self.inner.client.fetch(QueryKey::CurrentUser).await?;
        self.current_user()
            .ok_or_else(|| ApiError::Decode("current user missing after fetch".to_string()))
    }

    pub fn logout(&self) {
        self.end(SessionEnd::Logout);
    }

    /// The server answered 401
    pub fn expire(&self) {
        self.end(SessionEnd::Expired);
    }

    fn end(&self, reason: SessionEnd) {
        self.inner.tokens.clear();
        self.inner.client.clear();
        log::info!("[SESSION] ended: {:?}", reason);
        let listeners: Vec<EndListener> = self.inner.listeners.borrow().clone();
        for listener in listeners {
            listener(reason);
        }
    }
}
