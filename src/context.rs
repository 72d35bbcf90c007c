//! Application Context
//!
//! Shared services provided via Leptos Context API. The query cache and
//! the session are plain `Rc` objects; the context bridges their change
//! notifications into signals so views re-render when the cache moves.

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::ApiClient;
use crate::cache::{QueryKey, QueryValue};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::notify::Notifications;
use crate::query::QueryClient;
use crate::session::Session;

/// Long-lived objects built once at startup
#[derive(Clone)]
pub struct Services {
    pub config: AppConfig,
    pub api: Rc<ApiClient>,
    pub client: QueryClient,
    pub session: Session,
    pub notices: Notifications,
}

/// App-wide handles provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    services: StoredValue<Services, LocalStorage>,
    /// Bumped on every cache change - read
    pub cache_version: ReadSignal<u64>,
    /// Bumped when notices are raised or dismissed - read
    pub notice_version: ReadSignal<u64>,
}

impl AppContext {
    pub fn new(services: Services) -> Self {
        let (cache_version, set_cache_version) = signal(0u64);
        let (notice_version, set_notice_version) = signal(0u64);

        services.client.subscribe(move || set_cache_version.update(|v| *v += 1));
        services.notices.subscribe(move || set_notice_version.update(|v| *v += 1));

        Self {
            services: StoredValue::new_local(services),
            cache_version,
            notice_version,
        }
    }

    pub fn config(&self) -> AppConfig {
        self.services.with_value(|s| s.config.clone())
    }

    pub fn api(&self) -> Rc<ApiClient> {
        self.services.with_value(|s| s.api.clone())
    }

    pub fn client(&self) -> QueryClient {
        self.services.with_value(|s| s.client.clone())
    }

    pub fn session(&self) -> Session {
        self.services.with_value(|s| s.session.clone())
    }

    pub fn notices(&self) -> Notifications {
        self.services.with_value(|s| s.notices.clone())
    }

    /// Cached value for `key`, re-read whenever the cache changes
    pub fn query<T: QueryValue>(&self, key: QueryKey) -> Option<T> {
        self.cache_version.track();
        self.client().get(&key)
    }

    /// Last fetch error recorded on `key`
    pub fn query_error(&self, key: QueryKey) -> Option<ApiError> {
        self.cache_version.track();
        self.client().error(&key)
    }

    /// Nothing to show yet and a fetch is out
    pub fn is_loading(&self, key: QueryKey) -> bool {
        self.cache_version.track();
        let client = self.client();
        client.get_data(&key).is_none() && client.is_fetching(&key)
    }

    /// Fetch `key` in the background if it is missing or stale.
    /// Failures are recorded on the cache entry.
    pub fn load(&self, key: QueryKey) {
        let client = self.client();
        spawn_local(async move {
            let _ = client.ensure(key).await;
        });
    }

    /// Refetch `key` regardless of freshness
    pub fn refresh(&self, key: QueryKey) {
        let client = self.client();
        spawn_local(async move {
            let _ = client.fetch(key).await;
        });
    }
}

pub fn use_app_context() -> AppContext {
    use_context::<AppContext>().expect("AppContext should be provided")
}
