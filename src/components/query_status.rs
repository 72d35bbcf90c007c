//! Query Status Component
//!
//! Loading and error states of one cached query. Access denied and not
//! found are shown as their own states; other failures offer a retry.

use leptos::prelude::*;

use crate::cache::QueryKey;
use crate::context::use_app_context;
use crate::error::ApiError;

#[component]
pub fn QueryStatus(key: QueryKey) -> impl IntoView {
    let ctx = use_app_context();

    move || {
        if ctx.is_loading(key) {
            return view! { <p class="loading">"Loading..."</p> }.into_any();
        }
        match ctx.query_error(key) {
            None => ().into_any(),
            Some(ApiError::AccessDenied(_)) => view! {
                <div class="query-error access-denied">"You don't have access to this."</div>
            }
            .into_any(),
            Some(ApiError::NotFound(_)) => view! {
                <div class="query-error not-found">"This no longer exists."</div>
            }
            .into_any(),
            Some(err) => view! {
                <div class="query-error">
                    <span>{err.user_message()}</span>
                    <button type="button" class="retry-btn" on:click=move |_| ctx.refresh(key)>
                        "Retry"
                    </button>
                </div>
            }
            .into_any(),
        }
    }
}
