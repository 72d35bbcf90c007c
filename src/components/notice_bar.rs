//! Notice Bar Component
//!
//! Dismissible notifications stacked at the top of the page.

use leptos::prelude::*;

use crate::context::use_app_context;
use crate::notify::NoticeLevel;

#[component]
pub fn NoticeBar() -> impl IntoView {
    let ctx = use_app_context();

    let notices = move || {
        ctx.notice_version.track();
        ctx.notices().list()
    };

    view! {
        <div class="notice-bar" role="status">
            <For
                each=notices
                key=|notice| notice.id
                children=move |notice| {
                    let id = notice.id;
                    let class = match notice.level {
                        NoticeLevel::Error => "notice notice-error",
                        NoticeLevel::Info => "notice notice-info",
                    };
                    view! {
                        <div class=class>
                            <span class="notice-message">{notice.message.clone()}</span>
                            <button
                                type="button"
                                class="notice-dismiss"
                                aria-label="Dismiss"
                                on:click=move |_| ctx.notices().dismiss(id)
                            >
                                "×"
                            </button>
                        </div>
                    }
                }
            />
        </div>
    }
}
