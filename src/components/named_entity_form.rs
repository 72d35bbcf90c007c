//! Create / Rename Form Component
//!
//! Name + description form shared by workspaces and projects. The caller
//! supplies the mutation; the form stays open with the server's message on
//! failure and closes on success.

use std::future::Future;
use std::pin::Pin;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::{FieldError, FormError};
use crate::error::ApiResult;
use crate::models::NamedEntityRequest;
use crate::validation::{FieldErrors, NamedEntityForm as Fields};

/// The mutation run for a validated request
pub type SubmitFuture = Pin<Box<dyn Future<Output = ApiResult<()>>>>;

#[component]
pub fn NamedEntityForm(
    /// Values the form opens with
    initial: Fields,
    #[prop(into)] submit_label: String,
    #[prop(into)] on_submit: Callback<NamedEntityRequest, SubmitFuture>,
    #[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
    let (name, set_name) = signal(initial.name.clone());
    let (description, set_description) = signal(initial.description.clone());
    let (errors, set_errors) = signal(FieldErrors::default());
    let (server_error, set_server_error) = signal::<Option<String>>(None);
    let (busy, set_busy) = signal(false);

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }
        let form = Fields { name: name.get_untracked(), description: description.get_untracked() };
        let request = match form.validate() {
            Ok(request) => request,
            Err(errs) => return set_errors.set(errs),
        };
        set_errors.set(FieldErrors::default());
        set_server_error.set(None);
        set_busy.set(true);

        let fut = on_submit.run(request);
        spawn_local(async move {
            let result = fut.await;
            set_busy.set(false);
            match result {
                Ok(()) => on_close.run(()),
                Err(err) => set_server_error.set(Some(err.user_message())),
            }
        });
    };

    view! {
        <form class="entity-form" on:submit=submit>
            <FormError error=server_error />
            <label class="form-field">
                <span>"Name"</span>
                <input
                    type="text"
                    prop:value=move || name.get()
                    on:input=move |ev| set_name.set(event_target_value(&ev))
                />
                <FieldError errors=errors field="name" />
            </label>
            <label class="form-field">
                <span>"Description"</span>
                <textarea
                    prop:value=move || description.get()
                    on:input=move |ev| set_description.set(event_target_value(&ev))
                ></textarea>
                <FieldError errors=errors field="description" />
            </label>
            <div class="form-actions">
                <button type="submit" class="primary-btn" disabled=move || busy.get()>
                    {submit_label}
                </button>
                <button type="button" class="cancel-btn" on:click=move |_| on_close.run(())>
                    "Cancel"
                </button>
            </div>
        </form>
    }
}
