//! Form helpers shared by the create/edit forms

use leptos::prelude::*;

use crate::validation::FieldErrors;

/// Inline message for one field, hidden while the field is valid
#[component]
pub fn FieldError(errors: ReadSignal<FieldErrors>, field: &'static str) -> impl IntoView {
    move || {
        errors.with(|e| e.get(field).map(str::to_string)).map(|message| view! {
            <span class="field-error">{message}</span>
        })
    }
}

/// Error returned by the server for the whole form
#[component]
pub fn FormError(error: ReadSignal<Option<String>>) -> impl IntoView {
    move || error.get().map(|message| view! { <div class="form-error">{message}</div> })
}
