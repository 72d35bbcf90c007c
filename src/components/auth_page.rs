//! Login / Register Page

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::{FieldError, FormError};
use crate::context::use_app_context;
use crate::store::{navigate, store_sign_in, use_app_store, Route};
use crate::validation::{FieldErrors, LoginForm, RegisterForm};

/// Sign-in form, or the registration form when `register` is set
#[component]
pub fn AuthPage(register: bool) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();

    let (name, set_name) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (errors, set_errors) = signal(FieldErrors::default());
    let (server_error, set_server_error) = signal::<Option<String>>(None);
    let (busy, set_busy) = signal(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }
        set_server_error.set(None);
        let session = ctx.session();

        if register {
            let form = RegisterForm {
                name: name.get_untracked(),
                email: email.get_untracked(),
                password: password.get_untracked(),
            };
            let request = match form.validate() {
                Ok(request) => request,
                Err(errs) => return set_errors.set(errs),
            };
            set_errors.set(FieldErrors::default());
            set_busy.set(true);
            spawn_local(async move {
                let result = session.register(&request).await;
                set_busy.set(false);
                match result {
                    Ok(message) => {
                        let message = if message.is_empty() { "Account created. Please sign in.".to_string() } else { message };
                        ctx.notices().info(message);
                        navigate(&store, Route::Login);
                    }
                    Err(err) => set_server_error.set(Some(err.user_message())),
                }
            });
        } else {
            let form = LoginForm { email: email.get_untracked(), password: password.get_untracked() };
            let request = match form.validate() {
                Ok(request) => request,
                Err(errs) => return set_errors.set(errs),
            };
            set_errors.set(FieldErrors::default());
            set_busy.set(true);
            spawn_local(async move {
                let result = session.login(&request.email, &request.password).await;
                set_busy.set(false);
                match result {
                    Ok(user) => store_sign_in(&store, user),
                    Err(err) => set_server_error.set(Some(err.user_message())),
                }
            });
        }
    };

    let title = if register { "Create an account" } else { "Sign in" };
    let submit_label = move || match (register, busy.get()) {
        (_, true) => "Please wait...",
        (true, false) => "Register",
        (false, false) => "Sign in",
    };

    view! {
        <div class="auth-page">
            <form class="auth-form" on:submit=on_submit>
                <h1>{title}</h1>
                <FormError error=server_error />

                <Show when=move || register>
                    <label class="form-field">
                        <span>"Name"</span>
                        <input
                            type="text"
                            prop:value=move || name.get()
                            on:input=move |ev| set_name.set(event_target_value(&ev))
                        />
                        <FieldError errors=errors field="name" />
                    </label>
                </Show>

                <label class="form-field">
                    <span>"Email"</span>
                    <input
                        type="email"
                        autocomplete="username"
                        prop:value=move || email.get()
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                    />
                    <FieldError errors=errors field="email" />
                </label>

                <label class="form-field">
                    <span>"Password"</span>
                    <input
                        type="password"
                        autocomplete={if register { "new-password" } else { "current-password" }}
                        prop:value=move || password.get()
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                    />
                    <FieldError errors=errors field="password" />
                </label>

                <button type="submit" class="primary-btn" disabled=move || busy.get()>
                    {submit_label}
                </button>

                {if register {
                    view! {
                        <p class="auth-switch">
                            "Already have an account? "
                            <a href="#" on:click=move |ev| { ev.prevent_default(); navigate(&store, Route::Login); }>"Sign in"</a>
                        </p>
                    }.into_any()
                } else {
                    view! {
                        <p class="auth-switch">
                            "No account yet? "
                            <a href="#" on:click=move |ev| { ev.prevent_default(); navigate(&store, Route::Register); }>"Register"</a>
                        </p>
                    }.into_any()
                }}
            </form>
        </div>
    }
}
