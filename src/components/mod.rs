//! UI Components
//!
//! Pages and reusable Leptos components.

mod auth_page;
mod board_page;
mod dashboard;
mod delete_confirm_button;
mod form_field;
mod named_entity_form;
mod notice_bar;
mod query_status;
mod task_modal;
mod top_bar;
mod workspace_page;

pub use auth_page::AuthPage;
pub use board_page::BoardPage;
pub use dashboard::Dashboard;
pub use delete_confirm_button::DeleteConfirmButton;
pub use form_field::{FieldError, FormError};
pub use named_entity_form::{NamedEntityForm, SubmitFuture};
pub use notice_bar::NoticeBar;
pub use query_status::QueryStatus;
pub use task_modal::{TaskModal, TaskModalMode};
pub use top_bar::TopBar;
pub use workspace_page::WorkspacePage;
