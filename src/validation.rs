//! Form Validation
//!
//! Field-level checks run before any request is sent. A form that passes
//! is turned straight into its request body.

use chrono::NaiveDateTime;

use crate::error::ValidationError;
use crate::models::*;

pub const PASSWORD_MIN: usize = 8;
pub const NAME_MAX: usize = 255;
pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;

/// Errors of one form, at most one per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<ValidationError>);

impl FieldErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.0.push(ValidationError::new(field, message));
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.0.is_empty() { Ok(value()) } else { Err(self) }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn optional(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else { return false };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.push("email", "Email is required");
    } else if !is_valid_email(email.trim()) {
        errors.push("email", "Invalid email address");
    }
}

fn check_password(errors: &mut FieldErrors, password: &str) {
    if char_len(password) < PASSWORD_MIN {
        errors.push("password", format!("Password must be at least {} characters", PASSWORD_MIN));
    }
}

fn check_description(errors: &mut FieldErrors, description: &str) {
    if char_len(description.trim()) > DESCRIPTION_MAX {
        errors.push("description", format!("Description must be less than {} characters", DESCRIPTION_MAX));
    }
}

/// Value of an `<input type="datetime-local">`, with or without seconds
pub fn parse_due_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, FieldErrors> {
        let mut errors = FieldErrors::default();
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        errors.into_result(|| LoginRequest { email: self.email.trim().to_string(), password: self.password.clone() })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterRequest, FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.name.trim().is_empty() {
            errors.push("name", "Name is required");
        }
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        errors.into_result(|| RegisterRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            avatar_initials: initials(&self.name),
        })
    }
}

/// "Ada Lovelace" -> "AL"
pub fn initials(name: &str) -> Option<String> {
    let s: String = name
        .split_whitespace()
        .filter_map(|w| w.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect();
    if s.is_empty() { None } else { Some(s) }
}

/// Create/edit form for workspaces and projects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedEntityForm {
    pub name: String,
    pub description: String,
}

impl NamedEntityForm {
    pub fn validate(&self) -> Result<NamedEntityRequest, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = self.name.trim();
        if name.is_empty() {
            errors.push("name", "Name is required");
        } else if char_len(name) > NAME_MAX {
            errors.push("name", format!("Name must be less than {} characters", NAME_MAX));
        }
        check_description(&mut errors, &self.description);
        errors.into_result(|| NamedEntityRequest { name: name.to_string(), description: optional(&self.description) })
    }
}

/// Task create/edit form, fields as the inputs hold them
#[derive(Debug, Clone, PartialEq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    /// Selected member's user id, empty for unassigned
    pub assignee: String,
    pub priority: String,
    pub due_date: String,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            assignee: String::new(),
            priority: Priority::Medium.as_str().to_string(),
            due_date: String::new(),
        }
    }
}

struct TaskFields {
    title: String,
    description: Option<String>,
    assignee: Option<UserId>,
    priority: Priority,
    due_date: Option<NaiveDateTime>,
}

impl TaskForm {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            assignee: task.assigned_to.map(|id| id.to_string()).unwrap_or_default(),
            priority: task.priority.as_str().to_string(),
            due_date: task.due_date.map(|d| d.format("%Y-%m-%dT%H:%M").to_string()).unwrap_or_default(),
        }
    }

    fn check(&self) -> Result<TaskFields, FieldErrors> {
        let mut errors = FieldErrors::default();
        let title = self.title.trim();
        if title.is_empty() {
            errors.push("title", "Title is required");
        } else if char_len(title) > TITLE_MAX {
            errors.push("title", format!("Title must be less than {} characters", TITLE_MAX));
        }
        check_description(&mut errors, &self.description);

        let priority = Priority::parse(&self.priority);
        if priority.is_none() {
            errors.push("priority", "Priority is required");
        }

        let assignee = match self.assignee.trim() {
            "" => None,
            raw => match raw.parse::<UserId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push("assignee", "Unknown assignee");
                    None
                }
            },
        };

        let due_date = match self.due_date.trim() {
            "" => None,
            raw => match parse_due_date(raw) {
                Some(d) => Some(d),
                None => {
                    errors.push("due_date", "Invalid due date");
                    None
                }
            },
        };

        errors.into_result(|| TaskFields {
            title: title.to_string(),
            description: optional(&self.description),
            assignee,
            priority: priority.unwrap_or_default(),
            due_date,
        })
    }

    pub fn validate_create(&self) -> Result<CreateTaskRequest, FieldErrors> {
        let f = self.check()?;
        Ok(CreateTaskRequest {
            title: f.title,
            description: f.description,
            assigned_to_id: f.assignee,
            priority: f.priority,
            due_date: f.due_date,
        })
    }

    pub fn validate_update(&self) -> Result<UpdateTaskRequest, FieldErrors> {
        let f = self.check()?;
        Ok(UpdateTaskRequest {
            title: Some(f.title),
            description: f.description,
            assigned_to: f.assignee,
            priority: Some(f.priority),
            due_date: f.due_date,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InviteForm {
    pub user_id: String,
    pub role: String,
}

impl Default for InviteForm {
    fn default() -> Self {
        Self { user_id: String::new(), role: MemberRole::Member.as_str().to_string() }
    }
}

impl InviteForm {
    pub fn validate(&self) -> Result<AddMemberRequest, FieldErrors> {
        let mut errors = FieldErrors::default();
        let raw = self.user_id.trim();
        let user_id = if raw.is_empty() {
            errors.push("user_id", "User ID is required");
            None
        } else if !raw.chars().all(|c| c.is_ascii_digit()) {
            errors.push("user_id", "Must be a valid numeric user ID");
            None
        } else {
            match raw.parse::<UserId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push("user_id", "Must be a valid numeric user ID");
                    None
                }
            }
        };
        let role = MemberRole::parse(&self.role);
        if role.is_none() {
            errors.push("role", "Choose a role");
        }
        errors.into_result(|| AddMemberRequest {
            user_id: user_id.unwrap_or_default(),
            role: role.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_rules() {
        let form = LoginForm { email: "".into(), password: "short".into() };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("password"), Some("Password must be at least 8 characters"));

        let form = LoginForm { email: "not-an-email".into(), password: "longenough".into() };
        assert_eq!(form.validate().unwrap_err().get("email"), Some("Invalid email address"));

        let form = LoginForm { email: " ada@example.com ".into(), password: "longenough".into() };
        assert_eq!(form.validate().unwrap().email, "ada@example.com");
    }

    #[test]
    fn test_register_derives_initials() {
        let form = RegisterForm { name: "ada lovelace".into(), email: "ada@example.com".into(), password: "12345678".into() };
        let req = form.validate().unwrap();
        assert_eq!(req.avatar_initials.as_deref(), Some("AL"));

        let form = RegisterForm { name: "  ".into(), ..form };
        assert_eq!(form.validate().unwrap_err().get("name"), Some("Name is required"));
    }

    #[test]
    fn test_named_entity_limits() {
        let long = "x".repeat(NAME_MAX + 1);
        let form = NamedEntityForm { name: long, description: "d".repeat(DESCRIPTION_MAX + 1) };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 2);

        let form = NamedEntityForm { name: " Team ".into(), description: "   ".into() };
        let req = form.validate().unwrap();
        assert_eq!(req.name, "Team");
        assert!(req.description.is_none());
    }

    #[test]
    fn test_task_form_create() {
        let form = TaskForm {
            title: "Ship it".into(),
            description: "".into(),
            assignee: "4".into(),
            priority: "HIGH".into(),
            due_date: "2024-06-01T17:30".into(),
        };
        let req = form.validate_create().unwrap();
        assert_eq!(req.assigned_to_id, Some(4));
        assert_eq!(req.priority, Priority::High);
        assert_eq!(req.due_date.unwrap().format("%Y-%m-%dT%H:%M:%S").to_string(), "2024-06-01T17:30:00");
    }

    #[test]
    fn test_task_form_errors() {
        let form = TaskForm {
            title: "t".repeat(TITLE_MAX + 1),
            priority: "URGENT".into(),
            due_date: "tomorrow".into(),
            ..TaskForm::default()
        };
        let errors = form.validate_create().unwrap_err();
        assert!(errors.get("title").is_some());
        assert_eq!(errors.get("priority"), Some("Priority is required"));
        assert_eq!(errors.get("due_date"), Some("Invalid due date"));
    }

    #[test]
    fn test_invite_requires_numeric_id() {
        let form = InviteForm { user_id: "12a".into(), ..InviteForm::default() };
        assert_eq!(form.validate().unwrap_err().get("user_id"), Some("Must be a valid numeric user ID"));

        let form = InviteForm { user_id: "12".into(), role: "VIEWER".into() };
        assert_eq!(form.validate().unwrap(), AddMemberRequest { user_id: 12, role: MemberRole::Viewer });
    }
}
