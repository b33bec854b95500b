use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::project::ProjectStatus;
use crate::model::user::{ProjectRef, Role, User};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const PHONE_DIGITS: usize = 10;

const STRENGTH_LABELS: [&str; 6] = ["Weak", "Weak", "Fair", "Good", "Strong", "Strong"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name required")]
    NameRequired,
    #[error("Description required")]
    DescriptionRequired,
    #[error("10 digits required")]
    PhoneDigits,
    #[error("Password required")]
    PasswordRequired,
    #[error("Min 6 chars")]
    PasswordTooShort,
    #[error("Confirm password")]
    ConfirmRequired,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("{name} exceeds {limit_mb} MB, skipping")]
    FileTooLarge { name: String, limit_mb: u64 },
}

/// A validation failure tied to the form field that caused it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, error: ValidationError) -> Self {
        FieldError {
            field,
            message: error.to_string(),
        }
    }
}

static UPPERCASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[A-Z]").expect("valid uppercase regex"));
static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new("[0-9]").expect("valid digit regex"));
static SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^A-Za-z0-9]").expect("valid symbol regex"));

/// Keep only the digits of a phone number
pub fn clean_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Score a password 0..=5: one point each for length >= 6, length >= 10,
/// an uppercase letter, a digit, and a symbol.
pub fn password_strength(password: &str) -> u8 {
    if password.is_empty() {
        return 0;
    }
    let len = password.chars().count();
    [
        len >= MIN_PASSWORD_LEN,
        len >= 10,
        UPPERCASE.is_match(password),
        DIGIT.is_match(password),
        SYMBOL.is_match(password),
    ]
    .iter()
    .filter(|hit| **hit)
    .count() as u8
}

pub fn strength_label(score: u8) -> &'static str {
    STRENGTH_LABELS[usize::from(score.min(5))]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

// ---------------------------------------------------------------------------
// User form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub phone: String,
    pub password: String,
    pub confirm: String,
    pub role: Role,
    pub projects: Vec<ProjectRef>,
}

/// Body of a create or update user request. Updates never carry the phone
/// number or a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role: Role,
    pub projects: Vec<ProjectRef>,
}

impl UserForm {
    pub fn field_errors(&self, mode: FormMode) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", ValidationError::NameRequired));
        }
        if clean_phone(&self.phone).len() != PHONE_DIGITS {
            errors.push(FieldError::new("phone", ValidationError::PhoneDigits));
        }
        if mode == FormMode::Create {
            if self.password.is_empty() {
                errors.push(FieldError::new("password", ValidationError::PasswordRequired));
            } else if self.password.chars().count() < MIN_PASSWORD_LEN {
                errors.push(FieldError::new("password", ValidationError::PasswordTooShort));
            }
            if self.confirm.is_empty() {
                errors.push(FieldError::new("confirm", ValidationError::ConfirmRequired));
            } else if self.confirm != self.password {
                errors.push(FieldError::new("confirm", ValidationError::PasswordMismatch));
            }
        }
        errors
    }

    pub fn validate(&self, mode: FormMode) -> Result<UserPayload, Vec<FieldError>> {
        let errors = self.field_errors(mode);
        if !errors.is_empty() {
            return Err(errors);
        }
        let (phone, password) = match mode {
            FormMode::Create => (Some(clean_phone(&self.phone)), Some(self.password.clone())),
            FormMode::Edit => (None, None),
        };
        Ok(UserPayload {
            name: self.name.trim().to_string(),
            phone,
            password,
            role: self.role,
            projects: self.projects.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Project form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectForm {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPayload {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
}

impl ProjectForm {
    pub fn validate(&self) -> Result<ProjectPayload, Vec<FieldError>> {
        let name = self.name.trim();
        let description = self.description.trim();
        let mut errors = Vec::new();
        if name.is_empty() {
            errors.push(FieldError::new("name", ValidationError::NameRequired));
        }
        if description.is_empty() {
            errors.push(FieldError::new(
                "description",
                ValidationError::DescriptionRequired,
            ));
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ProjectPayload {
            name: name.to_string(),
            description: description.to_string(),
            status: self.status,
        })
    }
}

// ---------------------------------------------------------------------------
// Uploads and lists
// ---------------------------------------------------------------------------

/// Reject files above `max_bytes`. Files of unknown size pass.
pub fn check_upload_size(
    name: &str,
    size: Option<u64>,
    max_bytes: u64,
) -> Result<(), ValidationError> {
    match size {
        Some(size) if size > max_bytes => Err(ValidationError::FileTooLarge {
            name: name.to_string(),
            limit_mb: max_bytes / (1024 * 1024),
        }),
        _ => Ok(()),
    }
}

/// Users whose name contains `query`, ignoring case. A blank query keeps all.
pub fn filter_users<'a>(users: &'a [User], query: &str) -> Vec<&'a User> {
    let query = query.trim().to_lowercase();
    users
        .iter()
        .filter(|u| query.is_empty() || u.name.to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn create_form() -> UserForm {
        UserForm {
            name: "  Asha ".into(),
            phone: "(987) 654-3210".into(),
            password: "Secret#12".into(),
            confirm: "Secret#12".into(),
            role: Role::Admin,
            projects: vec![ProjectRef {
                uuid: "p1".into(),
                name: "Tower A".into(),
            }],
        }
    }

    #[test]
    fn test_clean_phone() {
        assert_eq!(clean_phone("+91 (987) 654-3210"), "919876543210");
        assert_eq!(clean_phone(""), "");
    }

    #[test]
    fn test_password_strength() {
        assert_eq!(password_strength(""), 0);
        assert_eq!(password_strength("abc"), 0);
        assert_eq!(password_strength("abcdef"), 1);
        assert_eq!(password_strength("abcdefghij"), 2);
        assert_eq!(password_strength("Abcdef1"), 3);
        assert_eq!(password_strength("Abcdefghi1!"), 5);
        assert_eq!(strength_label(0), "Weak");
        assert_eq!(strength_label(2), "Fair");
        assert_eq!(strength_label(3), "Good");
        assert_eq!(strength_label(5), "Strong");
    }

    #[test]
    fn test_create_payload() {
        let payload = create_form().validate(FormMode::Create).unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "name": "Asha",
                "phone": "9876543210",
                "password": "Secret#12",
                "role": "admin",
                "projects": [{ "uuid": "p1", "name": "Tower A" }]
            })
        );
    }

    #[test]
    fn test_edit_payload_omits_phone_and_password() {
        let mut form = create_form();
        form.password.clear();
        form.confirm.clear();
        let payload = form.validate(FormMode::Edit).unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("phone").is_none());
        assert!(value.get("password").is_none());
    }

    #[test]
    fn test_user_form_errors() {
        let form = UserForm {
            name: " ".into(),
            phone: "12345".into(),
            password: "abc".into(),
            confirm: "abd".into(),
            ..UserForm::default()
        };
        let errors = form.validate(FormMode::Create).unwrap_err();
        let messages: Vec<(&str, &str)> = errors
            .iter()
            .map(|e| (e.field, e.message.as_str()))
            .collect();
        assert_eq!(
            messages,
            vec![
                ("name", "Name required"),
                ("phone", "10 digits required"),
                ("password", "Min 6 chars"),
                ("confirm", "Passwords do not match"),
            ]
        );
    }

    #[test]
    fn test_missing_password_and_confirm() {
        let mut form = create_form();
        form.password.clear();
        form.confirm.clear();
        let errors = form.field_errors(FormMode::Create);
        assert_eq!(
            errors,
            vec![
                FieldError::new("password", ValidationError::PasswordRequired),
                FieldError::new("confirm", ValidationError::ConfirmRequired),
            ]
        );
    }

    #[test]
    fn test_project_form() {
        let form = ProjectForm {
            name: " Tower A ".into(),
            description: " 12 floors ".into(),
            status: ProjectStatus::InProgress,
        };
        assert_eq!(
            serde_json::to_value(form.validate().unwrap()).unwrap(),
            json!({ "name": "Tower A", "description": "12 floors", "status": "IN_PROGRESS" })
        );

        let errors = ProjectForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[1].field, "description");
    }

    #[test]
    fn test_upload_size() {
        let max = 10 * 1024 * 1024;
        assert_eq!(check_upload_size("a.pdf", Some(max), max), Ok(()));
        assert_eq!(check_upload_size("a.pdf", None, max), Ok(()));
        let err = check_upload_size("big.mov", Some(max + 1), max).unwrap_err();
        assert_eq!(err.to_string(), "big.mov exceeds 10 MB, skipping");
    }

    #[test]
    fn test_filter_users() {
        let users: Vec<User> = serde_json::from_value(json!([
            { "_id": "1", "name": "Asha Rao" },
            { "_id": "2", "name": "Ravi" },
            { "_id": "3", "name": "ASHOK" }
        ]))
        .unwrap();
        let names: Vec<&str> = filter_users(&users, " ash ")
            .iter()
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(names, vec!["Asha Rao", "ASHOK"]);
        assert_eq!(filter_users(&users, "").len(), 3);
    }
}
