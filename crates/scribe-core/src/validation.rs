//! Input validation.
//!
//! Pure predicates run before anything is hashed or written: the password
//! strength policy, identifier formats, post fields and pagination bounds.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Characters that satisfy the "symbol" password rule.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

pub const PASSWORD_MIN_LEN: usize = 8;
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 120;
pub const TITLE_MAX_LEN: usize = 200;
pub const CONTENT_MIN_LEN: usize = 10;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("static regex is valid"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex is valid")
});

/// One rule of the password strength policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordRule {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength => write!(f, "must be at least {PASSWORD_MIN_LEN} characters long"),
            Self::Uppercase => f.write_str("must contain at least one uppercase letter"),
            Self::Lowercase => f.write_str("must contain at least one lowercase letter"),
            Self::Digit => f.write_str("must contain at least one digit"),
            Self::Symbol => f.write_str("must contain at least one special character"),
        }
    }
}

/// Validation failures. All are user-correctable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The password failed one or more strength rules, listed in policy order.
    #[error("Password {}", join_rules(.0))]
    WeakPassword(Vec<PasswordRule>),

    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ValidationError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

fn join_rules(rules: &[PasswordRule]) -> String {
    rules
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check a plaintext password against the strength policy.
///
/// Returns every failed rule rather than stopping at the first one.
pub fn check_password_strength(password: &str) -> Result<(), ValidationError> {
    let mut failed = Vec::new();
    if password.chars().count() < PASSWORD_MIN_LEN {
        failed.push(PasswordRule::MinLength);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        failed.push(PasswordRule::Uppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        failed.push(PasswordRule::Lowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        failed.push(PasswordRule::Digit);
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        failed.push(PasswordRule::Symbol);
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword(failed))
    }
}

/// Validate a username and return its canonical (lowercase) form.
pub fn normalize_username(username: &str) -> Result<String, ValidationError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(ValidationError::invalid(
            "username",
            format!("must be {USERNAME_MIN_LEN}-{USERNAME_MAX_LEN} characters"),
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(ValidationError::invalid(
            "username",
            "must contain only letters, numbers, and underscores",
        ));
    }
    Ok(username.to_ascii_lowercase())
}

/// Validate an email address and return its canonical (lowercase) form.
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    if email.chars().count() > EMAIL_MAX_LEN || !EMAIL_RE.is_match(email) {
        return Err(ValidationError::invalid(
            "email",
            "must be a valid email address",
        ));
    }
    Ok(email.to_lowercase())
}

pub fn check_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::invalid("title", "must not be empty"));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(ValidationError::invalid(
            "title",
            format!("must be at most {TITLE_MAX_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn check_content(content: &str) -> Result<(), ValidationError> {
    if content.chars().count() < CONTENT_MIN_LEN {
        return Err(ValidationError::invalid(
            "content",
            format!("must be at least {CONTENT_MIN_LEN} characters"),
        ));
    }
    Ok(())
}

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Validate optional `page`/`per_page` query values.
    ///
    /// Missing values fall back to page 1 and `default_per_page`.
    pub fn new(
        page: Option<i64>,
        per_page: Option<i64>,
        default_per_page: u32,
        max_per_page: u32,
    ) -> Result<Self, ValidationError> {
        let page = page.unwrap_or(1);
        let per_page = per_page.unwrap_or_else(|| i64::from(default_per_page));

        let page = u32::try_from(page)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| ValidationError::invalid("page", "must be >= 1"))?;
        let per_page = u32::try_from(per_page)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| ValidationError::invalid("per_page", "must be >= 1"))?;
        if per_page > max_per_page {
            return Err(ValidationError::invalid(
                "per_page",
                format!("must be <= {max_per_page}"),
            ));
        }
        Ok(Self { page, per_page })
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// Number of pages needed for `total` items.
    pub fn pages_for(&self, total: i64) -> i64 {
        let per_page = i64::from(self.per_page);
        (total.max(0) + per_page - 1) / per_page
    }
}
