use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every failing field of a payload, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn require_text(&mut self, field: &'static str, value: &str, max: usize) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, "is required");
        } else if trimmed.chars().count() > max {
            self.push(field, format!("must be at most {max} characters"));
        }
    }

    pub fn optional_text(&mut self, field: &'static str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            if value.chars().count() > max {
                self.push(field, format!("must be at most {max} characters"));
            }
        }
    }

    pub fn email(&mut self, field: &'static str, value: &str) {
        if !is_email(value) {
            self.push(field, "must be a valid email address");
        }
    }

    pub fn phone(&mut self, field: &'static str, value: Option<&str>) {
        if let Some(value) = value {
            if !phone_pattern().is_match(value.trim()) {
                self.push(field, "must be a valid phone number");
            }
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

pub fn is_email(value: &str) -> bool {
    email_pattern().is_match(value.trim())
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,19}$").expect("phone pattern compiles"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failing_field() {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", "   ", 100);
        errors.require_text("description", &"x".repeat(11), 10);
        errors.email("email", "not-an-email");
        errors.phone("phone", Some("call me"));

        assert_eq!(errors.fields().len(), 4);
        assert!(errors.has("title"));
        assert!(errors.to_string().contains("description must be at most 10 characters"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn accepts_well_formed_values() {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", "Backend intern", 100);
        errors.email("email", "ada@campus.edu");
        errors.phone("phone", Some("+86 138-0000-0000"));
        errors.optional_text("notes", None, 10);
        assert!(errors.into_result().is_ok());
    }
}
