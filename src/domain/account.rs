/*!
 * Account settings: profile, custom styling and password.
 *
 * Each form validates into a `ValidationError` carrying one message per rejected
 * field, so a caller can show errors next to the inputs. Password hashing and
 * verification of the current password are left to the authentication layer;
 * `set_password_hash` only stores the already-hashed value.
 */

use log::info;

use crate::database::{Bindings, QueryExecutor};
use crate::errors::{DomainError, ValidationError};
use crate::record::{RecordId, table};

/// Longest accepted bio, in characters
pub const MAX_BIO_CHARS: usize = 1000;

/// Longest accepted custom stylesheet, in characters
pub const MAX_CSS_CHARS: usize = 10_000;

/// Profile form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New bio; `None` clears it
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        check_length(&mut errors, "bio", self.bio.as_deref(), MAX_BIO_CHARS);
        errors.into_result()
    }
}

/// Styling form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylingUpdate {
    /// New stylesheet; `None` clears it
    pub css: Option<String>,
}

impl StylingUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        check_length(&mut errors, "css", self.css.as_deref(), MAX_CSS_CHARS);
        errors.into_result()
    }
}

/// Password change form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChange {
    /// Check the form; the current password itself is verified by the caller
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();

        for (field, value) in [
            ("current_password", &self.current_password),
            ("new_password", &self.new_password),
            ("confirm_password", &self.confirm_password),
        ] {
            if value.is_empty() {
                errors.push(field, "Required");
            }
        }

        if !errors.is_empty() {
            return errors.into_result();
        }

        if self.new_password != self.confirm_password {
            errors.push("confirm_password", "Passwords do not match");
        } else if self.new_password == self.current_password {
            errors.push(
                "new_password",
                "New password cannot be the same as the current password",
            );
        }

        errors.into_result()
    }
}

fn check_length(errors: &mut ValidationError, field: &str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        if value.chars().count() > max {
            errors.push(field, format!("Must be at most {} characters", max));
        }
    }
}

/// Update the user's bio
pub async fn update_profile(
    executor: &QueryExecutor,
    user: &RecordId<table::User>,
    update: &ProfileUpdate,
) -> Result<(), DomainError> {
    update.validate()?;

    let mut bindings = Bindings::new().bind("user", user);
    if let Some(bio) = &update.bio {
        bindings.insert("bio", bio.as_str());
    }

    executor
        .execute("UPDATE type::record($user) SET bio = $bio", &bindings)
        .await?;
    info!("Profile updated for {}", user);
    Ok(())
}

/// Update the user's custom stylesheet
pub async fn update_styling(
    executor: &QueryExecutor,
    user: &RecordId<table::User>,
    update: &StylingUpdate,
) -> Result<(), DomainError> {
    update.validate()?;

    let mut bindings = Bindings::new().bind("user", user);
    if let Some(css) = &update.css {
        bindings.insert("css", css.as_str());
    }

    executor
        .execute("UPDATE type::record($user) SET css = $css", &bindings)
        .await?;
    info!("Styling updated for {}", user);
    Ok(())
}

/// Store a new password hash for the user
pub async fn set_password_hash(
    executor: &QueryExecutor,
    user: &RecordId<table::User>,
    hashed_password: &str,
) -> Result<(), DomainError> {
    if hashed_password.is_empty() {
        return Err(ValidationError::single("hashed_password", "Required").into());
    }

    let bindings = Bindings::new()
        .bind("user", user)
        .bind("hash", hashed_password);

    executor
        .execute("UPDATE type::record($user) SET hashedPassword = $hash", &bindings)
        .await?;
    info!("Password updated for {}", user);
    Ok(())
}
