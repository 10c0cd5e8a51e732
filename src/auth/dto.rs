use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::error::ValidationErrors;
use crate::uploads::{validate_image, FormData, UploadedImage};
use crate::users::dto::{parse_date, UserOut};

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Registration form, read from multipart. Text fields default to empty so
/// "missing" and "blank" validate the same way.
pub struct RegisterForm {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone_num: Option<String>,
    pub dob: String,
    pub gender: String,
    pub bio: Option<String>,
    pub profile_picture: Option<UploadedImage>,
}

impl RegisterForm {
    pub fn from_form(form: &mut FormData) -> Self {
        Self {
            name: form.take_text("name").unwrap_or_default(),
            username: form.take_text("username").unwrap_or_default(),
            email: form.take_text("email").unwrap_or_default(),
            password: form.take_text("password").unwrap_or_default(),
            phone_num: form.take_text("phone_num").filter(|s| !s.is_empty()),
            dob: form.take_text("dob").unwrap_or_default(),
            gender: form.take_text("gender").unwrap_or_default(),
            bio: form.take_text("bio").filter(|s| !s.is_empty()),
            profile_picture: form.take_file("profile_picture"),
        }
    }

    /// Field-level checks, collected per field. Returns the parsed date of
    /// birth when that field is valid.
    pub fn validate(&self, errors: &mut ValidationErrors) -> Option<Date> {
        if self.name.trim().is_empty() {
            errors.add("name", "The name field is required.");
        } else if self.name.chars().count() > 255 {
            errors.add("name", "The name must not be greater than 255 characters.");
        }

        if self.username.trim().is_empty() {
            errors.add("username", "The username field is required.");
        } else if self.username.chars().count() > 255 {
            errors.add(
                "username",
                "The username must not be greater than 255 characters.",
            );
        }

        if self.email.trim().is_empty() {
            errors.add("email", "The email field is required.");
        } else if !is_valid_email(&self.email) {
            errors.add("email", "The email must be a valid email address.");
        } else if self.email.chars().count() > 255 {
            errors.add("email", "The email must not be greater than 255 characters.");
        }

        if self.password.is_empty() {
            errors.add("password", "The password field is required.");
        } else if self.password.chars().count() < 5 {
            errors.add("password", "The password must be at least 5 characters.");
        }

        if let Some(phone) = &self.phone_num {
            if phone.chars().count() > 15 {
                errors.add(
                    "phone_num",
                    "The phone num must not be greater than 15 characters.",
                );
            }
        }

        let dob = if self.dob.trim().is_empty() {
            errors.add("dob", "The dob field is required.");
            None
        } else {
            match parse_date(self.dob.trim()) {
                None => {
                    errors.add("dob", "The dob is not a valid date.");
                    None
                }
                Some(date) if date >= OffsetDateTime::now_utc().date() => {
                    errors.add("dob", "The dob must be a date before today.");
                    None
                }
                Some(date) => Some(date),
            }
        };

        if self.gender.trim().is_empty() {
            errors.add("gender", "The gender field is required.");
        } else if !matches!(self.gender.as_str(), "Male" | "Female") {
            errors.add("gender", "The selected gender is invalid.");
        }

        if let Some(bio) = &self.bio {
            if bio.chars().count() > 100 {
                errors.add("bio", "The bio must not be greater than 100 characters.");
            }
        }

        if let Some(image) = &self.profile_picture {
            validate_image("profile_picture", image, errors);
        }

        dob
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", "The username field is required.");
        }
        if self.password.is_empty() {
            errors.add("password", "The password field is required.");
        }
        errors
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: UserOut,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserOut,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> RegisterForm {
        RegisterForm {
            name: "Alice Example".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "s3cret".into(),
            phone_num: Some("123456789".into()),
            dob: "1995-04-12".into(),
            gender: "Female".into(),
            bio: Some("hi there".into()),
            profile_picture: None,
        }
    }

    #[test]
    fn valid_form_passes_and_parses_dob() {
        let mut errors = ValidationErrors::new();
        let dob = valid_form().validate(&mut errors);
        assert!(errors.is_empty());
        assert_eq!(dob, Some(time::macros::date!(1995 - 04 - 12)));
    }

    #[test]
    fn all_failing_fields_are_reported_at_once() {
        let form = RegisterForm {
            name: "".into(),
            username: "".into(),
            email: "not-an-email".into(),
            password: "abc".into(),
            phone_num: Some("0123456789012345".into()),
            dob: "tomorrow".into(),
            gender: "Other".into(),
            bio: Some("x".repeat(101)),
            profile_picture: None,
        };
        let mut errors = ValidationErrors::new();
        assert_eq!(form.validate(&mut errors), None);

        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["bio", "dob", "email", "gender", "name", "password", "phone_num", "username"]
        );
    }

    #[test]
    fn dob_today_or_later_is_rejected() {
        let mut form = valid_form();
        form.dob = OffsetDateTime::now_utc().date().to_string();
        let mut errors = ValidationErrors::new();
        assert_eq!(form.validate(&mut errors), None);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["dob"]);
    }

    #[test]
    fn bio_boundary_is_inclusive() {
        let mut form = valid_form();
        form.bio = Some("x".repeat(100));
        let mut errors = ValidationErrors::new();
        form.validate(&mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn login_request_requires_both_fields() {
        let request = LoginRequest {
            username: "".into(),
            password: "".into(),
        };
        let errors = request.validate();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["password", "username"]
        );

        let request = LoginRequest {
            username: "alice".into(),
            password: "s3cret".into(),
        };
        assert!(request.validate().is_empty());
    }

    #[test]
    fn email_regex_accepts_plausible_addresses() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@sub.domain.org"));
        assert!(!is_valid_email("missing-at.example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
    }
}
