//! crates/alumni_quest_core/src/profile.rs
//!
//! Validation for the "complete your profile" step.

use crate::domain::DEFAULT_PROFILE_PHOTO;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("Please fill in all required fields")]
    MissingFields(Vec<&'static str>),
    #[error("Please enter a valid 10-digit mobile number")]
    PhoneLength,
    #[error("Mobile number must start with 6, 7, 8, or 9")]
    PhonePrefix,
}

/// Profile fields as submitted by the user.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub title: String,
    pub company: String,
    pub batch: String,
    pub industry: String,
    pub photo: Option<String>,
    pub looking_for: Option<String>,
    pub offering: Option<String>,
    pub phone: Option<String>,
}

/// A profile update that passed [`ProfileUpdate::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProfile {
    pub name: String,
    pub title: String,
    pub company: String,
    pub batch: String,
    pub industry: String,
    pub photo: String,
    pub looking_for: Option<String>,
    pub offering: Option<String>,
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(self) -> Result<ValidProfile, ProfileError> {
        let missing: Vec<&'static str> = [
            ("name", &self.name),
            ("company", &self.company),
            ("title", &self.title),
            ("batch", &self.batch),
            ("industry", &self.industry),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
        if !missing.is_empty() {
            return Err(ProfileError::MissingFields(missing));
        }

        let phone = match self.phone.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => Some(normalize_phone(p)?),
            _ => None,
        };
        let photo = self
            .photo
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROFILE_PHOTO.to_string());

        Ok(ValidProfile {
            name: self.name.trim().to_string(),
            title: self.title.trim().to_string(),
            company: self.company.trim().to_string(),
            batch: self.batch.trim().to_string(),
            industry: self.industry.trim().to_string(),
            photo,
            looking_for: non_blank(self.looking_for),
            offering: non_blank(self.offering),
            phone,
        })
    }
}

/// Indian mobile numbers only: ten digits starting 6-9, returned in E.164.
pub fn normalize_phone(raw: &str) -> Result<String, ProfileError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 10 {
        return Err(ProfileError::PhoneLength);
    }
    if !matches!(digits.as_bytes()[0], b'6'..=b'9') {
        return Err(ProfileError::PhonePrefix);
    }
    Ok(format!("+91{}", digits))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ProfileUpdate {
        ProfileUpdate {
            name: "Joshua Wilson".into(),
            title: "Associate".into(),
            company: "McKinsey".into(),
            batch: "2020".into(),
            industry: "Consulting".into(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_required_fields_are_listed() {
        let update = ProfileUpdate {
            batch: " ".into(),
            industry: String::new(),
            ..complete()
        };
        let err = update.validate().unwrap_err();
        assert_eq!(err, ProfileError::MissingFields(vec!["batch", "industry"]));
        assert_eq!(err.to_string(), "Please fill in all required fields");
    }

    #[test]
    fn photo_defaults_and_blank_optionals_drop() {
        let valid = ProfileUpdate {
            looking_for: Some("  ".into()),
            offering: Some("Mentoring".into()),
            ..complete()
        }
        .validate()
        .unwrap();
        assert_eq!(valid.photo, DEFAULT_PROFILE_PHOTO);
        assert_eq!(valid.looking_for, None);
        assert_eq!(valid.offering.as_deref(), Some("Mentoring"));
    }

    #[test]
    fn phone_numbers_are_normalized() {
        assert_eq!(normalize_phone("98765 43210").unwrap(), "+919876543210");
        assert_eq!(normalize_phone("(987) 654-3210").unwrap(), "+919876543210");
        assert_eq!(normalize_phone("12345"), Err(ProfileError::PhoneLength));
        assert_eq!(normalize_phone("5876543210"), Err(ProfileError::PhonePrefix));

        let valid = ProfileUpdate {
            phone: Some("9876543210".into()),
            ..complete()
        }
        .validate()
        .unwrap();
        assert_eq!(valid.phone.as_deref(), Some("+919876543210"));
    }
}
