use serde::{Deserialize, Serialize};

use data_error::{DonutError, Result};

/// One student/player entry in the collection.
///
/// `username` is the unique key; username and attribute comparisons are
/// case-insensitive throughout. Scalar attributes are optional strings
/// and set-valued attributes default to empty lists, so sparse records
/// (the scraped student data has no password or score) deserialize
/// cleanly from the same file format.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserRecord {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub house: Vec<String>,
    #[serde(default)]
    pub friends: Vec<String>,
    #[serde(default, rename = "highScore")]
    pub high_score: Option<i64>,
    #[serde(
        default,
        rename = "imagePath",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_path: Option<String>,
}

impl UserRecord {
    /// Case-insensitive username match.
    pub fn is_named(&self, name: &str) -> bool {
        self.username.eq_ignore_ascii_case(name)
    }

    /// Build a signup record. All five fields are required; the friends
    /// list starts empty and no score is set yet.
    pub fn new_signup(
        username: Option<String>,
        password: Option<String>,
        image_path: Option<String>,
        species: Option<String>,
        email: Option<String>,
    ) -> Result<Self> {
        let required = |field: Option<String>, name: &str| {
            field
                .filter(|value| !value.is_empty())
                .ok_or_else(|| DonutError::MissingField(name.to_owned()))
        };

        Ok(UserRecord {
            username: required(username, "username")?,
            password: Some(required(password, "password")?),
            email: Some(required(email, "email")?),
            species: Some(required(species, "species")?),
            image_path: Some(required(image_path, "imagePath")?),
            gender: None,
            graduation: None,
            option: Vec::new(),
            house: Vec::new(),
            friends: Vec::new(),
            high_score: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_record_deserializes() {
        // Shape of one scraped-student entry
        let raw = r#"{
            "username": "amy",
            "imagePath": "data-scraper/amy.png",
            "option": ["Computer Science"],
            "house": ["Avery"],
            "gender": "Female",
            "graduation": "2024"
        }"#;
        let record: UserRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.username, "amy");
        assert_eq!(record.high_score, None);
        assert!(record.friends.is_empty());
        assert_eq!(record.house, vec!["Avery".to_owned()]);
    }

    #[test]
    fn test_signup_initial_state() {
        let record = UserRecord::new_signup(
            Some("amy".to_owned()),
            Some("hunter2".to_owned()),
            Some("imgs/amy.png".to_owned()),
            Some("eel".to_owned()),
            Some("amy@example.com".to_owned()),
        )
        .unwrap();
        assert_eq!(record.high_score, None);
        assert!(record.friends.is_empty());
        assert_eq!(record.species.as_deref(), Some("eel"));
    }

    #[test]
    fn test_signup_missing_field() {
        let err = UserRecord::new_signup(
            Some("amy".to_owned()),
            Some("hunter2".to_owned()),
            None,
            Some("eel".to_owned()),
            Some("amy@example.com".to_owned()),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "missing required field: imagePath");
    }

    #[test]
    fn test_empty_field_counts_as_missing() {
        assert!(UserRecord::new_signup(
            Some("amy".to_owned()),
            Some("".to_owned()),
            Some("imgs/amy.png".to_owned()),
            Some("eel".to_owned()),
            Some("amy@example.com".to_owned()),
        )
        .is_err());
    }

    #[test]
    fn test_is_named_ignores_case() {
        let record: UserRecord =
            serde_json::from_str(r#"{"username": "Amy"}"#).unwrap();
        assert!(record.is_named("amy"));
        assert!(record.is_named("AMY"));
        assert!(!record.is_named("bo"));
    }
}
