//! Account types.

use bazaar_core::{Email, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

/// The signed-in shop user, as returned by `users/me/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl User {
    /// `first last`, falling back to the username when both are blank.
    #[must_use]
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }
}

/// Contact details attached to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

/// Username and password for `users/login/`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Sign-up form for `users/register/`.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    /// Confirmation; must equal `password`.
    #[serde(serialize_with = "expose")]
    pub password2: SecretString,
}

impl Registration {
    /// Whether the password and its confirmation match.
    #[must_use]
    pub fn passwords_match(&self) -> bool {
        self.password.expose_secret() == self.password2.expose_secret()
    }
}

/// Partial update for `users/profile/`. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.address.is_none()
    }
}

/// What `users/profile/` answers with: the full user or just the profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UpdatedProfile {
    User(User),
    Profile(Profile),
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
