#![allow(missing_docs)]

//! Session identity models.

use serde::{Deserialize, Serialize};

use crate::api::FileUpload;

/// Roles the backend assigns to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Traveler,
    Entrepreneur,
    EventOrganizer,
    EventParticipant,
    /// Role name this client does not know; carries no capabilities.
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Traveler => "traveler",
            Self::Entrepreneur => "entrepreneur",
            Self::EventOrganizer => "event_organizer",
            Self::EventParticipant => "event_participant",
            Self::Unknown => "unknown",
        }
    }
}

/// Authenticated user identity as reported by `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub profile_photo: Option<String>,
}

/// Registration payload submitted as a multipart form.
#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub role: Role,
    /// Optional profile photo uploaded alongside the text fields.
    pub profile_photo: Option<FileUpload>,
}

/// Editable profile fields for `PUT /users/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
