use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage-assigned member identifier.
pub type MemberId = i64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Disabled,
    #[default]
    Active,
}

impl MemberStatus {
    /// Persisted representation.
    pub fn as_i16(self) -> i16 {
        match self {
            MemberStatus::Disabled => models::member::STATUS_DISABLED,
            MemberStatus::Active => models::member::STATUS_ACTIVE,
        }
    }

    pub fn from_i16(v: i16) -> Option<Self> {
        match v {
            models::member::STATUS_DISABLED => Some(MemberStatus::Disabled),
            models::member::STATUS_ACTIVE => Some(MemberStatus::Active),
            _ => None,
        }
    }
}

/// A registered end user (business view).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    /// Opaque PHC string; empty when no password is set.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub age: u16,
    pub phone: Option<String>,
    /// Avatar URL.
    pub avatar: Option<String>,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn is_active(&self) -> bool { self.status == MemberStatus::Active }

    pub fn is_disabled(&self) -> bool { self.status == MemberStatus::Disabled }

    /// Members created without a password have no password-based login path.
    pub fn has_password(&self) -> bool { !self.password_hash.is_empty() }
}

/// Row handed to [`MemberRepository::create`](super::repository::MemberRepository::create);
/// the id is assigned by storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: u16,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMemberInput {
    pub name: String,
    pub email: String,
    /// Raw password; absent or empty means no password is set.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub age: Option<u16>,
    /// Empty string is treated as no phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Same empty-string rule as `phone`.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Defaults to `active`.
    #[serde(default)]
    pub status: Option<MemberStatus>,
}

/// Merge patch: `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMemberInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<u16>,
    /// `Some("")` clears the stored phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// `Some("")` clears the stored avatar.
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub status: Option<MemberStatus>,
}

impl UpdateMemberInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.age.is_none()
            && self.phone.is_none()
            && self.avatar.is_none()
            && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_values() {
        assert_eq!(MemberStatus::from_i16(MemberStatus::Active.as_i16()), Some(MemberStatus::Active));
        assert_eq!(MemberStatus::from_i16(MemberStatus::Disabled.as_i16()), Some(MemberStatus::Disabled));
        assert_eq!(MemberStatus::from_i16(7), None);
        assert_eq!(MemberStatus::default(), MemberStatus::Active);
    }

    #[test]
    fn password_hash_never_serialized() {
        let now = Utc::now();
        let m = Member {
            id: 1,
            name: "Alice".into(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            age: 30,
            phone: None,
            avatar: None,
            status: MemberStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let json = serde_json::to_value(&m).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["status"], "active");
    }

    #[test]
    fn update_input_from_json_patch() {
        let patch: UpdateMemberInput = serde_json::from_str(r#"{"phone": "", "name": null}"#).unwrap();
        assert_eq!(patch.phone.as_deref(), Some(""));
        assert!(patch.name.is_none());
        assert!(!patch.is_empty());
        assert!(UpdateMemberInput::default().is_empty());

        let patch: UpdateMemberInput = serde_json::from_str(r#"{"avatar": "https://cdn/a.png"}"#).unwrap();
        assert_eq!(patch.avatar.as_deref(), Some("https://cdn/a.png"));
        assert!(!patch.is_empty());
    }
}
