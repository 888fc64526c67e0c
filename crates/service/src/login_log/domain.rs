use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::member::domain::MemberId;

/// One recorded login. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginLog {
    pub id: i64,
    /// Loose reference to the member; not checked against the member table.
    pub user_id: MemberId,
    /// Member name at login time.
    pub username: String,
    pub ip: String,
    pub user_agent: String,
    pub device_id: String,
    pub city: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

/// What the authentication layer knows about a successful login.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub user_id: MemberId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

/// Row handed to the repository; id assigned by storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewLoginLog {
    pub event: LoginEvent,
    pub created_at: DateTime<Utc>,
}

/// Listing filters as received from callers. Dates are inclusive calendar days in UTC.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ListPageInput {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
    /// `None` or `Some(0)` means every member.
    #[serde(default)]
    pub user_id: Option<MemberId>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Repository-level filter: optional member plus a half-open `created_at` window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoginLogQuery {
    pub user_id: Option<MemberId>,
    /// `created_at >= created_from`
    pub created_from: Option<DateTime<Utc>>,
    /// `created_at < created_before`
    pub created_before: Option<DateTime<Utc>>,
}

/// Midnight UTC at the start of `day`.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

impl LoginLogQuery {
    /// An inclusive end date becomes an exclusive bound at the next midnight.
    pub fn from_input(input: &ListPageInput) -> Self {
        Self {
            user_id: input.user_id.filter(|id| *id != 0),
            created_from: input.start_date.map(start_of_day),
            created_before: input.end_date.and_then(|d| d.succ_opt()).map(start_of_day),
        }
    }

    pub fn matches(&self, log: &LoginLog) -> bool {
        self.user_id.map_or(true, |id| log.user_id == id)
            && self.created_from.map_or(true, |from| log.created_at >= from)
            && self.created_before.map_or(true, |before| log.created_at < before)
    }
}
