//! Row types for the six tables
//!
//! - Record structs: what a SELECT returns (and what the API serializes)
//! - New* structs: what an INSERT writes; the store assigns `id`

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::Row;
use serde::Serialize;

use super::store::{FieldMap, Insertable, Record};
use crate::policy::status::{ConnectionStatus, MeetingStatus, ReferralStatus};
use crate::types::MemberError;

// ============================================================================
// Timestamp Helpers (SQLite stores timestamps as TEXT)
// ============================================================================

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Current UTC time at the precision the database keeps
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width text form, so lexical order matches chronological order
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse RFC 3339, or a naive ISO 8601 datetime taken as UTC
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, MemberError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc).trunc_subsecs(6));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().trunc_subsecs(6))
        .ok_or_else(|| {
            MemberError::InvalidArgument(format!(
                "Invalid datetime '{raw}': expected ISO 8601, e.g. 2030-01-31T09:30:00Z"
            ))
        })
}

fn timestamp_column(row: &Row<'_>, name: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(name)?;
    parse_timestamp(&raw).map_err(|e| {
        let idx = row.as_ref().column_index(name).unwrap_or(0);
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn opt_text(value: Option<&str>) -> Value {
    value.map(text).unwrap_or(Value::Null)
}

// ============================================================================
// User
// ============================================================================

/// Registered user; root identity referenced by every other table
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Record for User {
    const TABLE: &'static str = "users";
    const KIND: &'static str = "User";
    const COLUMNS: &'static [&'static str] = &["id", "email", "password_hash", "created_at"];
    const MUTABLE: &'static [&'static str] = &[];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            created_at: timestamp_column(row, "created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

impl Insertable for NewUser {
    type Record = User;

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .set("email", text(&self.email))
            .set("password_hash", text(&self.password_hash))
            .set("created_at", format_timestamp(&current_timestamp()))
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Extended member information; at most one per user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub full_name: Option<String>,
    pub business: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
}

impl Profile {
    /// Fields a member may set on their own profile
    pub const FIELDS: [&'static str; 7] = [
        "full_name", "business", "title", "phone", "bio", "location", "linkedin",
    ];
}

impl Record for Profile {
    const TABLE: &'static str = "profiles";
    const KIND: &'static str = "Profile";
    const COLUMNS: &'static [&'static str] = &[
        "id", "user_id", "full_name", "business", "title", "phone", "bio", "location", "linkedin",
    ];
    const MUTABLE: &'static [&'static str] = &Profile::FIELDS;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            full_name: row.get("full_name")?,
            business: row.get("business")?,
            title: row.get("title")?,
            phone: row.get("phone")?,
            bio: row.get("bio")?,
            location: row.get("location")?,
            linkedin: row.get("linkedin")?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub user_id: i64,
    pub full_name: Option<String>,
    pub business: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
}

impl Insertable for NewProfile {
    type Record = Profile;

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .set("user_id", self.user_id)
            .set("full_name", opt_text(self.full_name.as_deref()))
            .set("business", opt_text(self.business.as_deref()))
            .set("title", opt_text(self.title.as_deref()))
            .set("phone", opt_text(self.phone.as_deref()))
            .set("bio", opt_text(self.bio.as_deref()))
            .set("location", opt_text(self.location.as_deref()))
            .set("linkedin", opt_text(self.linkedin.as_deref()))
    }
}

// ============================================================================
// Connection
// ============================================================================

/// Directed connection request from `user_id` to `connection_id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub id: i64,
    /// Requester
    pub user_id: i64,
    /// Recipient
    pub connection_id: i64,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    pub fn involves(&self, user_id: i64) -> bool {
        self.user_id == user_id || self.connection_id == user_id
    }
}

impl Record for Connection {
    const TABLE: &'static str = "connections";
    const KIND: &'static str = "Connection";
    const COLUMNS: &'static [&'static str] =
        &["id", "user_id", "connection_id", "status", "created_at"];
    const MUTABLE: &'static [&'static str] = &["status"];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            connection_id: row.get("connection_id")?,
            status: row.get("status")?,
            created_at: timestamp_column(row, "created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewConnection {
    pub user_id: i64,
    pub connection_id: i64,
}

impl Insertable for NewConnection {
    type Record = Connection;

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .set("user_id", self.user_id)
            .set("connection_id", self.connection_id)
            .set("status", ConnectionStatus::Pending)
            .set("created_at", format_timestamp(&current_timestamp()))
    }
}

// ============================================================================
// Referral
// ============================================================================

/// Business referral passed from `referrer_id` to `referred_id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Referral {
    pub id: i64,
    pub referrer_id: i64,
    pub referred_id: i64,
    pub details: String,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
}

impl Referral {
    pub fn involves(&self, user_id: i64) -> bool {
        self.referrer_id == user_id || self.referred_id == user_id
    }
}

impl Record for Referral {
    const TABLE: &'static str = "referrals";
    const KIND: &'static str = "Referral";
    const COLUMNS: &'static [&'static str] =
        &["id", "referrer_id", "referred_id", "details", "status", "created_at"];
    const MUTABLE: &'static [&'static str] = &["status"];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            referrer_id: row.get("referrer_id")?,
            referred_id: row.get("referred_id")?,
            details: row.get("details")?,
            status: row.get("status")?,
            created_at: timestamp_column(row, "created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewReferral {
    pub referrer_id: i64,
    pub referred_id: i64,
    pub details: String,
}

impl Insertable for NewReferral {
    type Record = Referral;

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .set("referrer_id", self.referrer_id)
            .set("referred_id", self.referred_id)
            .set("details", text(&self.details))
            .set("status", ReferralStatus::Open)
            .set("created_at", format_timestamp(&current_timestamp()))
    }
}

// ============================================================================
// Meeting
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meeting {
    pub id: i64,
    /// Owner
    pub user_id: i64,
    pub title: String,
    pub scheduled_for: DateTime<Utc>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub status: MeetingStatus,
}

impl Meeting {
    /// Fields the owner may overwrite
    pub const FIELDS: [&'static str; 5] = ["title", "scheduled_for", "notes", "location", "status"];
}

impl Record for Meeting {
    const TABLE: &'static str = "meetings";
    const KIND: &'static str = "Meeting";
    const COLUMNS: &'static [&'static str] = &[
        "id", "user_id", "title", "scheduled_for", "notes", "location", "status",
    ];
    const MUTABLE: &'static [&'static str] = &Meeting::FIELDS;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            scheduled_for: timestamp_column(row, "scheduled_for")?,
            notes: row.get("notes")?,
            location: row.get("location")?,
            status: row.get("status")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub user_id: i64,
    pub title: String,
    pub scheduled_for: DateTime<Utc>,
    pub notes: Option<String>,
    pub location: Option<String>,
}

impl Insertable for NewMeeting {
    type Record = Meeting;

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .set("user_id", self.user_id)
            .set("title", text(&self.title))
            .set("scheduled_for", format_timestamp(&self.scheduled_for))
            .set("notes", opt_text(self.notes.as_deref()))
            .set("location", opt_text(self.location.as_deref()))
            .set("status", MeetingStatus::Scheduled)
    }
}

// ============================================================================
// Notification
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: i64,
    /// Owner
    pub user_id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Record for Notification {
    const TABLE: &'static str = "notifications";
    const KIND: &'static str = "Notification";
    const COLUMNS: &'static [&'static str] = &["id", "user_id", "message", "created_at", "read"];
    const MUTABLE: &'static [&'static str] = &["read"];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            message: row.get("message")?,
            created_at: timestamp_column(row, "created_at")?,
            read: row.get("read")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub message: String,
}

impl Insertable for NewNotification {
    type Record = Notification;

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .set("user_id", self.user_id)
            .set("message", text(&self.message))
            .set("created_at", format_timestamp(&current_timestamp()))
            .set("read", false)
    }
}
