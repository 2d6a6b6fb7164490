use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use storekit_db::query::{Fields, Value};

/// Field names shared by both storage layouts.
pub mod fields {
    pub const FULLNAME: &str = "fullname";
    pub const STATUS: &str = "status";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Pending,
    Suspended,
}

impl AccountStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "suspended" => Ok(Self::Suspended),
            other => Err(format!("unknown account status '{other}'")),
        }
    }
}

/// Backend-neutral account as returned to callers.
///
/// `id` is the canonical string form of the backend identity: a decimal
/// integer for relational stores, a lowercase hex `ObjectId` for documents.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccountView {
    pub id: String,
    pub fullname: String,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewAccount {
    pub fullname: String,
    pub status: AccountStatus,
}

impl NewAccount {
    #[must_use]
    pub fn into_fields(self) -> Fields {
        Fields::from([
            (fields::FULLNAME.to_owned(), Value::from(self.fullname)),
            (fields::STATUS.to_owned(), Value::from(self.status.as_str())),
        ])
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default)]
pub struct AccountPatch {
    pub fullname: Option<String>,
    pub status: Option<AccountStatus>,
}

impl AccountPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fullname.is_none() && self.status.is_none()
    }

    #[must_use]
    pub fn into_fields(self) -> Fields {
        let mut out = Fields::new();
        if let Some(name) = self.fullname {
            out.insert(fields::FULLNAME.to_owned(), Value::from(name));
        }
        if let Some(status) = self.status {
            out.insert(fields::STATUS.to_owned(), Value::from(status.as_str()));
        }
        out
    }
}
