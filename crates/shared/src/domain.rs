use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(&self.0)
            }
        }
    };
}

id_newtype!(LeadId);
id_newtype!(UserId);

/// Pipeline stage of a lead. Rows written by hand into the backing sheet can
/// carry a blank or misspelled status; those decode as `Other` with the raw
/// text so a single bad row never fails a whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LeadStatus {
    New,
    FollowUp,
    Converted,
    Dead,
    Other(String),
}

impl LeadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "New",
            Self::FollowUp => "Follow-up",
            Self::Converted => "Converted",
            Self::Dead => "Dead",
            Self::Other(raw) => raw,
        }
    }

    fn from_wire(raw: String) -> Self {
        match raw.as_str() {
            "New" => Self::New,
            "Follow-up" => Self::FollowUp,
            "Converted" => Self::Converted,
            "Dead" => Self::Dead,
            _ => Self::Other(raw),
        }
    }

    fn blank() -> Self {
        Self::Other(String::new())
    }
}

impl Serialize for LeadStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LeadStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(Self::from_wire(raw))
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Only the four known stages parse; `Other` exists for decoding backend rows.
impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "follow-up" | "followup" | "follow_up" => Ok(Self::FollowUp),
            "converted" => Ok(Self::Converted),
            "dead" => Ok(Self::Dead),
            other => Err(format!("unknown lead status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Counselor,
}

impl UserRole {
    /// Staff administration is reserved for admins.
    pub fn can_manage_users(self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Counselor => "Counselor",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("admin") {
            Ok(Self::Admin)
        } else if s.eq_ignore_ascii_case("counselor") {
            Ok(Self::Counselor)
        } else {
            Err(format!("unknown user role '{s}'"))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub status: UserStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub assigned_counselor: String,
    #[serde(default = "LeadStatus::blank")]
    pub status: LeadStatus,
    #[serde(default)]
    pub last_remark: String,
    #[serde(default)]
    pub next_followup_date: Option<String>,
    #[serde(default)]
    pub conversion_date: Option<String>,
    #[serde(default)]
    pub created_by: String,
}

impl Lead {
    /// Calendar day of the next follow-up. The backend sends either a full
    /// RFC 3339 timestamp (read as a UTC day) or a bare `YYYY-MM-DD`.
    pub fn next_followup_day(&self) -> Option<NaiveDate> {
        let raw = self.next_followup_date.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc).date_naive());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_leads: u64,
    pub new_leads: u64,
    pub followups_due: u64,
    pub converted: u64,
    pub dead: u64,
    pub conversion_rate: String,
    #[serde(default)]
    pub counselors: Vec<CounselorPerformance>,
}

/// One row of the dashboard's per-counselor breakdown. `rate` is preformatted
/// by the backend (for example `"33%"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounselorPerformance {
    pub name: String,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub converted: u64,
    #[serde(default)]
    pub rate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProductivity {
    pub date: String,
    pub counselor: String,
    #[serde(default)]
    pub added: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub converted: u64,
    #[serde(default)]
    pub dead: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    #[serde(default)]
    pub by_status: std::collections::BTreeMap<String, u64>,
    #[serde(default)]
    pub by_source: std::collections::BTreeMap<String, u64>,
    #[serde(default)]
    pub by_course: std::collections::BTreeMap<String, u64>,
    #[serde(default)]
    pub daily_productivity: Vec<DailyProductivity>,
}
