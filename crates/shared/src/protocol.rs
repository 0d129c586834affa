use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{LeadId, LeadStatus, User, UserRole},
    error::EnvelopeError,
};

/// Wrapper every backend response follows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    /// Absent counts as a failure.
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

impl Envelope<Value> {
    /// Unwraps `data` into the caller's type. A successful envelope without
    /// `data` decodes from `null`, so only unit-like targets accept it.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, EnvelopeError> {
        if !self.success {
            return Err(EnvelopeError::rejected(self.error));
        }
        let data = self.data.unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|e| EnvelopeError::Decode(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Me,
    Leads,
    Followups,
    Dashboard,
    Reports,
    Users,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "/auth/login",
            Self::Me => "/auth/me",
            Self::Leads => "/leads",
            Self::Followups => "/followups",
            Self::Dashboard => "/dashboard",
            Self::Reports => "/reports",
            Self::Users => "/users",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDraft {
    pub student_name: String,
    pub phone: String,
    pub source: String,
    pub course: String,
    pub city: String,
    pub status: LeadStatus,
    /// The backend writes this column verbatim, so an unset day goes out as
    /// `""` rather than being omitted.
    #[serde(default, with = "blank_day")]
    pub next_followup_date: Option<NaiveDate>,
    pub remark: String,
}

mod blank_day {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(
        day: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match day {
            Some(day) => serializer.collect_str(&day.format(FORMAT)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw, FORMAT)
            .map(Some)
            .map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdate {
    pub lead_id: LeadId,
    #[serde(flatten)]
    pub fields: LeadDraft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowupUpdate {
    pub id: LeadId,
    pub remark: String,
    pub status: LeadStatus,
    pub next_followup_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Inclusive reporting window sent as `startDate`/`endDate` query params.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Window ending on `today` and starting `days` earlier.
    pub fn last_days(today: NaiveDate, days: u64) -> Self {
        let start_date = today
            .checked_sub_days(chrono::Days::new(days))
            .unwrap_or(NaiveDate::MIN);
        Self::new(start_date, today)
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        vec![
            (
                "startDate".to_string(),
                self.start_date.format("%Y-%m-%d").to_string(),
            ),
            (
                "endDate".to_string(),
                self.end_date.format("%Y-%m-%d").to_string(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FALLBACK_ERROR_MESSAGE;
    use serde_json::json;

    fn envelope(raw: Value) -> Envelope {
        serde_json::from_value(raw).expect("envelope")
    }

    #[test]
    fn successful_envelope_returns_data_unmodified() {
        let data = json!({"totalLeads": 4, "nested": {"k": [1, 2]}});
        let unwrapped: Value = envelope(json!({"success": true, "data": data.clone()}))
            .into_data()
            .expect("data");
        assert_eq!(unwrapped, data);
    }

    #[test]
    fn failed_envelope_surfaces_error_or_fallback() {
        let err = envelope(json!({"success": false, "error": "unauthorized"}))
            .into_data::<Value>()
            .expect_err("rejected");
        assert_eq!(err, EnvelopeError::Rejected("unauthorized".into()));
        assert_eq!(err.to_string(), "unauthorized");

        let err = envelope(json!({"success": false, "message": "ignored"}))
            .into_data::<Value>()
            .expect_err("rejected");
        assert_eq!(err.to_string(), FALLBACK_ERROR_MESSAGE);

        let err = envelope(json!({"success": false, "error": ""}))
            .into_data::<Value>()
            .expect_err("rejected");
        assert_eq!(err.to_string(), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn missing_success_flag_is_a_failure() {
        let err = envelope(json!({"error": "unauthorized"}))
            .into_data::<Value>()
            .expect_err("rejected");
        assert_eq!(err, EnvelopeError::Rejected("unauthorized".into()));

        let err = envelope(json!({})).into_data::<Value>().expect_err("rejected");
        assert_eq!(err.to_string(), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn failed_envelope_ignores_any_data() {
        let err = envelope(json!({"success": false, "data": [1], "error": "nope"}))
            .into_data::<Vec<u8>>()
            .expect_err("rejected");
        assert_eq!(err, EnvelopeError::Rejected("nope".into()));
    }

    #[test]
    fn missing_data_only_decodes_into_unit_like_targets() {
        let raw = json!({"success": true, "message": "saved"});
        envelope(raw.clone()).into_data::<()>().expect("unit");
        assert_eq!(envelope(raw.clone()).into_data::<Option<u8>>(), Ok(None));
        assert!(matches!(
            envelope(raw).into_data::<Vec<u8>>(),
            Err(EnvelopeError::Decode(_))
        ));
    }

    #[test]
    fn lead_update_flattens_draft_fields() {
        let update = LeadUpdate {
            lead_id: LeadId::from("L9"),
            fields: LeadDraft {
                student_name: "Ravi".into(),
                phone: "555".into(),
                source: "Referral".into(),
                course: "Data Science".into(),
                city: "Pune".into(),
                status: LeadStatus::FollowUp,
                next_followup_date: NaiveDate::from_ymd_opt(2024, 6, 1),
                remark: "call back".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&update).expect("encode"),
            json!({
                "leadId": "L9",
                "studentName": "Ravi",
                "phone": "555",
                "source": "Referral",
                "course": "Data Science",
                "city": "Pune",
                "status": "Follow-up",
                "nextFollowupDate": "2024-06-01",
                "remark": "call back"
            })
        );
    }

    #[test]
    fn lead_draft_sends_blank_followup_date_when_unset() {
        let draft = LeadDraft {
            student_name: "Meera".into(),
            phone: "777".into(),
            source: "Walk-in".into(),
            course: "Web Dev".into(),
            city: "Nagpur".into(),
            status: LeadStatus::New,
            next_followup_date: None,
            remark: "first visit".into(),
        };
        let encoded = serde_json::to_value(&draft).expect("encode");
        assert_eq!(encoded["nextFollowupDate"], json!(""));

        let decoded: LeadDraft = serde_json::from_value(encoded).expect("decode");
        assert_eq!(decoded, draft);
    }

    #[test]
    fn date_range_params_use_iso_days() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).expect("date");
        let range = DateRange::last_days(today, 30);
        assert_eq!(range.start_date, NaiveDate::from_ymd_opt(2024, 2, 4).expect("date"));
        assert_eq!(
            range.to_params(),
            vec![
                ("startDate".to_string(), "2024-02-04".to_string()),
                ("endDate".to_string(), "2024-03-05".to_string()),
            ]
        );
    }

    #[test]
    fn routes_match_backend_names() {
        assert_eq!(Route::Login.as_str(), "/auth/login");
        assert_eq!(Route::Me.to_string(), "/auth/me");
        assert_eq!(Route::Followups.as_str(), "/followups");
    }
}
