//! Presentation helpers shared by front ends: follow-up agenda, lead search,
//! report shares and default reporting windows.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use shared::{domain::Lead, protocol::DateRange};

pub const DASHBOARD_DEFAULT_DAYS: u64 = 30;
pub const REPORTS_DEFAULT_DAYS: u64 = 7;

/// Calendar day used for follow-up bucketing. The backend stores UTC dates.
pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn default_dashboard_range(today: NaiveDate) -> DateRange {
    DateRange::last_days(today, DASHBOARD_DEFAULT_DAYS)
}

pub fn default_reports_range(today: NaiveDate) -> DateRange {
    DateRange::last_days(today, REPORTS_DEFAULT_DAYS)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowupAgenda {
    pub overdue: Vec<Lead>,
    pub due_today: Vec<Lead>,
}

impl FollowupAgenda {
    /// Buckets leads by next follow-up day. Leads without a readable date or
    /// scheduled after `today` are left out.
    pub fn partition(leads: impl IntoIterator<Item = Lead>, today: NaiveDate) -> Self {
        let mut agenda = Self::default();
        for lead in leads {
            match lead.next_followup_day() {
                Some(day) if day < today => agenda.overdue.push(lead),
                Some(day) if day == today => agenda.due_today.push(lead),
                _ => {}
            }
        }
        agenda
    }

    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.due_today.is_empty()
    }
}

/// Search over the lead table: name is case-insensitive, phone and id are
/// matched as typed.
pub fn filter_leads<'a>(leads: &'a [Lead], term: &str) -> Vec<&'a Lead> {
    let needle = term.to_lowercase();
    leads
        .iter()
        .filter(|lead| {
            lead.student_name.to_lowercase().contains(&needle)
                || lead.phone.contains(term)
                || lead.id.as_str().contains(term)
        })
        .collect()
}

/// Whole-number percentage of `value` in `total`; zero for an empty total.
pub fn share_percent(value: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    ((value as f64 / total as f64) * 100.0).round() as u64
}

/// Each bucket paired with its share of the bucket total.
pub fn breakdown(counts: &BTreeMap<String, u64>) -> Vec<(&str, u64, u64)> {
    let total: u64 = counts.values().sum();
    counts
        .iter()
        .map(|(label, count)| (label.as_str(), *count, share_percent(*count, total)))
        .collect()
}
