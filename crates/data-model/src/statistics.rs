// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Aggregate platform metrics for a single day.
///
/// Every counter is computed independently from the current content of the
/// document, note and project tables when the snapshot is taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    /// The day being summarized
    pub date: NaiveDate,

    pub total_documents: u64,
    pub total_documents_public: u64,
    pub total_documents_organization: u64,
    pub total_documents_private: u64,
    pub total_documents_invisible: u64,

    pub total_documents_success: u64,
    pub total_documents_readable: u64,
    pub total_documents_pending: u64,
    pub total_documents_error: u64,
    pub total_documents_nofile: u64,
    pub total_documents_deleted: u64,

    pub total_pages: u64,
    pub total_pages_public: u64,
    pub total_pages_organization: u64,
    pub total_pages_private: u64,
    pub total_pages_invisible: u64,

    pub total_notes: u64,
    pub total_notes_public: u64,
    pub total_notes_organization: u64,
    pub total_notes_private: u64,
    pub total_notes_invisible: u64,

    pub total_users_uploaded: u64,
    pub total_users_public_uploaded: u64,
    pub total_users_private_uploaded: u64,
    pub total_users_organization_uploaded: u64,

    pub total_organizations_uploaded: u64,
    pub total_organizations_public_uploaded: u64,
    pub total_organizations_private_uploaded: u64,
    pub total_organizations_organization_uploaded: u64,

    pub total_projects: u64,
}

impl StatisticsSnapshot {
    /// The day summarized by a snapshot taken at `now`: the previous calendar
    /// day, in UTC.
    #[must_use]
    pub fn date_for_run(now: DateTime<Utc>) -> NaiveDate {
        now.date_naive().pred_opt().unwrap_or(NaiveDate::MIN)
    }
}

/// A stored [`StatisticsSnapshot`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub id: i64,

    #[serde(flatten)]
    pub snapshot: StatisticsSnapshot,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn date_is_previous_utc_day() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 5, 30, 0).unwrap();
        assert_eq!(
            StatisticsSnapshot::date_for_run(now),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );

        // Just after midnight UTC, which is still the previous day in most of
        // the Americas
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 1).unwrap();
        assert_eq!(
            StatisticsSnapshot::date_for_run(now),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
    }

    #[test]
    fn serialization_is_flat() {
        let statistics = Statistics {
            id: 42,
            snapshot: StatisticsSnapshot {
                date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                total_documents: 3,
                ..StatisticsSnapshot::default()
            },
        };

        let value = serde_json::to_value(&statistics).unwrap();
        assert_eq!(value["id"], 42);
        assert_eq!(value["date"], "2024-02-29");
        assert_eq!(value["total_documents"], 3);
        assert_eq!(value["total_projects"], 0);
    }
}
