// SPDX-License-Identifier: MPL-2.0

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use itertools::Itertools;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::records::Entry;

/// The calendar week containing `today`, as the half-open range
/// `[monday 00:00, next monday 00:00)`.
pub fn week_window(today: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let week_start = today - Days::new(today.weekday().num_days_from_monday().into());
    let week_end = week_start + Days::new(7);
    (
        week_start.and_time(NaiveTime::MIN),
        week_end.and_time(NaiveTime::MIN),
    )
}

/// Hours spent per project, largest total first.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProjectTotals(Vec<(String, f64)>);

impl ProjectTotals {
    /// Sums the duration of each entry per project.  Running entries are
    /// measured up to `now`.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>, now: NaiveDateTime) -> Self {
        let mut millis_for_project = HashMap::new();
        for entry in entries {
            let millis = entry.duration(now).num_milliseconds();
            millis_for_project
                .entry(entry.project_name)
                .and_modify(|e| *e += millis)
                .or_insert(millis);
        }

        let totals = millis_for_project
            .into_iter()
            .map(|(project, millis)| (project, millis_to_hours(millis)))
            // ties are broken by name so the output doesn't depend on hash order
            .sorted_by(|(a_name, a_hours), (b_name, b_hours)| {
                b_hours.total_cmp(a_hours).then_with(|| a_name.cmp(b_name))
            })
            .collect();
        Self(totals)
    }

    pub fn get(&self, project: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(name, _)| name == project)
            .map(|(_, hours)| *hours)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, hours)| (name.as_str(), *hours))
    }
}

impl Serialize for ProjectTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, hours) in &self.0 {
            map.serialize_entry(name, hours)?;
        }
        map.end()
    }
}

fn millis_to_hours(millis: i64) -> f64 {
    millis as f64 / (60.0 * 60.0 * 1000.0)
}
