// Record filters used to pick an anchor from the table
use serde::{Deserialize, Serialize};

use crate::record::{Field, Record};

pub trait Filter {
    fn matches(&self, record: &Record) -> bool;
}

impl<F: Fn(&Record) -> bool> Filter for F {
    fn matches(&self, record: &Record) -> bool {
        self(record)
    }
}

/// Conjunction of equality filters on the categorical columns plus a
/// case-insensitive substring search on the furniture name.
///
/// Unset fields are inactive. Blank values and the `"Any"` sentinel used by
/// selection widgets are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_style: Option<String>,
    /// Substring searched in `recommended_furniture`, case-insensitive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Value used by selection widgets to mean "no restriction"
pub const ANY: &str = "Any";

fn active(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ANY))
        .map(str::to_string)
}

impl RecordFilter {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn apartment_type(mut self, value: &str) -> Self {
        self.apartment_type = active(Some(value));
        self
    }

    #[must_use]
    pub fn location(mut self, value: &str) -> Self {
        self.location = active(Some(value));
        self
    }

    #[must_use]
    pub fn budget_range(mut self, value: &str) -> Self {
        self.budget_range = active(Some(value));
        self
    }

    #[must_use]
    pub fn preferred_style(mut self, value: &str) -> Self {
        self.preferred_style = active(Some(value));
        self
    }

    #[must_use]
    pub fn search(mut self, query: &str) -> Self {
        let query = query.trim();
        self.search = (!query.is_empty()).then(|| query.to_string());
        self
    }

    /// Drop blank and sentinel values, e.g. after deserializing a query string
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            apartment_type: active(self.apartment_type.as_deref()),
            location: active(self.location.as_deref()),
            budget_range: active(self.budget_range.as_deref()),
            preferred_style: active(self.preferred_style.as_deref()),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    /// Active equality constraints
    pub fn equalities(&self) -> impl Iterator<Item = (Field, &str)> {
        [
            (Field::ApartmentType, &self.apartment_type),
            (Field::Location, &self.location),
            (Field::BudgetRange, &self.budget_range),
            (Field::PreferredStyle, &self.preferred_style),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
    }

    /// True when no constraint is active
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.equalities().next().is_none() && self.search.is_none()
    }
}

impl Filter for RecordFilter {
    fn matches(&self, record: &Record) -> bool {
        if !self.equalities().all(|(field, value)| record.get(field) == value) {
            return false;
        }
        match &self.search {
            Some(query) => record
                .recommended_furniture
                .to_lowercase()
                .contains(&query.to_lowercase()),
            None => true,
        }
    }
}
