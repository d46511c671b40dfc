use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::filter::Filter;

/// A column of the rentals dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    RentalId,
    ApartmentType,
    Location,
    RenterType,
    BudgetRange,
    PreferredStyle,
    RecommendedFurniture,
}

impl Field {
    /// Every required column, in dataset order
    pub const ALL: [Field; 7] = [
        Field::RentalId,
        Field::ApartmentType,
        Field::Location,
        Field::RenterType,
        Field::BudgetRange,
        Field::PreferredStyle,
        Field::RecommendedFurniture,
    ];

    /// Columns offered as equality filters
    pub const FILTERABLE: [Field; 4] = [
        Field::ApartmentType,
        Field::Location,
        Field::BudgetRange,
        Field::PreferredStyle,
    ];

    /// Columns concatenated into the combined text, in order
    pub const COMBINED_TEXT: [Field; 6] = [
        Field::ApartmentType,
        Field::Location,
        Field::RenterType,
        Field::BudgetRange,
        Field::PreferredStyle,
        Field::RecommendedFurniture,
    ];

    /// Column name as it appears in the dataset header
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Field::RentalId => "rental_id",
            Field::ApartmentType => "apartment_type",
            Field::Location => "location",
            Field::RenterType => "renter_type",
            Field::BudgetRange => "budget_range",
            Field::PreferredStyle => "preferred_style",
            Field::RecommendedFurniture => "recommended_furniture",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s.trim())
            .ok_or_else(|| Error::InvalidConfig(format!("unknown field '{}'", s)))
    }
}

/// One row of the rentals dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub rental_id: String,
    pub apartment_type: String,
    pub location: String,
    pub renter_type: String,
    pub budget_range: String,
    pub preferred_style: String,
    pub recommended_furniture: String,
}

impl Record {
    #[inline]
    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::RentalId => &self.rental_id,
            Field::ApartmentType => &self.apartment_type,
            Field::Location => &self.location,
            Field::RenterType => &self.renter_type,
            Field::BudgetRange => &self.budget_range,
            Field::PreferredStyle => &self.preferred_style,
            Field::RecommendedFurniture => &self.recommended_furniture,
        }
    }

    /// Space-joined values of `fields`, in the given order
    pub fn combined_text(&self, fields: &[Field]) -> String {
        fields
            .iter()
            .map(|&field| self.get(field))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The user-facing projection of this record
    #[must_use]
    pub fn listing(&self) -> Listing {
        Listing {
            apartment_type: self.apartment_type.clone(),
            location: self.location.clone(),
            budget_range: self.budget_range.clone(),
            preferred_style: self.preferred_style.clone(),
            recommended_furniture: self.recommended_furniture.clone(),
        }
    }
}

/// Projection of a record returned to callers.
/// The identifier and renter type are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub apartment_type: String,
    pub location: String,
    pub budget_range: String,
    pub preferred_style: String,
    pub recommended_furniture: String,
}

impl Listing {
    /// Header row matching [`Listing::values`]
    pub const COLUMNS: [Field; 5] = [
        Field::ApartmentType,
        Field::Location,
        Field::BudgetRange,
        Field::PreferredStyle,
        Field::RecommendedFurniture,
    ];

    pub fn values(&self) -> [&str; 5] {
        [
            &self.apartment_type,
            &self.location,
            &self.budget_range,
            &self.preferred_style,
            &self.recommended_furniture,
        ]
    }
}

/// Immutable, ordered table of records.
///
/// Row positions are the indices used by feature vectors and the
/// similarity matrix, so the order never changes after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordTable {
    records: Vec<Record>,
}

impl RecordTable {
    #[inline]
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Combined text of every record, in row order
    pub fn combined_texts(&self, fields: &[Field]) -> Vec<String> {
        self.records.iter().map(|r| r.combined_text(fields)).collect()
    }

    /// Row of the first record whose `field` equals `value`
    pub fn position(&self, field: Field, value: &str) -> Option<usize> {
        self.records.iter().position(|r| r.get(field) == value)
    }

    /// Row of the first record accepted by `filter`
    pub fn first_match<F: Filter + ?Sized>(&self, filter: &F) -> Option<usize> {
        self.records.iter().position(|r| filter.matches(r))
    }

    /// Rows accepted by `filter`, in table order
    pub fn matching<'a, F: Filter + ?Sized>(
        &'a self,
        filter: &'a F,
    ) -> impl Iterator<Item = usize> + 'a {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, r)| filter.matches(r))
            .map(|(i, _)| i)
    }

    /// Sorted distinct values of a column
    pub fn distinct(&self, field: Field) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.get(field))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Uniformly random record among those accepted by `filter`
    pub fn sample<F, R>(&self, filter: &F, rng: &mut R) -> Option<&Record>
    where
        F: Filter + ?Sized,
        R: rand::Rng + ?Sized,
    {
        use rand::seq::IndexedRandom;

        let rows: Vec<usize> = self.matching(filter).collect();
        rows.choose(rng).and_then(|&i| self.records.get(i))
    }
}

impl FromIterator<Record> for RecordTable {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RecordTable {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
pub(crate) fn record(
    id: &str,
    apt: &str,
    loc: &str,
    renter: &str,
    budget: &str,
    style: &str,
    furniture: &str,
) -> Record {
    Record {
        rental_id: id.to_string(),
        apartment_type: apt.to_string(),
        location: loc.to_string(),
        renter_type: renter.to_string(),
        budget_range: budget.to_string(),
        preferred_style: style.to_string(),
        recommended_furniture: furniture.to_string(),
    }
}
