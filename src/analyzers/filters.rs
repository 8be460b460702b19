//! Category / owner / indicator allow-lists with cascading option lists.
//!
//! Each dimension only offers values still reachable under the dimensions
//! above it: owners depend on the selected categories, indicators on the
//! selected categories and owners. An empty allow-list matches nothing.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::analyzers::types::IndicatorRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub categories: BTreeSet<String>,
    pub owners: BTreeSet<String>,
    pub indicators: BTreeSet<String>,
}

impl Selection {
    /// Selects every value present in `records`.
    pub fn all(records: &[IndicatorRecord]) -> Self {
        Self {
            categories: records.iter().map(|r| r.category.clone()).collect(),
            owners: records.iter().map(|r| r.owner.clone()).collect(),
            indicators: records.iter().map(|r| r.indicator.clone()).collect(),
        }
    }

    /// Builds a selection top-down. `None` for a dimension selects every value
    /// reachable at that point; explicit choices are intersected with it.
    pub fn choose(
        records: &[IndicatorRecord],
        categories: Option<&[String]>,
        owners: Option<&[String]>,
        indicators: Option<&[String]>,
    ) -> Self {
        let mut selection = Selection::default();

        let options: BTreeSet<String> = records.iter().map(|r| r.category.clone()).collect();
        selection.categories = pick(categories, options);

        let options = FilterOptions::owners_under(records, &selection.categories);
        selection.owners = pick(owners, options);

        let options =
            FilterOptions::indicators_under(records, &selection.categories, &selection.owners);
        selection.indicators = pick(indicators, options);

        selection
    }

    /// Drops downstream choices that are no longer reachable.
    pub fn cascade(mut self, records: &[IndicatorRecord]) -> Self {
        let owners = FilterOptions::owners_under(records, &self.categories);
        self.owners.retain(|o| owners.contains(o));
        let indicators = FilterOptions::indicators_under(records, &self.categories, &self.owners);
        self.indicators.retain(|i| indicators.contains(i));
        self
    }

    pub fn matches(&self, record: &IndicatorRecord) -> bool {
        self.categories.contains(&record.category)
            && self.owners.contains(&record.owner)
            && self.indicators.contains(&record.indicator)
    }

    pub fn apply(&self, records: &[IndicatorRecord]) -> Vec<IndicatorRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

fn pick(chosen: Option<&[String]>, options: BTreeSet<String>) -> BTreeSet<String> {
    match chosen {
        Some(chosen) => chosen
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| options.contains(c))
            .collect(),
        None => options,
    }
}

/// Values a user can pick in each dimension, given the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub owners: Vec<String>,
    pub indicators: Vec<String>,
}

impl FilterOptions {
    pub fn cascade(records: &[IndicatorRecord], selection: &Selection) -> Self {
        let categories: BTreeSet<String> = records.iter().map(|r| r.category.clone()).collect();
        let owners = Self::owners_under(records, &selection.categories);
        let reachable_owners: BTreeSet<String> =
            selection.owners.intersection(&owners).cloned().collect();
        let indicators =
            Self::indicators_under(records, &selection.categories, &reachable_owners);

        Self {
            categories: categories.into_iter().collect(),
            owners: owners.into_iter().collect(),
            indicators: indicators.into_iter().collect(),
        }
    }

    fn owners_under(records: &[IndicatorRecord], categories: &BTreeSet<String>) -> BTreeSet<String> {
        records
            .iter()
            .filter(|r| categories.contains(&r.category))
            .map(|r| r.owner.clone())
            .collect()
    }

    fn indicators_under(
        records: &[IndicatorRecord],
        categories: &BTreeSet<String>,
        owners: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        records
            .iter()
            .filter(|r| categories.contains(&r.category) && owners.contains(&r.owner))
            .map(|r| r.indicator.clone())
            .collect()
    }
}
