use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

use super::listing::AnalyzedListing;

pub const SAMPLE_ROW_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SummaryStats {
    pub total_listings: usize,
    pub median_price: Option<f64>,
    pub mean_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub avg_bedrooms: Option<i64>,
    pub avg_bathrooms: Option<i64>,
}

/// Label → value pairs in presentation order. Serializes as a JSON object
/// whose keys keep that order.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedGroups<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for RankedGroups<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V: Copy + PartialOrd> RankedGroups<V> {
    /// Stable sort by value: entries that compare equal keep their
    /// incoming order.
    pub fn sorted_by_value(entries: Vec<(String, V)>, descending: bool) -> Self {
        let mut entries = entries;
        entries.sort_by(|a, b| {
            let ord = a
                .1
                .partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal);
            if descending { ord.reverse() } else { ord }
        });
        Self { entries }
    }
}

impl<V> RankedGroups<V> {
    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, value)| value)
    }

    #[cfg(test)]
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for RankedGroups<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Everything the analyzer produces for one suburb.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Analysis {
    /// `None` only when there was no input at all.
    pub stats: Option<SummaryStats>,
    pub yearly_counts: BTreeMap<i32, usize>,
    pub ptype_median: RankedGroups<f64>,
    pub bed_median: RankedGroups<f64>,
    pub ptype_counts: RankedGroups<usize>,
    pub sample_rows: Vec<AnalyzedListing>,
}

impl Analysis {
    pub fn total_listings(&self) -> usize {
        self.stats.as_ref().map_or(0, |s| s.total_listings)
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
