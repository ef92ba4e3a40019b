use chrono::Datelike;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::coercion::{
    as_label, extract_leading_number, number_label, parse_listing_date, to_number,
};
use crate::models::{
    AnalyzedListing, Analysis, FlatListing, RankedGroups, SAMPLE_ROW_LIMIT, SummaryStats, mean,
    median, round_to,
};

pub struct ListingAnalyzer;

impl ListingAnalyzer {
    pub fn new() -> Self {
        ListingAnalyzer
    }

    pub fn analyze(&self, rows: &[FlatListing]) -> Analysis {
        if rows.is_empty() {
            return Analysis::default();
        }

        let listings = self.coerce_rows(rows);
        let dropped = rows.len() - listings.len();
        if dropped > 0 {
            warn!(
                "Dropped {} of {} listings without a numeric price",
                dropped,
                rows.len()
            );
        }

        let analysis = Analysis {
            stats: Some(self.summary_stats(&listings)),
            yearly_counts: self.yearly_counts(&listings),
            ptype_median: self.median_price_by_property_type(&listings),
            bed_median: self.median_price_by_bedrooms(&listings),
            ptype_counts: self.property_type_counts(&listings),
            sample_rows: listings.into_iter().take(SAMPLE_ROW_LIMIT).collect(),
        };

        info!(
            "Analyzed {} listings across {} property types",
            analysis.total_listings(),
            analysis.ptype_counts.len()
        );

        analysis
    }

    /// Applies the column coercions and keeps only rows with a usable price.
    pub fn coerce_rows(&self, rows: &[FlatListing]) -> Vec<AnalyzedListing> {
        rows.iter().filter_map(|row| self.coerce_row(row)).collect()
    }

    fn coerce_row(&self, row: &FlatListing) -> Option<AnalyzedListing> {
        let price = to_number(row.price.as_ref())?;
        let listing_date = parse_listing_date(row.listing_date.as_ref());

        Some(AnalyzedListing {
            area_name: row.area_name.clone(),
            gnaf_pid: row.gnaf_pid.clone(),
            listing_date,
            price,
            property_type: as_label(row.property_type.as_ref()),

            bedrooms: to_number(row.bedrooms.as_ref()),
            bathrooms: to_number(row.bathrooms.as_ref()),
            garage_spaces: to_number(row.garage_spaces.as_ref()),
            building_size: row.building_size.clone(),
            land_size: row.land_size.clone(),

            sa1: row.sa1.clone(),
            suburb: row.suburb.clone(),
            state: row.state.clone(),
            street: row.street.clone(),

            latitude: row.latitude.clone(),
            longitude: row.longitude.clone(),

            building_size_num: extract_leading_number(row.building_size.as_ref()),
            land_size_num: extract_leading_number(row.land_size.as_ref()),
            year: listing_date.map(|date| date.year()),
        })
    }

    pub fn summary_stats(&self, listings: &[AnalyzedListing]) -> SummaryStats {
        let prices: Vec<f64> = listings.iter().map(|l| l.price).collect();
        let bedrooms: Vec<f64> = listings.iter().filter_map(|l| l.bedrooms).collect();
        let bathrooms: Vec<f64> = listings.iter().filter_map(|l| l.bathrooms).collect();

        SummaryStats {
            total_listings: listings.len(),
            median_price: median(&prices).map(|v| round_to(v, 2)),
            mean_price: mean(&prices).map(|v| round_to(v, 2)),
            min_price: prices.iter().copied().reduce(f64::min).map(|v| round_to(v, 2)),
            max_price: prices.iter().copied().reduce(f64::max).map(|v| round_to(v, 2)),
            avg_bedrooms: mean(&bedrooms).map(|v| v.round() as i64),
            avg_bathrooms: mean(&bathrooms).map(|v| v.round() as i64),
        }
    }

    pub fn yearly_counts(&self, listings: &[AnalyzedListing]) -> BTreeMap<i32, usize> {
        let mut counts = BTreeMap::new();
        for year in listings.iter().filter_map(|l| l.year) {
            *counts.entry(year).or_insert(0) += 1;
        }
        counts
    }

    pub fn median_price_by_property_type(&self, listings: &[AnalyzedListing]) -> RankedGroups<f64> {
        let groups = group_prices(
            listings
                .iter()
                .filter_map(|l| l.property_type.clone().map(|key| (key, l.price))),
        );
        RankedGroups::sorted_by_value(median_per_group(groups), true)
    }

    pub fn median_price_by_bedrooms(&self, listings: &[AnalyzedListing]) -> RankedGroups<f64> {
        let mut with_bedrooms: Vec<(f64, f64)> = listings
            .iter()
            .filter_map(|l| l.bedrooms.map(|beds| (beds, l.price)))
            .collect();
        with_bedrooms.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Numeric key order, not label order ("10" after "9")
        let entries: Vec<(String, Vec<f64>)> = with_bedrooms
            .chunk_by(|a, b| a.0 == b.0)
            .map(|chunk| {
                let prices = chunk.iter().map(|(_, price)| *price).collect();
                (number_label(chunk[0].0), prices)
            })
            .collect();

        RankedGroups::sorted_by_value(median_per_group(entries), false)
    }

    pub fn property_type_counts(&self, listings: &[AnalyzedListing]) -> RankedGroups<usize> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for key in listings.iter().filter_map(|l| l.property_type.as_ref()) {
            *counts.entry(key.clone()).or_insert(0) += 1;
        }
        RankedGroups::sorted_by_value(counts.into_iter().collect(), true)
    }
}

impl Default for ListingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Groups prices by label, returning groups in label order.
pub fn group_prices(pairs: impl Iterator<Item = (String, f64)>) -> Vec<(String, Vec<f64>)> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (key, price) in pairs {
        groups.entry(key).or_default().push(price);
    }
    groups.into_iter().collect()
}

fn median_per_group(groups: Vec<(String, Vec<f64>)>) -> Vec<(String, f64)> {
    groups
        .into_iter()
        .filter_map(|(key, prices)| median(&prices).map(|m| (key, m)))
        .collect()
}
