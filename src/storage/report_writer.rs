use anyhow::{Context, Result, anyhow};
use polars::prelude::*;
use serde_json::Value;
use std::fs::{self, File};
use std::path::Path;
use tracing::{info, warn};

use crate::fetcher::extract_results;
use crate::models::{AnalyzedListing, Analysis};
use crate::processor::coercion::cell_text;

pub struct ReportWriter;

impl ReportWriter {
    /// Console rendering of the six report sections.
    pub fn log_report(suburb: &str, property_type: &str, analysis: &Analysis) {
        info!("=== Suburb report: {} ({}) ===", suburb, property_type);

        let Some(stats) = &analysis.stats else {
            warn!("No listings to summarise");
            return;
        };

        info!("Total listings: {}", stats.total_listings);
        info!("Median price: {}", display_price(stats.median_price));
        info!("Mean price: {}", display_price(stats.mean_price));
        info!(
            "Price range: {} to {}",
            display_price(stats.min_price),
            display_price(stats.max_price)
        );
        info!(
            "Average bedrooms: {}, average bathrooms: {}",
            display_count(stats.avg_bedrooms),
            display_count(stats.avg_bathrooms)
        );

        info!("--- Listings per year ---");
        for (year, count) in &analysis.yearly_counts {
            info!("{}: {}", year, count);
        }

        info!("--- Median price by property type ---");
        for (property_type, price) in analysis.ptype_median.iter() {
            info!("{}: {}", property_type, display_price(Some(*price)));
        }

        info!("--- Median price by bedrooms ---");
        for (bedrooms, price) in analysis.bed_median.iter() {
            info!("{} bed: {}", bedrooms, display_price(Some(*price)));
        }

        info!("--- Property type distribution ---");
        for (property_type, count) in analysis.ptype_counts.iter() {
            info!("{}: {}", property_type, count);
        }

        info!("--- Sample listings ({}) ---", analysis.sample_rows.len());
        for row in &analysis.sample_rows {
            info!(
                "{} | {} | {} | {} bed",
                row.street.as_ref().map(cell_text).unwrap_or_default(),
                row.property_type.as_deref().unwrap_or("-"),
                display_price(Some(row.price)),
                display_count(row.bedrooms.map(|b| b as i64))
            );
        }
    }

    pub fn store_raw_json(path: &Path, results: &[Value]) -> Result<()> {
        let raw_json = serde_json::to_string_pretty(results)?;
        fs::write(path, raw_json)
            .with_context(|| format!("Failed to write raw listings to {}", path.display()))?;
        info!("Stored {} raw listings at: {}", results.len(), path.display());
        Ok(())
    }

    /// Reads a saved response. Accepts the API's `{"results": [...]}`
    /// envelope or a bare array of listings.
    pub fn load_raw_results(path: &Path) -> Result<Vec<Value>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read raw listings from {}", path.display()))?;
        let data: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse raw listings in {}", path.display()))?;

        match data {
            Value::Array(results) => Ok(results),
            Value::Object(_) => Ok(extract_results(&data)),
            _ => Err(anyhow!(
                "Expected a JSON array or object in {}",
                path.display()
            )),
        }
    }

    pub fn store_summary_json(path: &Path, analysis: &Analysis) -> Result<()> {
        let summary = serde_json::to_string_pretty(analysis)?;
        fs::write(path, summary)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        info!("Stored summary at: {}", path.display());
        Ok(())
    }

    pub fn store_parquet(path: &Path, listings: &[AnalyzedListing]) -> Result<()> {
        let mut df = Self::listings_to_dataframe(listings)?;

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create Parquet file {}", path.display()))?;
        ParquetWriter::new(&mut file).finish(&mut df)?;

        info!("Stored {} analyzed listings at: {}", df.height(), path.display());
        Ok(())
    }

    pub fn listings_to_dataframe(listings: &[AnalyzedListing]) -> Result<DataFrame> {
        let listing_dates: Vec<Option<String>> = listings
            .iter()
            .map(|l| l.listing_date.map(|d| d.to_string()))
            .collect();
        let prices: Vec<f64> = listings.iter().map(|l| l.price).collect();
        let property_types: Vec<Option<String>> =
            listings.iter().map(|l| l.property_type.clone()).collect();
        let years: Vec<Option<i32>> = listings.iter().map(|l| l.year).collect();

        let columns = vec![
            text_column("area_name", listings, |l| l.area_name.as_ref()),
            text_column("gnaf_pid", listings, |l| l.gnaf_pid.as_ref()),
            Series::new("listing_date".into(), listing_dates).into(),
            Series::new("price".into(), prices).into(),
            Series::new("property_type".into(), property_types).into(),
            number_column("bedrooms", listings, |l| l.bedrooms),
            number_column("bathrooms", listings, |l| l.bathrooms),
            number_column("garage_spaces", listings, |l| l.garage_spaces),
            text_column("building_size", listings, |l| l.building_size.as_ref()),
            text_column("land_size", listings, |l| l.land_size.as_ref()),
            text_column("sa1", listings, |l| l.sa1.as_ref()),
            text_column("suburb", listings, |l| l.suburb.as_ref()),
            text_column("state", listings, |l| l.state.as_ref()),
            text_column("street", listings, |l| l.street.as_ref()),
            text_column("latitude", listings, |l| l.latitude.as_ref()),
            text_column("longitude", listings, |l| l.longitude.as_ref()),
            number_column("building_size_num", listings, |l| l.building_size_num),
            number_column("land_size_num", listings, |l| l.land_size_num),
            Series::new("year".into(), years).into(),
        ];

        DataFrame::new(columns).map_err(|e| anyhow!("Failed to create DataFrame: {}", e))
    }
}

fn text_column(
    name: &str,
    listings: &[AnalyzedListing],
    pick: impl Fn(&AnalyzedListing) -> Option<&Value>,
) -> Column {
    let values: Vec<Option<String>> = listings.iter().map(|l| pick(l).map(cell_text)).collect();
    Series::new(name.into(), values).into()
}

fn number_column(
    name: &str,
    listings: &[AnalyzedListing],
    pick: impl Fn(&AnalyzedListing) -> Option<f64>,
) -> Column {
    let values: Vec<Option<f64>> = listings.iter().map(pick).collect();
    Series::new(name.into(), values).into()
}

fn display_price(price: Option<f64>) -> String {
    match price {
        Some(value) => format!("${:.2}", value),
        None => "n/a".to_string(),
    }
}

fn display_count(count: Option<i64>) -> String {
    count.map_or_else(|| "n/a".to_string(), |c| c.to_string())
}
