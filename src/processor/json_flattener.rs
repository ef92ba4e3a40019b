use anyhow::{Result, anyhow};
use polars::prelude::*;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, info};

use super::coercion::cell_text;
use crate::models::FlatListing;

static EMPTY: LazyLock<Map<String, Value>> = LazyLock::new(Map::new);

pub struct JsonFlattener;

impl JsonFlattener {
    pub fn new() -> Self {
        JsonFlattener
    }

    /// One row per input record, in input order. Never fails: missing
    /// nested objects and keys simply leave fields empty.
    pub fn flatten(&self, results: &[Value]) -> Vec<FlatListing> {
        let mut missing_address = 0;
        let mut missing_attributes = 0;

        let rows: Vec<FlatListing> = results
            .iter()
            .enumerate()
            .map(|(index, item)| {
                if !item.get("address").is_some_and(Value::is_object) {
                    missing_address += 1;
                    debug!("Listing at index {} has no address object", index);
                }
                if !item.get("attributes").is_some_and(Value::is_object) {
                    missing_attributes += 1;
                }
                self.extract_fields_directly(item)
            })
            .collect();

        info!(
            "Flattened {} listings ({} without address, {} without attributes)",
            rows.len(),
            missing_address,
            missing_attributes
        );

        rows
    }

    pub fn extract_fields_directly(&self, item: &Value) -> FlatListing {
        let top = item.as_object().unwrap_or(&*EMPTY);
        let attrs = nested(item, "attributes");
        let addr = nested(item, "address");
        let coords = nested(item, "coordinates");

        FlatListing {
            area_name: scalar(top, "area_name"),
            gnaf_pid: scalar(top, "gnaf_pid"),
            listing_date: scalar(top, "listing_date"),
            price: scalar(top, "price"),
            property_type: scalar(top, "property_type"),

            bedrooms: scalar(attrs, "bedrooms"),
            bathrooms: scalar(attrs, "bathrooms"),
            garage_spaces: scalar(attrs, "garage_spaces"),
            building_size: scalar(attrs, "building_size"),
            land_size: scalar(attrs, "land_size"),

            sa1: scalar(addr, "sa1"),
            suburb: scalar(addr, "sal"),
            state: scalar(addr, "state"),
            street: scalar(addr, "street"),

            latitude: scalar(coords, "latitude"),
            longitude: scalar(coords, "longitude"),
        }
    }

    /// Tabular view of the flattened listings, every column as nullable text.
    pub fn flatten_to_dataframe(&self, results: &[Value]) -> Result<DataFrame> {
        let rows = self.flatten(results);
        self.records_to_dataframe(&rows)
    }

    pub fn records_to_dataframe(&self, rows: &[FlatListing]) -> Result<DataFrame> {
        if rows.is_empty() {
            return Ok(DataFrame::empty());
        }

        let mut columns = Vec::with_capacity(FlatListing::COLUMNS.len());
        for field in FlatListing::COLUMNS {
            let values: Vec<Option<String>> = rows
                .iter()
                .map(|row| row.field(field).map(cell_text))
                .collect();

            let series = Series::new(field.into(), values);
            columns.push(series.into());
        }

        DataFrame::new(columns).map_err(|e| anyhow!("Failed to create DataFrame: {}", e))
    }
}

impl Default for JsonFlattener {
    fn default() -> Self {
        Self::new()
    }
}

fn nested<'a>(item: &'a Value, key: &str) -> &'a Map<String, Value> {
    item.get(key).and_then(Value::as_object).unwrap_or(&*EMPTY)
}

fn scalar(object: &Map<String, Value>, key: &str) -> Option<Value> {
    object.get(key).filter(|v| !v.is_null()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_listing() -> Value {
        json!({
            "area_name": "Belmont North",
            "gnaf_pid": "GANSW705012345",
            "listing_date": "2021-05-10",
            "price": 850000,
            "property_type": "House",
            "attributes": {
                "bedrooms": 4,
                "bathrooms": "2",
                "garage_spaces": 2,
                "building_size": "None",
                "land_size": "605 m²",
                "description": "ignored"
            },
            "address": {
                "sa1": "11103120801",
                "sal": "Belmont North",
                "state": "NSW",
                "street": "12 Example St"
            },
            "coordinates": {
                "latitude": -33.0205,
                "longitude": 151.6712
            }
        })
    }

    #[test]
    fn test_flatten_empty_input() {
        let flattener = JsonFlattener::new();
        assert!(flattener.flatten(&[]).is_empty());
        assert_eq!(flattener.flatten_to_dataframe(&[]).unwrap().height(), 0);
    }

    #[test]
    fn test_full_record_is_pulled_to_top_level() {
        let flattener = JsonFlattener::new();
        let row = flattener.extract_fields_directly(&sample_listing());

        assert_eq!(row.area_name, Some(json!("Belmont North")));
        assert_eq!(row.price, Some(json!(850000)));
        assert_eq!(row.bedrooms, Some(json!(4)));
        assert_eq!(row.bathrooms, Some(json!("2")));
        assert_eq!(row.land_size, Some(json!("605 m²")));
        assert_eq!(row.suburb, Some(json!("Belmont North")));
        assert_eq!(row.state, Some(json!("NSW")));
        assert_eq!(row.latitude, Some(json!(-33.0205)));
    }

    #[test]
    fn test_missing_and_null_nested_objects_yield_empty_fields() {
        let flattener = JsonFlattener::new();
        let records = vec![
            json!({"price": "500000"}),
            json!({"price": null, "attributes": null, "address": {"sal": null}}),
            json!({"address": "not an object", "coordinates": []}),
            json!("not even an object"),
        ];

        let rows = flattener.flatten(&records);
        assert_eq!(rows.len(), records.len());

        assert_eq!(rows[0].price, Some(json!("500000")));
        assert_eq!(rows[0].bedrooms, None);
        assert_eq!(rows[1], FlatListing::default());
        assert_eq!(rows[2].suburb, None);
        assert_eq!(rows[3], FlatListing::default());
    }

    #[test]
    fn test_suburb_comes_from_address_sal() {
        let flattener = JsonFlattener::new();
        let records = vec![
            json!({"address": {"sal": "Kotara"}}),
            json!({"address": {"sal": "Adamstown"}, "area_name": "Newcastle"}),
        ];

        for (record, row) in records.iter().zip(flattener.flatten(&records)) {
            assert_eq!(row.suburb.as_ref(), record["address"].get("sal"));
        }
    }

    #[test]
    fn test_dataframe_has_fixed_columns() {
        let flattener = JsonFlattener::new();
        let df = flattener
            .flatten_to_dataframe(&[sample_listing(), json!({})])
            .unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), FlatListing::COLUMNS.len());

        let suburb = df.column("suburb").unwrap().str().unwrap();
        assert_eq!(suburb.get(0), Some("Belmont North"));
        assert_eq!(suburb.get(1), None);

        let price = df.column("price").unwrap().str().unwrap();
        assert_eq!(price.get(0), Some("850000"));
    }
}
