use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One listing pulled up to a single level. Every field keeps the JSON
/// scalar it arrived as; `None` covers both a missing key and JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatListing {
    pub area_name: Option<Value>,
    pub gnaf_pid: Option<Value>,
    pub listing_date: Option<Value>,
    pub price: Option<Value>,
    pub property_type: Option<Value>,

    pub bedrooms: Option<Value>,
    pub bathrooms: Option<Value>,
    pub garage_spaces: Option<Value>,
    pub building_size: Option<Value>,
    pub land_size: Option<Value>,

    pub sa1: Option<Value>,
    pub suburb: Option<Value>,
    pub state: Option<Value>,
    pub street: Option<Value>,

    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
}

impl FlatListing {
    pub const COLUMNS: [&'static str; 16] = [
        "area_name",
        "gnaf_pid",
        "listing_date",
        "price",
        "property_type",
        "bedrooms",
        "bathrooms",
        "garage_spaces",
        "building_size",
        "land_size",
        "sa1",
        "suburb",
        "state",
        "street",
        "latitude",
        "longitude",
    ];

    pub fn field(&self, column: &str) -> Option<&Value> {
        match column {
            "area_name" => self.area_name.as_ref(),
            "gnaf_pid" => self.gnaf_pid.as_ref(),
            "listing_date" => self.listing_date.as_ref(),
            "price" => self.price.as_ref(),
            "property_type" => self.property_type.as_ref(),
            "bedrooms" => self.bedrooms.as_ref(),
            "bathrooms" => self.bathrooms.as_ref(),
            "garage_spaces" => self.garage_spaces.as_ref(),
            "building_size" => self.building_size.as_ref(),
            "land_size" => self.land_size.as_ref(),
            "sa1" => self.sa1.as_ref(),
            "suburb" => self.suburb.as_ref(),
            "state" => self.state.as_ref(),
            "street" => self.street.as_ref(),
            "latitude" => self.latitude.as_ref(),
            "longitude" => self.longitude.as_ref(),
            _ => None,
        }
    }
}

/// A listing that survived price coercion, with its numeric and date
/// columns parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzedListing {
    pub area_name: Option<Value>,
    pub gnaf_pid: Option<Value>,
    pub listing_date: Option<NaiveDate>,
    pub price: f64,
    pub property_type: Option<String>,

    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub garage_spaces: Option<f64>,
    pub building_size: Option<Value>,
    pub land_size: Option<Value>,

    pub sa1: Option<Value>,
    pub suburb: Option<Value>,
    pub state: Option<Value>,
    pub street: Option<Value>,

    pub latitude: Option<Value>,
    pub longitude: Option<Value>,

    pub building_size_num: Option<f64>,
    pub land_size_num: Option<f64>,
    pub year: Option<i32>,
}
