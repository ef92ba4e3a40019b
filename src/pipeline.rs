use serde_json::Value;
use tracing::{info, warn};

use crate::fetcher::{FetchError, ListingSource};
use crate::models::{Analysis, FlatListing};
use crate::processor::{JsonFlattener, ListingAnalyzer};

pub const NO_RESULTS_MESSAGE: &str =
    "No results returned for that suburb or property type combination.";

pub enum ReportOutcome {
    /// The upstream call worked but returned nothing to analyze.
    NoResults,
    Ready {
        raw: Vec<Value>,
        rows: Vec<FlatListing>,
        analysis: Analysis,
    },
}

pub struct SuburbReport<'a> {
    flattener: &'a JsonFlattener,
    analyzer: &'a ListingAnalyzer,
}

impl<'a> SuburbReport<'a> {
    pub fn new(flattener: &'a JsonFlattener, analyzer: &'a ListingAnalyzer) -> Self {
        Self {
            flattener,
            analyzer,
        }
    }

    pub fn flattener(&self) -> &'a JsonFlattener {
        self.flattener
    }

    pub fn analyzer(&self) -> &'a ListingAnalyzer {
        self.analyzer
    }

    pub async fn build(
        &self,
        source: &dyn ListingSource,
        suburb: &str,
        property_type: &str,
    ) -> Result<ReportOutcome, FetchError> {
        let raw = source.fetch_listings(suburb, property_type).await?;
        Ok(self.from_results(raw))
    }

    /// Flatten and analyze results that are already in hand.
    pub fn from_results(&self, raw: Vec<Value>) -> ReportOutcome {
        let rows = self.flattener.flatten(&raw);
        if rows.is_empty() {
            warn!("{}", NO_RESULTS_MESSAGE);
            return ReportOutcome::NoResults;
        }

        let analysis = self.analyzer.analyze(&rows);
        info!(
            "Report ready: {} raw listings, {} with a usable price",
            raw.len(),
            analysis.total_listings()
        );

        ReportOutcome::Ready {
            raw,
            rows,
            analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticSource(Result<Vec<Value>, u16>);

    #[async_trait]
    impl ListingSource for StaticSource {
        async fn fetch_listings(
            &self,
            _suburb: &str,
            _property_type: &str,
        ) -> Result<Vec<Value>, FetchError> {
            self.0.clone().map_err(FetchError::Status)
        }
    }

    #[tokio::test]
    async fn test_empty_upstream_is_no_results() {
        let (flattener, analyzer) = (JsonFlattener::new(), ListingAnalyzer::new());
        let report = SuburbReport::new(&flattener, &analyzer);

        let outcome = report
            .build(&StaticSource(Ok(vec![])), "Kotara", "all")
            .await
            .unwrap();
        assert!(matches!(outcome, ReportOutcome::NoResults));
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let (flattener, analyzer) = (JsonFlattener::new(), ListingAnalyzer::new());
        let report = SuburbReport::new(&flattener, &analyzer);

        let err = report
            .build(&StaticSource(Err(503)), "Kotara", "all")
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "API error: 503");
    }

    #[tokio::test]
    async fn test_ready_report_keeps_raw_rows_and_analysis() {
        let (flattener, analyzer) = (JsonFlattener::new(), ListingAnalyzer::new());
        let report = SuburbReport::new(&flattener, &analyzer);
        let source = StaticSource(Ok(vec![
            json!({"price": 500000, "property_type": "House", "address": {"sal": "Kotara"}}),
            json!({"price": 700000, "property_type": "House", "address": {"sal": "Kotara"}}),
            json!({"price": "POA", "property_type": "Unit"}),
        ]));

        match report.build(&source, "Kotara", "house").await.unwrap() {
            ReportOutcome::Ready {
                raw,
                rows,
                analysis,
            } => {
                assert_eq!(raw.len(), 3);
                assert_eq!(rows.len(), 3);
                assert_eq!(analysis.total_listings(), 2);
                assert_eq!(analysis.ptype_median.get("House"), Some(&600000.0));
            }
            ReportOutcome::NoResults => panic!("expected a ready report"),
        }
    }

    #[test]
    fn test_all_prices_dropped_is_still_a_report() {
        let (flattener, analyzer) = (JsonFlattener::new(), ListingAnalyzer::new());
        let report = SuburbReport::new(&flattener, &analyzer);

        let outcome = report.from_results(vec![json!({"price": "POA"})]);
        match outcome {
            ReportOutcome::Ready { analysis, .. } => assert_eq!(analysis.total_listings(), 0),
            ReportOutcome::NoResults => panic!("flattened table was not empty"),
        }
    }
}
