//! Graph population
//!
//! Each usable row becomes five node merges followed by four relationship
//! merges, issued one at a time. Rows are independent: there is no batching
//! and no transaction spanning more than one statement, so a failure part
//! way through a row leaves the statements before it applied.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{GraphClient, StatementSummary, StoreError};
use crate::dataset::{
    Dataset, DatasetError, Row, COL_CAPITAL, COL_COUNTRY, COL_CURRENCY, COL_LANGUAGE,
    COL_LARGEST_CITY, REQUIRED_COLUMNS,
};
use crate::graph::{NodeKey, RelType, Statement, UNKNOWN_CURRENCY, UNKNOWN_LANGUAGE};

/// Errors that abort a load
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("Row {row}: {source}")]
    Store {
        /// 1-based data row number
        row: usize,
        #[source]
        source: StoreError,
    },
}

/// Values extracted from one row, sentinels already applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPlan {
    pub country: String,
    pub capital: String,
    pub largest_city: String,
    pub currency: String,
    pub language: String,
}

impl RowPlan {
    /// `None` when Country, Capital/Major City or Largest city is missing
    pub fn from_row(row: &Row<'_>) -> Option<Self> {
        let country = row.get(COL_COUNTRY)?;
        let capital = row.get(COL_CAPITAL)?;
        let largest_city = row.get(COL_LARGEST_CITY)?;

        Some(Self {
            country: country.to_string(),
            capital: capital.to_string(),
            largest_city: largest_city.to_string(),
            currency: row.get(COL_CURRENCY).unwrap_or(UNKNOWN_CURRENCY).to_string(),
            language: row.get(COL_LANGUAGE).unwrap_or(UNKNOWN_LANGUAGE).to_string(),
        })
    }

    /// Node merges first, then relationship merges
    pub fn statements(&self) -> Vec<Statement> {
        let country = NodeKey::country(&self.country);
        let capital = NodeKey::city(&self.capital);
        let largest = NodeKey::city(&self.largest_city);
        let currency = NodeKey::currency(&self.currency);
        let language = NodeKey::language(&self.language);

        vec![
            Statement::merge_node(country.clone()),
            Statement::merge_node(capital.clone()),
            Statement::merge_node(largest.clone()),
            Statement::merge_node(currency.clone()),
            Statement::merge_node(language.clone()),
            Statement::merge_relationship(country.clone(), RelType::LocatedAt, capital),
            Statement::merge_relationship(country.clone(), RelType::LargestCityIn, largest),
            Statement::merge_relationship(country.clone(), RelType::HasCurrency, currency),
            Statement::merge_relationship(country, RelType::Speaks, language),
        ]
    }
}

/// Outcome of a completed load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub statements: usize,
    pub nodes_created: u64,
    pub relationships_created: u64,
}

/// Loads datasets through a borrowed graph client
pub struct GraphLoader<'a, C: GraphClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: GraphClient + ?Sized> GraphLoader<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Load every row in dataset order, stopping at the first store error
    pub async fn load(&self, dataset: &Dataset) -> Result<LoadReport, LoadError> {
        dataset.require_columns(&REQUIRED_COLUMNS)?;

        let mut report = LoadReport::default();
        let mut created = StatementSummary::default();

        for (i, row) in dataset.rows().enumerate() {
            let row_number = i + 1;
            report.rows_read += 1;

            let Some(plan) = RowPlan::from_row(&row) else {
                warn!(row = row_number, "Skipping row with missing country or city");
                report.rows_skipped += 1;
                continue;
            };

            for statement in plan.statements() {
                let summary = self
                    .client
                    .execute(&statement)
                    .await
                    .map_err(|source| LoadError::Store {
                        row: row_number,
                        source,
                    })?;
                created += summary;
                report.statements += 1;
            }

            debug!(row = row_number, country = %plan.country, "Loaded row");
            report.rows_loaded += 1;
        }

        report.nodes_created = created.nodes_created;
        report.relationships_created = created.relationships_created;

        info!(
            rows = report.rows_read,
            loaded = report.rows_loaded,
            skipped = report.rows_skipped,
            nodes_created = report.nodes_created,
            relationships_created = report.relationships_created,
            "Knowledge graph populated"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::EmbeddedClient;

    const HEADER: &str = "Country,Capital/Major City,Largest city,Official language,Currency-Code\n";

    fn dataset(rows: &str) -> Dataset {
        Dataset::from_reader(format!("{HEADER}{rows}").as_bytes()).unwrap()
    }

    #[test]
    fn test_plan_applies_sentinels() {
        let data = dataset("Testland,Testville,Testville,NaN,\n");
        let plan = RowPlan::from_row(&data.rows().next().unwrap()).unwrap();
        assert_eq!(plan.language, UNKNOWN_LANGUAGE);
        assert_eq!(plan.currency, UNKNOWN_CURRENCY);
        assert_eq!(plan.capital, "Testville");
    }

    #[test]
    fn test_plan_requires_country_and_cities() {
        let data = dataset(
            ",Testville,Testville,Testish,TST\n\
             Testland,,Testville,Testish,TST\n\
             Testland,Testville,NaN,Testish,TST\n",
        );
        assert!(data.rows().all(|row| RowPlan::from_row(&row).is_none()));
    }

    #[test]
    fn test_statement_order() {
        let data = dataset("Testland,Testville,Bigtown,Testish,TST\n");
        let plan = RowPlan::from_row(&data.rows().next().unwrap()).unwrap();
        let statements = plan.statements();

        assert_eq!(statements.len(), 9);
        assert!(statements[..5]
            .iter()
            .all(|s| matches!(s, Statement::MergeNode(_))));
        assert_eq!(
            statements[6],
            Statement::merge_relationship(
                NodeKey::country("Testland"),
                RelType::LargestCityIn,
                NodeKey::city("Bigtown"),
            )
        );
    }

    #[tokio::test]
    async fn test_missing_required_column() {
        let data = Dataset::from_reader("Country,Largest city\nX,Y\n".as_bytes()).unwrap();
        let client = EmbeddedClient::new();
        let err = GraphLoader::new(&client).load(&data).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::Dataset(DatasetError::MissingColumns(_))
        ));
        assert_eq!(client.store_read().await.node_count(), 0);
    }

    #[tokio::test]
    async fn test_store_error_reports_row() {
        let data = dataset(
            "Testland,Testville,Testville,Testish,TST\n\
             Otherland,Othertown,Othertown,Otherish,OTH\n",
        );
        let client = EmbeddedClient::new();
        client.close().await.unwrap();

        match GraphLoader::new(&client).load(&data).await {
            Err(LoadError::Store { row, source }) => {
                assert_eq!(row, 1);
                assert!(matches!(source, StoreError::Closed));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_report_counts() {
        let data = dataset(
            "Testland,Testville,Testville,NaN,TST\n\
             ,Nowhere,Nowhere,Testish,TST\n",
        );
        let client = EmbeddedClient::new();
        let report = GraphLoader::new(&client).load(&data).await.unwrap();

        assert_eq!(report.rows_read, 2);
        assert_eq!(report.rows_loaded, 1);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.statements, 9);
        // Capital and largest city share one node
        assert_eq!(report.nodes_created, 4);
        assert_eq!(report.relationships_created, 4);
    }
}
