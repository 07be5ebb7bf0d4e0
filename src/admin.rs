use chrono::NaiveDate;

use crate::cohort;
use crate::error::CoreError;
use crate::models::{CohortReport, Overview};
use crate::store::Store;

/// Admin-facing operations: headline counts and the cohort risk analysis.
pub struct AdminOps<'a> {
    store: &'a dyn Store,
}

impl<'a> AdminOps<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn overview(&self) -> Result<Overview, CoreError> {
        Ok(self.store.overview().await?)
    }

    pub async fn cohort_report(&self, today: NaiveDate) -> Result<CohortReport, CoreError> {
        cohort::analyze(self.store, today).await
    }
}
