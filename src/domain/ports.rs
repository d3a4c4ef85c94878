use crate::domain::model::{FinancialYear, PassType, SequenceCounter};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Durable home of the per-(year, type) counters.
///
/// Implementations must make `allocate` a single atomic step in the storage
/// engine: a number is returned only once it has been committed, and two
/// callers never receive the same number for the same key.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Create-or-increment the counter and return its new value.
    async fn allocate(&self, financial_year: FinancialYear, pass_type: PassType) -> Result<u32>;

    async fn list(&self) -> Result<Vec<SequenceCounter>>;

    async fn list_by_year(&self, financial_year: FinancialYear) -> Result<Vec<SequenceCounter>>;

    /// Overwrite `current_sequence` of row `id`. Not coordinated with
    /// concurrent `allocate` calls on the same row.
    async fn set_sequence(&self, id: i64, value: u32) -> Result<SequenceCounter>;
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// 固定日期，用於測試與補發
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
