//! Core ledger processing and business logic
//!
//! Rows from the ledger sheet are mapped into [`Transaction`]s, classified
//! onto the account or cash ledger, and replayed by the [`BalanceEngine`]
//! into a month [`AccountSnapshot`]. [`Ledger`] wires these together with a
//! [`SheetStore`](sheetledger_sheet::SheetStore) and a month cache.

pub mod cache;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod models;
pub mod reports;
pub mod types;

use chrono::Utc;
use rust_decimal::Decimal;
use sheetledger_config::Config;
use sheetledger_sheet::{AmountFormat, CsvSheetStore, DateNormalizer, StoreRef};
use std::sync::Arc;

pub use cache::{CacheRef, CachedTransactions, NoopCache, TransactionCache, TtlCache};
pub use classifier::LedgerClassifier;
pub use engine::BalanceEngine;
pub use error::{CoreError, CoreResult, ErrorCode, ErrorContext, ErrorLogger, ErrorSeverity};
pub use mapper::RowMapper;
pub use models::{AccountSnapshot, Transaction, TransactionDraft};
pub use reports::{CategoryBreakdown, CategoryReport, MonthlySummary, YearOverview};
pub use types::{Classification, Direction, LedgerKind, Period};

use error::DefaultErrorLogger;

/// The ledger service
pub struct Ledger {
    config: Config,
    store: StoreRef,
    advance_store: Option<StoreRef>,
    cache: CacheRef,
    classifier: Arc<LedgerClassifier>,
    mapper: RowMapper,
    engine: BalanceEngine,
    error_logger: Box<dyn ErrorLogger>,
}

impl Ledger {
    /// Create a ledger over `store`
    pub fn new(config: Config, store: StoreRef, cache: CacheRef) -> Self {
        let classifier = Arc::new(LedgerClassifier::new(&config.ledger));
        let amount_format = AmountFormat::new(
            config.currency.thousands_separators.clone(),
            config.currency.decimal_separator,
        );

        Self {
            mapper: RowMapper::new(Arc::clone(&classifier), amount_format),
            engine: BalanceEngine::new(Arc::clone(&classifier), Arc::new(DateNormalizer::default())),
            classifier,
            config,
            store,
            advance_store: None,
            cache,
            error_logger: Box::new(DefaultErrorLogger),
        }
    }

    /// Also append advance rows to `store`
    pub fn with_advance_store(mut self, store: StoreRef) -> Self {
        self.advance_store = Some(store);
        self
    }

    /// Build the CSV-backed ledger described by `config`
    pub fn from_config(config: Config) -> Self {
        let store: StoreRef = Arc::new(CsvSheetStore::new(config.data.path.clone(), config.data.header_rows));
        let cache: CacheRef = if config.cache.enabled {
            Arc::new(TtlCache::new(config.cache_ttl()))
        } else {
            Arc::new(NoopCache)
        };
        let advance_store = config
            .data
            .advance_path
            .clone()
            .map(|path| Arc::new(CsvSheetStore::new(path, config.data.header_rows)) as StoreRef);

        let ledger = Self::new(config, store, cache);
        match advance_store {
            Some(store) => ledger.with_advance_store(store),
            None => ledger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &BalanceEngine {
        &self.engine
    }

    // ==================== Reads ====================

    /// Every transaction in the sheet, in row order
    pub async fn all_transactions(&self) -> CoreResult<Vec<Transaction>> {
        let rows = self.store.read_all_rows().await?;
        let transactions = self.mapper.map_rows(&rows);
        log::debug!("Mapped {} transaction(s) from {} row(s)", transactions.len(), rows.len());
        Ok(transactions)
    }

    /// Snapshot for a month, surfacing store failures
    pub async fn try_compute_snapshot(&self, month: u32, year: i32) -> CoreResult<AccountSnapshot> {
        let period = Period::new(month, year).ok_or(CoreError::InvalidPeriod { month, year })?;
        let transactions = self.all_transactions().await?;
        Ok(self.engine.reconstruct(&transactions, period))
    }

    /// Snapshot for a month; all zeros when the sheet cannot be read
    pub async fn compute_snapshot(&self, month: u32, year: i32) -> AccountSnapshot {
        match self.try_compute_snapshot(month, year).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let context = ErrorContext::new("compute_snapshot")
                    .with_data("month", serde_json::json!(month))
                    .with_data("year", serde_json::json!(year));
                self.error_logger.log_error(&e, &context);
                AccountSnapshot::zeroed(month, year, Utc::now())
            }
        }
    }

    /// Transactions dated in a month, oldest first, served from cache when fresh
    pub async fn transactions_for_month(&self, month: u32, year: i32) -> CoreResult<CachedTransactions> {
        let period = Period::new(month, year).ok_or(CoreError::InvalidPeriod { month, year })?;
        let key = period.cache_key();

        if let Some(cached) = self.cache.get(&key) {
            log::debug!("Cache hit for {}", key);
            return Ok(cached);
        }

        let all = self.all_transactions().await?;
        let normalizer = self.engine.normalizer();
        let mut month_txs: Vec<Transaction> = self.engine.in_period(&all, period).cloned().collect();
        month_txs.sort_by_key(|tx| (tx.resolve_date(normalizer).map(|d| d.day), tx.row_position));

        let payload = Arc::new(month_txs);
        self.cache.put(&key, Arc::clone(&payload));
        Ok(payload)
    }

    /// Expense breakdown by category for a month
    pub async fn category_breakdown(&self, month: u32, year: i32) -> CoreResult<CategoryReport> {
        let period = Period::new(month, year).ok_or(CoreError::InvalidPeriod { month, year })?;
        let transactions = self.all_transactions().await?;
        Ok(reports::category_report(
            &self.engine,
            &transactions,
            period,
            &self.config.currency.default_currency,
        ))
    }

    /// Income and expenses for each month of `year`
    pub async fn year_overview(&self, year: i32) -> CoreResult<YearOverview> {
        let transactions = self.all_transactions().await?;
        Ok(reports::year_overview(&self.engine, &transactions, year, Utc::now()))
    }

    // ==================== Writes ====================

    /// Append a transaction and return its row position
    pub async fn add_transaction(&self, draft: TransactionDraft) -> CoreResult<usize> {
        let period = self.validate(&draft)?;
        let row = self.mapper.to_row(&draft, Utc::now())?;
        let position = self.store.append_row(&row).await?;
        log::info!("Added transaction at row {} ({} {})", position, draft.category, draft.amount);

        if self.classifier.is_mirrored(&draft.category) {
            if let Some(advance_store) = &self.advance_store {
                // primary row stays even if the mirror fails
                if let Err(e) = advance_store.append_row(&row).await {
                    let context = ErrorContext::new("add_transaction")
                        .with_data("position", serde_json::json!(position));
                    self.error_logger
                        .log_warning(&format!("Advance sheet append failed: {}", e), &context);
                }
            }
        }

        self.cache.invalidate(&period.cache_key());
        Ok(position)
    }

    /// Overwrite the transaction at `position`
    pub async fn update_transaction(&self, position: usize, draft: TransactionDraft) -> CoreResult<()> {
        self.validate(&draft)?;
        let row = self.mapper.to_row(&draft, Utc::now())?;
        self.store.update_row(position, &row).await?;
        log::info!("Updated transaction at row {}", position);

        // the old row's month is unknown here
        self.cache.clear();
        Ok(())
    }

    /// Blank out the transaction at `position`
    pub async fn delete_transaction(&self, position: usize) -> CoreResult<()> {
        self.store.clear_row(position).await?;
        log::info!("Deleted transaction at row {}", position);
        self.cache.clear();
        Ok(())
    }

    /// Reject drafts that would map to a row-level defect
    fn validate(&self, draft: &TransactionDraft) -> CoreResult<Period> {
        if draft.amount < Decimal::ZERO {
            return Err(CoreError::ValidationError {
                message: format!("Amount must not be negative: {}", draft.amount),
            });
        }
        if draft.category.trim().is_empty() {
            return Err(CoreError::ValidationError {
                message: "Category is required".to_string(),
            });
        }

        let date = self
            .engine
            .normalizer()
            .normalize(&draft.date)
            .ok_or_else(|| CoreError::ValidationError {
                message: format!("Unrecognized date: {:?}", draft.date),
            })?;
        Period::new(date.month, date.year).ok_or(CoreError::InvalidPeriod {
            month: date.month,
            year: date.year,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sheetledger_sheet::{MemorySheetStore, PositionedRow, RawRow, SheetError, SheetStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Store whose every call fails
    struct OfflineStore;

    #[async_trait]
    impl SheetStore for OfflineStore {
        async fn read_all_rows(&self) -> Result<Vec<PositionedRow>, SheetError> {
            Err(SheetError::Unavailable { message: "offline".to_string() })
        }
        async fn append_row(&self, _row: &RawRow) -> Result<usize, SheetError> {
            Err(SheetError::Unavailable { message: "offline".to_string() })
        }
        async fn update_row(&self, _position: usize, _row: &RawRow) -> Result<(), SheetError> {
            Err(SheetError::Unavailable { message: "offline".to_string() })
        }
        async fn clear_row(&self, _position: usize) -> Result<(), SheetError> {
            Err(SheetError::Unavailable { message: "offline".to_string() })
        }
    }

    /// Memory store that counts reads
    struct CountingStore {
        inner: MemorySheetStore,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl SheetStore for CountingStore {
        async fn read_all_rows(&self) -> Result<Vec<PositionedRow>, SheetError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_all_rows().await
        }
        async fn append_row(&self, row: &RawRow) -> Result<usize, SheetError> {
            self.inner.append_row(row).await
        }
        async fn update_row(&self, position: usize, row: &RawRow) -> Result<(), SheetError> {
            self.inner.update_row(position, row).await
        }
        async fn clear_row(&self, position: usize) -> Result<(), SheetError> {
            self.inner.clear_row(position).await
        }
    }

    fn march_rows() -> MemorySheetStore {
        MemorySheetStore::from_cells(vec![
            vec!["05/03/2025", "Restaurant", "Dinner", "850000", "expense"],
            vec!["01/03/2025", "Salary", "March pay", "9000000", "income"],
        ])
    }

    fn ledger_over(store: StoreRef) -> Ledger {
        Ledger::new(Config::default(), store, Arc::new(TtlCache::new(Duration::from_secs(300))))
    }

    fn draft(date: &str, category: &str, amount: i64, direction: Direction) -> TransactionDraft {
        TransactionDraft {
            date: date.to_string(),
            category: category.to_string(),
            amount: Decimal::from(amount),
            direction,
            ..TransactionDraft::default()
        }
    }

    #[tokio::test]
    async fn test_compute_snapshot_end_to_end() {
        let ledger = ledger_over(Arc::new(march_rows()));
        let snapshot = ledger.compute_snapshot(3, 2025).await;

        assert_eq!(snapshot.beginning_balance, Decimal::ZERO);
        assert_eq!(snapshot.total_advanced_account, Decimal::from(9_000_000));
        assert_eq!(snapshot.account_expenses, Decimal::from(850_000));
        assert_eq!(snapshot.current_balance, Decimal::from(8_150_000));
        assert_eq!(snapshot.total_expense, Decimal::from(850_000));
        assert_eq!(snapshot.cash_remaining, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_unavailable_store_yields_zeroed_snapshot() {
        let ledger = ledger_over(Arc::new(OfflineStore));
        let snapshot = ledger.compute_snapshot(3, 2025).await;
        assert_eq!(snapshot, AccountSnapshot::zeroed(3, 2025, snapshot.computed_at));

        let err = ledger.try_compute_snapshot(3, 2025).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::StoreUnavailable);
    }

    #[tokio::test]
    async fn test_invalid_month() {
        let ledger = ledger_over(Arc::new(march_rows()));
        let err = ledger.try_compute_snapshot(13, 2025).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPeriod);

        let snapshot = ledger.compute_snapshot(0, 2025).await;
        assert_eq!(snapshot.current_balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_transactions_for_month_sorted_and_cached() {
        let store = Arc::new(CountingStore { inner: march_rows(), reads: AtomicUsize::new(0) });
        let ledger = ledger_over(store.clone());

        let first = ledger.transactions_for_month(3, 2025).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].category, "Salary");
        assert_eq!(first[1].category, "Restaurant");

        let second = ledger.transactions_for_month(3, 2025).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_add_invalidates_month_key() {
        let store = Arc::new(CountingStore { inner: march_rows(), reads: AtomicUsize::new(0) });
        let ledger = ledger_over(store.clone());

        ledger.transactions_for_month(3, 2025).await.unwrap();
        let position = ledger
            .add_transaction(draft("20/03/2025", "Market", 120_000, Direction::Expense))
            .await
            .unwrap();
        assert_eq!(position, 3);

        let refreshed = ledger.transactions_for_month(3, 2025).await.unwrap();
        assert_eq!(refreshed.len(), 3);
        assert_eq!(store.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_add_stores_overridden_direction() {
        let store = Arc::new(MemorySheetStore::default());
        let ledger = ledger_over(store.clone());

        ledger
            .add_transaction(draft("2025-04-02", "Account advance", 5_000_000, Direction::Expense))
            .await
            .unwrap();
        let rows = store.rows().await;
        assert_eq!(rows[0].direction, "income");

        let snapshot = ledger.compute_snapshot(4, 2025).await;
        assert_eq!(snapshot.total_advanced_account, Decimal::from(5_000_000));
    }

    #[tokio::test]
    async fn test_add_rejects_bad_drafts() {
        let ledger = ledger_over(Arc::new(MemorySheetStore::default()));

        let err = ledger
            .add_transaction(draft("someday", "Market", 1, Direction::Expense))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = ledger
            .add_transaction(draft("2025-04-02", "Market", -1, Direction::Expense))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = ledger
            .add_transaction(draft("2025-04-02", "  ", 1, Direction::Expense))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_fractional_amount_needs_decimal_separator() {
        let store = Arc::new(MemorySheetStore::default());
        let ledger = ledger_over(store.clone());
        let mut lunch = draft("2025-04-02", "Restaurant", 0, Direction::Expense);
        lunch.amount = Decimal::new(125, 1);

        let err = ledger.add_transaction(lunch.clone()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(store.rows().await.is_empty());

        let mut config = Config::default();
        config.currency.thousands_separators = vec![','];
        config.currency.decimal_separator = Some('.');
        let store = Arc::new(MemorySheetStore::default());
        let ledger = Ledger::new(config, store.clone(), Arc::new(NoopCache));

        ledger.add_transaction(lunch).await.unwrap();
        assert_eq!(store.rows().await[0].amount, "12.5");
        let snapshot = ledger.compute_snapshot(4, 2025).await;
        assert_eq!(snapshot.account_expenses, Decimal::new(125, 1));
    }

    #[tokio::test]
    async fn test_advance_rows_are_mirrored() {
        let primary = Arc::new(MemorySheetStore::default());
        let advance = Arc::new(MemorySheetStore::default());
        let ledger = ledger_over(primary.clone()).with_advance_store(advance.clone());

        ledger
            .add_transaction(draft("2025-04-02", "Account advance", 100, Direction::Income))
            .await
            .unwrap();
        ledger
            .add_transaction(draft("2025-04-03", "Market", 50, Direction::Expense))
            .await
            .unwrap();

        assert_eq!(primary.rows().await.len(), 2);
        let mirrored = advance.rows().await;
        assert_eq!(mirrored.len(), 1);
        assert_eq!(mirrored[0].category, "Account advance");
    }

    #[tokio::test]
    async fn test_failed_mirror_keeps_primary_write() {
        let primary = Arc::new(MemorySheetStore::default());
        let ledger = ledger_over(primary.clone()).with_advance_store(Arc::new(OfflineStore));

        let position = ledger
            .add_transaction(draft("2025-04-02", "Account advance", 100, Direction::Income))
            .await
            .unwrap();
        assert_eq!(position, 1);
        assert_eq!(primary.rows().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_clear_cache() {
        let store = Arc::new(CountingStore { inner: march_rows(), reads: AtomicUsize::new(0) });
        let ledger = ledger_over(store.clone());

        ledger.transactions_for_month(3, 2025).await.unwrap();
        ledger
            .update_transaction(1, draft("05/03/2025", "Restaurant", 900_000, Direction::Expense))
            .await
            .unwrap();
        let updated = ledger.transactions_for_month(3, 2025).await.unwrap();
        assert_eq!(updated[1].amount, Decimal::from(900_000));

        ledger.delete_transaction(2).await.unwrap();
        let after_delete = ledger.transactions_for_month(3, 2025).await.unwrap();
        assert_eq!(after_delete.len(), 1);
        assert_eq!(after_delete[0].category, "Restaurant");
        assert_eq!(store.reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let ledger = ledger_over(Arc::new(march_rows()));
        let err = ledger
            .update_transaction(40, draft("05/03/2025", "Restaurant", 1, Direction::Expense))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RowNotFound);
    }

    #[tokio::test]
    async fn test_reports_through_ledger() {
        let ledger = ledger_over(Arc::new(march_rows()));
        let breakdown = ledger.category_breakdown(3, 2025).await.unwrap();
        assert_eq!(breakdown.entries.len(), 1);
        assert_eq!(breakdown.currency, "VND");

        let overview = ledger.year_overview(2025).await.unwrap();
        assert_eq!(overview.summaries[2].net_income, Decimal::from(8_150_000));
    }

    #[tokio::test]
    async fn test_from_config_reads_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(
            &path,
            "Date,Category,Description,Amount,Type,Receipt,Timestamp,Sub,Qty,Payment,Note\n\
             01/03/2025,Salary,,9000000,income,,,,,,\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.data.path = path;
        let ledger = Ledger::from_config(config);
        let snapshot = ledger.try_compute_snapshot(3, 2025).await.unwrap();
        assert_eq!(snapshot.total_advanced_account, Decimal::from(9_000_000));
    }
}
