use chrono::NaiveDate;
use gatepass_sequencer::config::DatabaseConfig;
use gatepass_sequencer::domain::ports::{FixedClock, SequenceStore};
use gatepass_sequencer::{
    FinancialYear, GatePassError, GatePassService, PassType, Role, SqliteSequenceStore,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;

fn database_config(temp_dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig {
        path: temp_dir
            .path()
            .join("sequences.db")
            .to_string_lossy()
            .into_owned(),
        ..DatabaseConfig::default()
    }
}

fn open_service(temp_dir: &TempDir, today: NaiveDate) -> GatePassService<SqliteSequenceStore, FixedClock> {
    let store = SqliteSequenceStore::open(&database_config(temp_dir)).unwrap();
    GatePassService::with_clock(store, FixedClock(today))
}

fn mid_december_2025() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 15).unwrap()
}

#[tokio::test]
async fn test_sequential_allocation_has_no_gaps() {
    let temp_dir = TempDir::new().unwrap();
    let service = open_service(&temp_dir, mid_december_2025());
    let fy: FinancialYear = "2526".parse().unwrap();

    for expected in 1..=5u32 {
        let got = service.allocate(fy, PassType::Returnable).await.unwrap();
        assert_eq!(got, expected);
    }
}

#[tokio::test]
async fn test_first_allocation_creates_row() {
    let temp_dir = TempDir::new().unwrap();
    let service = open_service(&temp_dir, mid_december_2025());
    let fy: FinancialYear = "2627".parse().unwrap();

    assert!(service.list_sequences_by_year("2627").await.unwrap().is_empty());

    let first = service.allocate(fy, PassType::NonReturnable).await.unwrap();
    assert_eq!(first, 1);

    let rows = service.list_sequences_by_year("2627").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].pass_type, PassType::NonReturnable);
    assert_eq!(rows[0].current_sequence, 1);
}

#[tokio::test]
async fn test_keys_have_independent_counters() {
    let temp_dir = TempDir::new().unwrap();
    let service = open_service(&temp_dir, mid_december_2025());

    assert_eq!(service.allocate_gate_pass_number(true).await.unwrap().sequence_number, 1);
    assert_eq!(service.allocate_gate_pass_number(true).await.unwrap().sequence_number, 2);
    assert_eq!(service.allocate_gate_pass_number(false).await.unwrap().sequence_number, 1);
    assert_eq!(service.allocate_gate_pass_number(true).await.unwrap().sequence_number, 3);

    let next_year: FinancialYear = "2627".parse().unwrap();
    assert_eq!(service.allocate(next_year, PassType::Returnable).await.unwrap(), 1);

    let all = service.list_sequences(Role::Admin).await.unwrap();
    let summary: Vec<(String, PassType, u32)> = all
        .iter()
        .map(|c| (c.financial_year.to_string(), c.pass_type, c.current_sequence))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("2526".to_string(), PassType::NonReturnable, 1),
            ("2526".to_string(), PassType::Returnable, 3),
            ("2627".to_string(), PassType::Returnable, 1),
        ]
    );
}

#[tokio::test]
async fn test_generated_numbers_are_formatted() {
    let temp_dir = TempDir::new().unwrap();
    let service = open_service(&temp_dir, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());

    let issued = service.allocate_gate_pass_number(false).await.unwrap();
    assert_eq!(issued.gate_pass_number, "RAPL-NRGP-2425/001");
    assert_eq!(issued.financial_year.to_string(), "2425");
    assert_eq!(issued.pass_type, PassType::NonReturnable);
    assert!(gatepass_sequencer::is_valid_gate_pass_number(&issued.gate_pass_number));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_allocation_is_collision_free() {
    let temp_dir = TempDir::new().unwrap();
    let service = Arc::new(open_service(&temp_dir, mid_december_2025()));
    let callers = 50u32;

    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.allocate_gate_pass_number(true).await })
        })
        .collect();

    let mut issued = BTreeSet::new();
    for handle in handles {
        let allocated = handle.await.unwrap().unwrap();
        assert!(issued.insert(allocated.sequence_number), "duplicate number issued");
    }

    let expected: BTreeSet<u32> = (1..=callers).collect();
    assert_eq!(issued, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_allocation_across_store_instances() {
    // 兩個獨立連線池指向同一資料庫，模擬多個服務實例
    let temp_dir = TempDir::new().unwrap();
    let fy: FinancialYear = "2526".parse().unwrap();
    let config = database_config(&temp_dir);
    let first = Arc::new(SqliteSequenceStore::open(&config).unwrap());
    let second = Arc::new(SqliteSequenceStore::open(&config).unwrap());

    for _ in 0..7 {
        first.allocate(fy, PassType::NonReturnable).await.unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..50 {
        let store = if i % 2 == 0 { Arc::clone(&first) } else { Arc::clone(&second) };
        handles.push(tokio::spawn(async move {
            store.allocate(fy, PassType::NonReturnable).await
        }));
    }

    let mut issued = BTreeSet::new();
    for handle in handles {
        assert!(issued.insert(handle.await.unwrap().unwrap()));
    }

    let expected: BTreeSet<u32> = (8..=57).collect();
    assert_eq!(issued, expected);
}

#[tokio::test]
async fn test_override_then_allocate() {
    let temp_dir = TempDir::new().unwrap();
    let service = open_service(&temp_dir, mid_december_2025());

    service.allocate_gate_pass_number(true).await.unwrap();
    let row = service.list_sequences(Role::Admin).await.unwrap().remove(0);

    let updated = service.update_sequence(Role::Admin, row.id, 10).await.unwrap();
    assert_eq!(updated.current_sequence, 10);
    assert!(updated.updated_at.is_some());

    let next = service.allocate_gate_pass_number(true).await.unwrap();
    assert_eq!(next.sequence_number, 11);
    assert_eq!(next.gate_pass_number, "RAPL-RGP-2526/011");
}

#[tokio::test]
async fn test_override_unknown_row_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let service = open_service(&temp_dir, mid_december_2025());

    let err = service.update_sequence(Role::Admin, 404, 3).await.unwrap_err();
    assert!(matches!(err, GatePassError::NotFoundError { id: 404 }));
}

#[tokio::test]
async fn test_non_admin_cannot_list_all_or_override() {
    let temp_dir = TempDir::new().unwrap();
    let service = open_service(&temp_dir, mid_december_2025());
    service.allocate_gate_pass_number(false).await.unwrap();

    assert!(matches!(
        service.list_sequences(Role::Logistics).await,
        Err(GatePassError::AuthorizationError { .. })
    ));
    assert!(matches!(
        service.update_sequence(Role::Manager, 1, 0).await,
        Err(GatePassError::AuthorizationError { .. })
    ));

    // 年度查詢對一般角色開放
    let rows = service.list_sequences_by_year("2526").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].current_sequence, 1);
}

#[test]
fn test_unreachable_database_is_storage_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        path: temp_dir
            .path()
            .join("missing-dir")
            .join("sequences.db")
            .to_string_lossy()
            .into_owned(),
        connection_timeout_ms: 500,
        ..DatabaseConfig::default()
    };

    let err = SqliteSequenceStore::open(&config).err().unwrap();
    assert!(matches!(err, GatePassError::StorageError { .. }));
}

#[tokio::test]
async fn test_lock_wait_times_out_without_issuing_a_number() {
    let temp_dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        busy_timeout_ms: 200,
        ..database_config(&temp_dir)
    };
    let store = SqliteSequenceStore::open(&config).unwrap();
    let fy: FinancialYear = "2526".parse().unwrap();

    assert_eq!(store.allocate(fy, PassType::Returnable).await.unwrap(), 1);

    // 另一條連線持有寫入鎖
    let holder = rusqlite::Connection::open(&config.path).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE").unwrap();

    let err = store.allocate(fy, PassType::Returnable).await.unwrap_err();
    assert!(matches!(err, GatePassError::StorageError { .. }));

    holder.execute_batch("ROLLBACK").unwrap();

    assert_eq!(store.allocate(fy, PassType::Returnable).await.unwrap(), 2);
}
