mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use scm_demo::services::seeding::{ManagedTable, ResetReport, SeedReport};

#[tokio::test]
async fn seed_is_idempotent() {
    let app = TestApp::new().await;

    let first: SeedReport = serde_json::from_value(app.seed().await).unwrap();
    assert_eq!(first.tables.len(), ManagedTable::SEEDED.len());
    assert!(first.tables.iter().all(|t| t.existing == 0 && t.inserted > 0));
    assert_eq!(first.table("Retailer").unwrap().inserted, 4);

    let second: SeedReport = serde_json::from_value(app.seed().await).unwrap();
    assert_eq!(second.total_inserted(), 0);
    for (before, after) in first.tables.iter().zip(&second.tables) {
        assert_eq!(before.table, after.table);
        assert_eq!(after.existing, before.inserted);
    }
}

#[tokio::test]
async fn seed_report_follows_table_order() {
    let app = TestApp::new().await;
    let report: SeedReport = serde_json::from_value(app.seed().await).unwrap();

    let names: Vec<&str> = report.tables.iter().map(|t| t.table.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Supplier",
            "Product",
            "DistributionCenter",
            "Inventory",
            "Retailer",
            "Shipment",
            "LineItem"
        ]
    );
}

#[tokio::test]
async fn reset_empties_every_managed_table() {
    let app = TestApp::new().await;
    app.seed().await;
    app.create_demo("Acme").await;

    let (status, body) = app.json(Method::POST, "/api/Demos/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    let report: ResetReport = serde_json::from_value(body).unwrap();
    assert_eq!(report.tables.len(), ManagedTable::RESET_ORDER.len());
    assert!(report.total_deleted() > 0);

    let db = app.state.db.as_ref();
    for table in ManagedTable::RESET_ORDER {
        assert_eq!(table.count(db).await.unwrap(), 0, "{table} not empty");
    }

    // seeding works again after a reset
    let again: SeedReport = serde_json::from_value(app.seed().await).unwrap();
    assert!(again.total_inserted() > 0);
}

#[tokio::test]
async fn missing_seed_file_fails_without_leaking_paths() {
    let app = TestApp::with_seed_files(&[("supplier.json", "[]")]).await;

    let (status, body) = app.json(Method::POST, "/api/Demos/seed", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Seed data could not be loaded");
}

#[tokio::test]
async fn empty_arrays_seed_nothing() {
    let files: Vec<(String, &str)> = ManagedTable::SEEDED
        .iter()
        .map(|t| (t.seed_file_name(), "[]"))
        .collect();
    let borrowed: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), *c)).collect();
    let app = TestApp::with_seed_files(&borrowed).await;

    let report: SeedReport = serde_json::from_value(app.seed().await).unwrap();
    assert_eq!(report.total_inserted(), 0);
    assert!(report.tables.iter().all(|t| t.existing == 0));
}
