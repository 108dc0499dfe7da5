//! Asset registry CRUD and stock-consistency tests.

use assert_matches::assert_matches;
use chrono::NaiveDate;
use civica_core::error::CoreError;
use civica_db::models::asset::{AssetListFilter, CreateAsset, UpdateAsset};
use civica_db::models::loan::CreateLoan;
use civica_db::repositories::{AssetRepo, LoanRepo};
use civica_db::DbError;
use sqlx::PgPool;

fn new_asset(code: &str, name: &str, asset_type: &str, total_stock: i32) -> CreateAsset {
    CreateAsset {
        code: code.to_string(),
        name: name.to_string(),
        description: Some("registry test".to_string()),
        asset_type: asset_type.to_string(),
        total_stock,
        location: None,
    }
}

#[sqlx::test]
async fn create_initializes_available_stock_and_status(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("AST-001", "Folding chair", "item", 12))
        .await
        .unwrap();
    assert_eq!(asset.available_stock, 12);
    assert_eq!(asset.status, "active");
    assert_eq!(asset.borrowed_stock(), 0);
}

#[sqlx::test]
async fn create_rejects_duplicate_code_and_name(pool: PgPool) {
    AssetRepo::create(&pool, &new_asset("AST-001", "Folding chair", "item", 5))
        .await
        .unwrap();

    let err = AssetRepo::create(&pool, &new_asset("AST-001", "Other name", "item", 5))
        .await
        .unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::Validation { errors, .. })
        if errors.0.contains_key("code"));

    let err = AssetRepo::create(&pool, &new_asset("AST-002", "Folding chair", "item", 5))
        .await
        .unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::Validation { errors, .. })
        if errors.0.contains_key("name"));
}

#[sqlx::test]
async fn create_rejects_zero_stock(pool: PgPool) {
    let err = AssetRepo::create(&pool, &new_asset("AST-001", "Folding chair", "item", 0))
        .await
        .unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::Validation { errors, .. })
        if errors.0.contains_key("total_stock"));
}

#[sqlx::test]
async fn update_recomputes_available_preserving_borrowed(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("AST-001", "Folding chair", "item", 10))
        .await
        .unwrap();

    // Borrow 4 units.
    let loan = LoanRepo::request(
        &pool,
        &CreateLoan {
            asset_id: asset.id,
            resident_id: 1,
            quantity: 4,
            loan_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            planned_return_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            loan_reason: None,
        },
    )
    .await
    .unwrap();
    LoanRepo::approve(&pool, loan.id).await.unwrap();

    let updated = AssetRepo::update(
        &pool,
        asset.id,
        &UpdateAsset { total_stock: Some(8), ..Default::default() },
    )
    .await
    .unwrap();
    assert_eq!(updated.total_stock, 8);
    assert_eq!(updated.available_stock, 4);
    assert_eq!(updated.borrowed_stock(), 4);

    // Shrinking below the 4 borrowed units is rejected.
    let err = AssetRepo::update(
        &pool,
        asset.id,
        &UpdateAsset { total_stock: Some(3), ..Default::default() },
    )
    .await
    .unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::Validation { errors, .. })
        if errors.0.contains_key("total_stock"));
}

#[sqlx::test]
async fn update_rejects_taken_name_but_allows_own(pool: PgPool) {
    AssetRepo::create(&pool, &new_asset("AST-001", "Folding chair", "item", 5))
        .await
        .unwrap();
    let asset = AssetRepo::create(&pool, &new_asset("AST-002", "Community hall", "room", 1))
        .await
        .unwrap();

    let err = AssetRepo::update(
        &pool,
        asset.id,
        &UpdateAsset { name: Some("Folding chair".to_string()), ..Default::default() },
    )
    .await
    .unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::Validation { .. }));

    // Re-submitting its own name is not a collision.
    let updated = AssetRepo::update(
        &pool,
        asset.id,
        &UpdateAsset { name: Some("Community hall".to_string()), ..Default::default() },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Community hall");
}

#[sqlx::test]
async fn update_missing_asset_is_not_found(pool: PgPool) {
    let err = AssetRepo::update(&pool, 9999, &UpdateAsset::default()).await.unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::NotFound { .. }));
}

#[sqlx::test]
async fn deactivate_blocked_by_outstanding_loans(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("AST-001", "Folding chair", "item", 5))
        .await
        .unwrap();
    let loan = LoanRepo::request(
        &pool,
        &CreateLoan {
            asset_id: asset.id,
            resident_id: 1,
            quantity: 2,
            loan_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            planned_return_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            loan_reason: None,
        },
    )
    .await
    .unwrap();

    // Blocked while the loan is requested, and still while borrowed.
    assert_matches!(
        AssetRepo::deactivate(&pool, asset.id).await.unwrap_err(),
        DbError::Core(CoreError::Conflict(_))
    );
    LoanRepo::approve(&pool, loan.id).await.unwrap();
    assert_matches!(
        AssetRepo::deactivate(&pool, asset.id).await.unwrap_err(),
        DbError::Core(CoreError::Conflict(_))
    );

    // Resolved loans no longer block; the asset is retired, not deleted.
    LoanRepo::return_loan(&pool, loan.id).await.unwrap();
    let deactivated = AssetRepo::deactivate(&pool, asset.id).await.unwrap();
    assert_eq!(deactivated.status, "inactive");
    assert!(AssetRepo::find_by_id(&pool, asset.id).await.unwrap().is_some());
}

#[sqlx::test]
async fn list_filters_and_paginates(pool: PgPool) {
    for i in 1..=15 {
        AssetRepo::create(
            &pool,
            &new_asset(&format!("AST-{i:03}"), &format!("Chair {i}"), "item", 2),
        )
        .await
        .unwrap();
    }
    AssetRepo::create(&pool, &new_asset("HALL-01", "Community hall", "room", 1))
        .await
        .unwrap();

    let filter = AssetListFilter {
        asset_type: Some("item".to_string()),
        sort_by: Some("code".to_string()),
        sort_order: Some("asc".to_string()),
        ..Default::default()
    };
    let (page_one, total) = AssetRepo::list(&pool, &filter, 1, 10).await.unwrap();
    assert_eq!(total, 15);
    assert_eq!(page_one.len(), 10);
    assert_eq!(page_one[0].code, "AST-001");

    let (page_two, _) = AssetRepo::list(&pool, &filter, 2, 10).await.unwrap();
    assert_eq!(page_two.len(), 5);

    let keyword_filter = AssetListFilter {
        keyword: Some("hall".to_string()),
        ..Default::default()
    };
    let (found, total) = AssetRepo::list(&pool, &keyword_filter, 1, 10).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].name, "Community hall");
}

#[sqlx::test]
async fn report_aggregates_stock_by_type(pool: PgPool) {
    let chairs = AssetRepo::create(&pool, &new_asset("AST-001", "Folding chair", "item", 10))
        .await
        .unwrap();
    AssetRepo::create(&pool, &new_asset("HALL-01", "Community hall", "room", 2))
        .await
        .unwrap();

    let loan = LoanRepo::request(
        &pool,
        &CreateLoan {
            asset_id: chairs.id,
            resident_id: 1,
            quantity: 3,
            loan_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            planned_return_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            loan_reason: None,
        },
    )
    .await
    .unwrap();
    LoanRepo::approve(&pool, loan.id).await.unwrap();

    let records = AssetRepo::report_records(&pool, &Default::default()).await.unwrap();
    let report = civica_core::report::build_asset_report(&records);
    assert_eq!(report.summary.total_assets, 2);
    assert_eq!(report.summary.total_stock, 12);
    assert_eq!(report.summary.available_stock, 9);
    assert_eq!(report.summary.borrowed_stock, 3);
    assert_eq!(report.group_by_type["room"].total_stock, 2);
}
