//! Integration tests for the ledger engine and the partner payout sync.
//!
//! These run against a migrated Postgres database. Set `DATABASE_URL` to
//! enable them; without it every test skips.

use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseConnection};

use autocare_core::ledger::LedgerError;
use autocare_db::entities::sea_orm_active_enums::OrderKind;
use autocare_db::repositories::customer::{CreateCustomerInput, CustomerRepository};
use autocare_db::repositories::ledger::{AmountChangeMeta, LedgerRepository};
use autocare_db::repositories::order::{CreateOrderInput, OrderRepository};
use autocare_shared::types::{AmountEntryId, CreditEntryId, CustomerId, OrderId};

async fn test_db() -> Option<DatabaseConnection> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("skipping: DATABASE_URL not set");
        return None;
    };
    Some(
        Database::connect(&url)
            .await
            .expect("Failed to connect to database"),
    )
}

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos()
}

async fn create_customer(db: &DatabaseConnection, is_partner: bool) -> CustomerId {
    let repo = CustomerRepository::new(db.clone());
    let customer = repo
        .create(CreateCustomerInput {
            name: format!("test-customer-{}", unique_suffix()),
            mobile: format!("1{}", unique_suffix() % 10_000_000_000),
            is_partner,
            notes: None,
        })
        .await
        .expect("Failed to create customer");
    CustomerId::from_raw(customer.id)
}

async fn balance_of(db: &DatabaseConnection, id: CustomerId) -> rust_decimal::Decimal {
    let repo = CustomerRepository::new(db.clone());
    repo.find_by_id(id)
        .await
        .expect("Failed to fetch customer")
        .expect("Customer missing")
        .current_balance
}

async fn credits_of(db: &DatabaseConnection, id: CustomerId) -> i64 {
    let repo = CustomerRepository::new(db.clone());
    repo.find_by_id(id)
        .await
        .expect("Failed to fetch customer")
        .expect("Customer missing")
        .current_credits
}

// ============================================================================
// Test: append cascades running totals and the denormalized balance
// ============================================================================
#[tokio::test]
async fn test_record_and_spend() {
    let Some(db) = test_db().await else { return };
    let customer = create_customer(&db, false).await;
    let ledger = LedgerRepository::new(db.clone());

    let first = ledger
        .record_amount_change(customer, dec!(100.00), AmountChangeMeta::default())
        .await
        .expect("Failed to record top-up");
    assert_eq!(first.running_total, dec!(100.00));

    let second = ledger
        .record_amount_change(customer, dec!(-40.00), AmountChangeMeta::default())
        .await
        .expect("Failed to record payment");
    assert_eq!(second.running_total, dec!(60.00));

    assert_eq!(balance_of(&db, customer).await, dec!(60.00));
}

// ============================================================================
// Test: every accumulation step is rounded to 2 decimals
// ============================================================================
#[tokio::test]
async fn test_per_step_rounding() {
    let Some(db) = test_db().await else { return };
    let customer = create_customer(&db, false).await;
    let ledger = LedgerRepository::new(db.clone());

    for delta in [dec!(10.00), dec!(-3.00), dec!(0.01)] {
        ledger
            .record_amount_change(customer, delta, AmountChangeMeta::default())
            .await
            .expect("Failed to record entry");
    }

    let history = ledger
        .amount_history(customer)
        .await
        .expect("Failed to fetch history");
    let totals: Vec<_> = history.iter().map(|e| e.running_total).collect();
    assert_eq!(totals, vec![dec!(10.00), dec!(7.00), dec!(7.01)]);
    assert_eq!(balance_of(&db, customer).await, dec!(7.01));
}

// ============================================================================
// Test: deleting a mid-sequence entry recomputes everything after the gap
// ============================================================================
#[tokio::test]
async fn test_mid_sequence_delete() {
    let Some(db) = test_db().await else { return };
    let customer = create_customer(&db, false).await;
    let ledger = LedgerRepository::new(db.clone());

    let mut ids = Vec::new();
    for delta in [dec!(100.00), dec!(-40.00), dec!(50.00)] {
        let entry = ledger
            .record_amount_change(customer, delta, AmountChangeMeta::default())
            .await
            .expect("Failed to record entry");
        ids.push(entry.id);
    }

    ledger
        .delete_amount_entry(AmountEntryId::from_raw(ids[1]))
        .await
        .expect("Failed to delete entry");

    let history = ledger
        .amount_history(customer)
        .await
        .expect("Failed to fetch history");
    let totals: Vec<_> = history.iter().map(|e| e.running_total).collect();
    assert_eq!(totals, vec![dec!(100.00), dec!(150.00)]);
    assert_eq!(balance_of(&db, customer).await, dec!(150.00));
}

// ============================================================================
// Test: deleting the last remaining entry zeroes the denormalized balance
// ============================================================================
#[tokio::test]
async fn test_delete_down_to_empty_ledger() {
    let Some(db) = test_db().await else { return };
    let customer = create_customer(&db, false).await;
    let ledger = LedgerRepository::new(db.clone());

    let entry = ledger
        .record_amount_change(customer, dec!(25.50), AmountChangeMeta::default())
        .await
        .expect("Failed to record entry");
    assert_eq!(balance_of(&db, customer).await, dec!(25.50));

    ledger
        .delete_amount_entry(AmountEntryId::from_raw(entry.id))
        .await
        .expect("Failed to delete entry");
    assert_eq!(balance_of(&db, customer).await, dec!(0));
}

// ============================================================================
// Test: rewriting a delta cascades through every later entry
// ============================================================================
#[tokio::test]
async fn test_update_delta_cascades() {
    let Some(db) = test_db().await else { return };
    let customer = create_customer(&db, false).await;
    let ledger = LedgerRepository::new(db.clone());

    let mut ids = Vec::new();
    for delta in [dec!(10.00), dec!(20.00), dec!(30.00)] {
        let entry = ledger
            .record_amount_change(customer, delta, AmountChangeMeta::default())
            .await
            .expect("Failed to record entry");
        ids.push(entry.id);
    }

    let updated = ledger
        .update_amount_delta(AmountEntryId::from_raw(ids[1]), dec!(5.00))
        .await
        .expect("Failed to update delta");
    assert_eq!(updated.running_total, dec!(15.00));

    let history = ledger
        .amount_history(customer)
        .await
        .expect("Failed to fetch history");
    let totals: Vec<_> = history.iter().map(|e| e.running_total).collect();
    assert_eq!(totals, vec![dec!(10.00), dec!(15.00), dec!(45.00)]);
    assert_eq!(balance_of(&db, customer).await, dec!(45.00));
}

// ============================================================================
// Test: credit ledger is an integer twin and allows negative totals
// ============================================================================
#[tokio::test]
async fn test_credit_ledger_negative_totals() {
    let Some(db) = test_db().await else { return };
    let customer = create_customer(&db, false).await;
    let ledger = LedgerRepository::new(db.clone());

    let mut totals = Vec::new();
    for delta in [7, 2, -9, -1] {
        let entry = ledger
            .record_credit_change(customer, delta, None)
            .await
            .expect("Failed to record credit entry");
        totals.push(entry.running_total);
    }
    assert_eq!(totals, vec![7, 9, 0, -1]);
    assert_eq!(credits_of(&db, customer).await, -1);
}

// ============================================================================
// Test: credit delete and update cascade like the amount ledger
// ============================================================================
#[tokio::test]
async fn test_credit_delete_and_update() {
    let Some(db) = test_db().await else { return };
    let customer = create_customer(&db, false).await;
    let ledger = LedgerRepository::new(db.clone());

    let mut ids = Vec::new();
    for delta in [10, 20, 30] {
        let entry = ledger
            .record_credit_change(customer, delta, None)
            .await
            .expect("Failed to record credit entry");
        ids.push(entry.id);
    }

    ledger
        .delete_credit_entry(CreditEntryId::from_raw(ids[0]))
        .await
        .expect("Failed to delete credit entry");
    assert_eq!(credits_of(&db, customer).await, 50);

    ledger
        .update_credit_delta(CreditEntryId::from_raw(ids[2]), 5)
        .await
        .expect("Failed to update credit delta");
    assert_eq!(credits_of(&db, customer).await, 25);
}

// ============================================================================
// Test: ledgers of different customers never interact
// ============================================================================
#[tokio::test]
async fn test_cross_customer_independence() {
    let Some(db) = test_db().await else { return };
    let alice = create_customer(&db, false).await;
    let bob = create_customer(&db, false).await;
    let ledger = LedgerRepository::new(db.clone());

    ledger
        .record_amount_change(alice, dec!(100.00), AmountChangeMeta::default())
        .await
        .expect("Failed to record entry");
    let bob_entry = ledger
        .record_amount_change(bob, dec!(7.00), AmountChangeMeta::default())
        .await
        .expect("Failed to record entry");

    // Bob's ledger starts from zero, not from Alice's totals.
    assert_eq!(bob_entry.running_total, dec!(7.00));
    assert_eq!(balance_of(&db, alice).await, dec!(100.00));
    assert_eq!(balance_of(&db, bob).await, dec!(7.00));
}

// ============================================================================
// Test: unknown customers and entries are rejected
// ============================================================================
#[tokio::test]
async fn test_not_found_errors() {
    let Some(db) = test_db().await else { return };
    let ledger = LedgerRepository::new(db.clone());

    let missing = CustomerId::from_raw(i64::MAX);
    let result = ledger
        .record_amount_change(missing, dec!(1.00), AmountChangeMeta::default())
        .await;
    assert!(matches!(result, Err(LedgerError::CustomerNotFound(_))));

    let result = ledger
        .delete_amount_entry(AmountEntryId::from_raw(i64::MAX))
        .await;
    assert!(matches!(result, Err(LedgerError::EntryNotFound(_))));
}

// ============================================================================
// Test: mark-paid pays the partner once, retract removes the payout
// ============================================================================
#[tokio::test]
async fn test_partner_payout_idempotent() {
    let Some(db) = test_db().await else { return };
    let customer = create_customer(&db, false).await;
    let partner = create_customer(&db, true).await;
    let orders = OrderRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone());

    let order = orders
        .create(CreateOrderInput {
            kind: OrderKind::Insurance,
            customer_id: customer,
            partner_id: Some(partner),
            total_price: dec!(4500.00),
            record_date: NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date"),
            notes: None,
        })
        .await
        .expect("Failed to create order");

    // Mark paid twice; the payout must exist exactly once.
    orders
        .set_paid(OrderId::from_raw(order.id), true)
        .await
        .expect("Failed to mark paid");
    orders
        .set_paid(OrderId::from_raw(order.id), true)
        .await
        .expect("Failed to re-mark paid");

    let history = ledger
        .amount_history(partner)
        .await
        .expect("Failed to fetch history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].delta, dec!(90.00));
    assert_eq!(balance_of(&db, partner).await, dec!(90.00));

    // Unpaying retracts the payout entry.
    orders
        .set_paid(OrderId::from_raw(order.id), false)
        .await
        .expect("Failed to unmark paid");
    let history = ledger
        .amount_history(partner)
        .await
        .expect("Failed to fetch history");
    assert!(history.is_empty());
    assert_eq!(balance_of(&db, partner).await, dec!(0));
}

// ============================================================================
// Test: service orders pay 5% and orders without a partner pay nothing
// ============================================================================
#[tokio::test]
async fn test_service_payout_and_no_partner() {
    let Some(db) = test_db().await else { return };
    let customer = create_customer(&db, false).await;
    let partner = create_customer(&db, true).await;
    let orders = OrderRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone());

    let with_partner = orders
        .create(CreateOrderInput {
            kind: OrderKind::Service,
            customer_id: customer,
            partner_id: Some(partner),
            total_price: dec!(1280.00),
            record_date: NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date"),
            notes: None,
        })
        .await
        .expect("Failed to create order");
    let without_partner = orders
        .create(CreateOrderInput {
            kind: OrderKind::Service,
            customer_id: customer,
            partner_id: None,
            total_price: dec!(500.00),
            record_date: NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date"),
            notes: None,
        })
        .await
        .expect("Failed to create order");

    orders
        .set_paid(OrderId::from_raw(with_partner.id), true)
        .await
        .expect("Failed to mark paid");
    orders
        .set_paid(OrderId::from_raw(without_partner.id), true)
        .await
        .expect("Failed to mark paid");

    let history = ledger
        .amount_history(partner)
        .await
        .expect("Failed to fetch history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].delta, dec!(64.00));
}

// ============================================================================
// Test: only a partner customer may be attributed on an order
// ============================================================================
#[tokio::test]
async fn test_order_rejects_non_partner() {
    let Some(db) = test_db().await else { return };
    let customer = create_customer(&db, false).await;
    let not_a_partner = create_customer(&db, false).await;
    let orders = OrderRepository::new(db.clone());

    let result = orders
        .create(CreateOrderInput {
            kind: OrderKind::Insurance,
            customer_id: customer,
            partner_id: Some(not_a_partner),
            total_price: dec!(100.00),
            record_date: NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date"),
            notes: None,
        })
        .await;
    assert!(matches!(
        result,
        Err(autocare_db::repositories::order::OrderError::NotAPartner(_))
    ));
}
