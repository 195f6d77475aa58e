//! The ledger engine: the sole write path for both customer ledgers.
//!
//! Every mutation (insert, delta update, delete) runs inside one database
//! transaction that holds an exclusive lock on the customer row, recomputes
//! the cached `running_total` of every entry from the mutation point
//! forward, and rewrites the customer's denormalized total from the latest
//! surviving entry. Callers observe either a fully consistent ledger or an
//! aborted write, never a partially cascaded state.
//!
//! Writes to different customers' ledgers are independent; the row lock
//! serializes only same-customer cascades.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use autocare_core::ledger::{
    ChangeType, LedgerError, final_total, round_amount, running_totals,
};
use autocare_core::partner::PayoutKind;
use autocare_shared::types::{AmountEntryId, CreditEntryId, CustomerId, OrderId};

use crate::entities::{amount_entries, credit_entries, customers};

/// Optional metadata attached to a balance ledger entry.
#[derive(Debug, Clone, Default)]
pub struct AmountChangeMeta {
    /// Informational classification of the change.
    pub change_type: Option<ChangeType>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Stable link back to the source order for partner payouts.
    pub source: Option<(PayoutKind, OrderId)>,
}

/// Repository owning all ledger mutation and the recompute cascade.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Balance ledger (2-decimal amounts)
    // ========================================================================

    /// Appends a balance entry and cascades forward from it.
    ///
    /// The delta is normalized to 2 fraction digits. Negative running totals
    /// are permitted; overdraft prevention belongs to the business layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the customer does not exist, the cascade cannot
    /// be persisted, or a concurrent cascade for the same customer is
    /// detected. On error nothing is committed.
    pub async fn record_amount_change(
        &self,
        customer_id: CustomerId,
        delta: Decimal,
        meta: AmountChangeMeta,
    ) -> Result<amount_entries::Model, LedgerError> {
        let delta = round_amount(delta);
        let now = Utc::now().into();

        let txn = self.db.begin().await.map_err(db_err)?;
        let customer = lock_customer(&txn, customer_id).await?;

        let entry = amount_entries::ActiveModel {
            customer_id: Set(customer.id),
            delta: Set(delta),
            // Placeholder; the cascade below rewrites it.
            running_total: Set(Decimal::ZERO),
            change_type: Set(meta.change_type.unwrap_or(ChangeType::Other).into()),
            source_kind: Set(meta.source.map(|(kind, _)| kind.into())),
            source_id: Set(meta.source.map(|(_, order_id)| order_id.into_inner())),
            notes: Set(meta.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let entry = entry.insert(&txn).await.map_err(db_err)?;

        cascade_amounts(&txn, customer, entry.id).await?;

        let entry = refetch_amount_entry(&txn, entry.id).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(entry)
    }

    /// Rewrites one balance entry's delta and cascades forward from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist or the cascade fails.
    pub async fn update_amount_delta(
        &self,
        entry_id: AmountEntryId,
        new_delta: Decimal,
    ) -> Result<amount_entries::Model, LedgerError> {
        let new_delta = round_amount(new_delta);

        let txn = self.db.begin().await.map_err(db_err)?;
        let entry = amount_entries::Entity::find_by_id(entry_id.into_inner())
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(entry_id.into_inner()))?;
        let customer = lock_customer(&txn, CustomerId::from_raw(entry.customer_id)).await?;

        let anchor_id = entry.id;
        let mut active: amount_entries::ActiveModel = entry.into();
        active.delta = Set(new_delta);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await.map_err(db_err)?;

        cascade_amounts(&txn, customer, anchor_id).await?;

        let entry = refetch_amount_entry(&txn, anchor_id).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(entry)
    }

    /// Deletes a balance entry and cascades forward from its position.
    ///
    /// The deleted row is excluded from its own prefix; all strictly-earlier
    /// rows keep their totals and seed the recomputation of everything after
    /// the gap.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist or the cascade fails.
    pub async fn delete_amount_entry(&self, entry_id: AmountEntryId) -> Result<(), LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let entry = amount_entries::Entity::find_by_id(entry_id.into_inner())
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(entry_id.into_inner()))?;
        let customer = lock_customer(&txn, CustomerId::from_raw(entry.customer_id)).await?;

        let anchor_id = entry.id;
        amount_entries::Entity::delete_by_id(anchor_id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        // The anchor row is gone, so `from_id = anchor_id` recomputes exactly
        // the surviving entries after the gap.
        cascade_amounts(&txn, customer, anchor_id).await?;

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    /// Returns a customer's full balance history in replay (id) order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn amount_history(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<amount_entries::Model>, LedgerError> {
        amount_entries::Entity::find()
            .filter(amount_entries::Column::CustomerId.eq(customer_id.into_inner()))
            .order_by_asc(amount_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Finds the payout entry linked to a source order, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_amount_entry_by_source(
        &self,
        kind: PayoutKind,
        source_id: OrderId,
    ) -> Result<Option<amount_entries::Model>, LedgerError> {
        amount_entries::Entity::find()
            .filter(amount_entries::Column::SourceKind.eq(crate::entities::sea_orm_active_enums::OrderKind::from(kind)))
            .filter(amount_entries::Column::SourceId.eq(source_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    // ========================================================================
    // Credit ledger (integer points)
    // ========================================================================

    /// Appends a credit entry and cascades forward from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the customer does not exist or the cascade fails.
    pub async fn record_credit_change(
        &self,
        customer_id: CustomerId,
        delta: i64,
        notes: Option<String>,
    ) -> Result<credit_entries::Model, LedgerError> {
        let now = Utc::now().into();

        let txn = self.db.begin().await.map_err(db_err)?;
        let customer = lock_customer(&txn, customer_id).await?;

        let entry = credit_entries::ActiveModel {
            customer_id: Set(customer.id),
            delta: Set(delta),
            running_total: Set(0),
            notes: Set(notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let entry = entry.insert(&txn).await.map_err(db_err)?;

        cascade_credits(&txn, customer, entry.id).await?;

        let entry = refetch_credit_entry(&txn, entry.id).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(entry)
    }

    /// Rewrites one credit entry's delta and cascades forward from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist or the cascade fails.
    pub async fn update_credit_delta(
        &self,
        entry_id: CreditEntryId,
        new_delta: i64,
    ) -> Result<credit_entries::Model, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let entry = credit_entries::Entity::find_by_id(entry_id.into_inner())
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(entry_id.into_inner()))?;
        let customer = lock_customer(&txn, CustomerId::from_raw(entry.customer_id)).await?;

        let anchor_id = entry.id;
        let mut active: credit_entries::ActiveModel = entry.into();
        active.delta = Set(new_delta);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await.map_err(db_err)?;

        cascade_credits(&txn, customer, anchor_id).await?;

        let entry = refetch_credit_entry(&txn, anchor_id).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(entry)
    }

    /// Deletes a credit entry and cascades forward from its position.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist or the cascade fails.
    pub async fn delete_credit_entry(&self, entry_id: CreditEntryId) -> Result<(), LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let entry = credit_entries::Entity::find_by_id(entry_id.into_inner())
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(entry_id.into_inner()))?;
        let customer = lock_customer(&txn, CustomerId::from_raw(entry.customer_id)).await?;

        let anchor_id = entry.id;
        credit_entries::Entity::delete_by_id(anchor_id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        cascade_credits(&txn, customer, anchor_id).await?;

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    /// Returns a customer's full credit history in replay (id) order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn credit_history(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<credit_entries::Model>, LedgerError> {
        credit_entries::Entity::find()
            .filter(credit_entries::Column::CustomerId.eq(customer_id.into_inner()))
            .order_by_asc(credit_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}

// ============================================================================
// Cascade internals
// ============================================================================

/// Locks the customer row for the duration of the transaction.
///
/// This is the per-customer serialization point: two cascades for the same
/// customer cannot interleave, while different customers proceed
/// concurrently.
async fn lock_customer(
    txn: &DatabaseTransaction,
    customer_id: CustomerId,
) -> Result<customers::Model, LedgerError> {
    customers::Entity::find_by_id(customer_id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(LedgerError::CustomerNotFound(customer_id.into_inner()))
}

/// Restores the running-total invariant for every balance entry with
/// `id >= from_id`, then rewrites the customer's denormalized balance.
///
/// The prefix total is seeded from the cached `running_total` of the last
/// entry before `from_id`; entries before the mutation point are untouched
/// by any write path, so their cache is trustworthy. After a delete the
/// anchor row no longer exists and `id >= from_id` selects exactly the
/// surviving suffix.
async fn cascade_amounts(
    txn: &DatabaseTransaction,
    customer: customers::Model,
    from_id: i64,
) -> Result<(), LedgerError> {
    let total_before = amount_entries::Entity::find()
        .filter(amount_entries::Column::CustomerId.eq(customer.id))
        .filter(amount_entries::Column::Id.lt(from_id))
        .order_by_desc(amount_entries::Column::Id)
        .one(txn)
        .await
        .map_err(db_err)?
        .map_or(Decimal::ZERO, |prev| prev.running_total);

    let suffix = amount_entries::Entity::find()
        .filter(amount_entries::Column::CustomerId.eq(customer.id))
        .filter(amount_entries::Column::Id.gte(from_id))
        .order_by_asc(amount_entries::Column::Id)
        .all(txn)
        .await
        .map_err(db_err)?;

    let deltas: Vec<Decimal> = suffix.iter().map(|e| e.delta).collect();
    let totals = running_totals(total_before, &deltas);

    for (entry, total) in suffix.into_iter().zip(totals.iter().copied()) {
        if entry.running_total != total {
            let mut active: amount_entries::ActiveModel = entry.into();
            active.running_total = Set(total);
            active.updated_at = Set(Utc::now().into());
            active.update(txn).await.map_err(db_err)?;
        }
    }

    let current = final_total(total_before, &totals);
    let mut active: customers::ActiveModel = customer.into();
    active.current_balance = Set(current);
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await.map_err(db_err)?;

    Ok(())
}

/// Integer twin of [`cascade_amounts`] for the credit ledger.
async fn cascade_credits(
    txn: &DatabaseTransaction,
    customer: customers::Model,
    from_id: i64,
) -> Result<(), LedgerError> {
    let total_before = credit_entries::Entity::find()
        .filter(credit_entries::Column::CustomerId.eq(customer.id))
        .filter(credit_entries::Column::Id.lt(from_id))
        .order_by_desc(credit_entries::Column::Id)
        .one(txn)
        .await
        .map_err(db_err)?
        .map_or(0i64, |prev| prev.running_total);

    let suffix = credit_entries::Entity::find()
        .filter(credit_entries::Column::CustomerId.eq(customer.id))
        .filter(credit_entries::Column::Id.gte(from_id))
        .order_by_asc(credit_entries::Column::Id)
        .all(txn)
        .await
        .map_err(db_err)?;

    let deltas: Vec<i64> = suffix.iter().map(|e| e.delta).collect();
    let totals = running_totals(total_before, &deltas);

    for (entry, total) in suffix.into_iter().zip(totals.iter().copied()) {
        if entry.running_total != total {
            let mut active: credit_entries::ActiveModel = entry.into();
            active.running_total = Set(total);
            active.updated_at = Set(Utc::now().into());
            active.update(txn).await.map_err(db_err)?;
        }
    }

    let current = final_total(total_before, &totals);
    let mut active: customers::ActiveModel = customer.into();
    active.current_credits = Set(current);
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await.map_err(db_err)?;

    Ok(())
}

async fn refetch_amount_entry(
    txn: &DatabaseTransaction,
    id: i64,
) -> Result<amount_entries::Model, LedgerError> {
    amount_entries::Entity::find_by_id(id)
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(LedgerError::EntryNotFound(id))
}

async fn refetch_credit_entry(
    txn: &DatabaseTransaction,
    id: i64,
) -> Result<credit_entries::Model, LedgerError> {
    credit_entries::Entity::find_by_id(id)
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(LedgerError::EntryNotFound(id))
}

/// Maps database failures into the engine's error taxonomy.
///
/// Lock and serialization failures surface as a retryable conflict; the
/// caller decides whether to re-invoke the whole operation.
fn db_err(err: DbErr) -> LedgerError {
    let msg = err.to_string();
    if msg.contains("deadlock")
        || msg.contains("could not serialize")
        || msg.contains("lock timeout")
        || msg.contains("lock_timeout")
    {
        LedgerError::ConcurrentModification
    } else {
        LedgerError::Database(msg)
    }
}
