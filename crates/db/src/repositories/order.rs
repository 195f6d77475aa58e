//! Order repository: insurance and service orders plus the partner payout
//! side effect.
//!
//! Marking an order paid is a business action with a ledger consequence:
//! when the order names a referring city partner, the partner's balance
//! ledger must hold exactly one payout entry for that order, with a delta
//! equal to the current payout rule applied to the current order total.
//! The sync here is idempotent, so a failed attempt can be retried.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::info;

use autocare_core::ledger::{ChangeType, LedgerError};
use autocare_core::partner::{PayoutKind, payout_amount};
use autocare_shared::types::{AmountEntryId, CustomerId, OrderId, PageRequest};

use crate::entities::sea_orm_active_enums::OrderKind;
use crate::entities::{amount_entries, customers, orders};
use crate::repositories::ledger::{AmountChangeMeta, LedgerRepository};

/// Error types for order operations.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// Order not found.
    #[error("Order not found: {0}")]
    NotFound(i64),

    /// Ordering customer not found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(i64),

    /// The referenced partner is not flagged as a partner.
    #[error("Customer {0} is not a partner")]
    NotAPartner(i64),

    /// The payout sync failed; the paid flag change was rolled back.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    /// Insurance or service.
    pub kind: OrderKind,
    /// The customer the order is sold to.
    pub customer_id: CustomerId,
    /// The referring city partner, if any.
    pub partner_id: Option<CustomerId>,
    /// Order total, tax included.
    pub total_price: Decimal,
    /// Business date of the order.
    pub record_date: NaiveDate,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Repository for orders and their payout bookkeeping.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: DatabaseConnection,
    ledger: LedgerRepository,
}

impl OrderRepository {
    /// Creates a new order repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let ledger = LedgerRepository::new(db.clone());
        Self { db, ledger }
    }

    /// Creates an unpaid order.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound` / `NotAPartner` when the referenced
    /// customers fail validation, or a database error.
    pub async fn create(&self, input: CreateOrderInput) -> Result<orders::Model, OrderError> {
        self.require_customer(input.customer_id).await?;
        if let Some(partner_id) = input.partner_id {
            self.require_partner(partner_id).await?;
        }

        let now = Utc::now().into();
        let order = orders::ActiveModel {
            kind: Set(input.kind),
            customer_id: Set(input.customer_id.into_inner()),
            partner_id: Set(input.partner_id.map(CustomerId::into_inner)),
            total_price: Set(input.total_price),
            record_date: Set(input.record_date),
            paid: Set(false),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(order.insert(&self.db).await?)
    }

    /// Finds an order by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, id: OrderId) -> Result<Option<orders::Model>, OrderError> {
        Ok(orders::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?)
    }

    /// Lists orders of one kind, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        kind: OrderKind,
        page: &PageRequest,
    ) -> Result<(Vec<orders::Model>, u64), OrderError> {
        let base = orders::Entity::find().filter(orders::Column::Kind.eq(kind));

        let total = base.clone().count(&self.db).await?;
        let items = base
            .order_by_desc(orders::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((items, total))
    }

    /// Sets the paid flag and synchronizes the partner payout entry.
    ///
    /// The payout sync runs first: marking paid fails outright if the
    /// ledger write fails, and the order keeps its previous flag. Both
    /// directions are idempotent, so repeating the call after a partial
    /// failure converges.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown order, or a ledger error when the
    /// payout entry could not be written or retracted.
    pub async fn set_paid(&self, id: OrderId, paid: bool) -> Result<orders::Model, OrderError> {
        let order = orders::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(OrderError::NotFound(id.into_inner()))?;

        self.sync_partner_payout(&order, paid).await?;

        if order.paid == paid {
            return Ok(order);
        }

        let mut active: orders::ActiveModel = order.into();
        active.paid = Set(paid);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Brings the partner's ledger in line with the order's target paid
    /// state.
    ///
    /// Paid and partner-attributed: ensure exactly one payout entry linked
    /// to this order, with the delta the payout rule currently yields.
    /// Otherwise: retract the linked entry if one exists.
    async fn sync_partner_payout(
        &self,
        order: &orders::Model,
        paid: bool,
    ) -> Result<(), OrderError> {
        let kind = PayoutKind::from(order.kind);
        let existing = self
            .ledger
            .find_amount_entry_by_source(kind, OrderId::from_raw(order.id))
            .await?;

        let Some(partner_id) = order.partner_id else {
            // Orders without a partner never earn a payout; clean up if the
            // attribution was removed after one was recorded.
            if let Some(entry) = existing {
                self.retract_payout(order, &entry).await?;
            }
            return Ok(());
        };

        if !paid {
            if let Some(entry) = existing {
                self.retract_payout(order, &entry).await?;
            }
            return Ok(());
        }

        let payout = payout_amount(kind, order.total_price);
        match existing {
            None => {
                self.ledger
                    .record_amount_change(
                        CustomerId::from_raw(partner_id),
                        payout,
                        AmountChangeMeta {
                            change_type: Some(ChangeType::PartnerIncome),
                            notes: None,
                            source: Some((kind, OrderId::from_raw(order.id))),
                        },
                    )
                    .await?;
                info!(
                    order_id = order.id,
                    partner_id,
                    payout = %payout,
                    "Recorded partner payout"
                );
            }
            Some(entry) if entry.delta != payout => {
                self.ledger
                    .update_amount_delta(AmountEntryId::from_raw(entry.id), payout)
                    .await?;
                info!(
                    order_id = order.id,
                    partner_id,
                    payout = %payout,
                    "Adjusted partner payout"
                );
            }
            Some(_) => {}
        }

        Ok(())
    }

    async fn retract_payout(
        &self,
        order: &orders::Model,
        entry: &amount_entries::Model,
    ) -> Result<(), OrderError> {
        self.ledger
            .delete_amount_entry(AmountEntryId::from_raw(entry.id))
            .await?;
        info!(order_id = order.id, entry_id = entry.id, "Retracted partner payout");
        Ok(())
    }

    async fn require_customer(&self, id: CustomerId) -> Result<customers::Model, OrderError> {
        customers::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(OrderError::CustomerNotFound(id.into_inner()))
    }

    async fn require_partner(&self, id: CustomerId) -> Result<customers::Model, OrderError> {
        let customer = self.require_customer(id).await?;
        if !customer.is_partner {
            return Err(OrderError::NotAPartner(id.into_inner()));
        }
        Ok(customer)
    }
}
