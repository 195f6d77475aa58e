//! Customer directory repository.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use autocare_shared::types::{CustomerId, PageRequest};

use crate::entities::customers;

/// Error types for customer operations.
#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    /// Customer not found.
    #[error("Customer not found: {0}")]
    NotFound(i64),

    /// A customer with the same name and mobile already exists.
    #[error("Customer already exists: {name} {mobile}")]
    AlreadyExists {
        /// Customer name.
        name: String,
        /// Mobile number.
        mobile: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerInput {
    /// Customer name.
    pub name: String,
    /// Mobile phone number.
    pub mobile: String,
    /// Whether the customer is a city partner.
    pub is_partner: bool,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Customer repository for CRUD operations.
///
/// The denormalized `current_balance` / `current_credits` fields are read
/// here but written only by the ledger repository.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: DatabaseConnection,
}

impl CustomerRepository {
    /// Creates a new customer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a customer with zeroed totals.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the (name, mobile) pair is taken.
    pub async fn create(
        &self,
        input: CreateCustomerInput,
    ) -> Result<customers::Model, CustomerError> {
        let existing = customers::Entity::find()
            .filter(customers::Column::Name.eq(input.name.clone()))
            .filter(customers::Column::Mobile.eq(input.mobile.clone()))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(CustomerError::AlreadyExists {
                name: input.name,
                mobile: input.mobile,
            });
        }

        let now = Utc::now().into();
        let customer = customers::ActiveModel {
            name: Set(input.name),
            mobile: Set(input.mobile),
            is_partner: Set(input.is_partner),
            current_balance: Set(Decimal::ZERO),
            current_credits: Set(0),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(customer.insert(&self.db).await?)
    }

    /// Finds a customer by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(
        &self,
        id: CustomerId,
    ) -> Result<Option<customers::Model>, CustomerError> {
        Ok(customers::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?)
    }

    /// Lists customers, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        page: &PageRequest,
    ) -> Result<(Vec<customers::Model>, u64), CustomerError> {
        let total = customers::Entity::find().count(&self.db).await?;

        let items = customers::Entity::find()
            .order_by_desc(customers::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((items, total))
    }
}
