//! Initial database migration.
//!
//! Creates the enums, customer directory, both ledger tables, and the order
//! table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(CUSTOMERS_SQL).await?;
        db.execute_unprepared(AMOUNT_ENTRIES_SQL).await?;
        db.execute_unprepared(CREDIT_ENTRIES_SQL).await?;
        db.execute_unprepared(ORDERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE change_type AS ENUM (
    'top_up',
    'payment',
    'partner_income',
    'other'
);

CREATE TYPE order_kind AS ENUM (
    'insurance',
    'service'
);
";

const CUSTOMERS_SQL: &str = r"
CREATE TABLE customers (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    mobile VARCHAR(100) NOT NULL,
    is_partner BOOLEAN NOT NULL DEFAULT FALSE,
    -- Denormalized mirrors of the latest ledger entry's running total.
    -- Written only by the ledger repository's cascade.
    current_balance NUMERIC(10, 2) NOT NULL DEFAULT 0,
    current_credits BIGINT NOT NULL DEFAULT 0,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (name, mobile)
);
";

const AMOUNT_ENTRIES_SQL: &str = r"
CREATE TABLE amount_entries (
    -- BIGSERIAL id order is the replay sequencing authority.
    id BIGSERIAL PRIMARY KEY,
    customer_id BIGINT NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    delta NUMERIC(10, 2) NOT NULL,
    running_total NUMERIC(10, 2) NOT NULL,
    change_type change_type NOT NULL DEFAULT 'other',
    source_kind order_kind,
    source_id BIGINT,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_amount_entries_customer_id ON amount_entries(customer_id, id);

-- One payout entry per source order.
CREATE UNIQUE INDEX idx_amount_entries_source
    ON amount_entries(source_kind, source_id)
    WHERE source_kind IS NOT NULL;
";

const CREDIT_ENTRIES_SQL: &str = r"
CREATE TABLE credit_entries (
    id BIGSERIAL PRIMARY KEY,
    customer_id BIGINT NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    delta BIGINT NOT NULL,
    running_total BIGINT NOT NULL,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_credit_entries_customer_id ON credit_entries(customer_id, id);
";

const ORDERS_SQL: &str = r"
CREATE TABLE orders (
    id BIGSERIAL PRIMARY KEY,
    kind order_kind NOT NULL,
    customer_id BIGINT NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    partner_id BIGINT REFERENCES customers(id) ON DELETE SET NULL,
    total_price NUMERIC(10, 2) NOT NULL,
    record_date DATE NOT NULL,
    paid BOOLEAN NOT NULL DEFAULT FALSE,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_orders_customer_id ON orders(customer_id);
CREATE INDEX idx_orders_partner_id ON orders(partner_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS orders;
DROP TABLE IF EXISTS credit_entries;
DROP TABLE IF EXISTS amount_entries;
DROP TABLE IF EXISTS customers;
DROP TYPE IF EXISTS order_kind;
DROP TYPE IF EXISTS change_type;
";
