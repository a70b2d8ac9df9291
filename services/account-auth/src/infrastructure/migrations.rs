//! 嵌入式 schema 迁移

use sentinel_adapter_postgres::Migration;

pub const MIGRATIONS: &[Migration] = &[
    Migration::new(
        1,
        "create_accounts",
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id BIGSERIAL PRIMARY KEY,
            organization_name VARCHAR(255) NOT NULL,
            email VARCHAR(320) NOT NULL,
            phone VARCHAR(64),
            hashed_password TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT accounts_email_key UNIQUE (email)
        );
        "#,
    ),
    Migration::new(
        2,
        "create_token_records",
        r#"
        CREATE TABLE IF NOT EXISTS token_records (
            id BIGSERIAL PRIMARY KEY,
            token_value TEXT NOT NULL,
            account_id BIGINT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT token_records_token_value_key UNIQUE (token_value)
        );
        CREATE INDEX IF NOT EXISTS idx_token_records_account_id ON token_records (account_id);
        "#,
    ),
];
