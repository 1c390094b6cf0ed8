//! Database schema and catalog seed.
//!
//! The DDL is embedded and applied at startup; every statement is
//! re-runnable (`IF NOT EXISTS` / `ON CONFLICT DO NOTHING`).

/// Schema DDL applied by [`crate::PgStore::apply_schema`].
pub const DDL: &str = r"
CREATE TABLE IF NOT EXISTS employee (
    id            BIGSERIAL PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    balance       BIGINT NOT NULL CHECK (balance >= 0)
);

CREATE TABLE IF NOT EXISTS merch (
    id    BIGSERIAL PRIMARY KEY,
    name  TEXT NOT NULL UNIQUE,
    price BIGINT NOT NULL CHECK (price > 0)
);

CREATE TABLE IF NOT EXISTS transfer (
    id          BIGSERIAL PRIMARY KEY,
    sender_id   BIGINT NOT NULL REFERENCES employee (id),
    receiver_id BIGINT NOT NULL REFERENCES employee (id),
    amount      BIGINT NOT NULL CHECK (amount > 0),
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS transfer_sender_idx ON transfer (sender_id);
CREATE INDEX IF NOT EXISTS transfer_receiver_idx ON transfer (receiver_id);

CREATE TABLE IF NOT EXISTS holding (
    employee_id BIGINT NOT NULL REFERENCES employee (id),
    merch_id    BIGINT NOT NULL REFERENCES merch (id),
    quantity    BIGINT NOT NULL CHECK (quantity >= 1),
    PRIMARY KEY (employee_id, merch_id)
);
";

/// The fixed merch catalog: `(name, price)` pairs.
///
/// Immutable reference data; both backends seed from this list.
pub const CATALOG: &[(&str, i64)] = &[
    ("t-shirt", 80),
    ("cup", 20),
    ("book", 50),
    ("pen", 10),
    ("powerbank", 200),
    ("hoody", 300),
    ("umbrella", 200),
    ("socks", 10),
    ("wallet", 50),
    ("pink-hoody", 500),
];

/// Render the catalog seed as a single idempotent INSERT.
#[must_use]
pub fn catalog_seed_sql() -> String {
    let values: Vec<String> = CATALOG
        .iter()
        .map(|(name, price)| format!("('{name}', {price})"))
        .collect();

    format!(
        "INSERT INTO merch (name, price) VALUES {} ON CONFLICT (name) DO NOTHING;",
        values.join(", ")
    )
}
