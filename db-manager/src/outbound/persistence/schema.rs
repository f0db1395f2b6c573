//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. Diesel uses them for
//! compile-time query validation; a column whose runtime type disagrees fails
//! row deserialization instead of being coerced.

diesel::table! {
    /// Append-only audit log.
    logs (id) {
        /// Identity column assigned by PostgreSQL.
        id -> Int4,
        /// When the audited event happened.
        log_time -> Timestamptz,
        /// Free-text description (max 255 characters).
        log_message -> Varchar,
    }
}

diesel::table! {
    /// Managed user accounts.
    users (id) {
        /// Identity column assigned by PostgreSQL.
        id -> Int4,
        /// Display name (max 20 characters).
        name -> Varchar,
        /// Email address (max 50 characters).
        email -> Varchar,
        /// Opaque password text (max 255 characters).
        password -> Varchar,
        /// Set on insert and rewritten on every update.
        registered_at -> Timestamptz,
    }
}
