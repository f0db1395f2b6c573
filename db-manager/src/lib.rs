//! User table manager with audited, transactional repository access.
//!
//! The [`domain`] ports define the user repository and the audit log. The
//! [`middleware`] decorators add transactions and audit entries around any
//! repository, [`outbound`] provides PostgreSQL and in-memory storage, and
//! [`inbound`] exposes the interactive command loop that [`app`] wires up.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

pub mod app;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
