//! FideliCard backend adapter
//!
//! [`SupabaseClient`] talks to the hosted identity service (`/auth/v1`) and
//! its REST layer (`/rest/v1`). It implements the core's `IdentityProvider`
//! and `ProfileStore`, plus the back-office `CompanyStore`, `PlanStore` and
//! `AccountAdmin` seams.

mod admin;
mod auth;
mod client;
pub mod error;
pub mod persistence;
mod rest;

pub use client::SupabaseClient;
pub use error::{parse_error_message, BackendError};
pub use persistence::SessionFile;
