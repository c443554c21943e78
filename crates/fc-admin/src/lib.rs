//! FideliCard back-office services
//!
//! [`CompanyDirectory`] and [`PlanCatalog`] keep a cached list for the admin
//! screens and write through the store traits in [`stores`].

mod cache;
pub mod companies;
pub mod error;
pub mod plans;
pub mod stores;

pub use cache::{Keyed, ListView};
pub use companies::CompanyDirectory;
pub use error::{AdminError, Result};
pub use plans::PlanCatalog;
pub use stores::{
    AccountAdmin, AccountMetadata, CompanyPatch, CompanyRecord, CompanyStore, NewAccount,
    NewCompanyAccount, NewPlan, PlanPatch, PlanRecord, PlanStore,
};
