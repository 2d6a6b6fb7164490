//! Accounts module: a small domain service persisted through `storekit-db`.
//!
//! The same [`domain::service::AccountService`] runs over either backend;
//! [`module::build_service`] picks the store and adapter from configuration.

pub mod domain;
pub mod infra;
pub mod module;

pub use domain::error::DomainError;
pub use domain::model::{AccountPatch, AccountStatus, AccountView, NewAccount};
pub use domain::service::{AccountService, ServiceConfig};
pub use module::{StoreKind, build_service};
