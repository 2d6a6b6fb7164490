pub mod entity;
pub mod mapper;
pub mod store_repo;


pub use mapper::{document_adapter, relational_adapter, COLLECTION};
pub use store_repo::StoreAccounts;
