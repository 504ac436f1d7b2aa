//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Operations that must move the
//! balance together with another row (crediting a top-up, paying for an
//! order) open their own transaction and return an outcome enum instead of
//! leaking partial state to the caller.

pub mod catalog_repo;
pub mod order_repo;
pub mod top_up_repo;
pub mod user_repo;
pub mod wallet_repo;

pub use catalog_repo::CatalogRepo;
pub use order_repo::OrderRepo;
pub use top_up_repo::TopUpRepo;
pub use user_repo::UserRepo;
pub use wallet_repo::WalletRepo;
