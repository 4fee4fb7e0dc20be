// ==========================================
// 宝石采购订单导入系统 - 仓储层模块
// ==========================================

pub mod error;
pub mod order_repo;
pub mod order_repo_impl;

pub use error::{RepositoryError, RepositoryResult};
pub use order_repo::{OrderStore, RawRowStore};
pub use order_repo_impl::SqliteOrderStore;
