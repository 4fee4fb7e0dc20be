// ==========================================
// 宝石采购订单导入系统 - 订单 Repository Trait
// ==========================================
// 职责: 定义订单与原始行的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::order::{LotKey, RawOrderRow, SupplierOrder};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use rust_decimal::Decimal;

// ==========================================
// OrderStore Trait
// ==========================================
// 用途: 转换产出订单的批量落库与去重回查
// 实现者: SqliteOrderStore（使用 rusqlite）
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// 批量插入订单，按 batch_size 分事务提交
    ///
    /// # 返回
    /// - Ok(usize): 成功插入的记录数
    /// - Err: 数据库错误（当前事务整体回滚，之前事务保持已提交）
    async fn bulk_insert(
        &self,
        orders: &[SupplierOrder],
        batch_size: usize,
    ) -> RepositoryResult<usize>;

    /// 批次键是否已存在于库中
    async fn exists_lot(&self, key: &LotKey) -> RepositoryResult<bool>;

    /// 查询任一美元价字段缺失的订单，按交易日期升序
    ///
    /// 每粒价只在已知每粒重时计入缺失；每粒重未知的订单不会因此入队
    async fn fetch_missing_usd(&self) -> RepositoryResult<Vec<SupplierOrder>>;

    /// 回填单条订单的美元价字段
    async fn update_usd_prices(
        &self,
        id: i64,
        price_usd_per_ct: Decimal,
        price_usd_per_piece: Option<Decimal>,
        total_usd: Decimal,
    ) -> RepositoryResult<()>;

    /// 订单总数（测试与对账用）
    async fn count_orders(&self) -> RepositoryResult<usize>;
}

// ==========================================
// RawRowStore Trait
// ==========================================
// 用途: 原始行的留痕与重放
#[async_trait]
pub trait RawRowStore: Send + Sync {
    /// 留存原始行，同一 (文件, 工作表, 行号) 幂等
    async fn insert_raw_rows(&self, rows: &[RawOrderRow]) -> RepositoryResult<usize>;

    /// 取出尚未处理的原始行
    async fn fetch_pending(&self) -> RepositoryResult<Vec<RawOrderRow>>;

    /// 标记原始行的处理结果
    async fn mark_outcome(
        &self,
        source_file: &str,
        sheet_name: &str,
        row_index: i64,
        outcome: &str,
        detail: Option<&str>,
    ) -> RepositoryResult<()>;
}
