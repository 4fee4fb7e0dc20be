// ==========================================
// 宝石采购订单导入系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 供应商采购表单的转换与价格归一管道
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 列名与字典映射
pub mod mappings;

// 转换层 - 管道各阶段
pub mod transform;

// 汇率查询与换算
pub mod rates;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 运行选项
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Currency, Unit};

// 领域实体
pub use domain::{CellValue, LotKey, RawOrderRow, SupplierOrder};

// 转换管道
pub use transform::{
    BackfillReport, OrderTransformer, PriceBackfill, PriceNormalizer, RunError, TransformError,
    TransformStats,
};

// 汇率
pub use rates::{ExchangeRate, RateError, RateLookup, SqliteRateStore};

// 仓储
pub use repository::{OrderStore, RawRowStore, RepositoryError, SqliteOrderStore};

// 配置
pub use config::TransformOptions;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "宝石采购订单导入系统";

// ==========================================
// 预编译检查
// ==========================================
