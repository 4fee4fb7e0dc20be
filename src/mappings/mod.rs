// ==========================================
// 宝石采购订单导入系统 - 静态映射层
// ==========================================
// 职责: 列标签/货币/单位的不可变别名表
// 红线: 表在编译期固定,运行期不注册新别名
// ==========================================

pub mod columns;
pub mod currency;
pub mod units;

pub use columns::{get_value_mapped, ORDER_COLUMN_MAPPING, RAW_COLUMN_MAPPING};
pub use currency::normalize_currency;
pub use units::normalize_unit;
