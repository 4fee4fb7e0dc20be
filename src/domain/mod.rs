// ==========================================
// 宝石采购订单导入系统 - 领域层
// ==========================================
// 职责: 实体与基础类型定义,不含业务流程
// ==========================================

pub mod order;
pub mod types;

pub use order::{
    field_spec, CellValue, FieldSpec, FieldType, LotKey, RawOrderRow, SupplierOrder, FIELD_SPECS,
};
pub use types::{Currency, Unit};
