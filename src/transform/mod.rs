// ==========================================
// 宝石采购订单导入系统 - 转换层模块
// ==========================================
// 阶段序在 pipeline 中写死: 映射 → 类型 → 分类 → 必填 → 价格 → 去重
// ==========================================

pub mod classifier;
pub mod context;
pub mod dedup;
pub mod error;
pub mod field_mapper;
pub mod pipeline;
pub mod pricing;
pub mod type_coercion;
pub mod validator;

/// 纯同步转换阶段的统一接口
///
/// 价格归一与去重依赖外部协作方,不走本接口。
pub trait TransformStage {
    fn name(&self) -> &'static str;
    fn apply(
        &self,
        ctx: &mut context::TransformContext,
    ) -> Result<(), error::TransformError>;
}

pub use classifier::RowClassifierStage;
pub use context::{AttrValue, TransformContext};
pub use dedup::DedupGuard;
pub use error::{RunError, TransformError};
pub use field_mapper::FieldMappingStage;
pub use pipeline::{ErrorSample, OrderTransformer, TransformStats};
pub use pricing::{BackfillReport, PriceBackfill, PriceNormalizer};
pub use type_coercion::TypeParsingStage;
pub use validator::RequiredFieldStage;
