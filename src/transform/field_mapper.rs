// ==========================================
// 宝石采购订单导入系统 - 字段映射阶段
// ==========================================
// 职责: 按列名别名表把原始单元格收敛到规范字段名
// 红线: 本阶段永不失败,缺列一律写 Null 交给后续校验
// ==========================================

use crate::domain::order::CellValue;
use crate::mappings::{get_value_mapped, ORDER_COLUMN_MAPPING};
use crate::transform::context::{AttrValue, TransformContext};
use crate::transform::error::TransformError;
use crate::transform::TransformStage;

pub struct FieldMappingStage;

impl TransformStage for FieldMappingStage {
    fn name(&self) -> &'static str {
        "field_mapping"
    }

    fn apply(&self, ctx: &mut TransformContext) -> Result<(), TransformError> {
        for (field, _aliases) in ORDER_COLUMN_MAPPING {
            let value = match get_value_mapped(&ctx.raw, field, ORDER_COLUMN_MAPPING) {
                Some(CellValue::Text(s)) => AttrValue::Text(s.clone()),
                Some(CellValue::Number(n)) => AttrValue::Number(*n),
                Some(CellValue::Empty) | None => AttrValue::Null,
            };
            ctx.set(field, value);
        }
        Ok(())
    }
}
