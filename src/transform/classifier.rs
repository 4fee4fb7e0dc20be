// ==========================================
// 宝石采购订单导入系统 - 行分类阶段
// ==========================================
// 职责: 丢弃取消行与非采购行
// 说明: 分类丢弃计入 skipped,不污染数据质量失败统计;
//       空行在映射后由编排器直接拦截,不进本阶段
// ==========================================

use crate::domain::order::CellValue;
use crate::mappings::{get_value_mapped, RAW_COLUMN_MAPPING};
use crate::transform::context::TransformContext;
use crate::transform::error::TransformError;
use crate::transform::TransformStage;

/// 取消标记的归一化形态
const CANCELED_TOKENS: &[&str] = &["canceled", "cancelled", "cancel"];

pub struct RowClassifierStage;

impl TransformStage for RowClassifierStage {
    fn name(&self) -> &'static str {
        "row_classifier"
    }

    fn apply(&self, ctx: &mut TransformContext) -> Result<(), TransformError> {
        scan_canceled(ctx)?;
        check_is_purchase(ctx)?;
        Ok(())
    }
}

/// 扫描原始行全部单元格,任一列出现取消标记即丢弃整行
///
/// 归一化口径: 小写后剥除非字母字符,与取消词表精确比对。
fn scan_canceled(ctx: &TransformContext) -> Result<(), TransformError> {
    for (column, cell) in &ctx.raw.data {
        let text = match cell {
            CellValue::Text(s) => s,
            _ => continue,
        };
        let normalized: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphabetic())
            .collect();
        if CANCELED_TOKENS.contains(&normalized.as_str()) {
            return Err(TransformError::Canceled {
                column: column.clone(),
                token: text.trim().to_string(),
            });
        }
    }
    Ok(())
}

/// 客户备注列为空或 'P' 视为采购,其余标记（寄售 M、议价 B 等）丢弃
fn check_is_purchase(ctx: &TransformContext) -> Result<(), TransformError> {
    let marker = match get_value_mapped(&ctx.raw, "client_memo", RAW_COLUMN_MAPPING) {
        Some(CellValue::Text(s)) => s.trim().to_uppercase(),
        _ => String::new(),
    };
    if marker.is_empty() || marker == "P" {
        Ok(())
    } else {
        Err(TransformError::NotAPurchase { marker })
    }
}
