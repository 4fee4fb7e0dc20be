// ==========================================
// 宝石采购订单导入系统 - 必填校验阶段
// ==========================================
// 职责: 汇总缺失的必填字段,一次性判行失败
// ==========================================

use crate::domain::order::FIELD_SPECS;
use crate::transform::context::TransformContext;
use crate::transform::error::TransformError;
use crate::transform::TransformStage;

pub struct RequiredFieldStage;

impl TransformStage for RequiredFieldStage {
    fn name(&self) -> &'static str {
        "required_fields"
    }

    fn apply(&self, ctx: &mut TransformContext) -> Result<(), TransformError> {
        let mut missing: Vec<String> = FIELD_SPECS
            .iter()
            .filter(|spec| spec.required && ctx.get(spec.name).is_null())
            .map(|spec| spec.name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            missing.sort();
            Err(TransformError::MissingRequiredFields(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::RawOrderRow;
    use crate::domain::types::{Currency, Unit};
    use crate::transform::context::AttrValue;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn ctx_with_all_required() -> TransformContext {
        let mut ctx = TransformContext::new(RawOrderRow::new(
            "po.xlsx",
            "May",
            5,
            HashMap::new(),
        ));
        ctx.set("date", AttrValue::Date(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()));
        ctx.set("book_no", AttrValue::Int(12));
        ctx.set("order_no", AttrValue::Int(340));
        ctx.set("supplier", AttrValue::Text("Siam Gems".to_string()));
        ctx.set("number", AttrValue::Int(5));
        ctx.set("stone", AttrValue::Text("Ruby".to_string()));
        ctx.set("carats", AttrValue::Decimal("10.500".parse().unwrap()));
        ctx.set("currency", AttrValue::Currency(Currency::USD));
        ctx.set("unit", AttrValue::Unit(Unit::Carat));
        ctx.set("price_cur_per_unit", AttrValue::Decimal("25.00".parse().unwrap()));
        ctx
    }

    #[test]
    fn test_complete_row_passes() {
        let mut ctx = ctx_with_all_required();
        assert!(RequiredFieldStage.apply(&mut ctx).is_ok());
    }

    #[test]
    fn test_all_missing_fields_reported_sorted() {
        let mut ctx = ctx_with_all_required();
        ctx.set("supplier", AttrValue::Null);
        ctx.set("carats", AttrValue::Null);
        let err = RequiredFieldStage.apply(&mut ctx).unwrap_err();
        assert_eq!(
            err,
            TransformError::MissingRequiredFields(vec![
                "carats".to_string(),
                "supplier".to_string()
            ])
        );
    }

    #[test]
    fn test_optional_fields_not_required() {
        let mut ctx = ctx_with_all_required();
        ctx.set("shape", AttrValue::Null);
        ctx.set("remarks", AttrValue::Null);
        assert!(RequiredFieldStage.apply(&mut ctx).is_ok());
    }
}
