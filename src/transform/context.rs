// ==========================================
// 宝石采购订单导入系统 - 转换上下文
// ==========================================
// 职责: 承载单行在各阶段之间流转的中间状态
// 说明: attrs 以字段名为键,经过类型转换后由 instantiate_order 组装为订单实体
// ==========================================

use crate::domain::order::{RawOrderRow, SupplierOrder};
use crate::domain::types::{Currency, Unit};
use crate::transform::error::TransformError;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// 阶段间传递的属性值
///
/// Text/Number 是映射阶段产出的原始态,其余是类型转换阶段的目标态。
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Text(String),
    Number(f64),
    Int(i64),
    Decimal(Decimal),
    Date(NaiveDate),
    Currency(Currency),
    Unit(Unit),
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            AttrValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            AttrValue::Date(v) => Some(*v),
            _ => None,
        }
    }
}

/// 单行转换上下文
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// 原始行（分类阶段还要回查未映射的单元格）
    pub raw: RawOrderRow,
    /// 映射后的字段属性,键为规范字段名
    pub attrs: BTreeMap<&'static str, AttrValue>,
}

impl TransformContext {
    pub fn new(raw: RawOrderRow) -> Self {
        TransformContext {
            raw,
            attrs: BTreeMap::new(),
        }
    }

    /// 行定位串,用于错误样本
    pub fn locator(&self) -> String {
        self.raw.locator()
    }

    pub fn get(&self, field: &str) -> &AttrValue {
        self.attrs.get(field).unwrap_or(&AttrValue::Null)
    }

    pub fn set(&mut self, field: &'static str, value: AttrValue) {
        self.attrs.insert(field, value);
    }

    /// 映射出的属性是否全部为空
    pub fn all_attrs_null(&self) -> bool {
        self.attrs.values().all(|v| v.is_null())
    }

    fn take_text(&self, field: &str) -> Option<String> {
        self.attrs.get(field).and_then(|v| match v {
            AttrValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
    }

    fn require_text(&self, field: &str) -> Result<String, TransformError> {
        self.take_text(field)
            .ok_or_else(|| TransformError::Unexpected(format!("field '{}' absent after validation", field)))
    }

    fn require_int(&self, field: &str) -> Result<i64, TransformError> {
        self.get(field)
            .as_int()
            .ok_or_else(|| TransformError::Unexpected(format!("field '{}' absent after validation", field)))
    }

    fn require_decimal(&self, field: &str) -> Result<Decimal, TransformError> {
        self.get(field)
            .as_decimal()
            .ok_or_else(|| TransformError::Unexpected(format!("field '{}' absent after validation", field)))
    }

    /// 组装订单实体
    ///
    /// 前置条件: 必填校验与价格归一均已通过,货币/单位已写回规范值。
    /// 违反前置条件按 Unexpected 上报,不做 panic。
    pub fn instantiate_order(&self) -> Result<SupplierOrder, TransformError> {
        let currency = match self.get("currency") {
            AttrValue::Currency(c) => *c,
            other => {
                return Err(TransformError::Unexpected(format!(
                    "currency not normalized: {:?}",
                    other
                )))
            }
        };
        let unit = match self.get("unit") {
            AttrValue::Unit(u) => *u,
            other => {
                return Err(TransformError::Unexpected(format!(
                    "unit not normalized: {:?}",
                    other
                )))
            }
        };
        let date = self
            .get("date")
            .as_date()
            .ok_or_else(|| TransformError::Unexpected("date absent after validation".to_string()))?;

        Ok(SupplierOrder {
            id: None,
            source_file: self.raw.source_file.clone(),
            sheet_name: self.raw.sheet_name.clone(),
            row_index: self.raw.row_index,
            date,
            book_no: self.require_int("book_no")?,
            order_no: self.require_int("order_no")?,
            tax_invoice: self.take_text("tax_invoice"),
            supplier: self.require_text("supplier")?,
            number: self.require_int("number")?,
            stone: self.require_text("stone")?,
            heating: self.take_text("heating"),
            color: self.take_text("color"),
            shape: self.take_text("shape"),
            cutting: self.take_text("cutting"),
            size: self.take_text("size"),
            carats: self.require_decimal("carats")?,
            weight_per_piece: self.get("weight_per_piece").as_decimal(),
            currency,
            price_cur_per_unit: self.require_decimal("price_cur_per_unit")?,
            unit,
            total_cur: self.get("total_cur").as_decimal(),
            price_usd_per_ct: self.get("price_usd_per_ct").as_decimal(),
            price_usd_per_piece: self.get("price_usd_per_piece").as_decimal(),
            total_usd: self.get("total_usd").as_decimal(),
            remarks: self.take_text("remarks"),
            credit_term: self.take_text("credit_term"),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::CellValue;
    use std::collections::HashMap;

    fn raw_row() -> RawOrderRow {
        RawOrderRow::new("orders.xlsx", "May", 7, HashMap::<String, CellValue>::new())
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn full_ctx() -> TransformContext {
        let mut ctx = TransformContext::new(raw_row());
        ctx.set("date", AttrValue::Date(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()));
        ctx.set("book_no", AttrValue::Int(12));
        ctx.set("order_no", AttrValue::Int(340));
        ctx.set("supplier", AttrValue::Text("Siam Gems".to_string()));
        ctx.set("number", AttrValue::Int(5));
        ctx.set("stone", AttrValue::Text("Ruby".to_string()));
        ctx.set("carats", AttrValue::Decimal(dec("10.500")));
        ctx.set("currency", AttrValue::Currency(Currency::USD));
        ctx.set("unit", AttrValue::Unit(Unit::Carat));
        ctx.set("price_cur_per_unit", AttrValue::Decimal(dec("25.00")));
        ctx.set("price_usd_per_ct", AttrValue::Decimal(dec("25.00")));
        ctx
    }

    #[test]
    fn test_instantiate_order_ok() {
        let order = full_ctx().instantiate_order().unwrap();
        assert_eq!(order.supplier, "Siam Gems");
        assert_eq!(order.carats, dec("10.500"));
        assert_eq!(order.currency, Currency::USD);
        assert!(order.shape.is_none());
        assert!(order.id.is_none());
    }

    #[test]
    fn test_instantiate_order_rejects_unnormalized_currency() {
        let mut ctx = full_ctx();
        ctx.set("currency", AttrValue::Text("US$".to_string()));
        let err = ctx.instantiate_order().unwrap_err();
        assert!(matches!(err, TransformError::Unexpected(_)));
    }

    #[test]
    fn test_all_attrs_null() {
        let mut ctx = TransformContext::new(raw_row());
        ctx.set("stone", AttrValue::Null);
        ctx.set("carats", AttrValue::Null);
        assert!(ctx.all_attrs_null());
        ctx.set("stone", AttrValue::Text("Ruby".to_string()));
        assert!(!ctx.all_attrs_null());
    }
}
