// ==========================================
// 宝石采购订单导入系统 - 类型转换阶段
// ==========================================
// 职责: 按字段声明把映射后的原始值转换为目标类型
// 口径: 整数/小数解析失败写 Null 交给必填校验;
//       日期非空但无法解析是硬错误,直接判行失败
// ==========================================

use crate::domain::order::{FieldType, FIELD_SPECS};
use crate::transform::context::{AttrValue, TransformContext};
use crate::transform::error::TransformError;
use crate::transform::TransformStage;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Excel 序列日期的零点
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// 文本日期的候选格式,月先于日
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

pub struct TypeParsingStage;

impl TransformStage for TypeParsingStage {
    fn name(&self) -> &'static str {
        "type_parsing"
    }

    fn apply(&self, ctx: &mut TransformContext) -> Result<(), TransformError> {
        for spec in FIELD_SPECS {
            let current = ctx.get(spec.name).clone();
            let parsed = match spec.ty {
                FieldType::Int => parse_int(&current),
                FieldType::Decimal(scale) => parse_decimal(&current, scale),
                FieldType::Date => parse_date(&current)
                    .map_err(|value| TransformError::InvalidDate {
                        field: spec.name.to_string(),
                        value,
                    })?,
                FieldType::Text => parse_text(&current),
            };
            ctx.set(spec.name, parsed);
        }
        Ok(())
    }
}

/// 整数解析: 数值截断小数位;文本先按数值解析,失败后剥离非数字字符重试
pub fn parse_int(value: &AttrValue) -> AttrValue {
    match value {
        AttrValue::Number(n) if n.is_finite() => AttrValue::Int(n.trunc() as i64),
        AttrValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return AttrValue::Null;
            }
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.is_finite() {
                    return AttrValue::Int(f.trunc() as i64);
                }
            }
            let digits: String = trimmed
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '-')
                .collect();
            match digits.parse::<i64>() {
                Ok(v) => AttrValue::Int(v),
                Err(_) => AttrValue::Null,
            }
        }
        AttrValue::Int(v) => AttrValue::Int(*v),
        _ => AttrValue::Null,
    }
}

/// 小数解析: 仅保留数字、小数点和负号,四舍五入到声明精度
pub fn parse_decimal(value: &AttrValue, scale: u32) -> AttrValue {
    let parsed = match value {
        AttrValue::Number(n) => Decimal::from_f64(*n),
        AttrValue::Text(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<Decimal>().ok()
        }
        AttrValue::Decimal(d) => Some(*d),
        AttrValue::Int(v) => Some(Decimal::from(*v)),
        _ => None,
    };
    match parsed {
        Some(d) => AttrValue::Decimal(
            d.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero),
        ),
        None => AttrValue::Null,
    }
}

/// 日期解析: 数值按 Excel 序列日,文本逐格式尝试
///
/// 非空但解析失败时返回 Err 携带原值文本。
pub fn parse_date(value: &AttrValue) -> Result<AttrValue, String> {
    match value {
        AttrValue::Null | AttrValue::Text(_) if is_blank_text(value) => Ok(AttrValue::Null),
        AttrValue::Number(n) => {
            let (y, m, d) = EXCEL_EPOCH;
            let epoch = NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| n.to_string())?;
            if !n.is_finite() || *n < 0.0 || *n > 200_000.0 {
                return Err(n.to_string());
            }
            Ok(AttrValue::Date(epoch + Duration::days(n.trunc() as i64)))
        }
        AttrValue::Text(s) => {
            let trimmed = s.trim();
            for fmt in DATE_FORMATS {
                if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
                    return Ok(AttrValue::Date(d));
                }
            }
            for fmt in DATETIME_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                    return Ok(AttrValue::Date(dt.date()));
                }
            }
            Err(trimmed.to_string())
        }
        AttrValue::Date(d) => Ok(AttrValue::Date(*d)),
        _ => Ok(AttrValue::Null),
    }
}

/// 文本解析: 去首尾空白,空串归 Null;数值渲染为无多余小数位的文本
pub fn parse_text(value: &AttrValue) -> AttrValue {
    match value {
        AttrValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                AttrValue::Null
            } else {
                AttrValue::Text(trimmed.to_string())
            }
        }
        AttrValue::Number(n) if n.is_finite() => {
            if n.fract() == 0.0 {
                AttrValue::Text(format!("{}", n.trunc() as i64))
            } else {
                AttrValue::Text(n.to_string())
            }
        }
        _ => AttrValue::Null,
    }
}

fn is_blank_text(value: &AttrValue) -> bool {
    match value {
        AttrValue::Null => true,
        AttrValue::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}
