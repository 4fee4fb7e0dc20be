// ==========================================
// 宝石采购订单导入系统 - 订单领域模型
// ==========================================
// 职责: 原始行 / 规范订单记录 / 去重键 / 字段声明表
// 红线: SupplierOrder 只由转换管道构造,入库后不可变
//       (USD 价格回填是唯一例外,见 transform::pricing)
// ==========================================

use crate::domain::types::{Currency, Unit};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// CellValue - 原始单元格值
// ==========================================
// 来源: 外部表格读取器（本 crate 不解析文件）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// 空白判定: Empty 或纯空白字符串
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

// ==========================================
// RawOrderRow - 原始行
// ==========================================
// 身份: (source_file, sheet_name, row_index)
// 用途: 导入层写入,转换管道只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOrderRow {
    pub source_file: String,
    pub sheet_name: String,
    pub row_index: i64,
    /// 列标签 → 原始单元格值
    pub data: HashMap<String, CellValue>,
}

impl RawOrderRow {
    pub fn new(
        source_file: impl Into<String>,
        sheet_name: impl Into<String>,
        row_index: i64,
        data: HashMap<String, CellValue>,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            sheet_name: sheet_name.into(),
            row_index,
            data,
        }
    }

    /// 行定位描述（错误样本用）
    pub fn locator(&self) -> String {
        format!("{} - {}", self.sheet_name, self.row_index)
    }
}

// ==========================================
// SupplierOrder - 规范采购订单记录
// ==========================================
// 对齐: schema.sql supplier_order 表
// 不变式: lot_key() 字段组合全库唯一（unique_supplier_lot）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierOrder {
    /// 存储 rowid（回填路径使用；入库前为 None）
    pub id: Option<i64>,

    // ===== 原始行回溯 =====
    pub source_file: String,
    pub sheet_name: String,
    pub row_index: i64,

    // ===== 订单信息 =====
    pub date: NaiveDate,
    pub book_no: i64,
    pub order_no: i64,
    pub tax_invoice: Option<String>,
    pub supplier: String,

    // ===== 宝石描述 =====
    pub number: i64,
    pub stone: String,
    pub heating: Option<String>,
    pub color: Option<String>,
    pub shape: Option<String>,
    pub cutting: Option<String>,
    pub size: Option<String>,
    pub carats: Decimal,
    pub weight_per_piece: Option<Decimal>,

    // ===== 源货币价格 =====
    pub currency: Currency,
    pub price_cur_per_unit: Decimal,
    pub unit: Unit,
    pub total_cur: Option<Decimal>,

    // ===== USD 归一价格（管道派生 / 回填）=====
    pub price_usd_per_ct: Option<Decimal>,
    pub price_usd_per_piece: Option<Decimal>,
    pub total_usd: Option<Decimal>,

    // ===== 备注 =====
    pub remarks: Option<String>,
    pub credit_term: Option<String>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
}

impl SupplierOrder {
    /// 计算去重键
    pub fn lot_key(&self) -> LotKey {
        LotKey {
            supplier: self.supplier.clone(),
            order_no: self.order_no,
            number: self.number,
            stone: self.stone.clone(),
            shape: self.shape.clone(),
            color: self.color.clone(),
            size: self.size.clone(),
            carats: self.carats,
            weight_per_piece: self.weight_per_piece,
            price_usd_per_ct: self.price_usd_per_ct,
        }
    }
}

// ==========================================
// LotKey - 去重键
// ==========================================
// 口径: "同一批次宝石"的业务定义
// 对齐: supplier_order 表 unique_supplier_lot 唯一索引（同字段组合）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LotKey {
    pub supplier: String,
    pub order_no: i64,
    pub number: i64,
    pub stone: String,
    pub shape: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub carats: Decimal,
    pub weight_per_piece: Option<Decimal>,
    pub price_usd_per_ct: Option<Decimal>,
}

// ==========================================
// FieldSpec - 字段声明表
// ==========================================
/// 用途: 驱动类型转换与必填校验（声明即口径）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    /// 定点十进制,参数为小数位数
    Decimal(u32),
    Date,
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

/// 规范订单的全部可映射字段
///
/// required = true 的字段在转换末端必须非空（RequiredFieldStage）。
/// USD 派生字段不参与映射输入,但保留声明以统一 attrs 初始化。
pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec { name: "date", ty: FieldType::Date, required: true },
    FieldSpec { name: "book_no", ty: FieldType::Int, required: true },
    FieldSpec { name: "order_no", ty: FieldType::Int, required: true },
    FieldSpec { name: "tax_invoice", ty: FieldType::Text, required: false },
    FieldSpec { name: "supplier", ty: FieldType::Text, required: true },
    FieldSpec { name: "number", ty: FieldType::Int, required: true },
    FieldSpec { name: "stone", ty: FieldType::Text, required: true },
    FieldSpec { name: "heating", ty: FieldType::Text, required: false },
    FieldSpec { name: "color", ty: FieldType::Text, required: false },
    FieldSpec { name: "shape", ty: FieldType::Text, required: false },
    FieldSpec { name: "cutting", ty: FieldType::Text, required: false },
    FieldSpec { name: "size", ty: FieldType::Text, required: false },
    FieldSpec { name: "carats", ty: FieldType::Decimal(3), required: true },
    FieldSpec { name: "weight_per_piece", ty: FieldType::Decimal(3), required: false },
    FieldSpec { name: "currency", ty: FieldType::Text, required: true },
    FieldSpec { name: "price_cur_per_unit", ty: FieldType::Decimal(2), required: true },
    FieldSpec { name: "unit", ty: FieldType::Text, required: true },
    FieldSpec { name: "total_cur", ty: FieldType::Decimal(2), required: false },
    FieldSpec { name: "price_usd_per_ct", ty: FieldType::Decimal(2), required: false },
    FieldSpec { name: "price_usd_per_piece", ty: FieldType::Decimal(2), required: false },
    FieldSpec { name: "total_usd", ty: FieldType::Decimal(2), required: false },
    FieldSpec { name: "remarks", ty: FieldType::Text, required: false },
    FieldSpec { name: "credit_term", ty: FieldType::Text, required: false },
];

/// 按名查找字段声明
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELD_SPECS.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn sample_order() -> SupplierOrder {
        SupplierOrder {
            id: None,
            source_file: "f.xlsx".to_string(),
            sheet_name: "S1".to_string(),
            row_index: 3,
            date: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
            book_no: 1,
            order_no: 100,
            tax_invoice: None,
            supplier: "TestSup".to_string(),
            number: 2,
            stone: "Ruby".to_string(),
            heating: None,
            color: Some("Red".to_string()),
            shape: Some("OVAL".to_string()),
            cutting: None,
            size: None,
            carats: dec("1.500"),
            weight_per_piece: Some(dec("0.750")),
            currency: Currency::THB,
            price_cur_per_unit: dec("40.00"),
            unit: Unit::Carat,
            total_cur: Some(dec("60.00")),
            price_usd_per_ct: Some(dec("1.00")),
            price_usd_per_piece: None,
            total_usd: None,
            remarks: None,
            credit_term: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_lot_key_ignores_pricing_source_fields() {
        let a = sample_order();
        let mut b = sample_order();
        b.book_no = 99;
        b.total_cur = None;
        // 去重键不含 book_no / total_cur
        assert_eq!(a.lot_key(), b.lot_key());
    }

    #[test]
    fn test_lot_key_distinguishes_usd_price() {
        let a = sample_order();
        let mut b = sample_order();
        b.price_usd_per_ct = Some(dec("2.00"));
        assert_ne!(a.lot_key(), b.lot_key());
    }

    #[test]
    fn test_field_specs_required_set() {
        let required: Vec<&str> = FIELD_SPECS
            .iter()
            .filter(|s| s.required)
            .map(|s| s.name)
            .collect();
        assert_eq!(
            required,
            vec![
                "date",
                "book_no",
                "order_no",
                "supplier",
                "number",
                "stone",
                "carats",
                "currency",
                "price_cur_per_unit",
                "unit",
            ]
        );
    }

    #[test]
    fn test_cell_value_blank() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text("   ".to_string()).is_blank());
        assert!(!CellValue::Text("x".to_string()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }
}
