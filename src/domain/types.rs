// ==========================================
// 宝石采购订单导入系统 - 基础枚举类型
// ==========================================
// 职责: 货币/计价单位的规范词汇表
// 红线: 管道内部只流转规范值,别名解析在 mappings 层完成
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Currency - 规范货币代码
// ==========================================
// 用途: 汇率查询键 + 订单源货币字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    USD,
    THB,
    EUR,
    GBP,
    JPY,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::THB => "THB",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
        }
    }

    /// 从规范代码还原（不做别名解析，别名见 mappings::currency）
    pub fn from_code(code: &str) -> Option<Currency> {
        match code {
            "USD" => Some(Currency::USD),
            "THB" => Some(Currency::THB),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "JPY" => Some(Currency::JPY),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// Unit - 规范计价单位
// ==========================================
// 口径: 源价格按何种单位报价（每克拉/每件/每克/每千克/整批）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// 每克拉
    Carat,
    /// 每克（1 克拉 = 0.2 克）
    Gram,
    /// 每千克
    Kilogram,
    /// 每件
    Piece,
    /// 整批总价
    LotTotal,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Carat => "CT",
            Unit::Gram => "G",
            Unit::Kilogram => "KG",
            Unit::Piece => "PC",
            Unit::LotTotal => "TOTAL",
        }
    }

    pub fn from_code(code: &str) -> Option<Unit> {
        match code {
            "CT" => Some(Unit::Carat),
            "G" => Some(Unit::Gram),
            "KG" => Some(Unit::Kilogram),
            "PC" => Some(Unit::Piece),
            "TOTAL" => Some(Unit::LotTotal),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
