// ==========================================
// 宝石采购订单导入系统 - 货币别名表
// ==========================================
// 职责: 供应商报表手写货币标注 → 规范货币代码
// 说明: 进程启动即固定的不可变静态表
// ==========================================

use crate::domain::types::Currency;

/// 规范货币 → 可接受别名（别名比较前先 trim + 大写）
pub const CURRENCY_ALIASES: &[(Currency, &[&str])] = &[
    (Currency::USD, &["US", "$", "US$"]),
    (Currency::THB, &["TH", "฿", "THBAHT"]),
    (Currency::EUR, &["EU", "€", "EURO"]),
    (Currency::GBP, &["UK", "£"]),
    (Currency::JPY, &["JP", "¥", "YEN"]),
];

/// 货币标注规范化
///
/// 接受规范代码本身（"USD"）或任一别名（"us$"、"฿"…），
/// 空白或无法识别返回 None。
pub fn normalize_currency(raw: &str) -> Option<Currency> {
    let txt = raw.trim().to_uppercase();
    if txt.is_empty() {
        return None;
    }
    if let Some(c) = Currency::from_code(&txt) {
        return Some(c);
    }
    for (canon, aliases) in CURRENCY_ALIASES {
        if aliases.iter().any(|a| a.to_uppercase() == txt) {
            return Some(*canon);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_codes_pass_through() {
        assert_eq!(normalize_currency("USD"), Some(Currency::USD));
        assert_eq!(normalize_currency("thb"), Some(Currency::THB));
    }

    #[test]
    fn test_aliases() {
        assert_eq!(normalize_currency("US"), Some(Currency::USD));
        assert_eq!(normalize_currency("$"), Some(Currency::USD));
        assert_eq!(normalize_currency(" us$ "), Some(Currency::USD));
        assert_eq!(normalize_currency("฿"), Some(Currency::THB));
        assert_eq!(normalize_currency("euro"), Some(Currency::EUR));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(normalize_currency(""), None);
        assert_eq!(normalize_currency("BAHTBUCKS"), None);
    }
}
