// ==========================================
// 宝石采购订单导入系统 - 计价单位别名表
// ==========================================
// 职责: 报表 "PER" 列手写单位 → 规范单位
// 说明: 别名按原样匹配（仅 trim,不折叠大小写）,
//       历史数据中 "p" 与 "P" 都是每件,但未见过的写法应显式失败
// ==========================================

use crate::domain::types::Unit;

/// 规范单位 → 可接受别名
pub const UNIT_ALIASES: &[(Unit, &[&str])] = &[
    (Unit::Carat, &["CT", "Ct", "ct"]),
    (Unit::Gram, &["G", "Gram", "g"]),
    (Unit::Kilogram, &["KG", "kg", "Kg"]),
    (Unit::Piece, &["PC", "Pc", "pc", "p", "P"]),
    (Unit::LotTotal, &["T", "TOTAL", "total", "lot"]),
];

/// 单位标注规范化
///
/// 空白或无法识别返回 None（调用方决定报 UnknownUnit）。
pub fn normalize_unit(raw: &str) -> Option<Unit> {
    let txt = raw.trim();
    if txt.is_empty() {
        return None;
    }
    for (canon, aliases) in UNIT_ALIASES {
        if aliases.contains(&txt) {
            return Some(*canon);
        }
    }
    None
}
