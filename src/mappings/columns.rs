// ==========================================
// 宝石采购订单导入系统 - 列标签映射表
// ==========================================
// 职责: 规范字段名 → 按优先级排列的可接受列标签别名
// 说明: 各供应商报表表头差异大（含换行表头）,
//       别名顺序即取值优先级,第一个非空命中生效
// ==========================================

use crate::domain::order::{CellValue, RawOrderRow};

/// 全保真原始入库映射（含采购/报价标记与供应商侧 USD 列）
pub const RAW_COLUMN_MAPPING: &[(&str, &[&str])] = &[
    (
        "client_memo",
        &[
            "Client Memo",
            "P/M/B",
            "Purchase (P) Memo (M) Bargain (B)",
            "Purchase(P)\nMemo (M)\nBargain (B)",
        ],
    ),
    ("date", &["Date"]),
    ("book_no", &["Book No.", "Book No"]),
    ("order_no", &["No.", "Order No", "No"]),
    ("tax_invoice", &["TAX INVOICE", "Tax Invoice"]),
    ("supplier", &["CLIENT", "Client", "Supplier"]),
    ("number", &["PC", "Pieces", "Qty"]),
    ("stone", &["Stone", "  Stone"]),
    ("heating", &["H/NH", "Heat/No Heat"]),
    ("color", &["Color", "Colour"]),
    ("shape", &["Shape"]),
    ("cutting", &["Cutting", "Cut"]),
    ("size", &["Size", "Dimensions"]),
    ("carats", &["Carats", "Cts", "Weight (ct)"]),
    ("currency", &["US/THB", "Currency", "Currency (US/THB)"]),
    ("price_cur_per_unit", &["price", "Price", "Price per Unit"]),
    ("unit", &["PER", "Unit"]),
    ("total_cur", &["Total", "Total THB", "THB Total"]),
    ("weight_per_piece", &["Weight per piece", "Weight/pc", "Weight/Piece"]),
    ("price_usd_per_ct", &["price $/ct ", "Price $/ct", "Price per ct $"]),
    ("price_usd_per_piece", &["price/$ per piece", "Price/$ per Piece"]),
    ("total_usd", &["Total $", "USD Total"]),
    ("remarks", &["Remarks", "Notes"]),
    ("credit_term", &["CREDIT TERM", "Credit Term"]),
];

/// 采购订单转换映射（管道输入字段,USD 列由管道自行派生,不从报表取）
pub const ORDER_COLUMN_MAPPING: &[(&str, &[&str])] = &[
    ("date", &["Date"]),
    ("book_no", &["Book No.", "Book No"]),
    ("order_no", &["No.", "Order No", "No"]),
    ("tax_invoice", &["TAX INVOICE", "Tax Invoice"]),
    ("supplier", &["CLIENT", "Client", "Supplier"]),
    ("number", &["PC", "Pieces", "Qty"]),
    ("stone", &["Stone", "  Stone"]),
    ("heating", &["H/NH", "Heat/No Heat"]),
    ("color", &["Color", "Colour"]),
    ("shape", &["Shape"]),
    ("cutting", &["Cutting", "Cut"]),
    ("size", &["Size", "Dimensions"]),
    ("carats", &["Carats", "Cts", "Weight (ct)"]),
    ("currency", &["US/THB", "Currency", "Currency (US/THB)"]),
    ("price_cur_per_unit", &["price", "Price", "Price per Unit"]),
    ("unit", &["PER", "Unit"]),
    ("total_cur", &["Total", "Total THB", "THB Total"]),
    ("weight_per_piece", &["Weight per piece", "Weight/pc", "Weight/Piece"]),
    ("remarks", &["Remarks", "Notes"]),
    ("credit_term", &["CREDIT TERM", "Credit Term"]),
];

/// 按映射表在原始行中取第一个非空值
///
/// 别名按声明顺序尝试,全部缺失或空白返回 None。
pub fn get_value_mapped<'a>(
    row: &'a RawOrderRow,
    field: &str,
    mapping: &[(&str, &[&str])],
) -> Option<&'a CellValue> {
    let aliases = mapping
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, a)| *a)?;
    for alias in aliases {
        if let Some(val) = row.data.get(*alias) {
            if !val.is_blank() {
                return Some(val);
            }
        }
    }
    None
}
