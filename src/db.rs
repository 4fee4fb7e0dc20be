// ==========================================
// 宝石采购订单导入系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中建表语句，保证测试与生产用同一份 schema
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存库（测试用）
pub fn open_in_memory_connection() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化订单导入相关表结构
///
/// 说明：
/// - Decimal 列以 TEXT 存规范化十进制文本，日期以 ISO-8601 文本存
/// - unique_supplier_lot 是落库去重的最后防线，应用层去重在其之前
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS supplier_order (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          source_file TEXT NOT NULL,
          sheet_name TEXT NOT NULL,
          row_index INTEGER NOT NULL,
          date TEXT NOT NULL,
          book_no INTEGER NOT NULL,
          order_no INTEGER NOT NULL,
          tax_invoice TEXT,
          supplier TEXT NOT NULL,
          number INTEGER NOT NULL,
          stone TEXT NOT NULL,
          heating TEXT,
          color TEXT,
          shape TEXT,
          cutting TEXT,
          size TEXT,
          carats TEXT NOT NULL,
          weight_per_piece TEXT,
          currency TEXT NOT NULL,
          price_cur_per_unit TEXT NOT NULL,
          unit TEXT NOT NULL,
          total_cur TEXT,
          price_usd_per_ct TEXT,
          price_usd_per_piece TEXT,
          total_usd TEXT,
          remarks TEXT,
          credit_term TEXT,
          created_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS unique_supplier_lot
          ON supplier_order(
            supplier, order_no, number, stone,
            shape, color, size,
            carats, weight_per_piece, price_usd_per_ct
          );

        CREATE TABLE IF NOT EXISTS supplier_order_raw (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          source_file TEXT NOT NULL,
          sheet_name TEXT NOT NULL,
          row_index INTEGER NOT NULL,
          data_json TEXT NOT NULL,
          outcome TEXT NOT NULL DEFAULT 'pending',
          outcome_detail TEXT,
          created_at TEXT NOT NULL DEFAULT (datetime('now')),
          UNIQUE (source_file, sheet_name, row_index)
        );

        CREATE TABLE IF NOT EXISTS exchange_rate (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          currency TEXT NOT NULL,
          date TEXT NOT NULL,
          price TEXT NOT NULL,
          open TEXT,
          high TEXT,
          low TEXT,
          UNIQUE (currency, date)
        );

        CREATE INDEX IF NOT EXISTS idx_supplier_order_missing_usd
          ON supplier_order(date)
          WHERE price_usd_per_ct IS NULL
             OR total_usd IS NULL
             OR (price_usd_per_piece IS NULL AND weight_per_piece IS NOT NULL);
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = open_in_memory_connection().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('supplier_order','supplier_order_raw','exchange_rate')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_unique_lot_index_rejects_duplicates() {
        let conn = open_in_memory_connection().unwrap();
        init_schema(&conn).unwrap();
        let insert = r#"
            INSERT INTO supplier_order (
              source_file, sheet_name, row_index, date, book_no, order_no,
              supplier, number, stone, shape, color, size, carats,
              weight_per_piece, currency, price_cur_per_unit, unit,
              price_usd_per_ct, created_at
            ) VALUES (
              'po.xlsx', 'May', 2, '2025-05-01', 12, 340,
              'Siam Gems', 5, 'Ruby', 'Oval', 'Red', '5x7', '10.5',
              '2.1', 'USD', '25', 'CT', '25', '2025-05-02T00:00:00Z'
            )
        "#;
        conn.execute(insert, []).unwrap();
        let err = conn.execute(insert, []).unwrap_err();
        assert!(err.to_string().contains("UNIQUE"));
    }
}
