// ==========================================
// 宝石采购订单导入系统 - 订单 Repository 实现
// ==========================================
// 工具: rusqlite + Arc<Mutex<Connection>>
// 说明: Decimal 列统一写规范化文本（去尾零），保证去重回查按同一口径比对
// ==========================================

use crate::db::{init_schema, open_in_memory_connection, open_sqlite_connection};
use crate::domain::order::{CellValue, LotKey, RawOrderRow, SupplierOrder};
use crate::domain::types::{Currency, Unit};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::order_repo::{OrderStore, RawRowStore};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SqliteOrderStore {
    conn: Arc<Mutex<Connection>>,
}

fn dec_to_sql(value: Decimal) -> String {
    value.normalize().to_string()
}

fn opt_dec_to_sql(value: Option<Decimal>) -> Option<String> {
    value.map(dec_to_sql)
}

fn parse_dec(idx: usize, raw: String) -> SqliteResult<Decimal> {
    raw.parse().map_err(|e: rust_decimal::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_opt_dec(idx: usize, raw: Option<String>) -> SqliteResult<Option<Decimal>> {
    match raw {
        Some(s) => parse_dec(idx, s).map(Some),
        None => Ok(None),
    }
}

fn parse_date(idx: usize, raw: String) -> SqliteResult<NaiveDate> {
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_created_at(idx: usize, raw: String) -> SqliteResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

const ORDER_COLUMNS: &str = r#"
    id, source_file, sheet_name, row_index, date, book_no, order_no,
    tax_invoice, supplier, number, stone, heating, color, shape, cutting,
    size, carats, weight_per_piece, currency, price_cur_per_unit, unit,
    total_cur, price_usd_per_ct, price_usd_per_piece, total_usd,
    remarks, credit_term, created_at
"#;

fn row_to_order(row: &Row) -> SqliteResult<SupplierOrder> {
    let currency_raw: String = row.get(18)?;
    let currency = Currency::from_code(&currency_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            18,
            rusqlite::types::Type::Text,
            format!("unknown currency code '{}'", currency_raw).into(),
        )
    })?;
    let unit_raw: String = row.get(20)?;
    let unit = Unit::from_code(&unit_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            20,
            rusqlite::types::Type::Text,
            format!("unknown unit code '{}'", unit_raw).into(),
        )
    })?;

    Ok(SupplierOrder {
        id: Some(row.get(0)?),
        source_file: row.get(1)?,
        sheet_name: row.get(2)?,
        row_index: row.get(3)?,
        date: parse_date(4, row.get(4)?)?,
        book_no: row.get(5)?,
        order_no: row.get(6)?,
        tax_invoice: row.get(7)?,
        supplier: row.get(8)?,
        number: row.get(9)?,
        stone: row.get(10)?,
        heating: row.get(11)?,
        color: row.get(12)?,
        shape: row.get(13)?,
        cutting: row.get(14)?,
        size: row.get(15)?,
        carats: parse_dec(16, row.get(16)?)?,
        weight_per_piece: parse_opt_dec(17, row.get(17)?)?,
        currency,
        price_cur_per_unit: parse_dec(19, row.get(19)?)?,
        unit,
        total_cur: parse_opt_dec(21, row.get(21)?)?,
        price_usd_per_ct: parse_opt_dec(22, row.get(22)?)?,
        price_usd_per_piece: parse_opt_dec(23, row.get(23)?)?,
        total_usd: parse_opt_dec(24, row.get(24)?)?,
        remarks: row.get(25)?,
        credit_term: row.get(26)?,
        created_at: parse_created_at(27, row.get(27)?)?,
    })
}

impl SqliteOrderStore {
    /// 创建新的 Repository 实例并初始化表结构
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 内存库实例（测试用）
    pub fn in_memory() -> RepositoryResult<Self> {
        let conn = open_in_memory_connection()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中插入一批订单
    fn insert_chunk_tx(
        tx: &rusqlite::Transaction,
        orders: &[SupplierOrder],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO supplier_order (
                source_file, sheet_name, row_index, date, book_no, order_no,
                tax_invoice, supplier, number, stone, heating, color, shape,
                cutting, size, carats, weight_per_piece, currency,
                price_cur_per_unit, unit, total_cur,
                price_usd_per_ct, price_usd_per_piece, total_usd,
                remarks, credit_term, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24,
                ?25, ?26, ?27
            )
            "#,
        )?;
        let mut count = 0usize;
        for order in orders {
            stmt.execute(params![
                order.source_file,
                order.sheet_name,
                order.row_index,
                order.date.format("%Y-%m-%d").to_string(),
                order.book_no,
                order.order_no,
                order.tax_invoice,
                order.supplier,
                order.number,
                order.stone,
                order.heating,
                order.color,
                order.shape,
                order.cutting,
                order.size,
                dec_to_sql(order.carats),
                opt_dec_to_sql(order.weight_per_piece),
                order.currency.as_str(),
                dec_to_sql(order.price_cur_per_unit),
                order.unit.as_str(),
                opt_dec_to_sql(order.total_cur),
                opt_dec_to_sql(order.price_usd_per_ct),
                opt_dec_to_sql(order.price_usd_per_piece),
                opt_dec_to_sql(order.total_usd),
                order.remarks,
                order.credit_term,
                order.created_at.to_rfc3339(),
            ])?;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn bulk_insert(
        &self,
        orders: &[SupplierOrder],
        batch_size: usize,
    ) -> RepositoryResult<usize> {
        if orders.is_empty() {
            return Ok(0);
        }
        let chunk_size = batch_size.max(1);
        let conn = self.get_conn()?;
        let mut total = 0usize;
        for chunk in orders.chunks(chunk_size) {
            let tx = conn.unchecked_transaction()?;
            total += Self::insert_chunk_tx(&tx, chunk)?;
            tx.commit()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        }
        Ok(total)
    }

    async fn exists_lot(&self, key: &LotKey) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        // 可空列用 IS 比对，NULL 与 NULL 视为同键
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM supplier_order
            WHERE supplier = ?1 AND order_no = ?2 AND number = ?3 AND stone = ?4
              AND shape IS ?5 AND color IS ?6 AND size IS ?7
              AND carats = ?8 AND weight_per_piece IS ?9 AND price_usd_per_ct IS ?10
            "#,
            params![
                key.supplier,
                key.order_no,
                key.number,
                key.stone,
                key.shape,
                key.color,
                key.size,
                dec_to_sql(key.carats),
                opt_dec_to_sql(key.weight_per_piece),
                opt_dec_to_sql(key.price_usd_per_ct),
            ],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn fetch_missing_usd(&self) -> RepositoryResult<Vec<SupplierOrder>> {
        let conn = self.get_conn()?;
        // 每粒价仅在已知每粒重时参与缺失判定,否则合法为空
        let sql = format!(
            "SELECT {} FROM supplier_order \
             WHERE price_usd_per_ct IS NULL \
                OR total_usd IS NULL \
                OR (price_usd_per_piece IS NULL AND weight_per_piece IS NOT NULL) \
             ORDER BY date ASC, id ASC",
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], row_to_order)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    async fn update_usd_prices(
        &self,
        id: i64,
        price_usd_per_ct: Decimal,
        price_usd_per_piece: Option<Decimal>,
        total_usd: Decimal,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE supplier_order
            SET price_usd_per_ct = ?2, price_usd_per_piece = ?3, total_usd = ?4
            WHERE id = ?1
            "#,
            params![
                id,
                dec_to_sql(price_usd_per_ct),
                opt_dec_to_sql(price_usd_per_piece),
                dec_to_sql(total_usd),
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "supplier_order".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn count_orders(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM supplier_order", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl RawRowStore for SqliteOrderStore {
    async fn insert_raw_rows(&self, rows: &[RawOrderRow]) -> RepositoryResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut count = 0usize;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO supplier_order_raw (
                    source_file, sheet_name, row_index, data_json
                ) VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for row in rows {
                let data_json = serde_json::to_string(&row.data)
                    .map_err(|e| RepositoryError::FieldValueError {
                        field: "data_json".to_string(),
                        message: e.to_string(),
                    })?;
                count += stmt.execute(params![
                    row.source_file,
                    row.sheet_name,
                    row.row_index,
                    data_json
                ])?;
            }
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    async fn fetch_pending(&self) -> RepositoryResult<Vec<RawOrderRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT source_file, sheet_name, row_index, data_json
            FROM supplier_order_raw
            WHERE outcome = 'pending'
            ORDER BY id ASC
            "#,
        )?;
        let raw_rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut out = Vec::with_capacity(raw_rows.len());
        for (source_file, sheet_name, row_index, data_json) in raw_rows {
            let data: HashMap<String, CellValue> = serde_json::from_str(&data_json)
                .map_err(|e| RepositoryError::FieldValueError {
                    field: "data_json".to_string(),
                    message: e.to_string(),
                })?;
            out.push(RawOrderRow {
                source_file,
                sheet_name,
                row_index,
                data,
            });
        }
        Ok(out)
    }

    async fn mark_outcome(
        &self,
        source_file: &str,
        sheet_name: &str,
        row_index: i64,
        outcome: &str,
        detail: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE supplier_order_raw
            SET outcome = ?4, outcome_detail = ?5
            WHERE source_file = ?1 AND sheet_name = ?2 AND row_index = ?3
            "#,
            params![source_file, sheet_name, row_index, outcome, detail],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "supplier_order_raw".to_string(),
                id: format!("{}/{}/{}", source_file, sheet_name, row_index),
            });
        }
        Ok(())
    }
}
