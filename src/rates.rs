// ==========================================
// 宝石采购订单导入系统 - 汇率查询与换算
// ==========================================
// 口径: price 为 1 美元兑换的本币数量（USD/本币当日牌价）
//       美元金额 = 本币金额 × inverse_price,中间值保留 4 位小数
// ==========================================

use crate::db::{init_schema, open_in_memory_connection, open_sqlite_connection};
use crate::domain::types::Currency;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// 汇率查询失败
#[derive(Error, Debug)]
pub enum RateError {
    #[error("No exchange rate available for {date} for {currency}")]
    NotFound { date: NaiveDate, currency: Currency },

    #[error("汇率仓储错误: {0}")]
    Storage(#[from] RepositoryError),
}

/// 单日汇率记录
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRate {
    pub currency: Currency,
    pub date: NaiveDate,
    /// 1 美元兑换的本币数量
    pub price: Decimal,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
}

impl ExchangeRate {
    /// 1 本币兑换的美元数量,保留 4 位小数
    pub fn inverse_price(&self) -> Decimal {
        (Decimal::ONE / self.price)
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
    }

    /// 本币金额换算为美元,保留 4 位小数
    pub fn convert_to_usd(&self, amount: Decimal) -> Decimal {
        (amount * self.inverse_price())
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
    }
}

// ==========================================
// RateLookup Trait
// ==========================================
// 用途: 价格归一与回填服务按交易日查汇率
#[async_trait]
pub trait RateLookup: Send + Sync {
    async fn rate(&self, date: NaiveDate, currency: Currency) -> Result<ExchangeRate, RateError>;
}

/// SQLite 汇率仓储
pub struct SqliteRateStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRateStore {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

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

    /// 写入单日牌价,同 (currency, date) 覆盖
    pub fn insert_rate(&self, rate: &ExchangeRate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO exchange_rate (currency, date, price, open, high, low)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(currency, date) DO UPDATE SET
                price = excluded.price,
                open = excluded.open,
                high = excluded.high,
                low = excluded.low
            "#,
            params![
                rate.currency.as_str(),
                rate.date.format("%Y-%m-%d").to_string(),
                rate.price.normalize().to_string(),
                rate.open.map(|d| d.normalize().to_string()),
                rate.high.map(|d| d.normalize().to_string()),
                rate.low.map(|d| d.normalize().to_string()),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl RateLookup for SqliteRateStore {
    async fn rate(&self, date: NaiveDate, currency: Currency) -> Result<ExchangeRate, RateError> {
        let conn = self.get_conn()?;
        let found: Option<(String, Option<String>, Option<String>, Option<String>)> = conn
            .query_row(
                r#"
                SELECT price, open, high, low FROM exchange_rate
                WHERE currency = ?1 AND date = ?2
                "#,
                params![currency.as_str(), date.format("%Y-%m-%d").to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()
            .map_err(RepositoryError::from)?;

        let (price_raw, open_raw, high_raw, low_raw) = match found {
            Some(v) => v,
            None => return Err(RateError::NotFound { date, currency }),
        };

        let parse = |field: &str, raw: &str| -> Result<Decimal, RateError> {
            raw.parse().map_err(|e: rust_decimal::Error| {
                RateError::Storage(RepositoryError::FieldValueError {
                    field: field.to_string(),
                    message: e.to_string(),
                })
            })
        };
        let parse_opt = |field: &str, raw: &Option<String>| -> Result<Option<Decimal>, RateError> {
            match raw {
                Some(s) => parse(field, s).map(Some),
                None => Ok(None),
            }
        };

        Ok(ExchangeRate {
            currency,
            date,
            price: parse("price", &price_raw)?,
            open: parse_opt("open", &open_raw)?,
            high: parse_opt("high", &high_raw)?,
            low: parse_opt("low", &low_raw)?,
        })
    }
}
