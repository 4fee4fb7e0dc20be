// ==========================================
// 端到端集成测试 - 美元价回填服务
// ==========================================
// 测试目标: 历史缺价订单的回填、幂等与逐条隔离
// ==========================================

use chrono::{NaiveDate, Utc};
use gem_order_import::domain::SupplierOrder;
use gem_order_import::logging;
use gem_order_import::rates::{ExchangeRate, RateLookup, SqliteRateStore};
use gem_order_import::repository::{OrderStore, SqliteOrderStore};
use gem_order_import::transform::PriceBackfill;
use gem_order_import::{Currency, Unit};
use rust_decimal::Decimal;
use std::sync::Arc;

// ==========================================
// 测试辅助函数
// ==========================================

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// 缺美元价的泰铢订单
fn thb_order(number: i64, date: NaiveDate) -> SupplierOrder {
    SupplierOrder {
        id: None,
        source_file: "po.xlsx".to_string(),
        sheet_name: "May".to_string(),
        row_index: number,
        date,
        book_no: 12,
        order_no: 340,
        tax_invoice: None,
        supplier: "Siam Gems".to_string(),
        number,
        stone: "Ruby".to_string(),
        heating: None,
        color: None,
        shape: None,
        cutting: None,
        size: None,
        carats: dec("10"),
        weight_per_piece: None,
        currency: Currency::THB,
        price_cur_per_unit: dec("40"),
        unit: Unit::Carat,
        total_cur: Some(dec("400")),
        price_usd_per_ct: None,
        price_usd_per_piece: None,
        total_usd: None,
        remarks: None,
        credit_term: None,
        created_at: Utc::now(),
    }
}

fn setup() -> (Arc<SqliteOrderStore>, Arc<SqliteRateStore>) {
    logging::init_test();
    (
        Arc::new(SqliteOrderStore::in_memory().unwrap()),
        Arc::new(SqliteRateStore::in_memory().unwrap()),
    )
}

fn insert_thb_rate(rates: &SqliteRateStore, date: NaiveDate, price: &str) {
    rates
        .insert_rate(&ExchangeRate {
            currency: Currency::THB,
            date,
            price: dec(price),
            open: None,
            high: None,
            low: None,
        })
        .unwrap();
}

// ==========================================
// 测试用例 1: 有牌价即回填,再跑为空(幂等)
// ==========================================

#[tokio::test]
async fn test_backfill_fills_and_is_idempotent() {
    let (store, rates) = setup();
    let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    insert_thb_rate(&rates, date, "40");
    store.bulk_insert(&[thb_order(1, date)], 10).await.unwrap();

    let backfill = PriceBackfill::new(store.clone(), rates);
    let report = backfill.run(false).await.unwrap();
    assert_eq!(report.to_update, 1);
    assert_eq!(report.updated, 1);
    assert!(report.errors.is_empty());
    assert!(store.fetch_missing_usd().await.unwrap().is_empty());

    // 再跑一次: 队列已空
    let report2 = backfill.run(false).await.unwrap();
    assert_eq!(report2.to_update, 0);
    assert_eq!(report2.updated, 0);
}

// ==========================================
// 测试用例 2: 缺牌价逐条隔离,不影响其余订单
// ==========================================

#[tokio::test]
async fn test_missing_rate_isolated_per_order() {
    let (store, rates) = setup();
    let rated = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    let unrated = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
    insert_thb_rate(&rates, rated, "40");
    store
        .bulk_insert(&[thb_order(1, rated), thb_order(2, unrated)], 10)
        .await
        .unwrap();

    let backfill = PriceBackfill::new(store.clone(), rates);
    let report = backfill.run(false).await.unwrap();

    assert_eq!(report.to_update, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0]
        .contains("No exchange rate available for 2025-05-02 for THB"));

    // 缺牌价订单仍留在队列
    let pending = store.fetch_missing_usd().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].number, 2);
}

// ==========================================
// 测试用例 3: dry_run 只评估不写库
// ==========================================

#[tokio::test]
async fn test_dry_run_does_not_persist() {
    let (store, rates) = setup();
    let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    insert_thb_rate(&rates, date, "40");
    store.bulk_insert(&[thb_order(1, date)], 10).await.unwrap();

    let backfill = PriceBackfill::new(store.clone(), rates);
    let report = backfill.run(true).await.unwrap();
    assert_eq!(report.to_update, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(store.fetch_missing_usd().await.unwrap().len(), 1);
}

// ==========================================
// 测试用例 4: 回填后的数值口径
// ==========================================

#[tokio::test]
async fn test_backfilled_prices_rounding() {
    let (store, rates) = setup();
    let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    // 1 美元 = 36.25 泰铢 → inverse 0.0276
    insert_thb_rate(&rates, date, "36.25");
    let mut order = thb_order(1, date);
    order.weight_per_piece = Some(dec("2"));
    store.bulk_insert(&[order], 10).await.unwrap();

    let backfill = PriceBackfill::new(store.clone(), rates.clone());
    backfill.run(false).await.unwrap();

    // 40 THB/ct × 0.0276 = 1.104 → 1.10 USD/ct
    // 每粒 1.10 × 2 = 2.20,总价 1.10 × 10 = 11.00
    let rate = rates.rate(date, Currency::THB).await.unwrap();
    assert_eq!(rate.inverse_price(), dec("0.0276"));
    assert!(store.fetch_missing_usd().await.unwrap().is_empty());
}

// ==========================================
// 测试用例 5: 任一美元价字段缺失即入队
// ==========================================
// 历史半成品行只填了克拉价,总价未落,仍需补齐

#[tokio::test]
async fn test_partially_filled_order_is_repaired() {
    let (store, rates) = setup();
    let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    insert_thb_rate(&rates, date, "40");
    let mut order = thb_order(1, date);
    order.price_usd_per_ct = Some(dec("1.00"));
    store.bulk_insert(&[order], 10).await.unwrap();

    let backfill = PriceBackfill::new(store.clone(), rates);
    let report = backfill.run(false).await.unwrap();
    assert_eq!(report.to_update, 1);
    assert_eq!(report.updated, 1);
    assert!(store.fetch_missing_usd().await.unwrap().is_empty());
}

// ==========================================
// 测试用例 6: 每粒重未知的订单不因缺每粒价入队
// ==========================================

#[tokio::test]
async fn test_unknown_piece_weight_not_reselected() {
    let (store, rates) = setup();
    let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    let mut order = thb_order(1, date);
    order.price_usd_per_ct = Some(dec("1.00"));
    order.total_usd = Some(dec("10.00"));
    assert!(order.weight_per_piece.is_none());
    store.bulk_insert(&[order], 10).await.unwrap();

    let backfill = PriceBackfill::new(store, rates);
    let report = backfill.run(false).await.unwrap();
    assert_eq!(report.to_update, 0);
    assert_eq!(report.updated, 0);
}
