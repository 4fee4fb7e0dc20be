// ==========================================
// 宝石采购订单导入系统 - 价格归一
// ==========================================
// 职责:
// - 把任意计价单位折算为每克拉本币价,再按交易日汇率折算美元
// - 推导每粒价与批次总价
// - 为历史缺价订单提供独立回填服务
// 口径: 价格统一保留 2 位小数,四舍五入(远离零)
// ==========================================

use crate::domain::order::SupplierOrder;
use crate::domain::types::{Currency, Unit};
use crate::mappings::{normalize_currency, normalize_unit};
use crate::rates::RateLookup;
use crate::repository::order_repo::OrderStore;
use crate::transform::context::{AttrValue, TransformContext};
use crate::transform::error::TransformError;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tracing::{info, warn};

const PRICE_SCALE: u32 = 2;

fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// 任意计价单位折算为每克拉价(同币种)
///
/// 克重单位按 1 克 = 5 克拉换算。
pub fn price_per_carat(
    price_per_unit: Decimal,
    unit: Unit,
    carats: Decimal,
    weight_per_piece: Option<Decimal>,
) -> Result<Decimal, TransformError> {
    let per_ct = match unit {
        Unit::Carat => price_per_unit,
        Unit::Piece => {
            let wpp = weight_per_piece.filter(|w| !w.is_zero());
            match wpp {
                Some(w) => price_per_unit / w,
                None => return Err(TransformError::MissingWeightPerPiece),
            }
        }
        Unit::LotTotal => {
            if carats.is_zero() {
                return Err(TransformError::MissingCarats);
            }
            price_per_unit / carats
        }
        Unit::Gram => price_per_unit * Decimal::new(2, 1),
        Unit::Kilogram => price_per_unit / Decimal::from(1000) * Decimal::new(2, 1),
    };
    Ok(round_price(per_ct))
}

/// 转换阶段的价格归一组件
///
/// 非美元货币按行内交易日查当日牌价,缺牌价判行失败。
pub struct PriceNormalizer {
    rates: Arc<dyn RateLookup>,
}

impl PriceNormalizer {
    pub fn new(rates: Arc<dyn RateLookup>) -> Self {
        PriceNormalizer { rates }
    }

    pub fn name(&self) -> &'static str {
        "price_normalizer"
    }

    async fn to_usd(
        &self,
        amount: Decimal,
        currency: Currency,
        date: NaiveDate,
    ) -> Result<Decimal, TransformError> {
        if currency == Currency::USD {
            return Ok(round_price(amount));
        }
        let rate = self.rates.rate(date, currency).await?;
        Ok(round_price(rate.convert_to_usd(amount)))
    }

    pub async fn apply(&self, ctx: &mut TransformContext) -> Result<(), TransformError> {
        let currency_raw = ctx
            .get("currency")
            .as_text()
            .map(str::to_string)
            .unwrap_or_default();
        let currency = normalize_currency(&currency_raw).ok_or_else(|| {
            TransformError::Unexpected(format!("unknown currency '{}'", currency_raw))
        })?;

        let unit_raw = ctx
            .get("unit")
            .as_text()
            .map(str::to_string)
            .unwrap_or_default();
        let unit =
            normalize_unit(&unit_raw).ok_or_else(|| TransformError::UnknownUnit(unit_raw.clone()))?;

        let price = ctx.get("price_cur_per_unit").as_decimal().ok_or_else(|| {
            TransformError::Unexpected("price_cur_per_unit absent after validation".to_string())
        })?;
        let carats = ctx.get("carats").as_decimal().ok_or_else(|| {
            TransformError::Unexpected("carats absent after validation".to_string())
        })?;
        let date = ctx.get("date").as_date().ok_or_else(|| {
            TransformError::Unexpected("date absent after validation".to_string())
        })?;
        let weight_per_piece = ctx.get("weight_per_piece").as_decimal();

        let per_ct_local = price_per_carat(price, unit, carats, weight_per_piece)?;
        let per_ct_usd = self.to_usd(per_ct_local, currency, date).await?;

        ctx.set("currency", AttrValue::Currency(currency));
        ctx.set("unit", AttrValue::Unit(unit));
        ctx.set("price_usd_per_ct", AttrValue::Decimal(per_ct_usd));
        match weight_per_piece {
            Some(wpp) => {
                ctx.set(
                    "price_usd_per_piece",
                    AttrValue::Decimal(round_price(per_ct_usd * wpp)),
                );
            }
            None => ctx.set("price_usd_per_piece", AttrValue::Null),
        }
        ctx.set("total_usd", AttrValue::Decimal(round_price(per_ct_usd * carats)));
        Ok(())
    }
}

/// 回填结果汇总
#[derive(Debug, Clone, Default)]
pub struct BackfillReport {
    pub to_update: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

/// 历史缺价订单的美元价回填服务
///
/// 逐条隔离: 单条失败只记入 errors,不影响其余订单。
pub struct PriceBackfill {
    store: Arc<dyn OrderStore>,
    rates: Arc<dyn RateLookup>,
}

impl PriceBackfill {
    pub fn new(store: Arc<dyn OrderStore>, rates: Arc<dyn RateLookup>) -> Self {
        PriceBackfill { store, rates }
    }

    fn usd_prices_for(
        order: &SupplierOrder,
        per_ct_usd: Decimal,
    ) -> (Decimal, Option<Decimal>, Decimal) {
        let per_piece = order
            .weight_per_piece
            .map(|wpp| round_price(per_ct_usd * wpp));
        let total = round_price(per_ct_usd * order.carats);
        (per_ct_usd, per_piece, total)
    }

    #[tracing::instrument(skip(self))]
    pub async fn run(&self, dry_run: bool) -> Result<BackfillReport, TransformError> {
        let pending = self
            .store
            .fetch_missing_usd()
            .await
            .map_err(|e| TransformError::Unexpected(e.to_string()))?;

        let mut report = BackfillReport {
            to_update: pending.len(),
            ..Default::default()
        };
        info!(to_update = report.to_update, dry_run, "开始回填缺失美元价");

        for order in &pending {
            match self.backfill_one(order, dry_run).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    warn!(locator = %format!("{} - {}", order.sheet_name, order.row_index), error = %e, "回填失败");
                    report
                        .errors
                        .push(format!("{} - {} : {}", order.sheet_name, order.row_index, e));
                }
            }
        }

        info!(
            updated = report.updated,
            failed = report.errors.len(),
            "回填完成"
        );
        Ok(report)
    }

    async fn backfill_one(&self, order: &SupplierOrder, dry_run: bool) -> Result<(), TransformError> {
        let per_ct_local = price_per_carat(
            order.price_cur_per_unit,
            order.unit,
            order.carats,
            order.weight_per_piece,
        )?;
        let per_ct_usd = if order.currency == Currency::USD {
            round_price(per_ct_local)
        } else {
            let rate = self.rates.rate(order.date, order.currency).await?;
            round_price(rate.convert_to_usd(per_ct_local))
        };
        let (per_ct, per_piece, total) = Self::usd_prices_for(order, per_ct_usd);

        if dry_run {
            return Ok(());
        }
        let id = order
            .id
            .ok_or_else(|| TransformError::Unexpected("order without id in backfill".to_string()))?;
        self.store
            .update_usd_prices(id, per_ct, per_piece, total)
            .await
            .map_err(|e| TransformError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
