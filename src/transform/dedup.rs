// ==========================================
// 宝石采购订单导入系统 - 批次去重守卫
// ==========================================
// 职责: 拦截同一批次键的重复订单
// 口径: 先查本次运行内存集合,再回查库内存量;
//       键在放行前登记,保证同一运行内第二条必被拦截
// ==========================================

use crate::domain::order::{LotKey, SupplierOrder};
use crate::repository::order_repo::OrderStore;
use crate::transform::error::TransformError;
use std::collections::HashSet;
use std::sync::Arc;

pub struct DedupGuard {
    store: Arc<dyn OrderStore>,
    seen: HashSet<LotKey>,
}

impl DedupGuard {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        DedupGuard {
            store,
            seen: HashSet::new(),
        }
    }

    /// 校验并登记批次键
    pub async fn check_and_register(&mut self, order: &SupplierOrder) -> Result<(), TransformError> {
        let key = order.lot_key();
        if self.seen.contains(&key) {
            return Err(TransformError::InMemoryDuplicate);
        }
        let persisted = self
            .store
            .exists_lot(&key)
            .await
            .map_err(|e| TransformError::Unexpected(e.to_string()))?;
        if persisted {
            // 已存在的键也登记,避免后续行再打一次库
            self.seen.insert(key);
            return Err(TransformError::PersistedDuplicate);
        }
        self.seen.insert(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Currency, Unit};
    use crate::repository::order_repo_impl::SqliteOrderStore;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn order(number: i64) -> SupplierOrder {
        SupplierOrder {
            id: None,
            source_file: "po.xlsx".to_string(),
            sheet_name: "May".to_string(),
            row_index: 2,
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
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
            carats: dec("10.5"),
            weight_per_piece: None,
            currency: Currency::USD,
            price_cur_per_unit: dec("25"),
            unit: Unit::Carat,
            total_cur: None,
            price_usd_per_ct: Some(dec("25")),
            price_usd_per_piece: None,
            total_usd: Some(dec("262.50")),
            remarks: None,
            credit_term: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_duplicate() {
        let store = Arc::new(SqliteOrderStore::in_memory().unwrap());
        let mut guard = DedupGuard::new(store);
        guard.check_and_register(&order(1)).await.unwrap();
        let err = guard.check_and_register(&order(1)).await.unwrap_err();
        assert_eq!(err, TransformError::InMemoryDuplicate);
        // 不同键不受影响
        guard.check_and_register(&order(2)).await.unwrap();
    }

    #[tokio::test]
    async fn test_persisted_duplicate() {
        let store = Arc::new(SqliteOrderStore::in_memory().unwrap());
        use crate::repository::order_repo::OrderStore as _;
        store.bulk_insert(&[order(1)], 10).await.unwrap();

        let mut guard = DedupGuard::new(store);
        let err = guard.check_and_register(&order(1)).await.unwrap_err();
        assert_eq!(err, TransformError::PersistedDuplicate);
    }
}
