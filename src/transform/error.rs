// ==========================================
// 宝石采购订单导入系统 - 转换错误类型
// ==========================================
// 工具: thiserror 派生宏
// 口径: TransformError 是行级数据质量失败,永不中断整个运行;
//       RunError 是基础设施失败,允许中断运行
// ==========================================

use crate::domain::types::Currency;
use crate::repository::error::RepositoryError;
use chrono::NaiveDate;
use thiserror::Error;

/// 行级转换失败
///
/// 错误文本沿用历史报表口径（英文）,stats 以截断文本为错误类键。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    // ===== 分类阶段（丢弃,不算失败）=====
    #[error("Row is empty")]
    EmptyRow,

    #[error("Row canceled in {column} : {token}")]
    Canceled { column: String, token: String },

    #[error("Not a purchase : client memo [{marker}]")]
    NotAPurchase { marker: String },

    // ===== 类型转换 =====
    #[error("Invalid date format '{value}' in {field}")]
    InvalidDate { field: String, value: String },

    // ===== 必填校验 =====
    #[error("Required field missing : {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    // ===== 价格归一 =====
    #[error("Unknown unit: '{0}'")]
    UnknownUnit(String),

    #[error("Price per piece requires weight_per_piece")]
    MissingWeightPerPiece,

    #[error("Lot total price requires non-zero carats")]
    MissingCarats,

    #[error("No exchange rate available for {date} for {currency}")]
    NoExchangeRate { date: NaiveDate, currency: Currency },

    // ===== 去重 =====
    #[error("Duplicate lot within current run")]
    InMemoryDuplicate,

    #[error("Duplicate lot already persisted")]
    PersistedDuplicate,

    // ===== 兜底 =====
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl From<crate::rates::RateError> for TransformError {
    fn from(err: crate::rates::RateError) -> Self {
        match err {
            crate::rates::RateError::NotFound { date, currency } => {
                TransformError::NoExchangeRate { date, currency }
            }
            crate::rates::RateError::Storage(e) => TransformError::Unexpected(e.to_string()),
        }
    }
}

impl TransformError {
    /// 分类阶段丢弃（空行/取消/非采购）,报表里计入 skipped 而非 failed
    pub fn is_classifier_skip(&self) -> bool {
        matches!(
            self,
            TransformError::EmptyRow
                | TransformError::Canceled { .. }
                | TransformError::NotAPurchase { .. }
        )
    }

    /// 错误类键: 按字符截断的错误文本,用于有界错误汇总
    pub fn class_key(&self, max_chars: usize) -> String {
        let text = self.to_string();
        text.chars().take(max_chars).collect()
    }
}

/// 运行级失败（中断整个运行）
#[derive(Error, Debug)]
pub enum RunError {
    /// 批量落库失败: 事务回滚,已入库行数随错误上抛
    #[error("batch commit failed after {rows_committed} committed rows: {source}")]
    BatchCommit {
        rows_committed: usize,
        #[source]
        source: RepositoryError,
    },

    /// 输入序列读取失败
    #[error("failed to read input rows: {source}")]
    Input {
        #[source]
        source: RepositoryError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_key_truncation() {
        let err = TransformError::MissingRequiredFields(vec![
            "carats".to_string(),
            "currency".to_string(),
            "date".to_string(),
        ]);
        let key = err.class_key(40);
        assert_eq!(key.chars().count(), 40);
        assert!(key.starts_with("Required field missing"));
    }

    #[test]
    fn test_class_key_shorter_than_limit() {
        let err = TransformError::EmptyRow;
        assert_eq!(err.class_key(40), "Row is empty");
    }

    #[test]
    fn test_classifier_skip_partition() {
        assert!(TransformError::EmptyRow.is_classifier_skip());
        assert!(TransformError::NotAPurchase {
            marker: "M".to_string()
        }
        .is_classifier_skip());
        assert!(!TransformError::MissingCarats.is_classifier_skip());
        assert!(!TransformError::InMemoryDuplicate.is_classifier_skip());
    }

    #[test]
    fn test_no_exchange_rate_message() {
        let err = TransformError::NoExchangeRate {
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            currency: Currency::THB,
        };
        assert_eq!(
            err.to_string(),
            "No exchange rate available for 2025-05-01 for THB"
        );
    }
}
