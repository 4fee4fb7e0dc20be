// ==========================================
// 宝石采购订单导入系统 - 转换管道编排
// ==========================================
// 职责:
// - 按固定阶段序逐行转换: 映射 → 类型 → 分类 → 必填 → 价格 → 去重
// - 行级失败只记账不中断,落库失败中断整个运行
// - 错误按截断文本聚类,每类保留首个样本
// ==========================================

use crate::config::TransformOptions;
use crate::domain::order::{RawOrderRow, SupplierOrder};
use crate::repository::error::RepositoryError;
use crate::repository::order_repo::{OrderStore, RawRowStore};
use crate::transform::classifier::RowClassifierStage;
use crate::transform::context::TransformContext;
use crate::transform::dedup::DedupGuard;
use crate::transform::error::{RunError, TransformError};
use crate::transform::field_mapper::FieldMappingStage;
use crate::transform::pricing::PriceNormalizer;
use crate::transform::type_coercion::TypeParsingStage;
use crate::transform::validator::RequiredFieldStage;
use crate::transform::TransformStage;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 单个错误类的计数与首样本
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSample {
    pub count: usize,
    /// "{工作表} - {行号} : {错误文本}"
    pub sample: String,
}

/// 一次运行的结果报告
#[derive(Debug, Clone)]
pub struct TransformStats {
    pub run_id: String,
    pub total_rows: usize,
    /// 通过全部阶段的订单数
    pub records_created: usize,
    /// 数据质量失败行数
    pub rows_failed: usize,
    /// 分类丢弃行数(空行/取消/非采购)
    pub rows_skipped: usize,
    /// 实际入库行数,dry_run 时恒为 0
    pub rows_committed: usize,
    pub errors: BTreeMap<String, ErrorSample>,
}

impl TransformStats {
    fn new(run_id: String) -> Self {
        TransformStats {
            run_id,
            total_rows: 0,
            records_created: 0,
            rows_failed: 0,
            rows_skipped: 0,
            rows_committed: 0,
            errors: BTreeMap::new(),
        }
    }

    fn record_error(&mut self, key: String, locator: &str, err: &TransformError) {
        let entry = self.errors.entry(key).or_insert_with(|| ErrorSample {
            count: 0,
            sample: format!("{} : {}", locator, err),
        });
        entry.count += 1;
    }
}

/// 转换管道编排器
pub struct OrderTransformer {
    store: Arc<dyn OrderStore>,
    normalizer: PriceNormalizer,
    options: TransformOptions,
}

impl OrderTransformer {
    pub fn new(
        store: Arc<dyn OrderStore>,
        normalizer: PriceNormalizer,
        options: TransformOptions,
    ) -> Self {
        OrderTransformer {
            store,
            normalizer,
            options,
        }
    }

    /// 逐行跑完全部阶段
    async fn process_row(
        &self,
        row: RawOrderRow,
        dedup: &mut DedupGuard,
    ) -> Result<SupplierOrder, TransformError> {
        let mut ctx = TransformContext::new(row);
        FieldMappingStage.apply(&mut ctx)?;
        // 映射后全空的行直接丢弃,后续阶段不再消耗
        if ctx.all_attrs_null() {
            return Err(TransformError::EmptyRow);
        }
        TypeParsingStage.apply(&mut ctx)?;
        RowClassifierStage.apply(&mut ctx)?;
        RequiredFieldStage.apply(&mut ctx)?;
        self.normalizer.apply(&mut ctx).await?;
        let order = ctx.instantiate_order()?;
        dedup.check_and_register(&order).await?;
        Ok(order)
    }

    /// 留痕回写在本方法内定稿: 行只有随批次落库成功才标记 created
    async fn flush(
        &self,
        buffer: &mut Vec<SupplierOrder>,
        stats: &mut TransformStats,
        raw_store: Option<&dyn RawRowStore>,
    ) -> Result<(), RunError> {
        if buffer.is_empty() {
            return Ok(());
        }
        if self.options.dry_run {
            // dry_run 不触碰留痕,原始行保持 pending
            buffer.clear();
            return Ok(());
        }
        match self.store.bulk_insert(buffer, self.options.batch_size).await {
            Ok(inserted) => {
                stats.rows_committed += inserted;
                if let Some(store) = raw_store {
                    for order in buffer.iter() {
                        store
                            .mark_outcome(
                                &order.source_file,
                                &order.sheet_name,
                                order.row_index,
                                "created",
                                None,
                            )
                            .await
                            .map_err(|source| RunError::Input { source })?;
                    }
                }
                buffer.clear();
                Ok(())
            }
            // 并发写入方绕过守卫造成的唯一键冲突: 只废弃本批,运行继续
            Err(RepositoryError::UniqueConstraintViolation(msg)) => {
                let err =
                    TransformError::Unexpected(format!("unique index rejected batch: {}", msg));
                let key = err.class_key(self.options.error_key_len);
                warn!(batch_rows = buffer.len(), error = %err, "批量落库遇唯一键冲突,废弃本批");
                for order in buffer.iter() {
                    let locator = format!("{} - {}", order.sheet_name, order.row_index);
                    stats.record_error(key.clone(), &locator, &err);
                    if let Some(store) = raw_store {
                        store
                            .mark_outcome(
                                &order.source_file,
                                &order.sheet_name,
                                order.row_index,
                                "failed",
                                Some(&err.to_string()),
                            )
                            .await
                            .map_err(|source| RunError::Input { source })?;
                    }
                }
                stats.records_created -= buffer.len();
                stats.rows_failed += buffer.len();
                buffer.clear();
                Ok(())
            }
            // 其余落库失败中断运行,未定稿的原始行保持 pending 可重放
            Err(source) => Err(RunError::BatchCommit {
                rows_committed: stats.rows_committed,
                source,
            }),
        }
    }

    /// 跑一次完整转换
    #[tracing::instrument(skip_all)]
    pub async fn run(
        &self,
        rows: impl IntoIterator<Item = RawOrderRow>,
    ) -> Result<TransformStats, RunError> {
        self.run_inner(rows, None).await
    }

    /// 带留痕的转换: 原始行先入 supplier_order_raw,处理结果逐行回写
    #[tracing::instrument(skip_all)]
    pub async fn run_with_audit(
        &self,
        rows: Vec<RawOrderRow>,
        raw_store: &dyn RawRowStore,
    ) -> Result<TransformStats, RunError> {
        raw_store
            .insert_raw_rows(&rows)
            .await
            .map_err(|source| RunError::Input { source })?;
        self.run_inner(rows, Some(raw_store)).await
    }

    async fn run_inner(
        &self,
        rows: impl IntoIterator<Item = RawOrderRow>,
        raw_store: Option<&dyn RawRowStore>,
    ) -> Result<TransformStats, RunError> {
        let run_id = Uuid::new_v4().to_string();
        let mut stats = TransformStats::new(run_id);
        let mut dedup = DedupGuard::new(self.store.clone());
        let mut buffer: Vec<SupplierOrder> = Vec::new();

        info!(
            run_id = %stats.run_id,
            dry_run = self.options.dry_run,
            batch_size = self.options.batch_size,
            "开始订单转换"
        );

        for row in rows {
            stats.total_rows += 1;
            let locator = row.locator();
            let source_file = row.source_file.clone();
            let sheet_name = row.sheet_name.clone();
            let row_index = row.row_index;

            match self.process_row(row, &mut dedup).await {
                Ok(order) => {
                    stats.records_created += 1;
                    // 留痕回写延后到批次落库成功,见 flush
                    buffer.push(order);
                }
                Err(err) => {
                    let key = err.class_key(self.options.error_key_len);
                    stats.record_error(key, &locator, &err);
                    let outcome = if err.is_classifier_skip() {
                        stats.rows_skipped += 1;
                        "skipped"
                    } else {
                        warn!(locator = %locator, error = %err, "行转换失败");
                        stats.rows_failed += 1;
                        "failed"
                    };
                    if let Some(store) = raw_store {
                        store
                            .mark_outcome(
                                &source_file,
                                &sheet_name,
                                row_index,
                                outcome,
                                Some(&err.to_string()),
                            )
                            .await
                            .map_err(|source| RunError::Input { source })?;
                    }
                }
            }

            if buffer.len() >= self.options.batch_size {
                self.flush(&mut buffer, &mut stats, raw_store).await?;
            }
        }
        self.flush(&mut buffer, &mut stats, raw_store).await?;

        info!(
            run_id = %stats.run_id,
            total_rows = stats.total_rows,
            records_created = stats.records_created,
            rows_failed = stats.rows_failed,
            rows_skipped = stats.rows_skipped,
            rows_committed = stats.rows_committed,
            "订单转换完成"
        );
        Ok(stats)
    }
}
