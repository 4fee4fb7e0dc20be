// ==========================================
// 宝石采购订单导入系统 - 运行配置
// ==========================================
// 说明: 字段全部带默认值,可从 JSON 配置反序列化局部覆盖
// ==========================================

use serde::{Deserialize, Serialize};

/// 转换运行选项
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// 只统计不落库
    pub dry_run: bool,
    /// 批量落库的事务大小
    pub batch_size: usize,
    /// 错误类键的截断长度（字符数）
    pub error_key_len: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            dry_run: false,
            batch_size: 1000,
            error_key_len: 40,
        }
    }
}
