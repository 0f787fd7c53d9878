// 图鉴统计 - 由集合派生的展示数据

use serde::Serialize;
use std::collections::HashSet;

use crate::models::Entry;

/// 收集总数
pub fn total_count(collection: &[Entry]) -> usize {
    collection.len()
}

/// 不同类型的数量（区分大小写，精确匹配）
pub fn category_count(collection: &[Entry]) -> usize {
    collection
        .iter()
        .map(|entry| entry.kind.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// 网格保持至少 min_slots 个格子，剩余的显示为空位
pub fn empty_slots(collection: &[Entry], min_slots: usize) -> usize {
    min_slots.saturating_sub(collection.len())
}

/// 两位补零（“전체 02”）
pub fn format_count(count: usize) -> String {
    format!("{:02}", count)
}

/// 图鉴统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub total: usize,
    pub categories: usize,
    pub empty_slots: usize,
}

impl CollectionStats {
    pub fn compute(collection: &[Entry], min_slots: usize) -> Self {
        Self {
            total: total_count(collection),
            categories: category_count(collection),
            empty_slots: empty_slots(collection, min_slots),
        }
    }
}
