// 选中状态 - 详情视图当前打开的条目
//
// 纯状态容器，不依赖任何界面框架

use anyhow::{anyhow, Result};

use crate::models::Entry;

/// 最多一个条目处于选中状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    current: Option<Entry>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 选中条目（不检查是否属于集合，由调用方负责）
    pub fn select(&mut self, entry: Entry) {
        self.current = Some(entry);
    }

    /// 按ID在集合中查找并选中，找不到时报错且保持原状态
    pub fn select_by_id(&mut self, collection: &[Entry], id: &str) -> Result<&Entry> {
        let entry = collection
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("图鉴中没有条目: {}", id))?;
        Ok(&*self.current.insert(entry))
    }

    /// 关闭详情
    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Entry> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// 选中的条目不在集合中时清除选中，返回是否发生了清除
    pub fn reconcile(&mut self, collection: &[Entry]) -> bool {
        let stale = self
            .current
            .as_ref()
            .is_some_and(|selected| !collection.iter().any(|entry| entry.id == selected.id));
        if stale {
            self.current = None;
        }
        stale
    }
}
