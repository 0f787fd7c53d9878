// 存储配置定义

use serde::{Deserialize, Serialize};

/// 存储配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 集合文档保存的键名
    #[serde(default = "default_collection_key")]
    pub collection_key: String,
    /// 文档损坏时是否先备份再丢弃
    #[serde(default = "default_backup_corrupt")]
    pub backup_corrupt: bool,
}

fn default_collection_key() -> String {
    "snowmanDex".to_string()
}

fn default_backup_corrupt() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            collection_key: default_collection_key(),
            backup_corrupt: default_backup_corrupt(),
        }
    }
}

impl StorageConfig {
    /// 损坏文档的备份键名
    pub fn backup_key(&self) -> String {
        format!("{}.corrupt", self.collection_key)
    }
}
