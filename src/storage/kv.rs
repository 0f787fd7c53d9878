// 键值存储抽象 - 应用范围内的持久化边界

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// 键值存储接口 - 所有存储后端必须实现此 trait
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 读取键对应的文档，不存在时返回 None
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 写入整个文档（覆盖）
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// 删除键
    async fn remove(&self, key: &str) -> Result<()>;

    /// 把 from 的原始内容复制到 to，from 不存在时返回 false
    async fn copy(&self, from: &str, to: &str) -> Result<bool> {
        match self.get(from).await? {
            Some(value) => {
                self.set(to, &value).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// 键名只允许作为单个文件名使用
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(anyhow!("无效的存储键名: {}", key))
    }
}

/// 文件存储 - 每个键一个 JSON 文件
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// 创建文件存储（目录不存在时自动创建）
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("创建存储目录失败: {:?}", dir))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            // 非 UTF-8 内容按有损文本返回，交给上层按格式错误处理
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Ok(Some(text)),
                Err(e) => {
                    warn!("{:?} 不是有效的 UTF-8，按有损文本读取", path);
                    Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow!("读取 {:?} 失败: {}", path, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        // 先写临时文件再替换，避免写到一半留下残缺文档
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .with_context(|| format!("写入 {:?} 失败", tmp))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("替换 {:?} 失败", path))?;
        debug!("已写入 {} ({} 字节)", key, value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow!("删除 {:?} 失败: {}", path, e)),
        }
    }

    /// 按字节复制文件，保留无法解码的原始内容
    async fn copy(&self, from: &str, to: &str) -> Result<bool> {
        let source = self.path_for(from)?;
        let target = self.path_for(to)?;
        match tokio::fs::copy(&source, &target).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(anyhow!("复制 {:?} 到 {:?} 失败: {}", source, target, e)),
        }
    }
}

/// 内存存储（测试或临时会话使用）
#[derive(Default)]
pub struct MemoryKvStore {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置文档
    pub fn with_document(key: &str, value: &str) -> Self {
        let mut data = HashMap::new();
        data.insert(key.to_string(), value.to_string());
        Self {
            data: RwLock::new(data),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.data.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let store = FileKvStore::new(temp_dir.path().join("data")).await.unwrap();

        assert!(store.get("snowmanDex").await.unwrap().is_none());

        store.set("snowmanDex", "[]").await.unwrap();
        assert_eq!(store.get("snowmanDex").await.unwrap().as_deref(), Some("[]"));
        assert!(temp_dir.path().join("data/snowmanDex.json").exists());

        store.remove("snowmanDex").await.unwrap();
        assert!(store.get("snowmanDex").await.unwrap().is_none());
        // 重复删除不报错
        store.remove("snowmanDex").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_keys() {
        let temp_dir = tempdir().unwrap();
        let store = FileKvStore::new(temp_dir.path()).await.unwrap();

        assert!(store.set("../escape", "x").await.is_err());
        assert!(store.set("a/b", "x").await.is_err());
        assert!(store.get(".hidden").await.is_err());
        assert!(store.set("snowmanDex.corrupt", "x").await.is_ok());
    }

    #[tokio::test]
    async fn test_file_store_reads_invalid_utf8_lossily() {
        let temp_dir = tempdir().unwrap();
        let store = FileKvStore::new(temp_dir.path()).await.unwrap();
        let raw = [0x5b, 0xff, 0xfe, 0x5d];
        tokio::fs::write(temp_dir.path().join("snowmanDex.json"), raw)
            .await
            .unwrap();

        let text = store.get("snowmanDex").await.unwrap().unwrap();
        assert!(text.starts_with('['));
        assert!(text.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_file_store_copy_keeps_raw_bytes() {
        let temp_dir = tempdir().unwrap();
        let store = FileKvStore::new(temp_dir.path()).await.unwrap();
        let raw = [0x5b, 0xff, 0xfe, 0x5d];
        tokio::fs::write(temp_dir.path().join("snowmanDex.json"), raw)
            .await
            .unwrap();

        assert!(store.copy("snowmanDex", "snowmanDex.corrupt").await.unwrap());
        let copied = tokio::fs::read(temp_dir.path().join("snowmanDex.corrupt.json"))
            .await
            .unwrap();
        assert_eq!(copied, raw);

        assert!(!store.copy("missing", "missing.corrupt").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryKvStore::with_document("k", "v");
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        store.set("k", "w").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("w"));
        store.remove("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_copy() {
        let store = MemoryKvStore::with_document("k", "v");
        assert!(store.copy("k", "k.bak").await.unwrap());
        assert_eq!(store.get("k.bak").await.unwrap().as_deref(), Some("v"));
        assert!(!store.copy("absent", "absent.bak").await.unwrap());
    }
}
