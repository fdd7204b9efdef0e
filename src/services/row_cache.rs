//! 行缓存 - 业务能力层
//!
//! 可恢复、幂等批处理的备忘录：按 (档案, 行) 记住每行的处理状态。
//! 缓存只是优化，不是事实来源 —— 没有它，每次回读表格也能得到同样结果，只是慢。

use crate::config::Profile;
use crate::error::CacheError;
use crate::models::{CacheEntry, CacheUpdate};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

/// 持久化形态：档案键 → 行号 → 条目
pub type CacheMap = HashMap<String, BTreeMap<u32, CacheEntry>>;

/// 缓存后端
///
/// 加载永不失败（缺失/损坏按空缓存处理），只有持久化失败会上报
pub trait CacheStore: Send + Sync {
    fn load(&self) -> CacheMap;
    fn persist(&self, map: &CacheMap) -> Result<(), CacheError>;
}

/// JSON 文件后端
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CacheStore for FileStore {
    fn load(&self) -> CacheMap {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => {
                debug!("缓存文件不存在，按空缓存处理: {}", self.path.display());
                return CacheMap::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    "⚠️ 缓存文件损坏，按空缓存处理 ({}): {}",
                    self.path.display(),
                    e
                );
                CacheMap::default()
            }
        }
    }

    fn persist(&self, map: &CacheMap) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| CacheError::SerializeFailed { source: e })?;
        std::fs::write(&self.path, json).map_err(|e| CacheError::PersistFailed {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}

/// 内存后端（测试 / 演练用）
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<CacheMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CacheMap {
        self.inner.lock().unwrap().clone()
    }
}

impl CacheStore for MemoryStore {
    fn load(&self) -> CacheMap {
        self.inner.lock().unwrap().clone()
    }

    fn persist(&self, map: &CacheMap) -> Result<(), CacheError> {
        *self.inner.lock().unwrap() = map.clone();
        Ok(())
    }
}

/// 行缓存
///
/// 显式的 open → 每次变更即 flush → 用毕即弃 的生命周期，
/// 不存在任何模块级可变状态
pub struct RowCache {
    profile_key: &'static str,
    enabled: bool,
    store: Box<dyn CacheStore>,
    map: CacheMap,
}

impl RowCache {
    /// 打开缓存：从后端加载一次，之后全部走内存 + 同步持久化
    pub fn open(profile: Profile, store: Box<dyn CacheStore>, enabled: bool) -> Self {
        let map = if enabled { store.load() } else { CacheMap::default() };
        Self {
            profile_key: profile.key(),
            enabled,
            store,
            map,
        }
    }

    /// 查询当前档案下某行的条目
    ///
    /// 缓存禁用时恒为 None —— 调用方自然退回到回读表格的慢路径
    pub fn get(&self, row: u32) -> Option<&CacheEntry> {
        if !self.enabled {
            return None;
        }
        self.map.get(self.profile_key)?.get(&row)
    }

    /// 合并写入并立即持久化
    ///
    /// 条目只增不删：崩溃发生在"决定做"与"做"之间也安全，
    /// 因为缓存里只有已经观察到的事实
    pub fn set(&mut self, row: u32, update: CacheUpdate) -> Result<(), CacheError> {
        if !self.enabled {
            return Ok(());
        }
        self.map
            .entry(self.profile_key.to_string())
            .or_default()
            .entry(row)
            .or_default()
            .merge(update);
        self.store.persist(&self.map)
    }

    /// 清空当前档案的全部条目（破坏性重跑用）
    pub fn reset(&mut self) -> Result<(), CacheError> {
        self.map.remove(self.profile_key);
        self.store.persist(&self.map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Completed;

    #[test]
    fn set_then_get_merges_prior_updates() {
        let mut cache = RowCache::open(Profile::Main, Box::new(MemoryStore::new()), true);

        cache
            .set(5, CacheUpdate::default().sent(true).name("Caden Lepple"))
            .unwrap();
        cache
            .set(5, CacheUpdate::default().completed(Completed::Yes))
            .unwrap();

        let entry = cache.get(5).unwrap();
        assert_eq!(entry.sent, Some(true));
        assert_eq!(entry.name.as_deref(), Some("Caden Lepple"));
        assert_eq!(entry.completed, Some(Completed::Yes));
    }

    #[test]
    fn later_write_wins_per_field() {
        let mut cache = RowCache::open(Profile::Main, Box::new(MemoryStore::new()), true);

        cache
            .set(2, CacheUpdate::default().completed(Completed::No))
            .unwrap();
        cache
            .set(2, CacheUpdate::default().completed(Completed::Yes))
            .unwrap();

        assert_eq!(cache.get(2).unwrap().completed, Some(Completed::Yes));
    }

    #[test]
    fn profiles_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        {
            let mut cache =
                RowCache::open(Profile::Main, Box::new(FileStore::new(&path)), true);
            cache.set(3, CacheUpdate::default().sent(true)).unwrap();
        }

        // 同一个缓存文件，换档案后互不可见
        let other = RowCache::open(Profile::Backfill, Box::new(FileStore::new(&path)), true);
        assert!(other.get(3).is_none());

        let main = RowCache::open(Profile::Main, Box::new(FileStore::new(&path)), true);
        assert_eq!(main.get(3).unwrap().sent, Some(true));
    }

    #[test]
    fn disabled_cache_reads_nothing_and_persists_nothing() {
        let mut cache = RowCache::open(Profile::Main, Box::new(MemoryStore::new()), false);
        cache.set(1, CacheUpdate::default().sent(true)).unwrap();
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn reset_clears_only_active_profile() {
        let mut cache = RowCache::open(Profile::Main, Box::new(MemoryStore::new()), true);
        cache.set(1, CacheUpdate::default().sent(true)).unwrap();
        cache
            .map
            .entry("backfill".to_string())
            .or_default()
            .insert(9, CacheEntry::default());

        cache.reset().unwrap();
        assert!(cache.get(1).is_none());
        assert!(cache.map.contains_key("backfill"));
    }

    #[test]
    fn file_store_round_trip_and_corruption_tolerance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        {
            let store = FileStore::new(&path);
            let mut cache = RowCache::open(Profile::Main, Box::new(store), true);
            cache
                .set(7, CacheUpdate::default().sent(true).empty(false))
                .unwrap();
        }

        // 重新打开：每次 set 都已同步落盘
        {
            let store = FileStore::new(&path);
            let cache = RowCache::open(Profile::Main, Box::new(store), true);
            assert_eq!(cache.get(7).unwrap().sent, Some(true));
        }

        // 写坏文件：按空缓存处理，不报错
        std::fs::write(&path, "{ not json").unwrap();
        let store = FileStore::new(&path);
        let cache = RowCache::open(Profile::Main, Box::new(store), true);
        assert!(cache.get(7).is_none());
    }
}
