use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::classifier::MAX_TEXT_BYTES;
use crate::models::{
    now_secs, EntryPayload, HistoryEntry, Settings, MAX_MAX_ITEMS, MIN_MAX_ITEMS,
};

const STORE_DIR: &str = "clipkeep";
const STORE_FILE: &str = "clipboard_data.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to serialize history data: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to persist history file: {0}")]
    Io(#[from] std::io::Error),
    #[error("no writable data directory available")]
    NoDataDir,
    #[error("text payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("max_items {0} outside allowed range [10, 500]")]
    InvalidMaxItems(usize),
}

/// 持久化文件的完整结构，整体读写、原子替换
#[derive(Debug, Serialize, Deserialize)]
struct StoreData {
    items: Vec<HistoryEntry>,
    next_id: u64,
    settings: Settings,
    #[serde(default)]
    last_updated: u64,
    // 旧文件缺省视为非首次启动
    #[serde(default)]
    is_first_launch: bool,
}

impl StoreData {
    fn fresh() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
            settings: Settings::default(),
            last_updated: now_secs(),
            is_first_launch: true,
        }
    }
}

/// 历史记录存储：去重、淘汰、搜索、收藏都在这里，记录与缩略图归它独占。
/// 所有修改操作成功返回前都已落盘。
pub struct HistoryStore {
    file_path: PathBuf,
    data: StoreData,
}

/// 跨线程共享句柄，修改操作经由锁串行化
pub type SharedStore = Arc<Mutex<HistoryStore>>;

impl HistoryStore {
    /// 数据目录选择顺序：local data -> data -> config -> 当前目录兜底
    pub fn resolve_storage_path() -> Result<PathBuf, StorageError> {
        let candidates = [
            dirs::data_local_dir(),
            dirs::data_dir(),
            dirs::config_dir(),
        ];

        for candidate in candidates.into_iter().flatten() {
            let mut base = candidate.clone();
            base.push(STORE_DIR);
            if fs::create_dir_all(&base).is_ok() {
                base.push(STORE_FILE);
                return Ok(base);
            }
        }

        let mut fallback = std::env::current_dir().map_err(|_| StorageError::NoDataDir)?;
        fallback.push(format!(".{}", STORE_DIR));
        fs::create_dir_all(&fallback).map_err(|_| StorageError::NoDataDir)?;
        fallback.push(STORE_FILE);
        Ok(fallback)
    }

    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::open(Self::resolve_storage_path()?))
    }

    /// 打开指定路径的存储。文件缺失、不可读或损坏都不算致命，
    /// 记一条警告后按空库加默认设置重新初始化。
    pub fn open(file_path: PathBuf) -> Self {
        let data = match fs::read_to_string(&file_path) {
            Ok(content) => match serde_json::from_str::<StoreData>(&content) {
                Ok(data) => data,
                Err(err) => {
                    log::warn!(
                        "history file {} is corrupt, starting empty: {}",
                        file_path.display(),
                        err
                    );
                    StoreData::fresh()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreData::fresh(),
            Err(err) => {
                log::warn!(
                    "history file {} is unreadable, starting empty: {}",
                    file_path.display(),
                    err
                );
                StoreData::fresh()
            }
        };

        Self { file_path, data }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    /// 新增一条内容。与最近一次插入的记录字节一致时不建新记录，
    /// 只刷新其 updated_at 并返回原 id；其余情况分配严格递增的新 id。
    pub fn add(&mut self, payload: EntryPayload) -> Result<u64, StorageError> {
        if let EntryPayload::Text(text) = &payload {
            if text.len() > MAX_TEXT_BYTES {
                return Err(StorageError::PayloadTooLarge(text.len()));
            }
        }

        let now = now_secs();

        // 相邻去重：只和最近插入的一条比较，更早的相同内容不合并
        if let Some(last) = self.data.items.last_mut() {
            if last.payload.same_content(&payload) {
                let id = last.id;
                last.updated_at = now;
                self.data.last_updated = now;
                self.save()?;
                return Ok(id);
            }
        }

        let id = self.data.next_id;
        self.data.next_id += 1;
        let size_bytes = payload.size_bytes();
        self.data.items.push(HistoryEntry {
            id,
            payload,
            size_bytes,
            created_at: now,
            updated_at: now,
            is_favorite: false,
        });

        self.evict();
        self.data.last_updated = now;
        self.save()?;
        Ok(id)
    }

    /// 每次插入后执行：超出条数或体积限制时，按 created_at（同秒比 id）
    /// 淘汰最老的非收藏记录。只剩收藏时即便仍超限也停止，收藏永不自动删除。
    fn evict(&mut self) {
        let max_items = self.data.settings.max_items;
        let max_bytes = self.data.settings.max_size_mb as u64 * 1_000_000;

        loop {
            let total = self.data.items.len();
            let loose_bytes: u64 = self
                .data
                .items
                .iter()
                .filter(|item| !item.is_favorite)
                .map(|item| item.size_bytes)
                .sum();

            if total <= max_items && loose_bytes <= max_bytes {
                break;
            }

            let victim = self
                .data
                .items
                .iter()
                .enumerate()
                .filter(|(_, item)| !item.is_favorite)
                .min_by_key(|(_, item)| (item.created_at, item.id))
                .map(|(index, _)| index);

            match victim {
                Some(index) => {
                    self.data.items.remove(index);
                }
                None => break,
            }
        }
    }

    /// 展示顺序：created_at 降序，同秒按 id 降序
    fn sorted_view(&self) -> Vec<HistoryEntry> {
        let mut items = self.data.items.clone();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.cmp(&a.id))
        });
        items
    }

    pub fn get_history(&self, limit: usize) -> Vec<HistoryEntry> {
        let mut items = self.sorted_view();
        items.truncate(limit);
        items
    }

    pub fn get_all(&self) -> Vec<HistoryEntry> {
        self.sorted_view()
    }

    pub fn entry(&self, id: u64) -> Option<HistoryEntry> {
        self.data.items.iter().find(|item| item.id == id).cloned()
    }

    /// 大小写不敏感的子串搜索；图片记录按格式元数据文本匹配
    pub fn search(&self, query: &str) -> Vec<HistoryEntry> {
        if query.is_empty() {
            return self.sorted_view();
        }
        let needle = query.to_lowercase();
        let mut items: Vec<HistoryEntry> = self
            .data
            .items
            .iter()
            .filter(|item| item.search_text().to_lowercase().contains(&needle))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        items
    }

    /// 删除指定记录；id 不存在返回 false，不算错误
    pub fn delete(&mut self, id: u64) -> Result<bool, StorageError> {
        let original_len = self.data.items.len();
        self.data.items.retain(|item| item.id != id);
        let removed = self.data.items.len() < original_len;

        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// 设置收藏标记；id 不存在返回 false
    pub fn set_favorite(&mut self, id: u64, is_favorite: bool) -> Result<bool, StorageError> {
        let Some(item) = self.data.items.iter_mut().find(|item| item.id == id) else {
            return Ok(false);
        };
        if item.is_favorite != is_favorite {
            item.is_favorite = is_favorite;
            self.data.last_updated = now_secs();
            self.save()?;
        }
        Ok(true)
    }

    /// 清空全部历史。next_id 不回卷，id 在存储生命周期内永不复用。
    pub fn clear_all(&mut self) -> Result<(), StorageError> {
        self.data.items.clear();
        self.data.last_updated = now_secs();
        self.save()
    }

    /// 更新容量限制并立即套用淘汰策略
    pub fn update_limits(
        &mut self,
        max_items: usize,
        max_size_mb: usize,
    ) -> Result<(), StorageError> {
        if !(MIN_MAX_ITEMS..=MAX_MAX_ITEMS).contains(&max_items) {
            return Err(StorageError::InvalidMaxItems(max_items));
        }
        self.data.settings.max_items = max_items;
        self.data.settings.max_size_mb = max_size_mb;
        self.evict();
        self.save()
    }

    pub fn settings(&self) -> Settings {
        self.data.settings.clone()
    }

    /// 只在注册成功得到系统确认后才应调用
    pub fn update_shortcut(&mut self, shortcut: &str) -> Result<(), StorageError> {
        self.data.settings.shortcut = shortcut.to_string();
        self.save()
    }

    pub fn set_auto_start(&mut self, auto_start: bool) -> Result<(), StorageError> {
        self.data.settings.auto_start = auto_start;
        self.save()
    }

    pub fn last_updated(&self) -> u64 {
        self.data.last_updated
    }

    /// 首次启动标记只命中一次，读取后立即落盘清除
    pub fn take_first_launch(&mut self) -> Result<bool, StorageError> {
        if self.data.is_first_launch {
            self.data.is_first_launch = false;
            self.save()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn len(&self) -> usize {
        self.data.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.items.is_empty()
    }

    /// 落盘失败重试一次；仍失败则向调用方报错，内存态保持为准
    fn save(&self) -> Result<(), StorageError> {
        match self.write_to_disk() {
            Ok(()) => Ok(()),
            Err(first) => {
                log::warn!("history save failed, retrying once: {}", first);
                self.write_to_disk()
            }
        }
    }

    /// 先写临时文件再原子改名，崩溃也不会留下写到一半的存储文件
    fn write_to_disk(&self) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(&self.data)?;
        let tmp_path = self.file_path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.file_path)?;
        Ok(())
    }
}
