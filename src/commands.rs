use crossbeam_channel::{Receiver, Sender};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

use crate::clipboard::{
    ArboardSource, ClipboardError, ClipboardMonitor, ClipboardSource, MonitorConfig,
};
use crate::hotkey::{GlobalHotkeyBackend, HotkeyBackend, ShortcutManager, ShortcutManagerConfig};
use crate::models::{
    CoreEvent, EntryPayload, HistoryEntry, RegistrationResult, Settings, ShortcutBinding,
};
use crate::storage::{HistoryStore, SharedStore, StorageError};

#[derive(Error, Debug)]
pub enum ClipperError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Hotkey(#[from] crate::hotkey::HotkeyError),
    #[error("history store lock poisoned")]
    StorePoisoned,
    #[error("content cannot be empty")]
    EmptyContent,
}

#[derive(Clone, Debug, Default)]
pub struct ClipperConfig {
    /// 持久化文件位置；None 时按平台数据目录解析
    pub storage_path: Option<PathBuf>,
    pub monitor: MonitorConfig,
    pub shortcuts: ShortcutManagerConfig,
}

/// 核心装配件：历史存储、剪贴板监听、快捷键管理装配在一起，
/// 对外提供命令面，外层 UI 只消费这里的方法和事件通道。
pub struct Clipper {
    store: SharedStore,
    monitor: ClipboardMonitor,
    shortcuts: Mutex<ShortcutManager>,
    events_tx: Sender<CoreEvent>,
    events_rx: Receiver<CoreEvent>,
}

impl Clipper {
    /// 生产构造：真实剪贴板与系统快捷键后端
    pub fn new(config: ClipperConfig) -> Result<Self, ClipperError> {
        let backend = GlobalHotkeyBackend::new()?;
        let clipper =
            Self::with_adapters(config, Box::new(ArboardSource), Box::new(backend))?;
        GlobalHotkeyBackend::spawn_event_forwarder(clipper.events_tx.clone());
        Ok(clipper)
    }

    /// 注入平台适配的构造，供测试和特殊宿主环境使用
    pub fn with_adapters(
        config: ClipperConfig,
        source: Box<dyn ClipboardSource>,
        backend: Box<dyn HotkeyBackend>,
    ) -> Result<Self, ClipperError> {
        let store = match config.storage_path {
            Some(path) => HistoryStore::open(path),
            None => HistoryStore::open_default()?,
        }
        .into_shared();

        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let monitor = ClipboardMonitor::new(
            store.clone(),
            events_tx.clone(),
            source,
            config.monitor,
        );
        let shortcuts = Mutex::new(ShortcutManager::new(
            backend,
            store.clone(),
            events_tx.clone(),
            config.shortcuts,
        ));

        Ok(Self { store, monitor, shortcuts, events_tx, events_rx })
    }

    /// 启动：先按持久化设置注册快捷键，再开启后台监听
    pub fn start(&self) -> RegistrationResult {
        let result = match self.shortcuts.lock() {
            Ok(mut shortcuts) => shortcuts.register_from_settings(),
            Err(_) => RegistrationResult::Disabled,
        };
        self.monitor.start();
        result
    }

    /// 退出前调用：停止监听并释放快捷键注册
    pub fn shutdown(&self) {
        self.monitor.stop();
        if let Ok(mut shortcuts) = self.shortcuts.lock() {
            shortcuts.unregister();
        }
    }

    /// 事件通道。投递为至少一次，消费者重连后应重新拉取历史。
    pub fn events(&self) -> Receiver<CoreEvent> {
        self.events_rx.clone()
    }

    // ───── 历史记录 ─────

    /// 直接写入一条内容（监听路径之外的入口）
    pub fn add_item(&self, payload: EntryPayload) -> Result<u64, ClipperError> {
        let (id, entry) = {
            let mut store = self.store.lock().map_err(|_| ClipperError::StorePoisoned)?;
            let id = store.add(payload)?;
            (id, store.entry(id))
        };
        if let Some(entry) = entry {
            let _ = self.events_tx.send(CoreEvent::ClipboardUpdated(entry));
        }
        Ok(id)
    }

    /// 手工录入一条收藏文本
    pub fn add_favorite_text(&self, content: &str) -> Result<u64, ClipperError> {
        let text = content.trim();
        if text.is_empty() {
            return Err(ClipperError::EmptyContent);
        }
        let mut store = self.store.lock().map_err(|_| ClipperError::StorePoisoned)?;
        let id = store.add(EntryPayload::Text(text.to_string()))?;
        store.set_favorite(id, true)?;
        Ok(id)
    }

    pub fn get_clipboard_history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.store
            .lock()
            .map(|store| store.get_history(limit))
            .unwrap_or_default()
    }

    pub fn get_all_items(&self) -> Vec<HistoryEntry> {
        self.store
            .lock()
            .map(|store| store.get_all())
            .unwrap_or_default()
    }

    pub fn search_clipboard_items(&self, query: &str) -> Vec<HistoryEntry> {
        self.store
            .lock()
            .map(|store| store.search(query))
            .unwrap_or_default()
    }

    /// 删除一条记录；id 不存在返回 false
    pub fn delete_history_item(&self, id: u64) -> Result<bool, ClipperError> {
        let mut store = self.store.lock().map_err(|_| ClipperError::StorePoisoned)?;
        Ok(store.delete(id)?)
    }

    /// 设置收藏标记；id 不存在返回 false
    pub fn set_item_favorite(&self, id: u64, is_favorite: bool) -> Result<bool, ClipperError> {
        let mut store = self.store.lock().map_err(|_| ClipperError::StorePoisoned)?;
        Ok(store.set_favorite(id, is_favorite)?)
    }

    pub fn clear_all_history(&self) -> Result<(), ClipperError> {
        let mut store = self.store.lock().map_err(|_| ClipperError::StorePoisoned)?;
        Ok(store.clear_all()?)
    }

    // ───── 监听 ─────

    /// 开关后台监听，返回当前是否在运行
    pub fn toggle_clipboard_monitoring(&self, enable: bool) -> bool {
        if enable {
            self.monitor.start();
        } else {
            self.monitor.stop();
        }
        self.monitor.is_running()
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_running()
    }

    /// 同步检查一次剪贴板变化
    pub fn poll_clipboard_once(&self) -> Option<EntryPayload> {
        self.monitor.poll_once()
    }

    /// 把历史记录写回系统剪贴板，监听器不会重复记录这次写入
    pub fn copy_entry(&self, id: u64) -> Result<(), ClipperError> {
        Ok(self.monitor.copy_to_clipboard(id)?)
    }

    // ───── 设置 ─────

    pub fn get_settings(&self) -> Settings {
        self.store
            .lock()
            .map(|store| store.settings())
            .unwrap_or_default()
    }

    /// 更新最大条数；允许区间之外的值被拒绝
    pub fn update_max_items(&self, max_items: usize) -> Result<(), ClipperError> {
        let mut store = self.store.lock().map_err(|_| ClipperError::StorePoisoned)?;
        let max_size_mb = store.settings().max_size_mb;
        Ok(store.update_limits(max_items, max_size_mb)?)
    }

    pub fn update_max_size_mb(&self, max_size_mb: usize) -> Result<(), ClipperError> {
        let mut store = self.store.lock().map_err(|_| ClipperError::StorePoisoned)?;
        let max_items = store.settings().max_items;
        Ok(store.update_limits(max_items, max_size_mb)?)
    }

    pub fn set_auto_start(&self, enabled: bool) -> Result<(), ClipperError> {
        let mut store = self.store.lock().map_err(|_| ClipperError::StorePoisoned)?;
        Ok(store.set_auto_start(enabled)?)
    }

    /// 重新绑定全局快捷键。注册结果即返回值，冲突事件走事件通道。
    pub fn update_shortcut(&self, shortcut: &str) -> RegistrationResult {
        match self.shortcuts.lock() {
            Ok(mut shortcuts) => shortcuts.register(shortcut),
            Err(_) => RegistrationResult::Disabled,
        }
    }

    pub fn current_binding(&self) -> Option<ShortcutBinding> {
        self.shortcuts
            .lock()
            .ok()
            .and_then(|shortcuts| shortcuts.current_binding())
    }

    pub fn last_updated(&self) -> u64 {
        self.store
            .lock()
            .map(|store| store.last_updated())
            .unwrap_or(0)
    }

    /// 首次启动检查，只会命中一次
    pub fn check_first_launch(&self) -> Result<bool, ClipperError> {
        let mut store = self.store.lock().map_err(|_| ClipperError::StorePoisoned)?;
        Ok(store.take_first_launch()?)
    }
}
