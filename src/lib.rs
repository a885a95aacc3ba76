//! clipkeep —— 剪贴板历史核心库
//!
//! 三块核心拼在一起：带内容分类的剪贴板监听、去重且有界的持久化历史、
//! 带冲突回退的全局快捷键管理。列表渲染、设置界面、托盘之类的展示层
//! 是外部消费者，只通过 [`Clipper`] 的命令面和事件通道交互。
//!
//! 平台相关的系统调用隔离在两道缝后面（[`ClipboardSource`]、
//! [`HotkeyBackend`]），核心逻辑不感知具体平台。

pub mod classifier;
pub mod clipboard;
pub mod commands;
pub mod hotkey;
pub mod models;
pub mod storage;

pub use classifier::{classify, Classification, RawContent, MAX_TEXT_BYTES};
pub use clipboard::{
    ArboardSource, ClipboardError, ClipboardMonitor, ClipboardSource, MonitorConfig,
};
pub use commands::{Clipper, ClipperConfig, ClipperError};
pub use hotkey::{
    default_shortcut, parse_combination, Combination, GlobalHotkeyBackend, HotkeyBackend,
    HotkeyError, ShortcutManager, ShortcutManagerConfig, DEFAULT_FALLBACKS,
};
pub use models::{
    BindingState, CoreEvent, EntryKind, EntryPayload, HistoryEntry, ImageEncoding, ImagePayload,
    RegistrationResult, Settings, ShortcutBinding, MAX_MAX_ITEMS, MIN_MAX_ITEMS,
};
pub use storage::{HistoryStore, SharedStore, StorageError};
