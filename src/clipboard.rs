use arboard::{Clipboard, ImageData};
#[cfg(target_os = "windows")]
use clipboard_master::{CallbackResult, ClipboardHandler, Master};
use crossbeam_channel::Sender;
use std::borrow::Cow;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::classifier::{classify, Classification, RawContent};
use crate::models::{CoreEvent, EntryPayload};
use crate::storage::SharedStore;

/// 轮询线程检查停止标志的粒度，保证 stop() 最多一个轮询周期内生效
#[cfg(not(target_os = "windows"))]
const STOP_CHECK_MS: u64 = 50;
/// 文本指纹超过该长度改用哈希，小内容直接比原文
const SMALL_TEXT_FINGERPRINT: usize = 4096;
#[cfg(target_os = "windows")]
const EVENT_MONITOR_RETRY_MIN_MS: u64 = 300;
#[cfg(target_os = "windows")]
const EVENT_MONITOR_RETRY_MAX_MS: u64 = 3000;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("clipboard access failed: {0}")]
    Clipboard(String),
    #[error("storage access failed: {0}")]
    Storage(String),
    #[error("record not found: {0}")]
    NotFound(u64),
}

/// 系统剪贴板的读写缝，平台实现在这层之下，便于按平台替换
pub trait ClipboardSource: Send {
    /// 读取当前剪贴板的一次快照；读不到内容返回 None
    fn fetch(&mut self) -> Option<RawContent>;
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
    fn write_rgba(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<(), ClipboardError>;
}

/// 基于 arboard 的生产实现。每次操作新建上下文，避免长期占用句柄。
pub struct ArboardSource;

impl ClipboardSource for ArboardSource {
    fn fetch(&mut self) -> Option<RawContent> {
        let mut clipboard = Clipboard::new().ok()?;
        if let Ok(image) = clipboard.get_image() {
            return Some(RawContent::RgbaImage {
                width: image.width as u32,
                height: image.height as u32,
                bytes: image.bytes.into_owned(),
            });
        }
        if let Ok(text) = clipboard.get_text() {
            return Some(RawContent::Text(text));
        }
        None
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard = Clipboard::new().map_err(|e| ClipboardError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Clipboard(e.to_string()))
    }

    fn write_rgba(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<(), ClipboardError> {
        let mut clipboard = Clipboard::new().map_err(|e| ClipboardError::Clipboard(e.to_string()))?;
        clipboard
            .set_image(ImageData {
                width: width as usize,
                height: height as usize,
                bytes: Cow::Owned(rgba.to_vec()),
            })
            .map_err(|e| ClipboardError::Clipboard(e.to_string()))
    }
}

fn text_fingerprint(text: &str) -> String {
    if text.len() <= SMALL_TEXT_FINGERPRINT {
        return format!("text:{}", text);
    }
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    text.hash(&mut hasher);
    format!("text#{}:{:016x}", text.len(), hasher.finish())
}

fn image_signature(width: usize, height: usize, rgba: &[u8]) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    width.hash(&mut hasher);
    height.hash(&mut hasher);
    rgba.len().hash(&mut hasher);

    // 只采样首尾字节，避免每次对超大位图做全量哈希
    for b in rgba.iter().take(4096) {
        b.hash(&mut hasher);
    }
    for b in rgba.iter().rev().take(4096) {
        b.hash(&mut hasher);
    }

    format!("image:{}:{}:{}", width, height, hasher.finish())
}

/// 变化检测用的轻量指纹：类型标签 + 哈希（小文本保留原文）
fn fingerprint(raw: &RawContent) -> String {
    match raw {
        RawContent::Text(text) => text_fingerprint(text),
        RawContent::RgbaImage { width, height, bytes } => {
            image_signature(*width as usize, *height as usize, bytes)
        }
        RawContent::EncodedImage(bytes) => {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            bytes.hash(&mut hasher);
            format!("blob:{}:{:016x}", bytes.len(), hasher.finish())
        }
        RawContent::FileList(paths) => format!("files:{}", paths.join("\n")),
        RawContent::Other(tag) => format!("other:{}", tag),
    }
}

#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// 轮询间隔，常规取值 0.5 ~ 2 秒
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_millis(500) }
    }
}

/// 剪贴板监听器。独立线程定时轮询，指纹变化才走分类入库；
/// Windows 上换成事件驱动监听。`poll_once` 可随时同步调用。
#[derive(Clone)]
pub struct ClipboardMonitor {
    store: SharedStore,
    events: Sender<CoreEvent>,
    source: Arc<Mutex<Box<dyn ClipboardSource>>>,
    config: MonitorConfig,
    running: Arc<AtomicBool>,
    session_id: Arc<AtomicU64>,
    last_fingerprint: Arc<Mutex<Option<String>>>,
}

impl ClipboardMonitor {
    pub fn new(
        store: SharedStore,
        events: Sender<CoreEvent>,
        source: Box<dyn ClipboardSource>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            store,
            events,
            source: Arc::new(Mutex::new(source)),
            config,
            running: Arc::new(AtomicBool::new(false)),
            session_id: Arc::new(AtomicU64::new(0)),
            last_fingerprint: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn is_session_active(&self, session: u64) -> bool {
        self.running.load(Ordering::SeqCst) && self.session_id.load(Ordering::SeqCst) == session
    }

    /// 启动后台监听；已在运行时为空操作。
    /// 启动瞬间的剪贴板内容作为基线指纹，存量内容不会被当成新变化。
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let session = self.session_id.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let baseline = self
                .source
                .lock()
                .ok()
                .and_then(|mut source| source.fetch())
                .map(|raw| fingerprint(&raw));
            if let Ok(mut last) = self.last_fingerprint.lock() {
                *last = baseline;
            }
        }

        #[cfg(target_os = "windows")]
        {
            spawn_event_driven_monitor(self.clone(), session);
        }

        #[cfg(not(target_os = "windows"))]
        {
            let monitor = self.clone();
            thread::spawn(move || run_polling_loop(monitor, session));
        }
    }

    /// 停止监听；未运行时为空操作。返回后不再有新的轮询开始，
    /// 已经进入分类入库的那一次允许完成。
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        // 会话号推进，残留线程在下一次检查点自行退出
        self.session_id.fetch_add(1, Ordering::SeqCst);
    }

    /// 同步检查一次剪贴板。有新内容则分类入库并返回内容，
    /// 指纹未变化、被拒收或不支持时返回 None。
    pub fn poll_once(&self) -> Option<EntryPayload> {
        let payload = self.observe()?;
        self.record(payload.clone());
        Some(payload)
    }

    /// 读取快照、比对指纹、执行一次分类。不做入库。
    fn observe(&self) -> Option<EntryPayload> {
        let raw = {
            let mut source = self.source.lock().ok()?;
            source.fetch()?
        };
        let current = fingerprint(&raw);

        {
            let mut last = self.last_fingerprint.lock().ok()?;
            if last.as_deref() == Some(current.as_str()) {
                return None;
            }
            *last = Some(current);
        }

        match classify(&raw) {
            Classification::Accepted(payload) => Some(payload),
            Classification::TooLarge { size_bytes } => {
                // 大文本拒收需要提示用户，区别于静默丢弃
                let _ = self.events.send(CoreEvent::LargeTextRejected { size_bytes });
                None
            }
            Classification::Unsupported => None,
        }
    }

    /// 入库并广播。去重命中时广播的是刷新后的原记录。
    fn record(&self, payload: EntryPayload) {
        let entry = {
            let Ok(mut store) = self.store.lock() else {
                return;
            };
            match store.add(payload) {
                Ok(id) => store.entry(id),
                Err(err) => {
                    log::warn!("failed to record clipboard change: {}", err);
                    None
                }
            }
        };
        if let Some(entry) = entry {
            let _ = self.events.send(CoreEvent::ClipboardUpdated(entry));
        }
    }

    fn process_change(&self, session: u64) {
        if !self.is_session_active(session) {
            return;
        }
        if let Some(payload) = self.observe() {
            self.record(payload);
        }
    }

    /// 把一条历史记录写回系统剪贴板。写入后直接以写入内容刷新基线指纹，
    /// 监听器不会把这次自家的写入再次入库。
    pub fn copy_to_clipboard(&self, id: u64) -> Result<(), ClipboardError> {
        let entry = self
            .store
            .lock()
            .map_err(|_| ClipboardError::Storage("store lock poisoned".to_string()))?
            .entry(id)
            .ok_or(ClipboardError::NotFound(id))?;

        let mut source = self
            .source
            .lock()
            .map_err(|_| ClipboardError::Clipboard("clipboard lock poisoned".to_string()))?;

        match &entry.payload {
            EntryPayload::Text(text) => {
                source.write_text(text)?;
                if let Ok(mut last) = self.last_fingerprint.lock() {
                    *last = Some(text_fingerprint(text));
                }
            }
            EntryPayload::Image(image) => {
                let decoded = image::load_from_memory(&image.data)
                    .map_err(|e| ClipboardError::Clipboard(e.to_string()))?;
                let rgba = decoded.to_rgba8();
                let (width, height) = rgba.dimensions();
                let bytes = rgba.into_raw();
                source.write_rgba(width, height, &bytes)?;
                if let Ok(mut last) = self.last_fingerprint.lock() {
                    *last = Some(image_signature(width as usize, height as usize, &bytes));
                }
            }
        }
        Ok(())
    }
}

#[cfg(not(target_os = "windows"))]
fn run_polling_loop(monitor: ClipboardMonitor, session: u64) {
    let interval_ms = (monitor.config.poll_interval.as_millis() as u64).max(1);
    loop {
        // 按 STOP_CHECK_MS 粒度醒来检查停止标志
        let mut slept = 0;
        while slept < interval_ms {
            let step = STOP_CHECK_MS.min(interval_ms - slept);
            thread::sleep(Duration::from_millis(step));
            slept += step;
            if !monitor.is_session_active(session) {
                return;
            }
        }
        monitor.process_change(session);
    }
}

#[cfg(target_os = "windows")]
struct ClipboardEventHandler {
    monitor: ClipboardMonitor,
    session: u64,
}

#[cfg(target_os = "windows")]
impl ClipboardHandler for ClipboardEventHandler {
    fn on_clipboard_change(&mut self) -> CallbackResult {
        if !self.monitor.is_session_active(self.session) {
            return CallbackResult::Stop;
        }
        self.monitor.process_change(self.session);
        CallbackResult::Next
    }

    fn on_clipboard_error(&mut self, _error: std::io::Error) -> CallbackResult {
        if !self.monitor.is_session_active(self.session) {
            CallbackResult::Stop
        } else {
            CallbackResult::Next
        }
    }
}

#[cfg(target_os = "windows")]
fn spawn_event_driven_monitor(monitor: ClipboardMonitor, session: u64) {
    thread::spawn(move || {
        let mut retry_delay_ms = EVENT_MONITOR_RETRY_MIN_MS;

        while monitor.is_session_active(session) {
            let handler = ClipboardEventHandler { monitor: monitor.clone(), session };

            match Master::new(handler) {
                Ok(mut master) => {
                    retry_delay_ms = EVENT_MONITOR_RETRY_MIN_MS;
                    if master.run().is_ok() {
                        break;
                    }
                }
                Err(_) => {}
            }

            if !monitor.is_session_active(session) {
                break;
            }

            thread::sleep(Duration::from_millis(retry_delay_ms));
            retry_delay_ms = (retry_delay_ms.saturating_mul(2)).min(EVENT_MONITOR_RETRY_MAX_MS);
        }
    });
}
