use serde::{Deserialize, Serialize};

/// 历史记录的内容类别
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Text,
    Image,
}

/// 支持入库的图片编码格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageEncoding {
    Png,
    Jpeg,
    Bmp,
}

impl ImageEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            ImageEncoding::Png => "PNG",
            ImageEncoding::Jpeg => "JPEG",
            ImageEncoding::Bmp => "BMP",
        }
    }
}

/// 图片内容：原始编码字节 + 入库时同步生成的缩略图。
/// 缩略图随所属记录一起存取，不单独计入容量配额。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub encoding: ImageEncoding,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub thumbnail: Vec<u8>,
}

impl ImagePayload {
    /// 可被搜索命中的元数据文本，如 "PNG 1920x1080"
    pub fn label(&self) -> String {
        format!("{} {}x{}", self.encoding.name(), self.width, self.height)
    }
}

/// 记录内容，封闭的两种变体
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EntryPayload {
    Text(String),
    Image(ImagePayload),
}

impl EntryPayload {
    pub fn kind(&self) -> EntryKind {
        match self {
            EntryPayload::Text(_) => EntryKind::Text,
            EntryPayload::Image(_) => EntryKind::Image,
        }
    }

    /// 配额统计的字节数，图片只计原始编码字节，不含缩略图
    pub fn size_bytes(&self) -> u64 {
        match self {
            EntryPayload::Text(text) => text.len() as u64,
            EntryPayload::Image(image) => image.data.len() as u64,
        }
    }

    /// 去重比较：类别相同且内容字节一致（缩略图不参与比较）
    pub fn same_content(&self, other: &EntryPayload) -> bool {
        match (self, other) {
            (EntryPayload::Text(a), EntryPayload::Text(b)) => a == b,
            (EntryPayload::Image(a), EntryPayload::Image(b)) => {
                a.encoding == b.encoding && a.data == b.data
            }
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub payload: EntryPayload,
    pub size_bytes: u64,
    pub created_at: u64,
    pub updated_at: u64,
    pub is_favorite: bool,
}

impl HistoryEntry {
    pub fn kind(&self) -> EntryKind {
        self.payload.kind()
    }

    /// 搜索匹配的文本：文本记录为正文，图片记录为格式元数据
    pub fn search_text(&self) -> String {
        match &self.payload {
            EntryPayload::Text(text) => text.clone(),
            EntryPayload::Image(image) => image.label(),
        }
    }
}

pub const MIN_MAX_ITEMS: usize = 10;
pub const MAX_MAX_ITEMS: usize = 500;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub max_items: usize,
    pub max_size_mb: usize,
    pub auto_start: bool,
    pub shortcut: String, // global shortcut like "Ctrl+Shift+V"
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_items: 100,
            max_size_mb: 50,
            auto_start: false,
            shortcut: crate::hotkey::default_shortcut().to_string(),
        }
    }
}

/// 快捷键绑定的生命周期状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingState {
    Unregistered,
    Registering,
    Active,
    Conflict,
    Disabled,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShortcutBinding {
    pub combination: String,
    pub state: BindingState,
}

/// 注册快捷键的最终结果，`Conflict` 携带用户可读信息与候选组合
#[derive(Clone, Debug, PartialEq)]
pub enum RegistrationResult {
    Active { combination: String },
    Conflict { message: String, suggestions: Vec<String> },
    Disabled,
}

/// 核心向外发布的事件。投递语义为至少一次，消费者重连后应重新拉取历史，
/// 不应假设事件流完整。
#[derive(Clone, Debug)]
pub enum CoreEvent {
    /// 新增或刷新了一条历史记录
    ClipboardUpdated(HistoryEntry),
    /// 超过 1 MiB 的文本被拒收，需要提示用户
    LargeTextRejected { size_bytes: u64 },
    /// 快捷键注册冲突，每次失败的尝试恰好发布一次
    ShortcutConflict { message: String, suggestions: Vec<String> },
    /// 已注册的全局快捷键被按下（呼出历史面板）
    ShortcutTriggered,
}

/// 当前 Unix 秒
pub(crate) fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
