use crossbeam_channel::Sender;
use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use thiserror::Error;

use crate::models::{BindingState, CoreEvent, RegistrationResult, ShortcutBinding};
use crate::storage::SharedStore;

/// 平台默认快捷键
#[cfg(target_os = "macos")]
pub fn default_shortcut() -> &'static str {
    "Meta+Shift+V"
}

#[cfg(not(target_os = "macos"))]
pub fn default_shortcut() -> &'static str {
    "Ctrl+Shift+V"
}

/// 冲突后依次尝试的备选组合，选用少见的功能键和弦降低再次碰撞的概率
pub const DEFAULT_FALLBACKS: [&str; 4] = [
    "Ctrl+Shift+F9",
    "Ctrl+Alt+F10",
    "Alt+Shift+F7",
    "Meta+Shift+F8",
];

#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("invalid shortcut '{value}': {reason}")]
    InvalidCombination { value: String, reason: String },
    #[error("shortcut '{0}' is already claimed")]
    AlreadyClaimed(String),
    #[error("hotkey backend failure: {0}")]
    Backend(String),
}

/// 逻辑修饰键，顺序即规范化顺序
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Meta,
}

impl Modifier {
    fn parse(token: &str) -> Option<Modifier> {
        match token.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Some(Modifier::Ctrl),
            "alt" | "option" | "opt" => Some(Modifier::Alt),
            "shift" => Some(Modifier::Shift),
            "meta" | "cmd" | "command" | "super" | "win" => Some(Modifier::Meta),
            _ => None,
        }
    }

    fn canonical_name(&self) -> &'static str {
        match self {
            Modifier::Ctrl => "Ctrl",
            Modifier::Alt => "Alt",
            Modifier::Shift => "Shift",
            Modifier::Meta => "Meta",
        }
    }

    #[cfg(target_os = "macos")]
    fn display_name(&self) -> &'static str {
        match self {
            Modifier::Ctrl => "⌃",
            Modifier::Alt => "⌥",
            Modifier::Shift => "⇧",
            Modifier::Meta => "⌘",
        }
    }

    #[cfg(not(target_os = "macos"))]
    fn display_name(&self) -> &'static str {
        match self {
            Modifier::Ctrl => "Ctrl",
            Modifier::Alt => "Alt",
            Modifier::Shift => "Shift",
            Modifier::Meta => "Win",
        }
    }

    fn to_native(self) -> Modifiers {
        match self {
            Modifier::Ctrl => Modifiers::CONTROL,
            Modifier::Alt => Modifiers::ALT,
            Modifier::Shift => Modifiers::SHIFT,
            Modifier::Meta => Modifiers::META,
        }
    }
}

/// 解析并规范化后的按键组合：有序修饰键集合 + 一个非修饰键
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combination {
    modifiers: Vec<Modifier>,
    key: String,
    code: Code,
}

impl Combination {
    /// 规范字符串形式，如 "Ctrl+Shift+V"
    pub fn canonical(&self) -> String {
        let mut parts: Vec<&str> = self
            .modifiers
            .iter()
            .map(|m| m.canonical_name())
            .collect();
        parts.push(self.key.as_str());
        parts.join("+")
    }

    /// 面向用户的显示形式（macOS 用修饰键符号，其他平台 Meta 显示为 Win）
    pub fn display(&self) -> String {
        let mut parts: Vec<&str> = self.modifiers.iter().map(|m| m.display_name()).collect();
        parts.push(self.key.as_str());
        parts.join("+")
    }

    fn to_hotkey(&self) -> HotKey {
        let mods = self
            .modifiers
            .iter()
            .fold(Modifiers::empty(), |acc, m| acc | m.to_native());
        HotKey::new(Some(mods), self.code)
    }
}

/// 解析 "Ctrl+Shift+V" 风格的组合。接受 Cmd/Super/Win 等别名，
/// 要求至少一个修饰键加恰好一个普通键。
pub fn parse_combination(value: &str) -> Result<Combination, HotkeyError> {
    let invalid = |reason: &str| HotkeyError::InvalidCombination {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let tokens: Vec<&str> = value
        .split('+')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() < 2 {
        return Err(invalid("expected at least one modifier and a key"));
    }

    let Some((key_token, modifier_tokens)) = tokens.split_last() else {
        return Err(invalid("expected at least one modifier and a key"));
    };

    let mut modifiers = Vec::new();
    for token in modifier_tokens {
        let modifier = Modifier::parse(token)
            .ok_or_else(|| invalid(&format!("unknown modifier '{}'", token)))?;
        if !modifiers.contains(&modifier) {
            modifiers.push(modifier);
        }
    }
    modifiers.sort();

    if Modifier::parse(key_token).is_some() {
        return Err(invalid("combination has no non-modifier key"));
    }
    let (key, code) =
        key_to_code(key_token).ok_or_else(|| invalid(&format!("unknown key '{}'", key_token)))?;

    Ok(Combination { modifiers, key, code })
}

fn key_to_code(token: &str) -> Option<(String, Code)> {
    if token.chars().count() == 1 {
        let ch = token.chars().next()?.to_ascii_uppercase();
        let code = match ch {
            'A' => Code::KeyA,
            'B' => Code::KeyB,
            'C' => Code::KeyC,
            'D' => Code::KeyD,
            'E' => Code::KeyE,
            'F' => Code::KeyF,
            'G' => Code::KeyG,
            'H' => Code::KeyH,
            'I' => Code::KeyI,
            'J' => Code::KeyJ,
            'K' => Code::KeyK,
            'L' => Code::KeyL,
            'M' => Code::KeyM,
            'N' => Code::KeyN,
            'O' => Code::KeyO,
            'P' => Code::KeyP,
            'Q' => Code::KeyQ,
            'R' => Code::KeyR,
            'S' => Code::KeyS,
            'T' => Code::KeyT,
            'U' => Code::KeyU,
            'V' => Code::KeyV,
            'W' => Code::KeyW,
            'X' => Code::KeyX,
            'Y' => Code::KeyY,
            'Z' => Code::KeyZ,
            '0' => Code::Digit0,
            '1' => Code::Digit1,
            '2' => Code::Digit2,
            '3' => Code::Digit3,
            '4' => Code::Digit4,
            '5' => Code::Digit5,
            '6' => Code::Digit6,
            '7' => Code::Digit7,
            '8' => Code::Digit8,
            '9' => Code::Digit9,
            _ => return None,
        };
        return Some((ch.to_string(), code));
    }

    let lower = token.to_ascii_lowercase();
    if let Some(num) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        let code = match num {
            1 => Code::F1,
            2 => Code::F2,
            3 => Code::F3,
            4 => Code::F4,
            5 => Code::F5,
            6 => Code::F6,
            7 => Code::F7,
            8 => Code::F8,
            9 => Code::F9,
            10 => Code::F10,
            11 => Code::F11,
            12 => Code::F12,
            _ => return None,
        };
        return Some((format!("F{}", num), code));
    }

    let (name, code) = match lower.as_str() {
        "space" => ("Space", Code::Space),
        "enter" | "return" => ("Enter", Code::Enter),
        "tab" => ("Tab", Code::Tab),
        "escape" | "esc" => ("Escape", Code::Escape),
        "backspace" => ("Backspace", Code::Backspace),
        "delete" | "del" => ("Delete", Code::Delete),
        "insert" => ("Insert", Code::Insert),
        "home" => ("Home", Code::Home),
        "end" => ("End", Code::End),
        "pageup" => ("PageUp", Code::PageUp),
        "pagedown" => ("PageDown", Code::PageDown),
        "up" => ("Up", Code::ArrowUp),
        "down" => ("Down", Code::ArrowDown),
        "left" => ("Left", Code::ArrowLeft),
        "right" => ("Right", Code::ArrowRight),
        "minus" => ("Minus", Code::Minus),
        "equal" => ("Equal", Code::Equal),
        "comma" => ("Comma", Code::Comma),
        "period" => ("Period", Code::Period),
        "slash" => ("Slash", Code::Slash),
        "backslash" => ("Backslash", Code::Backslash),
        "semicolon" => ("Semicolon", Code::Semicolon),
        "quote" => ("Quote", Code::Quote),
        "backquote" | "grave" => ("Backquote", Code::Backquote),
        _ => return None,
    };
    Some((name.to_string(), code))
}

/// 系统级注册的窄接口：平台绑定代码隔离在这一道缝后面，
/// 状态机逻辑不感知具体平台。
pub trait HotkeyBackend {
    fn register(&mut self, combination: &Combination) -> Result<(), HotkeyError>;
    fn unregister(&mut self, combination: &Combination) -> Result<(), HotkeyError>;
}

/// 基于 global-hotkey 的生产实现
pub struct GlobalHotkeyBackend {
    manager: GlobalHotKeyManager,
}

impl GlobalHotkeyBackend {
    pub fn new() -> Result<Self, HotkeyError> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| HotkeyError::Backend(e.to_string()))?;
        Ok(Self { manager })
    }

    /// 把按键按下事件转发到核心事件通道（呼出历史面板的信号源）
    pub fn spawn_event_forwarder(events: Sender<CoreEvent>) {
        std::thread::spawn(move || {
            let receiver = GlobalHotKeyEvent::receiver();
            while let Ok(event) = receiver.recv() {
                // 只处理按下，忽略松开
                if event.state == HotKeyState::Pressed
                    && events.send(CoreEvent::ShortcutTriggered).is_err()
                {
                    break;
                }
            }
        });
    }
}

impl HotkeyBackend for GlobalHotkeyBackend {
    fn register(&mut self, combination: &Combination) -> Result<(), HotkeyError> {
        self.manager.register(combination.to_hotkey()).map_err(|e| {
            let message = e.to_string();
            // 后端错误文案里区分"已被占用"与其他失败
            if message.to_lowercase().contains("already registered") {
                HotkeyError::AlreadyClaimed(combination.canonical())
            } else {
                HotkeyError::Backend(message)
            }
        })
    }

    fn unregister(&mut self, combination: &Combination) -> Result<(), HotkeyError> {
        self.manager
            .unregister(combination.to_hotkey())
            .map_err(|e| HotkeyError::Backend(e.to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct ShortcutManagerConfig {
    /// 冲突时是否自动沿备选列表继续尝试
    pub auto_fallback: bool,
    /// 自动尝试的备选个数上限
    pub max_fallback_attempts: usize,
    pub fallbacks: Vec<String>,
}

impl Default for ShortcutManagerConfig {
    fn default() -> Self {
        Self {
            auto_fallback: true,
            max_fallback_attempts: 3,
            fallbacks: DEFAULT_FALLBACKS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// 全局快捷键管理器。独占系统层面的注册句柄，
/// 注册成功前不会把新组合写进设置。
pub struct ShortcutManager {
    backend: Box<dyn HotkeyBackend>,
    store: SharedStore,
    events: Sender<CoreEvent>,
    config: ShortcutManagerConfig,
    binding: Option<ShortcutBinding>,
    active: Option<Combination>,
}

impl ShortcutManager {
    pub fn new(
        backend: Box<dyn HotkeyBackend>,
        store: SharedStore,
        events: Sender<CoreEvent>,
        config: ShortcutManagerConfig,
    ) -> Self {
        Self {
            backend,
            store,
            events,
            config,
            binding: None,
            active: None,
        }
    }

    /// 按设置里持久化的组合注册（启动时调用）
    pub fn register_from_settings(&mut self) -> RegistrationResult {
        let shortcut = match self.store.lock() {
            Ok(store) => store.settings().shortcut,
            Err(_) => default_shortcut().to_string(),
        };
        self.register(&shortcut)
    }

    /// 注册一个组合。被占用时给出可读信息和备选建议，
    /// 配置允许时自动尝试备选；备选全部失败进入 Disabled。
    /// 每次失败的尝试恰好发布一次冲突事件，不按轮询重复。
    pub fn register(&mut self, requested: &str) -> RegistrationResult {
        // 重新绑定前总是先注销旧的
        self.unregister();

        let combo = match parse_combination(requested) {
            Ok(combo) => combo,
            Err(err) => {
                let message = err.to_string();
                let suggestions = self.suggestions_excluding(&[]);
                self.binding = Some(ShortcutBinding {
                    combination: requested.trim().to_string(),
                    state: BindingState::Conflict,
                });
                self.emit_conflict(&message, &suggestions);
                return RegistrationResult::Conflict { message, suggestions };
            }
        };

        let mut attempts = vec![combo.clone()];
        if self.config.auto_fallback {
            attempts.extend(
                self.parsed_fallbacks()
                    .into_iter()
                    .filter(|candidate| candidate != &combo)
                    .take(self.config.max_fallback_attempts),
            );
        }

        let mut last_conflict = None;
        for (index, candidate) in attempts.iter().enumerate() {
            let canonical = candidate.canonical();
            self.binding = Some(ShortcutBinding {
                combination: canonical.clone(),
                state: BindingState::Registering,
            });

            match self.backend.register(candidate) {
                Ok(()) => {
                    self.active = Some(candidate.clone());
                    self.binding = Some(ShortcutBinding {
                        combination: canonical.clone(),
                        state: BindingState::Active,
                    });
                    // 系统确认成功之后才落盘，绝不提前
                    if let Ok(mut store) = self.store.lock() {
                        if let Err(err) = store.update_shortcut(&canonical) {
                            log::warn!("failed to persist shortcut {}: {}", canonical, err);
                        }
                    }
                    return RegistrationResult::Active { combination: canonical };
                }
                Err(err) => {
                    let message = match &err {
                        HotkeyError::AlreadyClaimed(c) => {
                            format!("快捷键 {} 已被其他程序占用", c)
                        }
                        other => format!("快捷键 {} 注册失败: {}", canonical, other),
                    };
                    // 只排除已经试过的组合，剩下的仍是有效建议
                    let tried: Vec<String> = attempts[..=index]
                        .iter()
                        .map(|a| a.canonical())
                        .collect();
                    let suggestions = self.suggestions_excluding(&tried);
                    self.binding = Some(ShortcutBinding {
                        combination: canonical,
                        state: BindingState::Conflict,
                    });
                    self.emit_conflict(&message, &suggestions);
                    last_conflict = Some((message, suggestions));
                    if !self.config.auto_fallback {
                        break;
                    }
                }
            }
        }

        match last_conflict {
            Some((message, suggestions)) if !self.config.auto_fallback => {
                RegistrationResult::Conflict { message, suggestions }
            }
            _ => {
                if let Some(binding) = &mut self.binding {
                    binding.state = BindingState::Disabled;
                }
                RegistrationResult::Disabled
            }
        }
    }

    /// 注销当前绑定；没有绑定时是无副作用的空操作
    pub fn unregister(&mut self) {
        if let Some(combo) = self.active.take() {
            if let Err(err) = self.backend.unregister(&combo) {
                log::warn!("failed to unregister {}: {}", combo.canonical(), err);
            }
        }
        self.binding = None;
    }

    pub fn current_binding(&self) -> Option<ShortcutBinding> {
        self.binding.clone()
    }

    fn parsed_fallbacks(&self) -> Vec<Combination> {
        self.config
            .fallbacks
            .iter()
            .filter_map(|s| parse_combination(s).ok())
            .collect()
    }

    /// 有序的备选建议，排除请求的组合和已经尝试过的
    fn suggestions_excluding(&self, tried: &[String]) -> Vec<String> {
        self.parsed_fallbacks()
            .iter()
            .map(|c| c.canonical())
            .filter(|c| !tried.contains(c))
            .collect()
    }

    fn emit_conflict(&self, message: &str, suggestions: &[String]) {
        let _ = self.events.send(CoreEvent::ShortcutConflict {
            message: message.to_string(),
            suggestions: suggestions.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::HistoryStore;
    use crossbeam_channel::Receiver;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeState {
        claimed: HashSet<String>,
        registered: Vec<String>,
    }

    struct FakeBackend(Arc<Mutex<FakeState>>);

    impl HotkeyBackend for FakeBackend {
        fn register(&mut self, combination: &Combination) -> Result<(), HotkeyError> {
            let mut state = self.0.lock().unwrap();
            let canonical = combination.canonical();
            if state.claimed.contains(&canonical) {
                return Err(HotkeyError::AlreadyClaimed(canonical));
            }
            state.registered.push(canonical);
            Ok(())
        }

        fn unregister(&mut self, combination: &Combination) -> Result<(), HotkeyError> {
            let mut state = self.0.lock().unwrap();
            let canonical = combination.canonical();
            state.registered.retain(|c| c != &canonical);
            Ok(())
        }
    }

    struct Fixture {
        manager: ShortcutManager,
        state: Arc<Mutex<FakeState>>,
        store: SharedStore,
        events: Receiver<CoreEvent>,
        _dir: TempDir,
    }

    fn fixture(config: ShortcutManagerConfig) -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::open(dir.path().join("data.json")).into_shared();
        let state = Arc::new(Mutex::new(FakeState::default()));
        let (tx, rx) = crossbeam_channel::unbounded();
        let manager = ShortcutManager::new(
            Box::new(FakeBackend(state.clone())),
            store.clone(),
            tx,
            config,
        );
        Fixture { manager, state, store, events: rx, _dir: dir }
    }

    fn conflict_events(rx: &Receiver<CoreEvent>) -> Vec<(String, Vec<String>)> {
        rx.try_iter()
            .filter_map(|event| match event {
                CoreEvent::ShortcutConflict { message, suggestions } => {
                    Some((message, suggestions))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_canonicalizes_order_and_aliases() {
        assert_eq!(
            parse_combination("shift+ctrl+v").unwrap().canonical(),
            "Ctrl+Shift+V"
        );
        assert_eq!(parse_combination("Cmd+P").unwrap().canonical(), "Meta+P");
        assert_eq!(
            parse_combination("super+shift+f9").unwrap().canonical(),
            "Shift+Meta+F9"
        );
        assert_eq!(
            parse_combination(" Ctrl + Alt + Delete ").unwrap().canonical(),
            "Ctrl+Alt+Delete"
        );
    }

    #[test]
    fn test_parse_rejects_bad_combinations() {
        assert!(parse_combination("V").is_err());
        assert!(parse_combination("Ctrl+").is_err());
        assert!(parse_combination("Ctrl+A+B").is_err());
        assert!(parse_combination("Ctrl+Shift").is_err());
        assert!(parse_combination("Bogus+V").is_err());
        assert!(parse_combination("Ctrl+F13").is_err());
    }

    #[test]
    fn test_register_success_persists_after_confirmation() {
        let mut fx = fixture(ShortcutManagerConfig::default());

        let result = fx.manager.register("Ctrl+Shift+V");
        assert_eq!(
            result,
            RegistrationResult::Active { combination: "Ctrl+Shift+V".to_string() }
        );

        let binding = fx.manager.current_binding().unwrap();
        assert_eq!(binding.state, BindingState::Active);
        assert_eq!(binding.combination, "Ctrl+Shift+V");

        let settings = fx.store.lock().unwrap().settings();
        assert_eq!(settings.shortcut, "Ctrl+Shift+V");
        assert!(conflict_events(&fx.events).is_empty());
    }

    #[test]
    fn test_conflict_walks_fallback_list_and_persists_winner() {
        let mut fx = fixture(ShortcutManagerConfig::default());
        fx.state
            .lock()
            .unwrap()
            .claimed
            .insert("Ctrl+Shift+V".to_string());

        let result = fx.manager.register("Ctrl+Shift+V");
        assert_eq!(
            result,
            RegistrationResult::Active { combination: "Ctrl+Shift+F9".to_string() }
        );

        // 失败一次就发布一次冲突事件，且带备选建议
        let events = conflict_events(&fx.events);
        assert_eq!(events.len(), 1);
        assert!(!events[0].0.is_empty());
        assert!(events[0].1.contains(&"Ctrl+Shift+F9".to_string()));

        // 胜出的备选组合被持久化
        let settings = fx.store.lock().unwrap().settings();
        assert_eq!(settings.shortcut, "Ctrl+Shift+F9");
    }

    #[test]
    fn test_exhausted_fallbacks_disable_binding() {
        let mut fx = fixture(ShortcutManagerConfig::default());
        {
            let mut state = fx.state.lock().unwrap();
            state.claimed.insert("Ctrl+Shift+V".to_string());
            for fallback in DEFAULT_FALLBACKS {
                state
                    .claimed
                    .insert(parse_combination(fallback).unwrap().canonical());
            }
        }

        let result = fx.manager.register("Ctrl+Shift+V");
        assert_eq!(result, RegistrationResult::Disabled);
        assert_eq!(
            fx.manager.current_binding().unwrap().state,
            BindingState::Disabled
        );

        // 请求 + 3 个自动备选，每次失败一条事件
        assert_eq!(conflict_events(&fx.events).len(), 4);
        // 设置没有被半途污染
        let settings = fx.store.lock().unwrap().settings();
        assert_eq!(settings.shortcut, crate::models::Settings::default().shortcut);
    }

    #[test]
    fn test_manual_mode_stops_at_first_conflict() {
        let config = ShortcutManagerConfig {
            auto_fallback: false,
            ..ShortcutManagerConfig::default()
        };
        let mut fx = fixture(config);
        fx.state
            .lock()
            .unwrap()
            .claimed
            .insert("Ctrl+Shift+V".to_string());

        match fx.manager.register("Ctrl+Shift+V") {
            RegistrationResult::Conflict { message, suggestions } => {
                assert!(!message.is_empty());
                assert!(!suggestions.is_empty());
                assert!(!suggestions.contains(&"Ctrl+Shift+V".to_string()));
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(
            fx.manager.current_binding().unwrap().state,
            BindingState::Conflict
        );
        assert_eq!(conflict_events(&fx.events).len(), 1);
        // 备选未被自动注册
        assert!(fx.state.lock().unwrap().registered.is_empty());

        // 用户改选建议中的组合后注册成功并持久化
        let result = fx.manager.register("Ctrl+Shift+F9");
        assert_eq!(
            result,
            RegistrationResult::Active { combination: "Ctrl+Shift+F9".to_string() }
        );
        let settings = fx.store.lock().unwrap().settings();
        assert_eq!(settings.shortcut, "Ctrl+Shift+F9");
    }

    #[test]
    fn test_rebinding_releases_previous_registration() {
        let mut fx = fixture(ShortcutManagerConfig::default());

        fx.manager.register("Ctrl+Shift+V");
        fx.manager.register("Ctrl+Alt+K");

        let state = fx.state.lock().unwrap();
        assert_eq!(state.registered, vec!["Ctrl+Alt+K".to_string()]);
    }

    #[test]
    fn test_unregister_is_noop_when_nothing_bound() {
        let mut fx = fixture(ShortcutManagerConfig::default());
        fx.manager.unregister();
        fx.manager.unregister();
        assert!(fx.manager.current_binding().is_none());
    }

    #[test]
    fn test_register_from_settings_uses_persisted_combination() {
        let mut fx = fixture(ShortcutManagerConfig::default());
        fx.store
            .lock()
            .unwrap()
            .update_shortcut("Ctrl+Alt+J")
            .unwrap();

        let result = fx.manager.register_from_settings();
        assert_eq!(
            result,
            RegistrationResult::Active { combination: "Ctrl+Alt+J".to_string() }
        );
    }

    #[test]
    fn test_invalid_combination_reports_conflict_with_suggestions() {
        let mut fx = fixture(ShortcutManagerConfig::default());
        match fx.manager.register("NotAShortcut") {
            RegistrationResult::Conflict { suggestions, .. } => {
                assert!(!suggestions.is_empty());
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert!(fx.state.lock().unwrap().registered.is_empty());
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_display_uses_win_for_meta() {
        let combo = parse_combination("Meta+Shift+F8").unwrap();
        assert_eq!(combo.display(), "Win+Shift+F8");
    }
}
