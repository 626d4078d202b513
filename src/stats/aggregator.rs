use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{CaptureEvent, KeyCode, KeyPress, MouseAction, MouseEvent, WindowFocus};
use crate::storage::Store;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Instant;
use tracing::{info, trace};

use super::window_info::WindowInfo;

/// Сколько последних переключений фокуса хранится для атрибуции запоздавших событий
const FOCUS_HISTORY_LEN: usize = 16;

/// Что делать с событиями, пришедшими до первого фокуса
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnattributedPolicy {
    Drop,
    Buffer { limit: usize },
}

/// Переключение фокуса. `window` None, если запись окна уже удалена.
#[derive(Debug, Clone, Copy)]
struct FocusTransition {
    at: Instant,
    window: Option<usize>,
}

/// Кому принадлежит событие с данной отметкой времени
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribution {
    Window(usize),
    /// Событие раньше самого первого фокуса
    BeforeFirstFocus,
    /// Окно было в фокусе, но его запись удалена
    Unknown,
}

#[derive(Debug, Default)]
struct AggregatorState {
    windows: Vec<WindowInfo>,
    index: HashMap<String, usize>,
    active: Option<usize>,
    history: VecDeque<FocusTransition>,
    /// Последнее вытесненное из истории переключение
    floor: Option<FocusTransition>,
    /// Самое первое переключение за сессию
    first_focus: Option<FocusTransition>,
    pending: VecDeque<CaptureEvent>,
    dropped: u64,
}

impl AggregatorState {
    fn resolve_or_insert(&mut self, identifier: &str) -> usize {
        if let Some(&idx) = self.index.get(identifier) {
            return idx;
        }
        let idx = self.windows.len();
        self.windows.push(WindowInfo::new(identifier));
        self.index.insert(identifier.to_string(), idx);
        info!("Новое окно в статистике: \"{}\"", identifier);
        idx
    }

    /// Окно, которое было в фокусе в момент `at`
    fn attribution_at(&self, at: Instant) -> Attribution {
        let focused = self
            .history
            .iter()
            .rev()
            .find(|t| t.at <= at)
            // Старше всей истории: в фокусе было окно последнего вытесненного переключения
            .or_else(|| self.floor.as_ref().filter(|t| t.at <= at));

        match focused {
            Some(FocusTransition {
                window: Some(idx), ..
            }) => Attribution::Window(*idx),
            Some(_) => Attribution::Unknown,
            None => match self.first_focus {
                Some(first) if first.at <= at => Attribution::Unknown,
                _ => Attribution::BeforeFirstFocus,
            },
        }
    }

    fn record_transition(&mut self, transition: FocusTransition) {
        if self.first_focus.is_none() {
            self.first_focus = Some(transition);
        }
        self.history.push_back(transition);
        while self.history.len() > FOCUS_HISTORY_LEN {
            self.floor = self.history.pop_front();
        }
    }

    /// Сдвинуть ссылки на окна после удаления записи `removed`
    fn forget_window(&mut self, removed: usize) {
        let shift = |window: &mut Option<usize>| {
            *window = match *window {
                Some(idx) if idx == removed => None,
                Some(idx) if idx > removed => Some(idx - 1),
                other => other,
            };
        };

        shift(&mut self.active);
        for transition in self.history.iter_mut() {
            shift(&mut transition.window);
        }
        if let Some(floor) = self.floor.as_mut() {
            shift(&mut floor.window);
        }
        if let Some(first) = self.first_focus.as_mut() {
            shift(&mut first.window);
        }
    }

    fn attribute(&mut self, idx: usize, event: &CaptureEvent) {
        let window = &mut self.windows[idx];
        match event {
            CaptureEvent::KeyPress(press) => window.add_key_press(press.key_code),
            CaptureEvent::Mouse(mouse) => match mouse.action {
                MouseAction::ButtonPress(button) => window.add_mouse_button_press(button),
                MouseAction::Scroll(direction) => window.add_scroll(direction),
                MouseAction::Move(position) => window.add_mouse_movement(position),
            },
            CaptureEvent::WindowFocusChanged(_) => {}
        }
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .windows
            .iter()
            .enumerate()
            .map(|(idx, window)| (window.id.clone(), idx))
            .collect();
    }
}

/// Агрегатор: относит каждое событие к окну, которое было в фокусе
///
/// Все изменения состояния проходят через один мьютекс, поэтому смена фокуса
/// и учёт нажатий никогда не выполняются одновременно.
pub struct Aggregator {
    state: Mutex<AggregatorState>,
    policy: UnattributedPolicy,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(UnattributedPolicy::Drop)
    }
}

impl Aggregator {
    pub fn new(policy: UnattributedPolicy) -> Self {
        info!("Инициализация Aggregator (policy: {:?})", policy);
        Self {
            state: Mutex::new(AggregatorState::default()),
            policy,
        }
    }

    pub fn apply(&self, event: CaptureEvent) {
        match event {
            CaptureEvent::WindowFocusChanged(focus) => self.on_window_focus_changed(focus),
            CaptureEvent::KeyPress(press) => self.on_key_press(press),
            CaptureEvent::Mouse(mouse) => self.on_mouse_event(mouse),
        }
    }

    pub fn on_window_focus_changed(&self, focus: WindowFocus) {
        let mut state = self.state.lock();

        let idx = state.resolve_or_insert(&focus.identifier);
        if state.active == Some(idx) {
            trace!("Окно \"{}\" уже активно", focus.identifier);
            return;
        }

        if let Some(prev) = state.active {
            state.windows[prev].window_unfocused(focus.timestamp);
        }
        state.windows[idx].window_focused(focus.timestamp);
        state.active = Some(idx);
        state.record_transition(FocusTransition {
            at: focus.timestamp,
            window: Some(idx),
        });

        debug_if_enabled!("Активное окно: \"{}\"", focus.identifier);

        if !state.pending.is_empty() {
            let pending: Vec<CaptureEvent> = state.pending.drain(..).collect();
            info!(
                "Переносим {} отложенных событий в окно \"{}\"",
                pending.len(),
                focus.identifier
            );
            for event in &pending {
                state.attribute(idx, event);
            }
        }
    }

    pub fn on_key_press(&self, press: KeyPress) {
        self.attribute_or_hold(press.into());
    }

    pub fn on_mouse_event(&self, event: MouseEvent) {
        self.attribute_or_hold(event.into());
    }

    fn attribute_or_hold(&self, event: CaptureEvent) {
        let mut state = self.state.lock();

        let first_window = match state.attribution_at(event.timestamp()) {
            Attribution::Window(idx) => {
                state.attribute(idx, &event);
                return;
            }
            Attribution::Unknown => {
                state.dropped += 1;
                debug_if_enabled!("Окно события уже удалено, событие отброшено: {:?}", event);
                return;
            }
            Attribution::BeforeFirstFocus => state.first_focus.map(|t| t.window),
        };

        match self.policy {
            UnattributedPolicy::Drop => {
                state.dropped += 1;
                debug_if_enabled!("Нет активного окна, событие отброшено: {:?}", event);
            }
            UnattributedPolicy::Buffer { limit } => {
                // Первый фокус уже был: событие досталось бы буферу, отдаём его первому окну
                match first_window {
                    Some(Some(first)) => {
                        state.attribute(first, &event);
                        return;
                    }
                    Some(None) => {
                        state.dropped += 1;
                        return;
                    }
                    None => {}
                }
                if state.pending.len() >= limit {
                    state.pending.pop_front();
                    state.dropped += 1;
                }
                state.pending.push_back(event);
            }
        }
    }

    pub fn lookup(&self, identifier: &str) -> Option<WindowInfo> {
        let state = self.state.lock();
        state
            .index
            .get(identifier)
            .map(|&idx| state.windows[idx].clone())
    }

    pub fn active_window(&self) -> Option<String> {
        let state = self.state.lock();
        state.active.map(|idx| state.windows[idx].id.clone())
    }

    /// Копия всех записей в порядке первого появления
    pub fn snapshot(&self) -> Vec<WindowInfo> {
        self.state.lock().windows.clone()
    }

    pub fn window_count(&self) -> usize {
        self.state.lock().windows.len()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.state.lock().dropped
    }

    /// Нажатия по всем окнам вместе
    pub fn total_key_presses(&self) -> BTreeMap<KeyCode, u64> {
        let state = self.state.lock();
        let mut totals = BTreeMap::new();
        for window in &state.windows {
            for (&key, &count) in &window.key_presses {
                *totals.entry(key).or_insert(0) += count;
            }
        }
        totals
    }

    /// Загрузить ранее сохранённые записи. Уже известные окна не перезаписываются.
    pub fn restore(&self, records: Vec<WindowInfo>) -> usize {
        let mut state = self.state.lock();
        let mut restored = 0;
        for record in records {
            if state.index.contains_key(&record.id) {
                continue;
            }
            let idx = state.windows.len();
            state.index.insert(record.id.clone(), idx);
            state.windows.push(record);
            restored += 1;
        }
        info!("Восстановлено {} окон из хранилища", restored);
        restored
    }

    /// Удалить запись окна. Если окно было активным, фокус сбрасывается.
    pub fn remove(&self, identifier: &str) -> Option<WindowInfo> {
        let mut state = self.state.lock();
        let idx = state.index.get(identifier).copied()?;

        let removed = state.windows.remove(idx);
        state.rebuild_index();
        // События из интервалов фокуса удалённого окна больше никому не засчитываются
        state.forget_window(idx);

        info!("Окно \"{}\" удалено из статистики", identifier);
        Some(removed)
    }

    /// Сохранить все записи. Вызывается по таймеру и при завершении, не на каждое событие.
    pub fn checkpoint(&self, store: &dyn Store) -> Result<usize> {
        let records = self.snapshot();
        for record in &records {
            store.save(record)?;
        }
        debug_if_enabled!("Контрольная точка: сохранено {} окон", records.len());
        Ok(records.len())
    }
}
