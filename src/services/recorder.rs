use crate::error::{KeyheatError, Result};
use crate::events::{CaptureEvent, KeyPress, MouseEvent, WindowFocus};
use crate::stats::Aggregator;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::capture::{combine_readiness, CaptureSource, Feed, StopSignal};

type KeyboardSource = Box<dyn CaptureSource<KeyPress>>;
type MouseSource = Box<dyn CaptureSource<MouseEvent>>;
type WindowSource = Box<dyn CaptureSource<WindowFocus>>;

struct Sources {
    keyboard: KeyboardSource,
    mouse: MouseSource,
    window: WindowSource,
}

/// Запускает три источника и три цикла потребления, которые пишут в общий Aggregator
pub struct Recorder {
    aggregator: Arc<Aggregator>,
    sources: Mutex<Option<Sources>>,
    stop: StopSignal,
    running_tx: Mutex<Option<watch::Sender<bool>>>,
    running_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Recorder {
    pub fn new(
        aggregator: Arc<Aggregator>,
        keyboard: KeyboardSource,
        mouse: MouseSource,
        window: WindowSource,
    ) -> Self {
        let (running_tx, running_rx) = watch::channel(false);
        Self {
            aggregator,
            sources: Mutex::new(Some(Sources {
                keyboard,
                mouse,
                window,
            })),
            stop: StopSignal::new(),
            running_tx: Mutex::new(Some(running_tx)),
            running_rx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Запустить захват. Источники одноразовые: повторный вызов возвращает ошибку.
    pub fn start(&self) -> Result<()> {
        let Sources {
            keyboard,
            mouse,
            window,
        } = self.sources.lock().take().ok_or(KeyheatError::AlreadyRunning)?;

        info!(
            "Запуск источников: {}, {}, {}",
            keyboard.name(),
            mouse.name(),
            window.name()
        );

        let keyboard_feed = Feed::new(&self.stop);
        let mouse_feed = Feed::new(&self.stop);
        let window_feed = Feed::new(&self.stop);

        let mut tasks = Vec::with_capacity(7);

        if let Some(running_tx) = self.running_tx.lock().take() {
            tasks.push(combine_readiness(
                keyboard_feed.ready.clone(),
                mouse_feed.ready.clone(),
                window_feed.ready.clone(),
                running_tx,
            ));
        }

        tasks.push(spawn_source(keyboard, keyboard_feed.sink));
        tasks.push(spawn_source(mouse, mouse_feed.sink));
        tasks.push(spawn_source(window, window_feed.sink));

        tasks.push(consume(keyboard_feed.events, self.aggregator.clone()));
        tasks.push(consume(mouse_feed.events, self.aggregator.clone()));
        tasks.push(consume(window_feed.events, self.aggregator.clone()));

        self.tasks.lock().extend(tasks);
        info!("Все источники запущены");
        Ok(())
    }

    /// Попросить источники остановиться. Накопленная статистика не трогается.
    pub fn stop(&self) {
        if self.stop.is_stopped() {
            return;
        }
        info!("Остановка источников");
        self.stop.stop();
    }

    /// Дождаться завершения всех задач (не дольше `timeout`)
    pub async fn join(&self, timeout: Duration) -> bool {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        let result = tokio::time::timeout(timeout, async {
            for task in tasks {
                let _ = task.await;
            }
        })
        .await;

        if result.is_err() {
            warn!("Таймаут при завершении источников");
            return false;
        }
        true
    }

    /// Мгновенное значение общей готовности
    pub fn is_running(&self) -> bool {
        *self.running_rx.borrow()
    }

    /// Подписка на общую готовность
    pub fn running_signal(&self) -> watch::Receiver<bool> {
        self.running_rx.clone()
    }
}

fn spawn_source<E: Send + 'static>(
    source: Box<dyn CaptureSource<E>>,
    sink: super::capture::FeedSink<E>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = source.name();
        match source.run(sink).await {
            Ok(()) => info!("Источник {} завершил работу", name),
            Err(e) => error!("Ошибка в источнике {}: {}", name, e),
        }
    })
}

/// Один потребитель на канал: порядок событий внутри канала сохраняется
fn consume<E>(mut events: mpsc::UnboundedReceiver<E>, aggregator: Arc<Aggregator>) -> JoinHandle<()>
where
    E: Into<CaptureEvent> + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            aggregator.apply(event.into());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::KeyCode;
    use crate::services::capture::FeedSink;
    use crate::stats::UnattributedPolicy;
    use std::time::Instant;

    /// Источник, который выдаёт заранее заданные события и ждёт остановки
    struct ScriptedSource<E> {
        name: &'static str,
        events: Vec<E>,
        become_ready: bool,
    }

    #[async_trait::async_trait]
    impl<E: Send + 'static> CaptureSource<E> for ScriptedSource<E> {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(self: Box<Self>, mut sink: FeedSink<E>) -> Result<()> {
            if !self.become_ready {
                return Err(KeyheatError::ServiceUnavailable(self.name.to_string()));
            }
            sink.set_ready(true);
            for event in self.events {
                sink.emit(event);
            }
            sink.stopped().await;
            Ok(())
        }
    }

    fn scripted<E>(name: &'static str, events: Vec<E>) -> Box<ScriptedSource<E>> {
        Box::new(ScriptedSource {
            name,
            events,
            become_ready: true,
        })
    }

    async fn wait_running(rx: &mut watch::Receiver<bool>, expected: bool) {
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|v| *v == expected))
            .await
            .expect("общий сигнал не изменился вовремя")
            .expect("сигнал закрыт");
    }

    #[tokio::test]
    async fn test_recorder_attributes_events_and_reports_readiness() {
        let start = Instant::now();
        let aggregator = Arc::new(Aggregator::new(UnattributedPolicy::Buffer { limit: 16 }));
        let recorder = Recorder::new(
            aggregator.clone(),
            scripted(
                "keyboard",
                vec![KeyPress::at(KeyCode(30), start + Duration::from_millis(10))],
            ),
            scripted::<MouseEvent>("mouse", Vec::new()),
            scripted("window", vec![WindowFocus::at("Editor", start)]),
        );

        let mut running = recorder.running_signal();
        recorder.start().unwrap();
        wait_running(&mut running, true).await;
        assert!(recorder.is_running());

        // Нажатие могло дойти раньше фокуса: тогда оно ждёт в буфере
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if aggregator
                    .lookup("Editor")
                    .map(|w| w.key_count(KeyCode(30)))
                    .unwrap_or(0)
                    == 1
                {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("нажатие не учтено");

        recorder.stop();
        wait_running(&mut running, false).await;
        assert!(recorder.join(Duration::from_secs(2)).await);
        assert!(!recorder.is_running());

        // Остановка не очищает статистику
        assert_eq!(aggregator.window_count(), 1);
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let recorder = Recorder::new(
            Arc::new(Aggregator::default()),
            scripted::<KeyPress>("keyboard", Vec::new()),
            scripted::<MouseEvent>("mouse", Vec::new()),
            scripted::<WindowFocus>("window", Vec::new()),
        );

        recorder.start().unwrap();
        assert!(matches!(recorder.start(), Err(KeyheatError::AlreadyRunning)));
        recorder.stop();
        recorder.stop();
        recorder.join(Duration::from_secs(2)).await;
    }

    #[tokio::test]
    async fn test_failed_source_keeps_recorder_not_ready() {
        let recorder = Recorder::new(
            Arc::new(Aggregator::default()),
            scripted::<KeyPress>("keyboard", Vec::new()),
            Box::new(ScriptedSource::<MouseEvent> {
                name: "mouse",
                events: Vec::new(),
                become_ready: false,
            }),
            scripted::<WindowFocus>("window", Vec::new()),
        );

        let running = recorder.running_signal();
        recorder.start().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!*running.borrow());
        assert!(!recorder.is_running());

        recorder.stop();
        recorder.join(Duration::from_secs(2)).await;
    }
}
