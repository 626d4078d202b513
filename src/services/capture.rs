//! Общий контракт источников захвата.
//!
//! Источник получает `FeedSink`: канал для событий, свой сигнал готовности и
//! сигнал остановки. Пока источник жив и захватывает события, готовность true;
//! когда `FeedSink` уничтожается (источник завершился или упал), она сбрасывается в false.

use crate::error::Result;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// Источник событий одного типа
#[async_trait::async_trait]
pub trait CaptureSource<E: Send + 'static>: Send {
    fn name(&self) -> &'static str;

    /// Захватывать события до сигнала остановки. Повторный запуск не поддерживается.
    async fn run(self: Box<Self>, sink: FeedSink<E>) -> Result<()>;
}

/// Булев сигнал «источник сейчас захватывает события»
pub struct ReadinessSignal {
    tx: watch::Sender<bool>,
}

impl Default for ReadinessSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn set(&self, ready: bool) {
        self.tx.send_if_modified(|current| {
            if *current == ready {
                false
            } else {
                *current = ready;
                true
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Общий сигнал остановки для всех источников
pub struct StopSignal {
    tx: watch::Sender<bool>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Выход источника: события, готовность, остановка
pub struct FeedSink<E> {
    events: mpsc::UnboundedSender<E>,
    ready: ReadinessSignal,
    stop: watch::Receiver<bool>,
}

impl<E> FeedSink<E> {
    pub fn new(
        events: mpsc::UnboundedSender<E>,
        ready: ReadinessSignal,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Self {
            events,
            ready,
            stop,
        }
    }

    /// Отправить событие. false, если потребитель уже закрыт.
    pub fn emit(&self, event: E) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.set(ready);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow() || self.events.is_closed()
    }

    /// Дождаться сигнала остановки (или исчезновения его отправителя)
    pub async fn stopped(&mut self) {
        let _ = self.stop.wait_for(|stopped| *stopped).await;
    }
}

impl<E> Drop for FeedSink<E> {
    fn drop(&mut self) {
        self.ready.set(false);
    }
}

/// Канал событий вместе с подпиской на готовность его источника
pub struct Feed<E> {
    pub sink: FeedSink<E>,
    pub events: mpsc::UnboundedReceiver<E>,
    pub ready: watch::Receiver<bool>,
}

impl<E> Feed<E> {
    pub fn new(stop: &StopSignal) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let readiness = ReadinessSignal::new();
        let ready = readiness.subscribe();
        Self {
            sink: FeedSink::new(tx, readiness, stop.subscribe()),
            events: rx,
            ready,
        }
    }
}

/// Производный сигнал: пересчитывается при каждом изменении любого из трёх входов
pub fn combine_readiness(
    mut keyboard: watch::Receiver<bool>,
    mut mouse: watch::Receiver<bool>,
    mut window: watch::Receiver<bool>,
    output: watch::Sender<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let combined = *keyboard.borrow_and_update()
                && *mouse.borrow_and_update()
                && *window.borrow_and_update();
            output.send_if_modified(|current| {
                if *current == combined {
                    false
                } else {
                    *current = combined;
                    true
                }
            });

            let source_gone = tokio::select! {
                changed = keyboard.changed() => changed.is_err(),
                changed = mouse.changed() => changed.is_err(),
                changed = window.changed() => changed.is_err(),
                _ = output.closed() => break,
            };

            if source_gone {
                // Источники не перезапускаются: без любого из них сбор остановлен
                output.send_replace(false);
                debug!("Один из источников завершился, общий сигнал готовности сброшен");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn wait_value(rx: &mut watch::Receiver<bool>, expected: bool) {
        tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|v| *v == expected))
            .await
            .expect("сигнал не изменился вовремя")
            .expect("отправитель сигнала исчез");
    }

    #[tokio::test]
    async fn test_combined_readiness_is_logical_and() {
        let keyboard = ReadinessSignal::new();
        let mouse = ReadinessSignal::new();
        let window = ReadinessSignal::new();
        let (tx, mut rx) = watch::channel(false);

        let _task = combine_readiness(keyboard.subscribe(), mouse.subscribe(), window.subscribe(), tx);

        keyboard.set(true);
        mouse.set(true);
        assert!(!*rx.borrow());

        window.set(true);
        wait_value(&mut rx, true).await;

        mouse.set(false);
        wait_value(&mut rx, false).await;

        mouse.set(true);
        wait_value(&mut rx, true).await;
    }

    #[tokio::test]
    async fn test_dropped_sink_resets_readiness() {
        let stop = StopSignal::new();
        let feed: Feed<u32> = Feed::new(&stop);
        let mut ready = feed.ready.clone();

        feed.sink.set_ready(true);
        assert!(*ready.borrow_and_update());

        drop(feed.sink);
        assert!(!*ready.borrow());
    }

    #[tokio::test]
    async fn test_sink_observes_stop() {
        let stop = StopSignal::new();
        let feed: Feed<u32> = Feed::new(&stop);
        let mut sink = feed.sink;

        assert!(!sink.is_stopped());
        assert!(sink.emit(7));

        stop.stop();
        tokio::time::timeout(Duration::from_secs(1), sink.stopped())
            .await
            .unwrap();
        assert!(sink.is_stopped());
    }
}
