//! 防抖
//!
//! 静默一段时间后才执行动作；每次新输入都会取消并重新计时

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

type Action<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

/// 可取消的延迟执行
///
/// 被 drop 时取消尚未执行的动作。必须在 tokio 运行时内使用
pub struct Debouncer<T> {
    delay: Duration,
    action: Action<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            action: Arc::new(move |value| action(value).boxed()),
            pending: None,
        }
    }

    /// 安排在静默 `delay` 之后执行动作，取消之前安排的那一次
    ///
    /// 上一次的动作即使已经开始执行也会被取消，其结果不再有意义
    pub fn call(&mut self, value: T) {
        self.cancel();

        let action = Arc::clone(&self.action);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action(value).await;
        }));
    }

    /// 取消尚未完成的动作
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// 是否有尚未完成的动作
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Debouncer<String>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let debouncer = Debouncer::new(Duration::from_millis(30), move |value: String| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(value);
            }
        });
        (calls, debouncer)
    }

    #[tokio::test]
    async fn test_only_last_input_fires() {
        let (calls, mut debouncer) = recorder();
        for text in ["三", "三体", "三体2"] {
            debouncer.call(text.to_string());
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*calls.lock().unwrap(), vec!["三体2".to_string()]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test]
    async fn test_cancel_prevents_action() {
        let (calls, mut debouncer) = recorder();
        debouncer.call("x".to_string());
        debouncer.cancel();

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drop_cancels_pending_action() {
        let (calls, mut debouncer) = recorder();
        debouncer.call("x".to_string());
        drop(debouncer);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(calls.lock().unwrap().is_empty());
    }
}
