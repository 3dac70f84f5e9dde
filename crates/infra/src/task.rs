//! # 遅延タスク実行
//!
//! リクエスト処理の完了を待たずに実行する処理（バックグラウンド送信）を受け付ける。
//!
//! 呼び出し側はタスクを渡した時点で制御を取り戻し、結果は受け取らない。
//! タスク内の失敗はタスク自身がログに出力する。

use std::{future::Future, pin::Pin};

use tokio::runtime::Handle;

use crate::InfraError;

/// 遅延実行する処理の単位
pub type DeferredTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// 遅延タスク実行トレイト
pub trait DeferredTaskRunner: Send + Sync {
    /// タスクを登録する
    ///
    /// タスクの完了を待たずに戻る。
    fn add_task(&self, task: DeferredTask);
}

/// tokio ランタイム上でタスクを実行するランナー
#[derive(Debug, Clone)]
pub struct TokioTaskRunner {
    handle: Handle,
}

impl TokioTaskRunner {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// 現在の tokio ランタイムのハンドルで作成する
    ///
    /// ランタイム外から呼び出した場合はエラーを返す。
    pub fn current() -> Result<Self, InfraError> {
        let handle = Handle::try_current().map_err(|e| InfraError::unexpected(e.to_string()))?;
        Ok(Self::new(handle))
    }
}

impl DeferredTaskRunner for TokioTaskRunner {
    fn add_task(&self, task: DeferredTask) {
        // JoinHandle は保持しない（タスクはデタッチされて実行を続ける）
        self.handle.spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn test_登録したタスクがランタイム上で実行される() {
        let runner = TokioTaskRunner::current().unwrap();
        let (tx, rx) = oneshot::channel();

        runner.add_task(Box::pin(async move {
            let _ = tx.send("done");
        }));

        assert_eq!(rx.await.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_add_taskはタスクの完了を待たずに戻る() {
        let runner = TokioTaskRunner::current().unwrap();
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = oneshot::channel();

        runner.add_task(Box::pin(async move {
            let _ = release_rx.await;
            let _ = done_tx.send(());
        }));

        // ここに到達した時点でタスクはまだ解放待ち
        release_tx.send(()).unwrap();
        done_rx.await.unwrap();
    }

    #[test]
    fn test_ランタイム外ではcurrentがエラーを返す() {
        assert!(TokioTaskRunner::current().is_err());
    }
}
