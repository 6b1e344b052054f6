use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinHandle;

use bunkmate_protocol::{AppError, AppResult};

use crate::errors::TRANSFER_RUNTIME_UNAVAILABLE;

pub type TransferTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub trait TransferTaskSpawner: Send + Sync {
    fn spawn(&self, task_name: &'static str, task: TransferTask) -> AppResult<JoinHandle<()>>;
}

fn runtime_unavailable(task_name: &'static str) -> AppError {
    AppError::new(
        TRANSFER_RUNTIME_UNAVAILABLE,
        "The background transfer runtime is not available",
    )
    .with_context("task", task_name)
}

#[derive(Default)]
pub struct TokioTransferTaskSpawner;

impl TransferTaskSpawner for TokioTransferTaskSpawner {
    fn spawn(&self, task_name: &'static str, task: TransferTask) -> AppResult<JoinHandle<()>> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(runtime_unavailable(task_name));
        }

        Ok(tokio::spawn(task))
    }
}

#[derive(Default)]
pub struct NoopTransferTaskSpawner;

impl TransferTaskSpawner for NoopTransferTaskSpawner {
    fn spawn(&self, task_name: &'static str, _task: TransferTask) -> AppResult<JoinHandle<()>> {
        Err(runtime_unavailable(task_name))
    }
}
