use bunkmate_protocol::AppResult;
use bunkmate_protocol::models::TransferProgressSnapshotDto;

pub trait TransferEventSink: Send + Sync {
    fn emit_progress(&self, snapshot: &TransferProgressSnapshotDto) -> AppResult<()>;
}

pub struct NoopTransferEventSink;

impl TransferEventSink for NoopTransferEventSink {
    fn emit_progress(&self, _snapshot: &TransferProgressSnapshotDto) -> AppResult<()> {
        Ok(())
    }
}
