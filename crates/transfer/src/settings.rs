use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TRANSFER_PORT: u16 = 38466;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferSettings {
    pub port: u16,
    pub chunk_size_bytes: u32,
    pub connect_timeout_ms: u64,
    pub stall_timeout_ms: u64,
    pub chunk_pacing_ms: u64,
    pub read_buffer_bytes: u32,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_TRANSFER_PORT,
            chunk_size_bytes: 4096,
            connect_timeout_ms: 8_000,
            stall_timeout_ms: 60_000,
            chunk_pacing_ms: 0,
            read_buffer_bytes: 8192,
        }
    }
}

impl TransferSettings {
    pub fn normalized(mut self) -> Self {
        self.chunk_size_bytes = self.chunk_size_bytes.clamp(512, 65_536);
        self.connect_timeout_ms = self.connect_timeout_ms.clamp(1_000, 60_000);
        self.stall_timeout_ms = self.stall_timeout_ms.clamp(1_000, 600_000);
        self.chunk_pacing_ms = self.chunk_pacing_ms.min(1_000);
        self.read_buffer_bytes = self.read_buffer_bytes.clamp(1_024, 65_536);
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }

    pub fn chunk_pacing(&self) -> Duration {
        Duration::from_millis(self.chunk_pacing_ms)
    }
}
