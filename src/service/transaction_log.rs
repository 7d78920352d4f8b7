//! 交易记录
//!
//! 部署交易广播后以 `(hash, summary)` 形式登记，供用户查看历史。
//! 写入是 fire-and-forget：调用方不关心结果。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ethers::types::TxHash;
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub summary: String,
}

impl TransactionSummary {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }

    /// 跨链代币部署记录
    pub fn crosschain_deployment(
        chain_id: u64,
        name: &str,
        address: &ethers::types::Address,
    ) -> Self {
        Self::new(format!(
            "Deployment: chain {}; CROSSCHAIN TOKEN {} {}",
            chain_id,
            name,
            to_checksum(address, None)
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: TxHash,
    pub summary: String,
    pub added_time: DateTime<Utc>,
}

#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn add_transaction(&self, hash: TxHash, summary: TransactionSummary);
}

/// 内存实现，按添加顺序保存
#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    records: Arc<RwLock<Vec<TransactionRecord>>>,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<TransactionRecord> {
        self.records.read().await.clone()
    }

    pub async fn find(&self, hash: &TxHash) -> Option<TransactionRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| &r.hash == hash)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn add_transaction(&self, hash: TxHash, summary: TransactionSummary) {
        tracing::info!(tx_hash = ?hash, summary = %summary.summary, "Transaction added");

        self.records.write().await.push(TransactionRecord {
            hash,
            summary: summary.summary,
            added_time: Utc::now(),
        });
    }
}
