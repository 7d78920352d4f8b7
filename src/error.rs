//! 统一错误类型
//!
//! 部署/配置流程中所有可预期的失败都归入 [`DeployError`]，
//! 每个变体对应一个稳定的 [`DeployErrorCode`]，便于日志检索与前端提示。

use ethers::types::{Address, TxHash};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorCode {
    InvalidAddress,
    InvalidParameter,
    ChainNotSupported,
    ArtifactMissing,
    AbiError,
    GasEstimationFailed,
    RpcError,
    TransactionDropped,
    TransactionReverted,
    ContractAddressMissing,
}

impl DeployErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidAddress => "invalid_address",
            Self::InvalidParameter => "invalid_parameter",
            Self::ChainNotSupported => "chain_not_supported",
            Self::ArtifactMissing => "artifact_missing",
            Self::AbiError => "abi_error",
            Self::GasEstimationFailed => "gas_estimation_failed",
            Self::RpcError => "rpc_error",
            Self::TransactionDropped => "transaction_dropped",
            Self::TransactionReverted => "transaction_reverted",
            Self::ContractAddressMissing => "contract_address_missing",
        }
    }
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("chain {0} is not registered")]
    ChainNotSupported(u64),

    #[error("contract artifact `{0}` is not loaded")]
    ArtifactMissing(&'static str),

    #[error("abi error: {0}")]
    Abi(String),

    #[error("gas estimation failed: {0}")]
    GasEstimation(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("transaction {0:?} was dropped before a receipt was produced")]
    TransactionDropped(TxHash),

    #[error("transaction {0:?} reverted")]
    TransactionReverted(TxHash),

    #[error("deployment transaction {0:?} produced no contract address")]
    ContractAddressMissing(TxHash),
}

impl DeployError {
    pub fn code(&self) -> DeployErrorCode {
        match self {
            Self::InvalidAddress(_) => DeployErrorCode::InvalidAddress,
            Self::InvalidParameter(_) => DeployErrorCode::InvalidParameter,
            Self::ChainNotSupported(_) => DeployErrorCode::ChainNotSupported,
            Self::ArtifactMissing(_) => DeployErrorCode::ArtifactMissing,
            Self::Abi(_) => DeployErrorCode::AbiError,
            Self::GasEstimation(_) => DeployErrorCode::GasEstimationFailed,
            Self::Rpc(_) => DeployErrorCode::RpcError,
            Self::TransactionDropped(_) => DeployErrorCode::TransactionDropped,
            Self::TransactionReverted(_) => DeployErrorCode::TransactionReverted,
            Self::ContractAddressMissing(_) => DeployErrorCode::ContractAddressMissing,
        }
    }

    pub fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidAddress(address.into())
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn rpc(err: impl std::fmt::Display) -> Self {
        Self::Rpc(err.to_string())
    }

    /// 地址为零地址时的专用错误（部署参数中 vault / minter 不允许为零）
    pub fn zero_address(field: &str) -> Self {
        Self::InvalidAddress(format!("{field} must not be {:?}", Address::zero()))
    }
}

impl From<ethers::abi::Error> for DeployError {
    fn from(err: ethers::abi::Error) -> Self {
        Self::Abi(err.to_string())
    }
}

pub type DeployResult<T> = Result<T, DeployError>;
