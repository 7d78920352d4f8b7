//! Domain 模块
//!
//! 链配置与跨链代币值对象

pub mod chain_config;
pub mod token;

// 重新导出常用类型
pub use chain_config::{
    BridgeTokenSet, BridgeVersion, ChainEntry, ChainRegistry, NetworkType, TokenListEntry,
};
pub use token::{token_id, DeploymentParams, SwapConfig, TokenConfig, UnderlyingToken};
