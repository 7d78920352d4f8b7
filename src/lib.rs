//! crosschain-deployer - 跨链桥代币部署与 RouterConfig 登记
//!
//! 链配置注册表 + 合约部署编排 + 部署页面控制器。
//! 签名、ABI 编码、交易广播全部委托给 ethers-rs。

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use error::{DeployError, DeployErrorCode, DeployResult};

pub mod prelude {
    pub use crate::{
        config::Config,
        domain::{ChainEntry, ChainRegistry, DeploymentParams, SwapConfig, TokenConfig},
        error::{DeployError, DeployErrorCode, DeployResult},
        service::{
            ChainClient, CrosschainTokenController, DeploymentOrchestrator, RouterConfigContract,
            TransactionLog, WalletContext,
        },
    };
}
