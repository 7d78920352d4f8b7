pub mod chain_client;
pub mod crosschain_token_controller;
pub mod deployment_orchestrator;
pub mod router_config;
pub mod transaction_log;

pub use chain_client::{
    CallReceipt, ChainClient, DeployHooks, DeployReceipt, EthersChainClient, NoopHooks,
    SignerClient,
};
pub use crosschain_token_controller::{CrosschainTokenController, WalletContext};
pub use deployment_orchestrator::{
    AddTokenParams, DeploymentOrchestrator, DeploymentRecord, RegistrationRequest,
};
pub use router_config::{router_config_abi, RouterConfigContract};
pub use transaction_log::{
    InMemoryTransactionLog, TransactionLog, TransactionRecord, TransactionSummary,
};
