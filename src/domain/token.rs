//! 跨链代币领域模型
//!
//! 部署参数、RouterConfig 合约的 TokenConfig / SwapConfig 值对象。

use ethers::abi::Token;
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{DeployError, DeployResult};
use crate::utils::AddressValidator;

/// 部署后的跨链代币合约版本号（AnyswapV6ERC20）
pub const CONTRACT_VERSION: u64 = 6;

/// 每百万分之一的手续费率
pub const SWAP_FEE_RATE_PER_MILLION: u64 = 1000;

/// 表单中"小数位未知"的占位值
pub const UNKNOWN_DECIMALS: i32 = -1;

/// 源链上的原始代币（来自用户输入/链上读取，字段可能不完整）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderlyingToken {
    pub address: String,
    pub name: String,
    pub symbol: String,
    /// -1 表示尚未读取到
    pub decimals: i32,
    /// 原始代币所在链
    pub network_id: Option<u64>,
}

impl UnderlyingToken {
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: i32,
    ) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            network_id: None,
        }
    }

    pub fn with_network_id(mut self, network_id: u64) -> Self {
        self.network_id = Some(network_id);
        self
    }

    /// 地址、名称、符号非空且小数位已知（0..=255）
    pub fn is_complete(&self) -> bool {
        !self.address.is_empty()
            && !self.name.is_empty()
            && !self.symbol.is_empty()
            && self.decimals > UNKNOWN_DECIMALS
            && self.decimals_u8().is_ok()
    }

    /// 小数位转换为合约使用的 uint8
    pub fn decimals_u8(&self) -> DeployResult<u8> {
        u8::try_from(self.decimals).map_err(|_| {
            DeployError::invalid_parameter(format!("decimals out of range: {}", self.decimals))
        })
    }

    /// 跨链代币名称
    pub fn crosschain_name(&self) -> String {
        format!("Crosschain{}", self.name)
    }

    /// 跨链代币符号
    pub fn crosschain_symbol(&self) -> String {
        format!("CC{}", self.symbol)
    }
}

/// 部署一个跨链代币所需的全部参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentParams {
    pub chain_id: u64,
    pub account: Address,
    pub underlying: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub vault: Address,
    pub minter: Address,
}

impl DeploymentParams {
    /// 构造参数校验：名称/符号非空，vault 与 minter 非零地址
    pub fn validate(&self) -> DeployResult<()> {
        if self.name.trim().is_empty() {
            return Err(DeployError::invalid_parameter("name must not be empty"));
        }
        if self.symbol.trim().is_empty() {
            return Err(DeployError::invalid_parameter("symbol must not be empty"));
        }
        if AddressValidator::is_zero(&self.vault) {
            return Err(DeployError::zero_address("vault"));
        }
        if AddressValidator::is_zero(&self.minter) {
            return Err(DeployError::zero_address("minter"));
        }
        Ok(())
    }

    /// AnyswapV6ERC20 构造函数参数：(name, symbol, decimals, underlying, vault, minter)
    pub fn constructor_args(&self) -> Vec<Token> {
        vec![
            Token::String(self.name.clone()),
            Token::String(self.symbol.clone()),
            Token::Uint(U256::from(self.decimals)),
            Token::Address(self.underlying),
            Token::Address(self.vault),
            Token::Address(self.minter),
        ]
    }
}

/// 代币 ID：`{chain_id}{NAME}`
///
/// 该格式未经 RouterConfig 合约方确认，只在此处拼接，调用方不要依赖其结构。
pub fn token_id(chain_id: u64, name: &str) -> String {
    format!("{}{}", chain_id, name.to_uppercase())
}

/// RouterConfig.TokenConfig
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub decimals: u8,
    pub contract_address: Address,
    pub contract_version: U256,
}

impl TokenConfig {
    pub fn new(decimals: u8, contract_address: Address) -> Self {
        Self {
            decimals,
            contract_address,
            contract_version: U256::from(CONTRACT_VERSION),
        }
    }

    /// 合约中未登记的代币返回零地址
    pub fn is_registered(&self) -> bool {
        !self.contract_address.is_zero()
    }

    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::Uint(U256::from(self.decimals)),
            Token::Address(self.contract_address),
            Token::Uint(self.contract_version),
        ])
    }

    /// 从 `getTokenConfig` 的返回值解析
    pub fn from_token(token: Token) -> DeployResult<Self> {
        let fields = match token {
            Token::Tuple(fields) if fields.len() == 3 => fields,
            other => {
                return Err(DeployError::Abi(format!(
                    "unexpected TokenConfig shape: {other:?}"
                )))
            }
        };

        let mut fields = fields.into_iter();
        let decimals = fields.next().and_then(Token::into_uint);
        let contract_address = fields.next().and_then(Token::into_address);
        let contract_version = fields.next().and_then(Token::into_uint);

        match (decimals, contract_address, contract_version) {
            (Some(decimals), Some(contract_address), Some(contract_version)) => {
                if decimals > U256::from(u8::MAX) {
                    return Err(DeployError::Abi(format!(
                        "TokenConfig decimals out of range: {decimals}"
                    )));
                }
                Ok(Self {
                    decimals: decimals.low_u32() as u8,
                    contract_address,
                    contract_version,
                })
            }
            _ => Err(DeployError::Abi(
                "TokenConfig fields have unexpected types".to_string(),
            )),
        }
    }
}

/// RouterConfig.SwapConfig
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapConfig {
    pub maximum_swap: U256,
    pub minimum_swap: U256,
    pub big_value_threshold: U256,
    pub swap_fee_rate_per_million: U256,
    pub maximum_swap_fee: U256,
    pub minimum_swap_fee: U256,
}

impl SwapConfig {
    /// 新代币的默认兑换限额（单位 10^18）
    pub fn default_limits() -> Self {
        let unit = U256::exp10(18);
        Self {
            maximum_swap: U256::from(1_000_000u64) * unit,
            minimum_swap: U256::from(100u64) * unit,
            big_value_threshold: U256::from(100_000u64) * unit,
            swap_fee_rate_per_million: U256::from(SWAP_FEE_RATE_PER_MILLION),
            maximum_swap_fee: U256::from(10u64) * unit,
            // 1.5 * 10^18
            minimum_swap_fee: U256::from(15u64) * U256::exp10(17),
        }
    }

    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::Uint(self.maximum_swap),
            Token::Uint(self.minimum_swap),
            Token::Uint(self.big_value_threshold),
            Token::Uint(self.swap_fee_rate_per_million),
            Token::Uint(self.maximum_swap_fee),
            Token::Uint(self.minimum_swap_fee),
        ])
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self::default_limits()
    }
}
