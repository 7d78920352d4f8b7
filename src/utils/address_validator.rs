//! 地址验证模块
//!
//! EVM 地址格式校验 + EIP-55 Checksum 校验

use ethers::types::Address;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DeployError, DeployResult};

/// 0x 前缀 + 40 位十六进制
pub static EVM_ADDRESS_REGEXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[A-Fa-f0-9]{40}$").expect("valid regex literal"));

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// 地址验证器
pub struct AddressValidator;

impl AddressValidator {
    /// 仅检查格式（不做 checksum 校验）
    pub fn is_valid_format(address: &str) -> bool {
        EVM_ADDRESS_REGEXP.is_match(address)
    }

    /// 格式 + EIP-55 Checksum 校验
    ///
    /// 全小写或全大写地址视为未携带 checksum，直接通过。
    pub fn is_valid(address: &str) -> bool {
        if !Self::is_valid_format(address) {
            return false;
        }

        let hex_part = &address[2..];
        let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());

        if has_lower && has_upper {
            return Self::verify_eip55_checksum(address);
        }

        true
    }

    /// 解析为 [`Address`]，非法时返回 [`DeployError::InvalidAddress`]
    pub fn parse(address: &str) -> DeployResult<Address> {
        if !Self::is_valid(address) {
            return Err(DeployError::invalid_address(address));
        }
        address
            .parse::<Address>()
            .map_err(|_| DeployError::invalid_address(address))
    }

    /// 零地址视为"不存在"
    pub fn is_zero(address: &Address) -> bool {
        address.is_zero()
    }

    /// https://eips.ethereum.org/EIPS/eip-55
    fn verify_eip55_checksum(address: &str) -> bool {
        use sha3::{Digest, Keccak256};

        let addr_lower = address[2..].to_lowercase();
        let mut hasher = Keccak256::new();
        hasher.update(addr_lower.as_bytes());
        let hash = hasher.finalize();

        address[2..].chars().enumerate().all(|(i, ch)| {
            if !ch.is_ascii_alphabetic() {
                return true;
            }
            let hash_byte = hash[i / 2];
            let hash_nibble = if i % 2 == 0 {
                hash_byte >> 4
            } else {
                hash_byte & 0x0f
            };
            ch.is_ascii_uppercase() == (hash_nibble >= 8)
        })
    }
}
