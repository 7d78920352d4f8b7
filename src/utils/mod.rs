pub mod address_validator;

pub use address_validator::{AddressValidator, EVM_ADDRESS_REGEXP, ZERO_ADDRESS};
