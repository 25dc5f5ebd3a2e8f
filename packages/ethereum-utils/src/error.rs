#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EthereumUtilsError {
    #[error("invalid quantity `{0}`: expected a 0x-prefixed hex string or a decimal number")]
    InvalidQuantity(String),
}
