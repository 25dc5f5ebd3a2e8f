use alloy_primitives::U256;

use crate::error::EthereumUtilsError;

/// Encodes an integer as an execution JSON-RPC quantity (`0x` hex, no leading zeros).
pub fn to_quantity(value: u64) -> String {
    format!("{value:#x}")
}

/// Parses a quantity given either as `0x` hex or as a decimal string.
///
/// # Errors
/// Returns [`EthereumUtilsError::InvalidQuantity`] if the string is neither.
pub fn parse_quantity(value: &str) -> Result<u64, EthereumUtilsError> {
    let invalid = || EthereumUtilsError::InvalidQuantity(value.to_string());
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some("") => Err(invalid()),
        Some(digits) => u64::from_str_radix(digits, 16).map_err(|_| invalid()),
        None => value.parse().map_err(|_| invalid()),
    }
}

/// Same as [`parse_quantity`] for 256-bit integers.
///
/// # Errors
/// Returns [`EthereumUtilsError::InvalidQuantity`] if the string is not a valid quantity.
pub fn parse_u256_quantity(value: &str) -> Result<U256, EthereumUtilsError> {
    let invalid = || EthereumUtilsError::InvalidQuantity(value.to_string());
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some("") => Err(invalid()),
        Some(digits) => U256::from_str_radix(digits, 16).map_err(|_| invalid()),
        None => U256::from_str_radix(value, 10).map_err(|_| invalid()),
    }
}

#[cfg(test)]
mod test {
    use alloy_primitives::U256;

    use super::*;

    #[test]
    fn test_quantity() {
        assert_eq!("0x0", to_quantity(0));
        assert_eq!("0x1b4", to_quantity(436));
        assert_eq!(436, parse_quantity("0x1b4").unwrap());
        assert_eq!(436, parse_quantity("436").unwrap());
        assert_eq!(U256::from(7u64), parse_u256_quantity("0x7").unwrap());
        assert_eq!(U256::from(7u64), parse_u256_quantity("7").unwrap());
    }

    #[test]
    fn test_quantity_sad_paths() {
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("0xzz").is_err());
        assert!(parse_quantity("-1").is_err());
        assert!(parse_u256_quantity("").is_err());
    }
}
