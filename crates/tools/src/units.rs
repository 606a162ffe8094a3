//! Wei/ether conversion on 256-bit quantities

use ethers::types::U256;
use thiserror::Error;

/// Decimals between wei and ether
pub const ETHER_DECIMALS: usize = 18;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("invalid decimal amount: {0:?}")]
    InvalidAmount(String),
}

/// Render `value / 10^decimals` exactly, without trailing fractional zeros.
pub fn format_units(value: U256, decimals: usize) -> String {
    let (whole, fraction) = value.div_mod(U256::exp10(decimals));
    if fraction.is_zero() {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Wei to ether, e.g. `2500000000000000000` -> `"2.5"`
pub fn format_ether(wei: U256) -> String {
    format_units(wei, ETHER_DECIMALS)
}

/// Parse a base-10 integer amount such as a seeded balance.
pub fn parse_amount(amount: &str) -> Result<U256, UnitsError> {
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UnitsError::InvalidAmount(amount.to_string()));
    }
    U256::from_dec_str(amount).map_err(|_| UnitsError::InvalidAmount(amount.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(value: &str) -> U256 {
        parse_amount(value).unwrap()
    }

    #[test]
    fn test_format_fractional_ether() {
        assert_eq!(format_ether(wei("2500000000000000000")), "2.5");
        assert_eq!(format_ether(wei("1")), "0.000000000000000001");
        assert_eq!(format_ether(wei("123456789012345678901")), "123.456789012345678901");
    }

    #[test]
    fn test_format_whole_ether() {
        assert_eq!(format_ether(U256::zero()), "0");
        assert_eq!(format_ether(wei("1000000000000000000000000")), "1000000");
    }

    #[test]
    fn test_format_full_width() {
        assert_eq!(
            format_ether(U256::MAX),
            "115792089237316195423570985008687907853269984665640564039457.584007913129639935"
        );
    }

    #[test]
    fn test_format_units_without_decimals() {
        assert_eq!(format_units(wei("42"), 0), "42");
        assert_eq!(format_units(wei("4200"), 2), "42");
    }

    #[test]
    fn test_parse_amount_rejects_non_digits() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("1e18").is_err());
        // 2^256
        assert!(parse_amount(
            "115792089237316195423570985008687907853269984665640564039457584007913129639936"
        )
        .is_err());
    }
}
