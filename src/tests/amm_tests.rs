//! Constant-product quoting and USD conversion

#[cfg(test)]
mod tests {
    use crate::compute::amm::{amount_in, amount_out, fee_fraction, pow10, quote};
    use crate::compute::usd::{compute_value_usd, denominate, normalize_usd};
    use crate::compute::ComputeError;
    use crate::tests::support::dec;
    use bigdecimal::{BigDecimal, Zero};

    #[test]
    fn test_quote_of_zero_is_zero() {
        assert_eq!(quote(&dec("0"), &dec("10"), &dec("99")).unwrap(), dec("0"));
        assert_eq!(quote(&dec("0"), &dec("0"), &dec("99")).unwrap(), dec("0"));
    }

    #[test]
    fn test_quote_with_equal_reserves_is_identity() {
        let amount = dec("123456789012345678901234567890");
        let reserve = dec("987654321098765432109876543210");
        assert_eq!(quote(&amount, &reserve, &reserve).unwrap(), amount);
    }

    #[test]
    fn test_quote_truncates_and_is_monotone() {
        let r_in = dec("3");
        let r_out = dec("10");
        assert_eq!(quote(&dec("1"), &r_in, &r_out).unwrap(), dec("3"));

        let mut previous = BigDecimal::zero();
        for amount in 0..50 {
            let current = quote(&BigDecimal::from(amount), &r_in, &r_out).unwrap();
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_quote_rejects_empty_reserve() {
        assert!(matches!(
            quote(&dec("5"), &dec("0"), &dec("10")),
            Err(ComputeError::Arithmetic(_))
        ));
    }

    #[test]
    fn test_amount_out_applies_fee() {
        // 1000 in against 1_000_000/1_000_000 at 0.3%
        let out = amount_out(&dec("1000"), &dec("1000000"), &dec("1000000"), 300).unwrap();
        assert_eq!(out, dec("996"));
    }

    #[test]
    fn test_amount_in_rounds_up() {
        let needed = amount_in(&dec("996"), &dec("1000000"), &dec("1000000"), 300).unwrap();
        assert_eq!(needed, dec("1000"));
        assert!(amount_out(&needed, &dec("1000000"), &dec("1000000"), 300).unwrap() >= dec("996"));
    }

    #[test]
    fn test_amount_in_rejects_draining_the_reserve() {
        assert!(amount_in(&dec("10"), &dec("10"), &dec("10"), 300).is_err());
    }

    #[test]
    fn test_pow10_handles_both_signs() {
        assert_eq!(pow10(3), dec("1000"));
        assert_eq!(pow10(-2), dec("0.01"));
        assert_eq!(pow10(0), dec("1"));
    }

    #[test]
    fn test_fee_fraction_uses_contract_units() {
        assert_eq!(fee_fraction(300), dec("0.003"));
        assert_eq!(fee_fraction(100_000), dec("1"));
    }

    #[test]
    fn test_usd_value_of_raw_amount() {
        // 2.5 tokens with 6 decimals at 4 USD
        assert_eq!(denominate(&dec("2500000"), 6), dec("2.5"));
        assert_eq!(compute_value_usd(&dec("2500000"), 6, &dec("4")), dec("10"));
        assert_eq!(normalize_usd(&dec("10"), &dec("0.5")).unwrap(), dec("20"));
        assert!(normalize_usd(&dec("10"), &dec("0")).is_err());
    }
}
