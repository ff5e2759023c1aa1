//! Sign byte plus little-endian magnitude, as carried by the
//! `SMALL_BIG_EXT` and `LARGE_BIG_EXT` tags.
//!
//! Zero is written with an empty magnitude. Decoding accepts any
//! magnitude, including zero-padded ones.

use num_bigint::BigInt;
use num_traits::Zero;

use super::Sign;

/// Rebuilds a signed integer from a sign byte (0 is positive, anything else
/// negative) and little-endian magnitude bytes.
pub fn decode_magnitude(sign: u8, magnitude: &[u8]) -> BigInt {
    BigInt::from_bytes_le(Sign::from(sign).into(), magnitude)
}

/// Splits an integer into its wire sign byte and minimal little-endian magnitude.
pub fn encode_magnitude(n: &BigInt) -> (u8, Vec<u8>) {
    if n.is_zero() {
        return (Sign::Positive.into(), Vec::new());
    }

    let (sign, magnitude) = n.to_bytes_le();
    let sign = match sign {
        num_bigint::Sign::Minus => Sign::Negative,
        _ => Sign::Positive,
    };

    (sign.into(), magnitude)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode() {
        assert_eq!(decode_magnitude(0, &[]), BigInt::zero());
        assert_eq!(decode_magnitude(1, &[]), BigInt::zero());
        assert_eq!(
            decode_magnitude(0, &[1, 2, 3, 4, 5, 6]),
            BigInt::from(6618611909121_i64)
        );
        assert_eq!(
            decode_magnitude(1, &[1, 2, 3, 4, 5, 6]),
            BigInt::from(-6618611909121_i64)
        );
        // any nonzero sign byte is negative
        assert_eq!(decode_magnitude(255, &[7]), BigInt::from(-7));
        assert_eq!(decode_magnitude(0, &[7, 0, 0]), BigInt::from(7));
    }

    #[test]
    fn encode() {
        assert_eq!(encode_magnitude(&BigInt::zero()), (0, vec![]));
        assert_eq!(
            encode_magnitude(&BigInt::from(6618611909121_i64)),
            (0, vec![1, 2, 3, 4, 5, 6])
        );
        assert_eq!(
            encode_magnitude(&BigInt::from(-6618611909121_i64)),
            (1, vec![1, 2, 3, 4, 5, 6])
        );
        assert_eq!(encode_magnitude(&BigInt::from(256)), (0, vec![0, 1]));
    }

    #[test]
    fn symmetric() {
        let n: BigInt = "-123456789012345678901234567890".parse().unwrap();
        let (sign, magnitude) = encode_magnitude(&n);
        assert_eq!(sign, 1);
        assert_ne!(magnitude.last(), Some(&0));
        assert_eq!(decode_magnitude(sign, &magnitude), n);
    }
}
