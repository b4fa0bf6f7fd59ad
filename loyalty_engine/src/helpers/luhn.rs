/// Validates a decimal Luhn checksum over a non-negative integer.
///
/// Order numbers arrive as text, so callers parse them into a `u64` first; anything that does not parse is
/// rejected before this check runs.
pub fn valid_luhn(number: u64) -> bool {
    (number % 10 + checksum(number / 10)) % 10 == 0
}

/// Walks the digits right to left, doubling every other digit and casting out nines on the doubled digit.
fn checksum(mut number: u64) -> u64 {
    let mut sum = 0;
    let mut double = true;
    while number > 0 {
        let mut digit = number % 10;
        if double {
            digit *= 2;
            if digit > 9 {
                digit = digit % 10 + digit / 10;
            }
        }
        sum += digit;
        double = !double;
        number /= 10;
    }
    sum % 10
}

#[cfg(test)]
mod test {
    use super::*;

    /// Textbook implementation over the decimal string form, used as the reference.
    fn reference_luhn(digits: &str) -> bool {
        let sum: u32 = digits
            .chars()
            .rev()
            .map(|c| c.to_digit(10).unwrap())
            .enumerate()
            .map(|(i, d)| {
                if i % 2 == 1 {
                    let doubled = d * 2;
                    if doubled > 9 {
                        doubled - 9
                    } else {
                        doubled
                    }
                } else {
                    d
                }
            })
            .sum();
        sum % 10 == 0
    }

    #[test]
    fn known_valid_numbers() {
        for n in [0u64, 18, 26, 79927398713, 2377225624, 5062821234567892, 4561261212345467] {
            assert!(valid_luhn(n), "{n} should pass");
        }
    }

    #[test]
    fn known_invalid_numbers() {
        for n in [1u64, 11, 123456, 79927398710, 5062821234567891, 5062821234567893] {
            assert!(!valid_luhn(n), "{n} should fail");
        }
    }

    #[test]
    fn agrees_with_reference_for_all_lengths() {
        // A deterministic walk over numbers spanning every decimal length from 1 to 19 digits.
        let mut n: u64 = 7;
        while n < 10_000_000_000_000_000_000 {
            for offset in 0..25 {
                let candidate = n.wrapping_add(offset);
                assert_eq!(
                    valid_luhn(candidate),
                    reference_luhn(&candidate.to_string()),
                    "disagreement on {candidate}"
                );
            }
            n = n.saturating_mul(10).saturating_add(3);
        }
    }
}
