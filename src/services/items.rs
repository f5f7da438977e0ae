// Quantity handling for items. Quantities are short display strings ("2x",
// "500g"); only the leading run of decimal digits is treated as a number.

/// Direction of a quantity adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }
}

/// Adjust a quantity string by one.
///
/// Parses the leading digits (defaulting to 1 when absent or unparsable),
/// adds or subtracts 1 with a floor of 1, and rewrites the quantity as the
/// plain integer. Any non-numeric suffix is discarded: "2x" bumps to "3",
/// not "3x".
pub fn bump_quantity(current: &str, direction: Direction) -> String {
    let digits: String = current
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let mut n: i64 = digits.parse().unwrap_or(1);

    match direction {
        Direction::Up => n += 1,
        Direction::Down => {
            if n > 1 {
                n -= 1;
            }
        }
    }

    n.to_string()
}

/// Blank quantities fall back to "1" on add/edit.
pub fn normalize_quantity(quantity: &str) -> String {
    let trimmed = quantity.trim();
    if trimmed.is_empty() {
        "1".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_discards_suffix() {
        assert_eq!(bump_quantity("2x", Direction::Up), "3");
        assert_eq!(bump_quantity("500g", Direction::Up), "501");
        assert_eq!(bump_quantity("3", Direction::Up), "4");
    }

    #[test]
    fn decrement_floors_at_one() {
        assert_eq!(bump_quantity("1", Direction::Down), "1");
        assert_eq!(bump_quantity("2", Direction::Down), "1");
        assert_eq!(bump_quantity("1x", Direction::Down), "1");
    }

    #[test]
    fn non_numeric_defaults_to_one() {
        assert_eq!(bump_quantity("", Direction::Down), "1");
        assert_eq!(bump_quantity("um pacote", Direction::Down), "1");
        assert_eq!(bump_quantity("um pacote", Direction::Up), "2");
        // Absurdly long digit runs overflow the parse and fall back to 1
        assert_eq!(bump_quantity("99999999999999999999x", Direction::Up), "2");
    }

    #[test]
    fn normalize_blank_quantity() {
        assert_eq!(normalize_quantity(""), "1");
        assert_eq!(normalize_quantity("   "), "1");
        assert_eq!(normalize_quantity(" 2x "), "2x");
    }

    #[test]
    fn direction_from_path() {
        assert_eq!(Direction::from_path("up"), Some(Direction::Up));
        assert_eq!(Direction::from_path("down"), Some(Direction::Down));
        assert_eq!(Direction::from_path("sideways"), None);
    }
}
