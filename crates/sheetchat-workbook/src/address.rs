//! A1-style cell addressing
//!
//! Rows and columns are exposed 0-based; letters form a bijective base-26
//! column number (`A` = 1, `Z` = 26, `AA` = 27).

use crate::error::{Result, WorkbookError};
use crate::model::CellRange;
use once_cell::sync::Lazy;
use regex::Regex;

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]+)(\d+)$").expect("valid address regex"));

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^!]+)!([A-Z]+\d+):([A-Z]+\d+)$").expect("valid range regex")
});

static SHEET_ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^!]+)!([A-Z]+\d+)$").expect("valid sheet address regex"));

/// `"B3"` -> `(2, 1)`
pub fn address_to_rc(address: &str) -> Result<(u32, u32)> {
    let invalid = || WorkbookError::InvalidAddress(address.to_string());

    let caps = ADDRESS_RE.captures(address).ok_or_else(invalid)?;

    let row: u32 = caps[2].parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }

    let mut col: u32 = 0;
    for byte in caps[1].bytes() {
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(u32::from(byte - b'A' + 1)))
            .ok_or_else(invalid)?;
    }

    Ok((row - 1, col - 1))
}

/// `(2, 1)` -> `"B3"`
pub fn rc_to_address(row: u32, col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = u64::from(col) + 1;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    letters.reverse();

    // Only ASCII uppercase letters are pushed above
    let column: String = letters.into_iter().map(char::from).collect();
    format!("{}{}", column, u64::from(row) + 1)
}

/// Parse `"<sheet>!<from>:<to>"`. Any other shape yields `None`.
///
/// The UI's `@` mention sigil is not stripped here.
pub fn parse_range(text: &str) -> Option<CellRange> {
    let caps = RANGE_RE.captures(text)?;
    Some(CellRange {
        sheet: caps[1].to_string(),
        from: caps[2].to_string(),
        to: caps[3].to_string(),
    })
}

/// Split `"@Sheet1!B2"` into `("Sheet1", "B2")`.
///
/// Returns `None` when the text carries no sheet prefix.
pub fn split_sheet_address(text: &str) -> Option<(String, String)> {
    let text = text.strip_prefix('@').unwrap_or(text);
    let caps = SHEET_ADDRESS_RE.captures(text)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_to_rc() {
        assert_eq!(address_to_rc("A1").unwrap(), (0, 0));
        assert_eq!(address_to_rc("Z1").unwrap(), (0, 25));
        assert_eq!(address_to_rc("AA1").unwrap(), (0, 26));
        assert_eq!(address_to_rc("AB2").unwrap(), (1, 27));
        assert_eq!(address_to_rc("ZZ10").unwrap(), (9, 701));
        assert_eq!(address_to_rc("AAA1").unwrap(), (0, 702));
    }

    #[test]
    fn test_address_to_rc_rejects_bad_input() {
        for bad in ["", "A", "1", "a1", "A0", "1A", "A1B", "Sheet1!A1", " A1"] {
            match address_to_rc(bad) {
                Err(WorkbookError::InvalidAddress(addr)) => assert_eq!(addr, bad),
                other => panic!("Expected InvalidAddress for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_rc_to_address() {
        assert_eq!(rc_to_address(0, 0), "A1");
        assert_eq!(rc_to_address(0, 25), "Z1");
        assert_eq!(rc_to_address(0, 26), "AA1");
        assert_eq!(rc_to_address(1, 27), "AB2");
        assert_eq!(rc_to_address(9, 701), "ZZ10");
    }

    #[test]
    fn test_address_inverse() {
        for col in [0, 1, 25, 26, 51, 52, 701, 702, 16383] {
            for row in [0, 9, 1_048_575] {
                let address = rc_to_address(row, col);
                assert_eq!(address_to_rc(&address).unwrap(), (row, col), "{}", address);
            }
        }
    }

    #[test]
    fn test_parse_range() {
        let range = parse_range("Sheet1!A1:B3").unwrap();
        assert_eq!(range.sheet, "Sheet1");
        assert_eq!(range.from, "A1");
        assert_eq!(range.to, "B3");

        let range = parse_range("My Data!C2:C2").unwrap();
        assert_eq!(range.sheet, "My Data");
    }

    #[test]
    fn test_parse_range_mismatch_is_none() {
        assert!(parse_range("A1:B3").is_none());
        assert!(parse_range("Sheet1!A1").is_none());
        assert!(parse_range("Sheet1!a1:b3").is_none());
        assert!(parse_range("@Sheet1!A1:B3").is_some_and(|r| r.sheet == "@Sheet1"));
    }

    #[test]
    fn test_split_sheet_address() {
        assert_eq!(
            split_sheet_address("Sheet1!D2"),
            Some(("Sheet1".to_string(), "D2".to_string()))
        );
        assert_eq!(
            split_sheet_address("@Totals!E6"),
            Some(("Totals".to_string(), "E6".to_string()))
        );
        assert_eq!(split_sheet_address("D2"), None);
    }
}
