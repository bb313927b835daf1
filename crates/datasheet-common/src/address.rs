//! A1-notation helpers. Rows and columns are 0-based on the Rust side.

/// `0 -> "A"`, `25 -> "Z"`, `26 -> "AA"`.
pub fn col_to_letters(col: u32) -> String {
    let mut n = col as u64 + 1;
    let mut buf = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        buf.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

/// Inverse of [`col_to_letters`]; case-insensitive.
pub fn letters_to_col(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 7 {
        return None;
    }
    let mut n: u64 = 0;
    for ch in s.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        n = n * 26 + (ch.to_ascii_uppercase() as u8 - b'A' + 1) as u64;
    }
    u32::try_from(n - 1).ok()
}

pub fn cell_to_a1(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letters(col), row as u64 + 1)
}

/// A parsed A1 cell reference with its anchor markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct A1Cell {
    pub row: u32,
    pub col: u32,
    pub row_abs: bool,
    pub col_abs: bool,
}

/// Parse `A1`, `$B$7`, `c10`… into 0-based coordinates.
pub fn parse_a1_cell(s: &str) -> Option<A1Cell> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let col_abs = bytes.first() == Some(&b'$');
    if col_abs {
        i += 1;
    }
    let col_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    let col = letters_to_col(&s[col_start..i])?;
    let row_abs = bytes.get(i) == Some(&b'$');
    if row_abs {
        i += 1;
    }
    let digits = &s[i..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some(A1Cell {
        row: row - 1,
        col,
        row_abs,
        col_abs,
    })
}
