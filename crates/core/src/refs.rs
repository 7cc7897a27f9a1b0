// Cell and range references in A1 notation.
//
// Rows and columns are 0-indexed internally; A1 text is 1-indexed.

use serde::{Deserialize, Serialize};

/// Error parsing an A1 reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefParseError(pub String);

impl std::fmt::Display for RefParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid range reference: {}", self.0)
    }
}

impl std::error::Error for RefParseError {}

/// Convert 0-indexed column to letter (0 = A, 25 = Z, 26 = AA, etc.)
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Convert a column letter run to its 0-indexed column (A = 0, AA = 26).
pub fn letter_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut col: usize = 0;
    for ch in letters.chars() {
        let c = ch.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return None;
        }
        col = col * 26 + (c as usize - 'A' as usize + 1);
    }
    Some(col - 1)
}

/// A single cell position, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Format as A1 notation.
    pub fn to_a1(&self) -> String {
        format!("{}{}", col_to_letter(self.col), self.row + 1)
    }

    /// Parse a single-cell reference like "B7". Absolute markers ($) are
    /// accepted and ignored.
    pub fn parse(text: &str) -> Result<Self, RefParseError> {
        let cleaned: String = text.trim().chars().filter(|c| *c != '$').collect();
        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| RefParseError(text.to_string()))?;
        let (letters, digits) = cleaned.split_at(split);
        let col = letter_to_col(letters).ok_or_else(|| RefParseError(text.to_string()))?;
        let row: usize = digits
            .parse::<usize>()
            .ok()
            .filter(|r| *r >= 1)
            .ok_or_else(|| RefParseError(text.to_string()))?;
        Ok(Self { row: row - 1, col })
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

/// A rectangular range, normalized so `start` is the top-left corner.
///
/// Serializes as its A1 text ("A1:C5", or "B2" for a single cell) so it can
/// travel on the assist wire and in operation payloads unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RangeRef {
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeRef {
    /// Build a normalized range from any two corners.
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    pub fn single(cell: CellRef) -> Self {
        Self { start: cell, end: cell }
    }

    pub fn rows(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        cell.row >= self.start.row
            && cell.row <= self.end.row
            && cell.col >= self.start.col
            && cell.col <= self.end.col
    }

    pub fn overlaps(&self, other: &RangeRef) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    /// Iterate all cell positions in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        let (r0, r1) = (self.start.row, self.end.row);
        let (c0, c1) = (self.start.col, self.end.col);
        (r0..=r1).flat_map(move |row| (c0..=c1).map(move |col| CellRef::new(row, col)))
    }

    /// Format as A1 notation; single cells collapse to one reference.
    pub fn to_a1(&self) -> String {
        if self.is_single_cell() {
            self.start.to_a1()
        } else {
            format!("{}:{}", self.start.to_a1(), self.end.to_a1())
        }
    }

    /// Parse "A1:C5" or "B2". A worksheet prefix ("Sheet1!A1:C5") is
    /// accepted and discarded.
    pub fn parse(text: &str) -> Result<Self, RefParseError> {
        let body = text.trim().rsplit('!').next().unwrap_or(text.trim());
        match body.split_once(':') {
            Some((a, b)) => Ok(Self::new(CellRef::parse(a)?, CellRef::parse(b)?)),
            None => Ok(Self::single(CellRef::parse(body)?)),
        }
    }
}

impl std::fmt::Display for RangeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

impl std::str::FromStr for RangeRef {
    type Err = RefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RangeRef {
    type Error = RefParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RangeRef> for String {
    fn from(r: RangeRef) -> String {
        r.to_a1()
    }
}
