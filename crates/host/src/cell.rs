// Cell model for the in-memory grid host.

use serde::{Deserialize, Serialize};

use gridmind_core::CellScalar;

/// What a cell holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellContent {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Formula source text, including the leading '='. The in-memory host
    /// stores formulas without evaluating them.
    Formula { source: String },
}

impl Default for CellContent {
    fn default() -> Self {
        CellContent::Empty
    }
}

impl CellContent {
    /// Parse raw input the way a grid entry would: '=' prefix is a
    /// formula, numeric text a number, TRUE/FALSE a bool, anything else text.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return CellContent::Empty;
        }
        if trimmed.starts_with('=') {
            return CellContent::Formula { source: trimmed.to_string() };
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return CellContent::Number(n);
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "TRUE" => CellContent::Bool(true),
            "FALSE" => CellContent::Bool(false),
            _ => CellContent::Text(trimmed.to_string()),
        }
    }

    /// Value as seen by context capture and analysis. Formulas read as
    /// Empty since this host does not evaluate them.
    pub fn to_scalar(&self) -> CellScalar {
        match self {
            CellContent::Empty | CellContent::Formula { .. } => CellScalar::Empty,
            CellContent::Text(s) => CellScalar::Text(s.clone()),
            CellContent::Number(n) => CellScalar::Number(*n),
            CellContent::Bool(b) => CellScalar::Bool(*b),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }
}

/// Visual styling, addressed by the style primitives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    pub bold: bool,
    pub italic: bool,
    /// Fill color name or hex string; None = no fill.
    pub fill_color: Option<String>,
    /// Number display pattern; None = general formatting.
    pub number_format: Option<String>,
}

impl CellStyle {
    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }
}

/// A populated grid cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub content: CellContent,
    pub style: CellStyle,
}

impl Cell {
    pub fn from_input(input: &str) -> Self {
        Self { content: CellContent::from_input(input), style: CellStyle::default() }
    }

    /// Display text with the cell's number pattern applied.
    pub fn display(&self) -> String {
        match &self.content {
            CellContent::Empty => String::new(),
            CellContent::Text(s) => s.clone(),
            CellContent::Bool(b) => b.to_string().to_ascii_uppercase(),
            CellContent::Formula { source } => source.clone(),
            CellContent::Number(n) => match &self.style.number_format {
                Some(pattern) => format_number(*n, pattern),
                None => format_general(*n),
            },
        }
    }
}

/// General formatting: integers without a trailing ".0".
fn format_general(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Render a number under a display pattern.
///
/// Supports the pattern family the engine emits: "$#,##0.00" (currency),
/// "0.00%" / "0%" (percent), "#,##0" / "#,##0.00" (grouped), plain "0.00"
/// decimal counts. Unknown patterns fall back to general formatting.
pub fn format_number(n: f64, pattern: &str) -> String {
    let decimals = pattern
        .rsplit_once('.')
        .map(|(_, frac)| frac.chars().take_while(|c| *c == '0').count())
        .unwrap_or(0);

    if pattern.contains('%') {
        return format!("{:.*}%", decimals, n * 100.0);
    }

    let grouped = pattern.contains(',');
    let body = if grouped {
        group_thousands(n, decimals)
    } else {
        format!("{:.*}", decimals, n)
    };

    if pattern.starts_with('$') {
        if n < 0.0 {
            format!("-${}", body.trim_start_matches('-'))
        } else {
            format!("${}", body)
        }
    } else if pattern.contains('#') || pattern.contains('0') {
        body
    } else {
        format_general(n)
    }
}

fn group_thousands(n: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (formatted, None),
    };

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    let sign = if n < 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}
