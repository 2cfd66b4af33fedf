use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            // Debug keeps the shortest round-trip form and always carries a fraction.
            Value::Float(f) => format!("{f:?}"),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Builds a text cell, treating the empty string as missing.
pub fn text_cell(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        None
    } else {
        Some(Value::String(raw.to_string()))
    }
}

/// Parses a cell as an integer first, then as a finite float.
pub fn parse_number(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(Value::Integer(parsed));
    }
    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Some(Value::Float(parsed)),
        _ => None,
    }
}

/// Renders an optional cell the way reports write it; missing becomes empty.
pub fn display_cell(cell: Option<&Value>) -> String {
    cell.map(Value::as_display).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_prefers_integers() {
        assert_eq!(parse_number("50"), Some(Value::Integer(50)));
        assert_eq!(parse_number(" 12 "), Some(Value::Integer(12)));
        assert_eq!(parse_number("2.5"), Some(Value::Float(2.5)));
        assert_eq!(parse_number("-3e2"), Some(Value::Float(-300.0)));
    }

    #[test]
    fn parse_number_rejects_text_and_non_finite_values() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("1,234"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn float_display_keeps_fraction() {
        assert_eq!(Value::Float(2.0).as_display(), "2.0");
        assert_eq!(Value::Float(0.25).as_display(), "0.25");
        assert_eq!(Value::Integer(7).as_display(), "7");
        assert_eq!(display_cell(None), "");
    }

    #[test]
    fn text_cell_maps_empty_to_missing() {
        assert_eq!(text_cell(""), None);
        assert_eq!(text_cell("a"), Some(Value::String("a".to_string())));
    }
}
