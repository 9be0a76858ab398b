//! CSV export rendering.
//!
//! Output is UTF-8 with CRLF line endings. Cells are quoted per the usual
//! CSV rules and neutralized against spreadsheet formula injection before
//! quoting: a neutralized cell is always quoted so the leading apostrophe
//! survives round-trips through strict parsers.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::order::Order;

/// Line ending for exported files.
pub const CSV_LINE_ENDING: &str = "\r\n";

/// Characters that make a cell a potential spreadsheet formula.
const FORMULA_PREFIXES: &[char] = &['=', '+', '-', '@'];

/// Characters that force a cell to be quoted.
const QUOTE_TRIGGERS: &[char] = &[',', '"', '\r', '\n'];

// ---------------------------------------------------------------------------
// Field selection
// ---------------------------------------------------------------------------

/// An exportable order field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportField {
    Id,
    Number,
    Status,
    Total,
    Currency,
    CustomerEmail,
    Country,
    Tags,
    DateCreated,
}

/// All exportable fields, in default column order.
pub const ALL_FIELDS: &[ExportField] = &[
    ExportField::Id,
    ExportField::Number,
    ExportField::Status,
    ExportField::Total,
    ExportField::Currency,
    ExportField::CustomerEmail,
    ExportField::Country,
    ExportField::Tags,
    ExportField::DateCreated,
];

impl ExportField {
    /// Convert from the wire string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "id" => Ok(Self::Id),
            "number" => Ok(Self::Number),
            "status" => Ok(Self::Status),
            "total" => Ok(Self::Total),
            "currency" => Ok(Self::Currency),
            "customer_email" => Ok(Self::CustomerEmail),
            "country" => Ok(Self::Country),
            "tags" => Ok(Self::Tags),
            "date_created" => Ok(Self::DateCreated),
            _ => Err(CoreError::Validation(format!(
                "Unknown export field '{s}'"
            ))),
        }
    }

    /// Column header / wire string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Number => "number",
            Self::Status => "status",
            Self::Total => "total",
            Self::Currency => "currency",
            Self::CustomerEmail => "customer_email",
            Self::Country => "country",
            Self::Tags => "tags",
            Self::DateCreated => "date_created",
        }
    }
}

/// Resolve the field list actually exported: an empty selection means all
/// fields; duplicates keep their first position.
pub fn effective_fields(fields: &[ExportField]) -> Vec<ExportField> {
    if fields.is_empty() {
        return ALL_FIELDS.to_vec();
    }
    let mut seen = Vec::with_capacity(fields.len());
    for field in fields {
        if !seen.contains(field) {
            seen.push(*field);
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Cell rendering
// ---------------------------------------------------------------------------

/// Render one cell: neutralize a leading formula character, then quote if
/// the value (or the neutralization) requires it.
pub fn escape_cell(value: &str) -> String {
    let neutralized = value.starts_with(FORMULA_PREFIXES);
    let body = if neutralized {
        format!("'{value}")
    } else {
        value.to_string()
    };
    if neutralized || body.contains(QUOTE_TRIGGERS) {
        format!("\"{}\"", body.replace('"', "\"\""))
    } else {
        body
    }
}

/// The raw (unescaped) value of one field for one order.
pub fn field_value(order: &Order, field: ExportField) -> String {
    match field {
        ExportField::Id => order.id.to_string(),
        ExportField::Number => order.number.clone(),
        ExportField::Status => order.status.as_str().to_string(),
        ExportField::Total => format!("{:.2}", order.total),
        ExportField::Currency => order.currency.clone(),
        ExportField::CustomerEmail => order.customer_email.clone().unwrap_or_default(),
        ExportField::Country => order.country.clone().unwrap_or_default(),
        ExportField::Tags => order.tags.join("|"),
        ExportField::DateCreated => order.date_created.to_rfc3339(),
    }
}

/// Render the header line for a field selection (no trailing line ending).
pub fn header_row(fields: &[ExportField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Render one data row from raw cell values (no trailing line ending).
pub fn render_row(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| escape_cell(c))
        .collect::<Vec<_>>()
        .join(",")
}

/// Assemble a complete export document from pre-extracted rows.
pub fn render_document(fields: &[ExportField], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str(&header_row(fields));
    out.push_str(CSV_LINE_ENDING);
    for row in rows {
        out.push_str(&render_row(row));
        out.push_str(CSV_LINE_ENDING);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;
    use chrono::TimeZone;

    fn order() -> Order {
        Order {
            id: 42,
            number: "42".into(),
            status: OrderStatus::Processing,
            total: 99.5,
            currency: "USD".into(),
            customer_email: Some("jo@example.com".into()),
            country: Some("DE".into()),
            tags: vec!["vip".into(), "wholesale".into()],
            date_created: chrono::Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    // -- escape_cell ----------------------------------------------------------

    #[test]
    fn plain_value_passes_through() {
        assert_eq!(escape_cell("hello"), "hello");
    }

    #[test]
    fn formula_prefix_is_neutralized_and_quoted() {
        assert_eq!(escape_cell("=cmd()"), "\"'=cmd()\"");
        assert_eq!(escape_cell("+1234"), "\"'+1234\"");
        assert_eq!(escape_cell("-total"), "\"'-total\"");
        assert_eq!(escape_cell("@import"), "\"'@import\"");
    }

    #[test]
    fn comma_forces_quoting() {
        assert_eq!(escape_cell("a,b"), "\"a,b\"");
    }

    #[test]
    fn embedded_quote_is_doubled() {
        assert_eq!(escape_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn newline_forces_quoting() {
        assert_eq!(escape_cell("line1\nline2"), "\"line1\nline2\"");
    }

    // -- field selection ------------------------------------------------------

    #[test]
    fn empty_selection_means_all_fields() {
        assert_eq!(effective_fields(&[]), ALL_FIELDS.to_vec());
    }

    #[test]
    fn duplicate_fields_keep_first_position() {
        let fields = effective_fields(&[
            ExportField::Status,
            ExportField::Id,
            ExportField::Status,
        ]);
        assert_eq!(fields, vec![ExportField::Status, ExportField::Id]);
    }

    #[test]
    fn field_round_trip() {
        for field in ALL_FIELDS {
            assert_eq!(ExportField::from_str_value(field.as_str()).unwrap(), *field);
        }
    }

    // -- document rendering ---------------------------------------------------

    #[test]
    fn document_has_header_and_crlf_endings() {
        let fields = [ExportField::Id, ExportField::Status];
        let rows = vec![vec!["42".to_string(), "processing".to_string()]];
        let doc = render_document(&fields, &rows);
        assert_eq!(doc, "id,status\r\n42,processing\r\n");
    }

    #[test]
    fn field_values_cover_every_column() {
        let order = order();
        let row: Vec<String> = ALL_FIELDS
            .iter()
            .map(|f| field_value(&order, *f))
            .collect();
        assert_eq!(row[0], "42");
        assert_eq!(row[2], "processing");
        assert_eq!(row[3], "99.50");
        assert_eq!(row[5], "jo@example.com");
        assert_eq!(row[7], "vip|wholesale");
        assert!(row[8].starts_with("2025-03-01T12:00:00"));
    }
}
