//! SQL escaping and placeholder substitution
//!
//! `?` placeholders are replaced by escaped values and `??` placeholders by
//! escaped identifiers, left to right. Runs of three or more `?` are left
//! untouched, as are placeholders beyond the last supplied value.

use crate::Value;

/// Escapes values and identifiers and substitutes placeholders
pub trait SqlFormatter: Send + Sync {
    /// Render a value as a SQL literal
    fn escape(&self, value: &Value) -> String;

    /// Render an identifier (column, table, `schema.table`) quoted
    fn escape_id(&self, identifier: &str) -> String;

    /// Substitute `?` and `??` placeholders in `sql` with `values`
    fn format(&self, sql: &str, values: &[Value]) -> String {
        let mut out = String::with_capacity(sql.len());
        let mut values = values.iter();
        let mut rest = sql;

        while let Some(start) = rest.find('?') {
            let run = rest[start..].bytes().take_while(|b| *b == b'?').count();
            out.push_str(&rest[..start]);
            let placeholder = &rest[start..start + run];
            rest = &rest[start + run..];

            if run > 2 {
                out.push_str(placeholder);
                continue;
            }

            match values.next() {
                Some(value) if run == 2 => out.push_str(&identifier_list(self, value)),
                Some(value) => out.push_str(&self.escape(value)),
                None => {
                    out.push_str(placeholder);
                    break;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

fn identifier_list<F: SqlFormatter + ?Sized>(formatter: &F, value: &Value) -> String {
    match value {
        Value::String(s) => formatter.escape_id(s),
        Value::Array(items) => items
            .iter()
            .map(|item| identifier_list(formatter, item))
            .collect::<Vec<_>>()
            .join(", "),
        other => formatter.escape_id(&other.to_string()),
    }
}

/// MySQL-flavoured formatter: backslash string escapes, backtick identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlFormatter;

impl MySqlFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl SqlFormatter for MySqlFormatter {
    fn escape(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::UInt64(v) => v.to_string(),
            Value::Float64(v) if v.is_finite() => v.to_string(),
            // SQL has no literal for NaN or infinity.
            Value::Float64(_) => "NULL".to_string(),
            Value::Decimal(v) => escape_string(v),
            Value::String(v) => escape_string(v),
            Value::Bytes(v) => format!("X'{}'", hex::encode(v)),
            Value::Uuid(v) => escape_string(&v.to_string()),
            Value::Date(v) => format!("'{}'", v.format("%Y-%m-%d")),
            Value::Time(v) => format!("'{}'", v.format("%H:%M:%S%.f")),
            Value::DateTime(v) => format!("'{}'", v.format("%Y-%m-%d %H:%M:%S%.3f")),
            Value::DateTimeUtc(v) => {
                format!("'{}'", v.naive_utc().format("%Y-%m-%d %H:%M:%S%.3f"))
            }
            Value::Json(v) => escape_string(&v.to_string()),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Array(_) => format!("({})", self.escape(item)),
                    _ => self.escape(item),
                })
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// `schema.table` is quoted per part.
    fn escape_id(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``").replace('.', "`.`"))
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\0' => out.push_str("\\0"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
