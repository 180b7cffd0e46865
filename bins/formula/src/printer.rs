use std::{fmt::Display, io::Write};

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tabled::{Table, Tabled};

#[derive(Debug, Args)]
pub struct PrinterArgs {
    /// The output format to use. Valid options are "plain", "json", and "binary". Default is "plain".
    #[arg(long, short = 'o', default_value_t = Format::default())]
    pub output: Format,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Plain,
    Json,
    /// CBOR
    Binary,
}

impl std::str::FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(Format::Plain),
            "json" => Ok(Format::Json),
            "binary" => Ok(Format::Binary),
            _ => Err(anyhow::anyhow!("Unknown format: {}", s)),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Format::Plain => "plain",
            Format::Json => "json",
            Format::Binary => "binary",
        };
        write!(f, "{}", s)
    }
}

impl Format {
    /// Serializes `data` as JSON or CBOR. Plain output is rejected.
    pub fn print_structured<S: Serialize, W: Write>(
        &self,
        data: S,
        writer: &mut W,
    ) -> anyhow::Result<()> {
        match self {
            Format::Json => {
                serde_json::to_writer(&mut *writer, &data).context("JSON serialization failed")?;
                writeln!(writer)?;
                Ok(())
            }
            Format::Binary => {
                ciborium::into_writer(&data, writer).context("CBOR serialization failed")
            }
            Format::Plain => {
                anyhow::bail!("Plain format not supported")
            }
        }
    }

    /// Writes one line per item. Structured formats are rejected.
    pub fn print_plain<T, D, W>(&self, data: T, writer: &mut W) -> anyhow::Result<()>
    where
        T: IntoIterator<Item = D>,
        D: Display,
        W: Write,
    {
        match self {
            Format::Plain => {
                for item in data {
                    writeln!(writer, "{}", item)?;
                }
                Ok(())
            }
            _ => {
                anyhow::bail!("Non-plain format not supported for plain text output")
            }
        }
    }

    /// Plain output as a table, structured output as a list of rows.
    pub fn print_rows<R, W>(&self, rows: Vec<R>, writer: &mut W) -> anyhow::Result<()>
    where
        R: Tabled + Serialize,
        W: Write,
    {
        match self {
            Format::Plain => self.print_plain([Table::new(rows)], writer),
            Format::Json | Format::Binary => self.print_structured(rows, writer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use runtime_formula::Value;

    #[derive(Debug, Clone, Serialize, serde::Deserialize, Tabled)]
    struct Row {
        name: String,
        category: String,
    }

    #[test]
    fn format_from_str_accepts_supported_values() {
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("BINARY".parse::<Format>().unwrap(), Format::Binary);
        assert!("yaml".parse::<Format>().is_err());
    }

    #[test]
    fn json_format_writes_values() -> anyhow::Result<()> {
        let value = Value::from(vec![Value::from(1.0), Value::from("a")]);
        let mut buffer = Vec::new();

        Format::Json.print_structured(&value, &mut buffer)?;

        let decoded: serde_json::Value = serde_json::from_slice(&buffer)?;
        assert_eq!(decoded, serde_json::json!([1, "a"]));

        Ok(())
    }

    #[test]
    fn binary_format_round_trip() -> anyhow::Result<()> {
        let rows = vec![Row {
            name: "upper".into(),
            category: "text".into(),
        }];
        let mut buffer = Vec::new();

        Format::Binary.print_rows(rows, &mut buffer)?;

        let mut cursor = Cursor::new(buffer);
        let decoded: Vec<Row> = ciborium::from_reader(&mut cursor)?;
        assert_eq!(decoded[0].name, "upper");

        Ok(())
    }

    #[test]
    fn plain_rows_render_a_table() -> anyhow::Result<()> {
        let rows = vec![Row {
            name: "is_even".into(),
            category: "boolean".into(),
        }];
        let mut buffer = Vec::new();

        Format::Plain.print_rows(rows, &mut buffer)?;

        let output = String::from_utf8(buffer)?;
        assert!(output.contains("name"));
        assert!(output.contains("is_even"));

        Ok(())
    }

    #[test]
    fn plain_rejects_structured_printing() {
        let mut buffer = Vec::new();
        assert!(Format::Plain.print_structured("x", &mut buffer).is_err());
        assert!(Format::Json.print_plain(["x"], &mut buffer).is_err());
    }
}
