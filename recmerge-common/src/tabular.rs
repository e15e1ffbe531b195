//! Loading and writing tabular sources
//!
//! CSV/TSV go through the `csv` crate, JSON is an array of flat objects.
//! Bytes are decoded/encoded with a [`TextEncoding`] from the supported set.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::encoding::TextEncoding;
use crate::format::{InputFormat, LineEnding, OutputFormat};
use crate::{Error, Record, Result, Source};

/// Parse `bytes` as a source in the given format and encoding
pub fn load_source(bytes: &[u8], format: InputFormat, encoding: TextEncoding) -> Result<Source> {
    let text = encoding.decode(bytes)?;
    let source = match format {
        InputFormat::Csv => load_delimited(&text, b',')?,
        InputFormat::Tsv => load_delimited(&text, b'\t')?,
        InputFormat::Json => load_json(&text)?,
    };

    tracing::debug!(
        format = %format,
        encoding = encoding.key(),
        columns = source.headers().len(),
        records = source.len(),
        "Loaded tabular source"
    );

    Ok(source)
}

fn load_delimited(text: &str, delimiter: u8) -> Result<Source> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(Error::Parse("No header row".to_string()));
    }
    check_unique_headers(&headers)?;

    let mut source = Source::new(headers.clone());
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let input_line = index + 1;
        if row.len() > headers.len() {
            return Err(Error::Parse(format!(
                "Row {} has {} fields but the header has {}",
                input_line,
                row.len(),
                headers.len()
            )));
        }

        // Short rows read missing trailing fields as empty
        let values: BTreeMap<String, String> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), row.get(i).unwrap_or("").to_string()))
            .collect();
        source.add_record(Record::new(input_line, values));
    }

    Ok(source)
}

fn load_json(text: &str) -> Result<Source> {
    let rows: Vec<Value> = serde_json::from_str(text)?;

    let mut headers: Vec<String> = Vec::new();
    let mut objects: Vec<Map<String, Value>> = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let Value::Object(object) = row else {
            return Err(Error::Parse(format!("Row {} is not a JSON object", index + 1)));
        };
        for key in object.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
        objects.push(object);
    }

    let mut source = Source::new(headers.clone());
    for (index, object) in objects.into_iter().enumerate() {
        let mut values = BTreeMap::new();
        for header in &headers {
            let value = match object.get(header) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(Value::Bool(b)) => b.to_string(),
                Some(Value::Number(n)) => n.to_string(),
                Some(other) => {
                    return Err(Error::Parse(format!(
                        "Row {} column '{}' is not a scalar: {}",
                        index + 1,
                        header,
                        other
                    )))
                }
            };
            values.insert(header.clone(), value);
        }
        source.add_record(Record::new(index + 1, values));
    }

    Ok(source)
}

fn check_unique_headers(headers: &[String]) -> Result<()> {
    for (i, header) in headers.iter().enumerate() {
        if headers[..i].contains(header) {
            return Err(Error::Parse(format!("Duplicate column: {}", header)));
        }
    }
    Ok(())
}

/// Serialize `source` in the given format, encoding and line-ending convention
pub fn write_source(
    source: &Source,
    format: OutputFormat,
    encoding: TextEncoding,
    line_ending: LineEnding,
) -> Result<Vec<u8>> {
    let text = match format {
        OutputFormat::Csv => write_delimited(source, b',', line_ending)?,
        OutputFormat::Tsv => write_delimited(source, b'\t', line_ending)?,
        OutputFormat::Json => write_json(source, line_ending)?,
    };

    Ok(encoding.encode(&text)?.into_owned())
}

fn write_delimited(source: &Source, delimiter: u8, line_ending: LineEnding) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(line_ending.csv_terminator())
        .from_writer(Vec::new());

    writer.write_record(source.headers())?;
    for record in source.records() {
        writer.write_record(source.headers().iter().map(|h| record.value(h)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::Parse(e.to_string()))
}

fn write_json(source: &Source, line_ending: LineEnding) -> Result<String> {
    let rows: Vec<Value> = source
        .records()
        .iter()
        .map(|record| {
            let object: Map<String, Value> = source
                .headers()
                .iter()
                .map(|h| (h.clone(), Value::String(record.value(h).to_string())))
                .collect();
            Value::Object(object)
        })
        .collect();

    // Newlines inside values are escaped, so every raw newline is structural
    let pretty = serde_json::to_string_pretty(&rows)?;
    let mut text = pretty.replace('\n', line_ending.terminator());
    text.push_str(line_ending.terminator());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8() -> TextEncoding {
        TextEncoding::utf8()
    }

    #[test]
    fn test_load_csv_numbers_lines_from_one() {
        let data = b"Name,Phone\nAda,555-1212\nGrace,\n";
        let source = load_source(data, InputFormat::Csv, utf8()).unwrap();

        assert_eq!(source.headers(), &["Name", "Phone"]);
        assert_eq!(source.len(), 2);
        assert_eq!(source.records()[0].input_line, 1);
        assert_eq!(source.records()[1].input_line, 2);
        assert_eq!(source.records()[1].value("Phone"), "");
    }

    #[test]
    fn test_load_csv_pads_short_rows_and_rejects_long_rows() {
        let short = b"A,B,C\n1,2\n";
        let source = load_source(short, InputFormat::Csv, utf8()).unwrap();
        assert_eq!(source.records()[0].value("C"), "");

        let long = b"A,B\n1,2,3\n";
        assert!(matches!(
            load_source(long, InputFormat::Csv, utf8()),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_load_rejects_duplicate_or_missing_headers() {
        assert!(load_source(b"A,A\n1,2\n", InputFormat::Csv, utf8()).is_err());
        assert!(load_source(b"", InputFormat::Csv, utf8()).is_err());
    }

    #[test]
    fn test_load_tsv() {
        let data = b"Name\tCity\nAda\tLondon, UK\n";
        let source = load_source(data, InputFormat::Tsv, utf8()).unwrap();
        assert_eq!(source.records()[0].value("City"), "London, UK");
    }

    #[test]
    fn test_load_json_unions_keys_in_order() {
        let data = br#"[{"Name": "Ada", "Age": 36}, {"Name": "Grace", "City": null, "Member": true}]"#;
        let source = load_source(data, InputFormat::Json, utf8()).unwrap();

        assert_eq!(source.headers(), &["Name", "Age", "City", "Member"]);
        assert_eq!(source.records()[0].value("Age"), "36");
        assert_eq!(source.records()[0].value("City"), "");
        assert_eq!(source.records()[1].value("Member"), "true");
    }

    #[test]
    fn test_load_json_rejects_nested_values() {
        let data = br#"[{"Name": {"first": "Ada"}}]"#;
        assert!(matches!(
            load_source(data, InputFormat::Json, utf8()),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_load_wrong_encoding_fails() {
        let latin1 = b"Name\nJos\xE9\n";
        assert!(matches!(
            load_source(latin1, InputFormat::Csv, utf8()),
            Err(Error::Decode { .. })
        ));

        let enc = TextEncoding::from_key("windows-1252").unwrap();
        let source = load_source(latin1, InputFormat::Csv, enc).unwrap();
        assert_eq!(source.records()[0].value("Name"), "José");
    }

    #[test]
    fn test_write_csv_line_endings() {
        let source = load_source(b"A,B\n1,\"x,y\"\n", InputFormat::Csv, utf8()).unwrap();

        let crlf = write_source(&source, OutputFormat::Csv, utf8(), LineEnding::Windows).unwrap();
        assert_eq!(crlf, b"A,B\r\n1,\"x,y\"\r\n".to_vec());

        let cr = write_source(&source, OutputFormat::Csv, utf8(), LineEnding::Mac).unwrap();
        assert_eq!(cr, b"A,B\r1,\"x,y\"\r".to_vec());

        let tsv = write_source(&source, OutputFormat::Tsv, utf8(), LineEnding::Unix).unwrap();
        assert_eq!(tsv, b"A\tB\n1\tx,y\n".to_vec());
    }

    #[test]
    fn test_write_json_keeps_header_order() {
        let source = load_source(b"Zeta,Alpha\n1,2\n", InputFormat::Csv, utf8()).unwrap();
        let bytes = write_source(&source, OutputFormat::Json, utf8(), LineEnding::Unix).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.find("Zeta").unwrap() < text.find("Alpha").unwrap());
        assert!(text.ends_with("]\n"));
        let reparsed = load_source(text.as_bytes(), InputFormat::Json, utf8()).unwrap();
        assert_eq!(reparsed.records()[0].value("Alpha"), "2");
    }

    #[test]
    fn test_write_unencodable_output_fails() {
        let source = load_source("Name\n東京\n".as_bytes(), InputFormat::Csv, utf8()).unwrap();
        let latin1 = TextEncoding::from_key("windows-1252").unwrap();
        assert!(matches!(
            write_source(&source, OutputFormat::Csv, latin1, LineEnding::Unix),
            Err(Error::Encode { .. })
        ));
    }
}
