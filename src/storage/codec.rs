//! CSV encoding of collection files.
//!
//! A collection file is a header line followed by one line per record,
//! comma-separated with double-quote escaping. Records may be ragged on read
//! (short rows are padded, blank lines skipped); they are never ragged on write.

use std::io::{Read, Write};
use std::path::Path;

use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::types::{Record, Schema};

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input)
}

fn schema_of<R: Read>(rdr: &mut csv::Reader<R>, path: &Path) -> StorageResult<Schema> {
    let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    Schema::new(header).map_err(|e| StorageError::CorruptedData {
        path: path.to_path_buf(),
        reason: format!("bad header line: {e}"),
    })
}

/// read only the header line
pub(crate) fn read_schema<R: Read>(input: R, path: &Path) -> StorageResult<Schema> {
    schema_of(&mut reader(input), path)
}

/// read the header and every record, in file order
pub(crate) fn read_collection<R: Read>(
    input: R,
    path: &Path,
) -> StorageResult<(Schema, Vec<Record>)> {
    let mut rdr = reader(input);
    let schema = schema_of(&mut rdr, path)?;

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        records.push(schema.record_from_row(row.iter()));
    }
    Ok((schema, records))
}

/// Encode one row as a complete line, terminator included.
///
/// Appends hand the whole line to a single write call.
pub(crate) fn encode_row<I, T>(values: I) -> StorageResult<Vec<u8>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(values)?;
    wtr.into_inner().map_err(|e| StorageError::Io(e.into_error()))
}

/// write a full collection: header then records
pub(crate) fn write_collection<W: Write>(
    output: W,
    schema: &Schema,
    records: &[Record],
) -> StorageResult<()> {
    let mut wtr = csv::Writer::from_writer(output);
    wtr.write_record(schema.fields())?;
    for record in records {
        wtr.write_record(record.values())?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("test.csv")
    }

    #[test]
    fn test_encode_quotes_when_needed() {
        let line = encode_row(["1", "hello, world", "say \"hi\""]).unwrap();
        assert_eq!(
            String::from_utf8(line).unwrap(),
            "1,\"hello, world\",\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_encode_single_empty_value() {
        let line = encode_row([""]).unwrap();
        assert_eq!(String::from_utf8(line).unwrap(), "\"\"\n");
    }

    #[test]
    fn test_read_collection() {
        let data = "id,text\n1,hello\n2,\"multi\nline\"\n";
        let (schema, records) = read_collection(data.as_bytes(), path()).unwrap();
        assert_eq!(schema.fields(), &["id".to_string(), "text".to_string()]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("text"), Some("multi\nline"));
    }

    #[test]
    fn test_read_skips_blank_lines_and_pads() {
        let data = "a,b\n1,2\n\n3\n";
        let (_, records) = read_collection(data.as_bytes(), path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("b"), Some(""));
    }

    #[test]
    fn test_read_schema_of_empty_file() {
        let err = read_schema("".as_bytes(), path()).unwrap_err();
        assert!(matches!(err, StorageError::CorruptedData { .. }));
    }

    #[test]
    fn test_write_then_read() {
        let schema = Schema::new(vec!["id".into(), "v".into()]).unwrap();
        let records = vec![schema.record_from_row(["1", "a,b"])];

        let mut out = Vec::new();
        write_collection(&mut out, &schema, &records).unwrap();
        assert_eq!(String::from_utf8(out.clone()).unwrap(), "id,v\n1,\"a,b\"\n");

        let (read_schema, read_records) = read_collection(out.as_slice(), path()).unwrap();
        assert_eq!(read_schema, schema);
        assert_eq!(read_records, records);
    }
}
