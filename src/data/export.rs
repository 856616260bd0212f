//! CSV export of a stored collection, one column per record field.

use std::io;

use crate::data::record::Record;

/// Writes a header row of the kind's field names, then one row per record.
/// Absent values are written as empty cells.
pub fn write_csv<R: Record, W: io::Write>(records: &[R], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(R::KIND.fields())?;
    for record in records {
        csv_writer.write_record(
            record
                .values()
                .into_iter()
                .map(|value| value.map(ToString::to_string).unwrap_or_default()),
        )?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::{AgricultureRecord, FieldValue};

    #[test]
    fn writes_header_and_blank_cells() {
        let records = vec![
            AgricultureRecord {
                state: Some("Benue".into()),
                lga: Some("Makurdi".into()),
                year: Some(FieldValue::Int(2022)),
                crop: Some("Yam, white".into()),
                value: Some(FieldValue::Float(12.5)),
            },
            AgricultureRecord {
                crop: Some("Rice".into()),
                ..Default::default()
            },
        ];
        let mut out = Vec::new();
        write_csv(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "state,lga,year,crop,value\nBenue,Makurdi,2022,\"Yam, white\",12.5\n,,,Rice,\n"
        );
    }
}
