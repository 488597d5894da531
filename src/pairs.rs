//! CSV pair lists: the wire format between the overlap checker and the
//! imprinter
//!
//! One row per pair, `hi,lo,status[,vol_common,vol_hi,vol_lo]`; the three
//! volume fields are present for `overlap` / `bad_overlap` rows. Fields
//! may be double-quoted with `""` escaping.
use std::fmt;
use std::io::BufRead;

use crate::document::Document;
use crate::kernel::Kernel;
use crate::Error;

/// Row status for a non-distinct pair
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PairStatus {
    Touch,
    Overlap,
    /// The pair overlaps by more than the configured volume ratio
    BadOverlap,
}

impl PairStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairStatus::Touch => "touch",
            PairStatus::Overlap => "overlap",
            PairStatus::BadOverlap => "bad_overlap",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "touch" => Some(PairStatus::Touch),
            "overlap" => Some(PairStatus::Overlap),
            "bad_overlap" => Some(PairStatus::BadOverlap),
            _ => None,
        }
    }
}

/// One CSV row
#[derive(Clone, Debug, PartialEq)]
pub struct PairRow {
    pub hi: usize,
    pub lo: usize,
    pub status: PairStatus,
    /// `[vol_common, vol_hi, vol_lo]`, for overlap rows
    pub volumes: Option<[f64; 3]>,
}

impl fmt::Display for PairRow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{}", self.hi, self.lo, self.status.as_str())?;
        if let Some([common, hi, lo]) = self.volumes {
            write!(f, ",{common:.2},{hi:.2},{lo:.2}")?;
        }
        Ok(())
    }
}

/// Splits one CSV row into fields, honouring double quotes
pub fn split_row(row: &str) -> Vec<String> {
    #[derive(Eq, PartialEq)]
    enum State {
        Unquoted,
        Quoted,
        QuotedQuote,
    }

    let mut state = State::Unquoted;
    let mut fields = vec![String::new()];
    for c in row.chars() {
        match state {
            State::Unquoted => match c {
                ',' => fields.push(String::new()),
                '"' => state = State::Quoted,
                c => fields.last_mut().unwrap().push(c),
            },
            State::Quoted => match c {
                '"' => state = State::QuotedQuote,
                c => fields.last_mut().unwrap().push(c),
            },
            State::QuotedQuote => match c {
                ',' => {
                    fields.push(String::new());
                    state = State::Unquoted;
                }
                '"' => {
                    fields.last_mut().unwrap().push('"');
                    state = State::Quoted;
                }
                _ => state = State::Unquoted,
            },
        }
    }
    fields
}

/// Reads the pair list consumed by the imprinter
///
/// Rows with status `overlap` / `bad_overlap` are returned in input order;
/// `touch` rows are ignored. Indices are validated against the document.
pub fn read_imprint_pairs<K: Kernel>(
    reader: impl BufRead,
    doc: &Document<K>,
) -> Result<Vec<(usize, usize)>, Error> {
    let mut pairs = vec![];
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = i + 1;
        let fields = split_row(&line);
        if fields.len() < 3 {
            return Err(Error::ShortPairRow(row));
        }
        let hi = doc
            .lookup_solid(&fields[0])
            .ok_or_else(|| Error::BadShapeIndex(fields[0].clone()))?;
        let lo = doc
            .lookup_solid(&fields[1])
            .ok_or_else(|| Error::BadShapeIndex(fields[1].clone()))?;
        match PairStatus::parse(fields[2].trim()) {
            Some(PairStatus::Touch) => (),
            Some(_) => pairs.push((hi, lo)),
            None => {
                return Err(Error::BadPairStatus {
                    row,
                    status: fields[2].clone(),
                })
            }
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kernel::rect::RectKernel;
    use crate::testkit::cube_at;
    use std::io::Cursor;

    fn doc(n: usize) -> Document<RectKernel> {
        Document::from_solids(
            (0..n)
                .map(|i| cube_at(i as f64 * 10.0, 0.0, 0.0, 5.0))
                .collect(),
        )
    }

    #[test]
    fn row_formatting() {
        let touch = PairRow {
            hi: 4,
            lo: 1,
            status: PairStatus::Touch,
            volumes: None,
        };
        assert_eq!(touch.to_string(), "4,1,touch");

        let overlap = PairRow {
            hi: 7,
            lo: 2,
            status: PairStatus::Overlap,
            volumes: Some([12.5, 125.0, 125.0]),
        };
        assert_eq!(overlap.to_string(), "7,2,overlap,12.50,125.00,125.00");
    }

    #[test]
    fn split_row_plain_and_quoted() {
        assert_eq!(split_row("1,2,touch"), vec!["1", "2", "touch"]);
        assert_eq!(
            split_row("\"1\",\"say \"\"hi\"\"\",x"),
            vec!["1", "say \"hi\"", "x"]
        );
        assert_eq!(split_row(""), vec![""]);
    }

    #[test]
    fn reads_overlap_rows_and_skips_touch() {
        let input = "1,0,touch\n2,0,overlap,12.50,125.00,125.00\n3,1,bad_overlap,99.00,125.00,125.00\n";
        let pairs = read_imprint_pairs(Cursor::new(input), &doc(4)).unwrap();
        assert_eq!(pairs, vec![(2, 0), (3, 1)]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let input = "\n1,0,overlap,1.00,2.00,3.00\n\n";
        let pairs = read_imprint_pairs(Cursor::new(input), &doc(2)).unwrap();
        assert_eq!(pairs, vec![(1, 0)]);
    }

    #[test]
    fn rejects_short_rows() {
        let err = read_imprint_pairs(Cursor::new("1,0\n"), &doc(2)).unwrap_err();
        assert!(matches!(err, Error::ShortPairRow(1)));
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let err = read_imprint_pairs(Cursor::new("9,0,overlap,1,2,3\n"), &doc(2)).unwrap_err();
        assert!(matches!(err, Error::BadShapeIndex(_)));
        let err = read_imprint_pairs(Cursor::new("-1,0,overlap,1,2,3\n"), &doc(2)).unwrap_err();
        assert!(matches!(err, Error::BadShapeIndex(_)));
    }

    #[test]
    fn rejects_unknown_status() {
        let err = read_imprint_pairs(Cursor::new("1,0,sideways\n"), &doc(2)).unwrap_err();
        assert!(matches!(err, Error::BadPairStatus { row: 1, .. }));
    }

    #[test]
    fn round_trip_through_display() {
        let row = PairRow {
            hi: 1,
            lo: 0,
            status: PairStatus::BadOverlap,
            volumes: Some([99.0, 125.0, 125.0]),
        };
        let pairs =
            read_imprint_pairs(Cursor::new(format!("{row}\n")), &doc(2)).unwrap();
        assert_eq!(pairs, vec![(1, 0)]);
    }
}
