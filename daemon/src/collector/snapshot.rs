use super::ProcessRecord;
use csv::{ByteRecord, ReaderBuilder};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    MissingFields,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Blank => f.write_str("blank line"),
            SkipReason::MissingFields => f.write_str("missing fields"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Record(ProcessRecord),
    Skipped { line: String, reason: SkipReason },
}

/// Reads the exporter's CSV. An unreadable file yields no records.
pub fn read_snapshot(path: &Path) -> Vec<ProcessRecord> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Unable to open {:?}: {}", path, e);
            return Vec::new();
        }
    };
    into_records(parse_snapshot(&bytes))
}

/// Parses every row after the header. The header itself is never inspected.
///
/// Quoting is off so commas always split fields, and rows may have any
/// number of fields. Empty lines produce no outcome at all.
pub fn parse_snapshot(data: &[u8]) -> Vec<RowOutcome> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(data);

    let mut outcomes = Vec::new();
    for result in rdr.byte_records() {
        match result {
            Ok(record) => outcomes.push(classify(&record)),
            Err(e) => warn!("Unreadable snapshot row: {}", e),
        }
    }
    outcomes
}

pub fn into_records(outcomes: Vec<RowOutcome>) -> Vec<ProcessRecord> {
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            RowOutcome::Record(record) => Some(record),
            RowOutcome::Skipped { line, reason } => {
                debug!("Skipping row {:?}: {}", line, reason);
                None
            }
        })
        .collect()
}

/// `date,pid,name,memUsage[,cpu...]`. The CPU value is the numeric prefix of
/// the fifth field; a missing or non-numeric value counts as 0.
fn classify(record: &ByteRecord) -> RowOutcome {
    let fields: Vec<String> = record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect();
    let line = fields.join(",");

    if fields.iter().all(|f| f.trim().is_empty()) {
        return RowOutcome::Skipped {
            line,
            reason: SkipReason::Blank,
        };
    }
    if fields.len() < 4 {
        return RowOutcome::Skipped {
            line,
            reason: SkipReason::MissingFields,
        };
    }

    let cpu_usage = fields.get(4).and_then(|f| leading_float(f)).unwrap_or_else(|| {
        warn!("No CPU value in row {:?}, counting it as 0", line);
        0.0
    });

    let mut fields = fields.into_iter();
    let mut next = || fields.next().unwrap_or_default();
    RowOutcome::Record(ProcessRecord {
        date: next(),
        pid: next(),
        name: next(),
        mem_usage: next(),
        cpu_usage,
    })
}

/// Longest floating-point prefix of `text` after leading whitespace.
pub fn leading_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if b.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(b.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}
