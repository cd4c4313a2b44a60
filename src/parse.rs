//! Parser for the plaintext (`ascii`) query response.
//!
//! Each line reads `<series> <timestamp> <value> [tags...]\n`. Only the
//! timestamp field is extracted.

use crate::error::ParseError;

/// Extract the timestamp of every line in `body`, in response order.
///
/// Fails on the first line that does not start with `series` or is not
/// newline-terminated. An empty body yields an empty list.
pub fn parse_timestamps(body: &str, series: &str) -> Result<Vec<i64>, ParseError> {
    body.split_inclusive('\n')
        .enumerate()
        .map(|(idx, line)| parse_line(line, series, idx + 1))
        .collect()
}

fn parse_line(line: &str, series: &str, line_no: usize) -> Result<i64, ParseError> {
    if !line.starts_with(series) {
        return Err(ParseError::UnexpectedSeries {
            line: line_no,
            series: series.to_owned(),
        });
    }
    if !line.ends_with('\n') {
        return Err(ParseError::Unterminated { line: line_no });
    }

    let token = line
        .split_whitespace()
        .nth(1)
        .ok_or(ParseError::MissingTimestamp { line: line_no })?;

    token.parse().map_err(|_| ParseError::InvalidTimestamp {
        line: line_no,
        token: token.to_owned(),
    })
}
