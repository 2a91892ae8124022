//! Text input logs: one lane event per line.
//!
//! ```text
//! # comment
//! press 0 1.250
//! release 0 1.500
//! ```

use std::fmt::Write as _;

use hl_engine::LaneInput;

use crate::FormatError;

/// Parse a log into lane events, sorted by timestamp.
pub fn parse_input_log(text: &str) -> Result<Vec<LaneInput>, FormatError> {
    let mut inputs = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let err = |message: &str| FormatError::Parse { line: index + 1, message: message.to_string() };

        let mut fields = line.split_whitespace();
        let pressed = match fields.next() {
            Some("press") => true,
            Some("release") => false,
            Some(other) => return Err(err(&format!("unknown event `{}`", other))),
            None => continue,
        };
        let lane: u8 = fields
            .next()
            .ok_or_else(|| err("missing lane"))?
            .parse()
            .map_err(|_| err("lane is not a number"))?;
        let timestamp: f64 = fields
            .next()
            .ok_or_else(|| err("missing time"))?
            .parse()
            .map_err(|_| err("time is not a number"))?;
        if !timestamp.is_finite() || timestamp < 0.0 {
            return Err(err("time must be a non-negative number"));
        }
        if fields.next().is_some() {
            return Err(err("trailing fields"));
        }
        inputs.push(LaneInput { lane, pressed, timestamp });
    }
    inputs.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    Ok(inputs)
}

/// Write events in the format [`parse_input_log`] reads.
pub fn write_input_log(inputs: &[LaneInput]) -> String {
    let mut out = String::new();
    for input in inputs {
        let verb = if input.pressed { "press" } else { "release" };
        let _ = writeln!(out, "{} {} {:.6}", verb, input.lane, input.timestamp);
    }
    out
}
