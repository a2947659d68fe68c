// Parser for the `birdc show route` table dump
//
// The dump is line oriented: a line starting at column 0 opens a new route,
// indented lines carry details (`via ...`, `dev ...`) of the route above them.
// The format is not a stable interface, so nothing here fails hard: lines that
// do not fit are reported in the `ParseReport` and otherwise ignored.

use super::RouteRecord;
use serde::Serialize;

/// Minimum number of tokens on a route header line
const HEADER_MIN_TOKENS: usize = 6;

const BANNER_PREFIXES: [&str; 2] = ["BIRD", "Table"];

/// Why a line did not contribute to a route record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Header or detail line with fewer tokens than its shape needs
    TooFewFields { found: usize, expected: usize },
    /// Preference token is not a base-10 integer
    InvalidPreference { token: String },
    /// Detail lines collected under a header that yielded no network
    MissingNetwork,
    /// Indented line that is neither `via` nor `dev`
    UnknownDetail { keyword: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number in the dump
    pub line_number: usize,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of parsing one table dump
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub records: Vec<RouteRecord>,
    pub skipped: Vec<SkippedLine>,
}

/// Route context being accumulated between two header lines
struct PendingRoute {
    line_number: usize,
    route: Option<RouteRecord>,
    has_details: bool,
}

impl PendingRoute {
    fn empty(line_number: usize) -> Self {
        PendingRoute {
            line_number,
            route: None,
            has_details: false,
        }
    }
}

/// Parse a table dump into route records, in input order
pub fn parse(output: &str) -> Vec<RouteRecord> {
    parse_routes(output).records
}

/// Parse a table dump, keeping track of every line that was skipped
pub fn parse_routes(output: &str) -> ParseReport {
    let mut report = ParseReport::default();
    let mut pending: Option<PendingRoute> = None;

    for (index, line) in output.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim_start();

        if trimmed.is_empty() || BANNER_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            continue;
        }

        if line.starts_with([' ', '\t']) {
            let current = pending.get_or_insert_with(|| PendingRoute::empty(line_number));
            if let Err(reason) = apply_detail(current, trimmed) {
                report.skipped.push(SkippedLine { line_number, reason });
            }
            continue;
        }

        flush(&mut report, pending.take());

        let mut next = PendingRoute::empty(line_number);
        match parse_header(trimmed) {
            Ok(route) => next.route = Some(route),
            Err(reason) => report.skipped.push(SkippedLine { line_number, reason }),
        }
        pending = Some(next);
    }

    flush(&mut report, pending);
    report
}

fn flush(report: &mut ParseReport, pending: Option<PendingRoute>) {
    let Some(pending) = pending else {
        return;
    };

    match pending.route {
        Some(route) => report.records.push(route),
        None if pending.has_details => report.skipped.push(SkippedLine {
            line_number: pending.line_number,
            reason: SkipReason::MissingNetwork,
        }),
        None => {}
    }
}

/// Two header shapes are accepted:
/// `network type [protocol since] timestamp * (preference)` and BIRD 2's
/// `network type [protocol since] * (preference)`, where the timestamp is the
/// `since` part of the bracket group
fn parse_header(line: &str) -> Result<RouteRecord, SkipReason> {
    let words = line.split_whitespace().count();
    if words < HEADER_MIN_TOKENS {
        return Err(SkipReason::TooFewFields {
            found: words,
            expected: HEADER_MIN_TOKENS,
        });
    }

    let tokens = tokenize(line);
    let (timestamp, preference_token) = if tokens.len() >= HEADER_MIN_TOKENS {
        (tokens[3], tokens[5])
    } else {
        let since = bracket_since(&tokens).ok_or(SkipReason::TooFewFields {
            found: tokens.len(),
            expected: HEADER_MIN_TOKENS,
        })?;
        (since, tokens[tokens.len() - 1])
    };

    let preference = parse_preference(preference_token)?;

    Ok(RouteRecord {
        network: tokens[0].to_string(),
        route_type: tokens[1].to_string(),
        source_protocol: strip_enclosing(tokens[2], '[', ']').to_string(),
        timestamp: timestamp.to_string(),
        preference,
        next_hop: None,
        interface: None,
    })
}

/// `since` out of a five-token `net type [proto since] * (pref)` header
fn bracket_since<'a>(tokens: &[&'a str]) -> Option<&'a str> {
    if tokens.len() != HEADER_MIN_TOKENS - 1 || !tokens[2].starts_with('[') {
        return None;
    }
    let mut words = strip_enclosing(tokens[2], '[', ']').split_whitespace();
    words.next()?;
    words.last()
}

/// Accepts `(200)` and BIRD's `(100/20)` preference/metric form
fn parse_preference(token: &str) -> Result<u32, SkipReason> {
    let inner = strip_enclosing(token, '(', ')');
    let preference = inner.split('/').next().unwrap_or(inner);

    preference
        .parse()
        .map_err(|_| SkipReason::InvalidPreference {
            token: token.to_string(),
        })
}

/// Apply a `via <gw> on <iface>` or `dev <iface>` line; later lines overwrite earlier ones
fn apply_detail(pending: &mut PendingRoute, line: &str) -> Result<(), SkipReason> {
    let tokens = tokenize(line);
    let (next_hop, interface) = match tokens.first().copied() {
        Some("via") if tokens.len() >= 4 => (Some(tokens[1]), tokens[3]),
        Some("dev") if tokens.len() >= 2 => (None, tokens[1]),
        Some("via") => {
            return Err(SkipReason::TooFewFields {
                found: tokens.len(),
                expected: 4,
            });
        }
        Some("dev") => {
            return Err(SkipReason::TooFewFields {
                found: tokens.len(),
                expected: 2,
            });
        }
        Some(keyword) => {
            return Err(SkipReason::UnknownDetail {
                keyword: keyword.to_string(),
            });
        }
        None => return Ok(()),
    };

    pending.has_details = true;
    if let Some(route) = pending.route.as_mut() {
        if let Some(gateway) = next_hop {
            route.next_hop = Some(gateway.to_string());
        }
        route.interface = Some(interface.to_string());
    }
    Ok(())
}

/// Whitespace tokenizer that keeps `[...]` and `(...)` groups together,
/// so `[bgp1 2024-01-01]` is one token
fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        let group_end = match rest.as_bytes()[0] {
            b'[' => rest.find(']').map(|i| i + 1),
            b'(' => rest.find(')').map(|i| i + 1),
            _ => None,
        };
        let end = group_end
            .unwrap_or_else(|| rest.find(char::is_whitespace).unwrap_or(rest.len()));

        tokens.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }

    tokens
}

fn strip_enclosing(token: &str, open: char, close: char) -> &str {
    let token = token.strip_prefix(open).unwrap_or(token);
    token.strip_suffix(close).unwrap_or(token)
}
