//! Reference adapter: a byte-level VCD scanner.
//!
//! Not a full VCD library. It tokenizes the header into a signal table and
//! walks value changes without building waveforms, which makes it a useful
//! lower bound for the other adapters and a self-contained adapter for tests.

use std::collections::HashMap;
use std::hint::black_box;
use std::path::Path;
use std::process::ExitCode;
use wavebench::{Adapter, AdapterError, AdapterMain, Format, Operation};

/// Signals loaded by `value_query`
const QUERY_SIGNALS: usize = 4;
/// Time points sampled per queried signal
const QUERY_POINTS: u64 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Signal {
    path: String,
    id: String,
    width: u32,
}

#[derive(Debug)]
struct Header {
    signals: Vec<Signal>,
    body_offset: usize,
}

enum Event<'a> {
    Time(u64),
    Change { id: &'a [u8], value: &'a [u8] },
}

/// Whitespace-separated tokens with their end offset
struct Tokens<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let data = self.data;
        while self.pos < data.len() && data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= data.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < data.len() && !data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        Some(&data[start..self.pos])
    }
}

fn text(token: &[u8]) -> String {
    String::from_utf8_lossy(token).into_owned()
}

fn skip_to_end(tokens: &mut Tokens<'_>) -> Result<(), AdapterError> {
    tokens
        .find(|t| *t == b"$end")
        .map(|_| ())
        .ok_or_else(|| AdapterError::open_failed("unterminated declaration"))
}

fn parse_header(data: &[u8]) -> Result<Header, AdapterError> {
    let mut tokens = Tokens::new(data, 0);
    let mut scopes: Vec<String> = Vec::new();
    let mut signals = Vec::new();

    while let Some(token) = tokens.next() {
        match token {
            b"$scope" => {
                let _kind = tokens.next();
                let name = tokens
                    .next()
                    .ok_or_else(|| AdapterError::open_failed("truncated $scope"))?;
                scopes.push(text(name));
                skip_to_end(&mut tokens)?;
            }
            b"$upscope" => {
                scopes.pop();
                skip_to_end(&mut tokens)?;
            }
            b"$var" => {
                let mut fields = Vec::with_capacity(4);
                for field in tokens.by_ref() {
                    if field == b"$end" {
                        break;
                    }
                    fields.push(field);
                }
                if fields.len() < 4 {
                    return Err(AdapterError::open_failed("truncated $var declaration"));
                }
                let width = text(fields[1])
                    .parse()
                    .map_err(|_| AdapterError::open_failed("invalid $var width"))?;
                let mut path = scopes.join(".");
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(&text(fields[3]));
                signals.push(Signal {
                    path,
                    id: text(fields[2]),
                    width,
                });
            }
            b"$enddefinitions" => {
                skip_to_end(&mut tokens)?;
                return Ok(Header {
                    signals,
                    body_offset: tokens.pos,
                });
            }
            t if t.starts_with(b"$") => skip_to_end(&mut tokens)?,
            _ => return Err(AdapterError::open_failed("not a VCD file: unexpected header token")),
        }
    }

    Err(AdapterError::open_failed("not a VCD file: missing $enddefinitions"))
}

fn scan_body<'a, F>(data: &'a [u8], offset: usize, mut on_event: F) -> Result<(), AdapterError>
where
    F: FnMut(Event<'a>),
{
    let mut tokens = Tokens::new(data, offset);
    while let Some(token) = tokens.next() {
        match token[0] {
            b'#' => {
                let time = std::str::from_utf8(&token[1..])
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| {
                        AdapterError::open_failed(format!("invalid timestamp '{}'", text(token)))
                    })?;
                on_event(Event::Time(time));
            }
            b'$' => {
                if token == b"$comment" {
                    skip_to_end(&mut tokens)?;
                }
            }
            b'b' | b'B' | b'r' | b'R' => {
                let id = tokens
                    .next()
                    .ok_or_else(|| AdapterError::open_failed("vector change without id"))?;
                on_event(Event::Change {
                    id,
                    value: &token[1..],
                });
            }
            b'0' | b'1' | b'x' | b'X' | b'z' | b'Z' => on_event(Event::Change {
                id: &token[1..],
                value: &token[..1],
            }),
            _ => {}
        }
    }
    Ok(())
}

fn full_parse(data: &[u8]) -> Result<usize, AdapterError> {
    let header = parse_header(data)?;
    let mut last_values: HashMap<&[u8], &[u8]> = HashMap::with_capacity(header.signals.len());
    let mut changes = 0usize;
    scan_body(data, header.body_offset, |event| {
        if let Event::Change { id, value } = event {
            last_values.insert(id, value);
            changes += 1;
        }
    })?;
    black_box(&last_values);
    Ok(changes)
}

fn time_range(data: &[u8], offset: usize) -> Result<Option<(u64, u64)>, AdapterError> {
    let mut range: Option<(u64, u64)> = None;
    scan_body(data, offset, |event| {
        if let Event::Time(t) = event {
            range = Some(match range {
                None => (t, t),
                Some((first, last)) => (first.min(t), last.max(t)),
            });
        }
    })?;
    Ok(range)
}

/// Load the first few signals and sample each at evenly spaced times
fn value_query(data: &[u8], header: &Header) -> Result<usize, AdapterError> {
    let selected: Vec<&[u8]> = header
        .signals
        .iter()
        .take(QUERY_SIGNALS)
        .map(|s| s.id.as_bytes())
        .collect();
    let mut waves: Vec<Vec<(u64, &[u8])>> = vec![Vec::new(); selected.len()];
    let mut now = 0u64;

    scan_body(data, header.body_offset, |event| match event {
        Event::Time(t) => now = t,
        Event::Change { id, value } => {
            if let Some(index) = selected.iter().position(|s| *s == id) {
                waves[index].push((now, value));
            }
        }
    })?;

    let end = waves
        .iter()
        .filter_map(|w| w.last().map(|(t, _)| *t))
        .max()
        .unwrap_or(0);
    let mut hits = 0;
    for wave in &waves {
        for step in 0..QUERY_POINTS {
            let t = (end as u128 * step as u128 / QUERY_POINTS as u128) as u64;
            let index = wave.partition_point(|(time, _)| *time <= t);
            if index > 0 {
                black_box(wave[index - 1].1);
                hits += 1;
            }
        }
    }
    Ok(hits)
}

struct VcdScan;

impl Adapter for VcdScan {
    fn name(&self) -> &str {
        "vcd-scan"
    }

    fn prepare(&mut self, file: &Path, _operation: Operation) -> Result<(), AdapterError> {
        if Format::from_path(file) != Some(Format::Vcd) {
            return Err(AdapterError::unsupported(format!(
                "{} is not a VCD file",
                file.display()
            )));
        }
        if !file.is_file() {
            return Err(AdapterError::open_failed(format!(
                "{}: no such file",
                file.display()
            )));
        }
        Ok(())
    }

    fn execute(&mut self, file: &Path, operation: Operation) -> Result<(), AdapterError> {
        let data = std::fs::read(file)
            .map_err(|e| AdapterError::open_failed(format!("{}: {}", file.display(), e)))?;

        match operation {
            Operation::FullParse => {
                black_box(full_parse(&data)?);
            }
            Operation::SignalList => {
                let header = parse_header(&data)?;
                black_box(
                    header
                        .signals
                        .iter()
                        .map(|s| s.path.len() + s.width as usize)
                        .sum::<usize>(),
                );
            }
            Operation::TimeRange => {
                let header = parse_header(&data)?;
                black_box(time_range(&data, header.body_offset)?);
            }
            Operation::ValueQuery => {
                let header = parse_header(&data)?;
                black_box(value_query(&data, &header)?);
            }
            Operation::Pipeline => {
                let header = parse_header(&data)?;
                black_box(header.signals.len());
                black_box(time_range(&data, header.body_offset)?);
                black_box(value_query(&data, &header)?);
            }
        }
        Ok(())
    }
}

fn main() -> ExitCode {
    match AdapterMain::new(VcdScan).run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("vcd-scan: {}", e);
            ExitCode::FAILURE
        }
    }
}
