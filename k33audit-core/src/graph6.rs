//! graph6 codec for single-line graph collection records.
//!
//! A record is a size prefix `N(n)` followed by the upper triangle of the
//! adjacency matrix in column order (`(0,1), (0,2), (1,2), (0,3), ...`), packed
//! six bits per printable byte with 63 added to each byte.

use crate::{error::FormatError, format::GRAPH6_HEADER, graph::Graph};

const BIAS: u8 = 63;
const MAX_BYTE: u8 = 126;
const BITS_PER_BYTE: usize = 6;
const SHORT_ORDER_LIMIT: usize = 62;
const MEDIUM_ORDER_LIMIT: usize = 258_047;
const LONG_ORDER_LIMIT: u64 = 68_719_476_735;

fn invalid(reason: &'static str) -> FormatError {
    FormatError::InvalidGraph6 { reason }
}

/// Decodes one graph6 record.
///
/// A leading `>>graph6<<` header and trailing whitespace are ignored.
///
/// # Errors
/// Returns [`FormatError::InvalidGraph6`] when the record is empty, uses a
/// byte outside `63..=126`, is a sparse6/digraph6 record, or carries too few
/// or too many adjacency bytes for its order.
///
/// # Examples
/// ```
/// use k33audit_core::graph6;
///
/// let k5 = graph6::decode("D~{")?;
/// assert_eq!(k5.order(), 5);
/// assert_eq!(k5.edge_count(), 10);
/// # Ok::<(), k33audit_core::FormatError>(())
/// ```
pub fn decode(record: &str) -> Result<Graph, FormatError> {
    let body = record
        .strip_prefix(GRAPH6_HEADER)
        .unwrap_or(record)
        .trim_end();
    if body.starts_with(':') || body.starts_with('&') {
        return Err(invalid("sparse6 and digraph6 records are not supported"));
    }
    let bytes = body.as_bytes();
    if bytes.is_empty() {
        return Err(invalid("record is empty"));
    }
    if bytes.iter().any(|&byte| !(BIAS..=MAX_BYTE).contains(&byte)) {
        return Err(invalid("byte outside the printable graph6 range"));
    }
    let (order, data) = decode_order(bytes)?;

    let pairs = order.saturating_mul(order.saturating_sub(1)) / 2;
    let expected = pairs.div_ceil(BITS_PER_BYTE);
    if data.len() < expected {
        return Err(invalid("record is truncated"));
    }
    if data.len() > expected {
        return Err(invalid("record has trailing data"));
    }

    let mut graph = Graph::new(order);
    let mut bit = 0;
    for v in 1..order {
        for u in 0..v {
            let byte = data.get(bit / BITS_PER_BYTE).copied().unwrap_or(BIAS) - BIAS;
            let shift = BITS_PER_BYTE - 1 - bit % BITS_PER_BYTE;
            if (byte >> shift) & 1 == 1 {
                graph
                    .add_edge(u, v)
                    .map_err(|_| invalid("record lists an edge twice"))?;
            }
            bit += 1;
        }
    }
    Ok(graph)
}

fn decode_order(bytes: &[u8]) -> Result<(usize, &[u8]), FormatError> {
    let sextets = |digits: &[u8]| {
        digits
            .iter()
            .fold(0_u64, |acc, &byte| (acc << BITS_PER_BYTE) | u64::from(byte - BIAS))
    };
    let (value, rest) = match bytes {
        [MAX_BYTE, MAX_BYTE, rest @ ..] => {
            let digits = rest.get(..6).ok_or_else(|| invalid("size prefix is truncated"))?;
            (sextets(digits), rest.get(6..).unwrap_or_default())
        }
        [MAX_BYTE, rest @ ..] => {
            let digits = rest.get(..3).ok_or_else(|| invalid("size prefix is truncated"))?;
            (sextets(digits), rest.get(3..).unwrap_or_default())
        }
        [first, rest @ ..] => (u64::from(first - BIAS), rest),
        [] => return Err(invalid("record is empty")),
    };
    let order = usize::try_from(value).map_err(|_| invalid("order exceeds addressable memory"))?;
    Ok((order, rest))
}

/// Encodes `graph` as a graph6 record without header or newline.
///
/// Only the arcs `u -> v` with `u < v` are consulted, so the graph is
/// expected to be symmetric.
#[must_use]
pub fn encode(graph: &Graph) -> String {
    let order = graph.order();
    let mut bytes = encode_order(order);
    let mut current = 0_u8;
    let mut filled = 0;
    for v in 1..order {
        for u in 0..v {
            current = (current << 1) | u8::from(graph.has_arc(u, v));
            filled += 1;
            if filled == BITS_PER_BYTE {
                bytes.push(current + BIAS);
                current = 0;
                filled = 0;
            }
        }
    }
    if filled > 0 {
        bytes.push((current << (BITS_PER_BYTE - filled)) + BIAS);
    }
    bytes.into_iter().map(char::from).collect()
}

fn encode_order(order: usize) -> Vec<u8> {
    let sextets = |value: u64, count: usize| {
        (0..count)
            .rev()
            .map(move |index| ((value >> (index * BITS_PER_BYTE)) & 0x3f) as u8 + BIAS)
    };
    let value = order as u64;
    if order <= SHORT_ORDER_LIMIT {
        sextets(value, 1).collect()
    } else if order <= MEDIUM_ORDER_LIMIT {
        std::iter::once(MAX_BYTE).chain(sextets(value, 3)).collect()
    } else {
        let value = value.min(LONG_ORDER_LIMIT);
        [MAX_BYTE, MAX_BYTE]
            .into_iter()
            .chain(sextets(value, 6))
            .collect()
    }
}
