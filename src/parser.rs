use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::{
    filter::{FilterSet, FilterValue},
    vocabulary::{is_placeholder, FilterKey, ValueKind},
};

/// Keyword that opens the marker line carrying the filters of a reply.
pub const MARKER: &str = "FILTROS_COLETADOS";

/// Content of a marker line meaning "no filter confirmed yet".
pub const NO_FILTERS: &str = "nenhum";

const TRUE_TOKENS: &[&str] = &["true", "sim", "verdadeiro"];
const FALSE_TOKENS: &[&str] = &["false", "nao", "não", "falso"];

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i){MARKER}:[ \t]*([^\n]*)")).unwrap());

/// Extracts the filters stated in one model reply.
///
/// Only the last marker line counts. Anything that does not coerce to its
/// key's kind is left out, so a malformed reply yields fewer filters rather
/// than an error.
pub fn parse_filters(reply: &str) -> FilterSet {
    let mut filters = FilterSet::new();

    let Some(content) = MARKER_RE
        .captures_iter(reply)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
    else {
        debug!("Reply has no {MARKER} line");
        return filters;
    };

    if content.is_empty() || content.eq_ignore_ascii_case(NO_FILTERS) {
        return filters;
    }

    for pair in content.split(',') {
        let Some((raw_key, raw_value)) = pair.split_once('=') else {
            continue;
        };
        let Some(key) = FilterKey::lookup(raw_key.trim()) else {
            debug!("Ignoring unknown filter key {:?}", raw_key.trim());
            continue;
        };
        let raw_value = raw_value.trim();
        if is_placeholder(raw_value) {
            continue;
        }
        if let Some(value) = coerce(key, raw_value) {
            filters.insert(key, value);
        }
    }

    filters
}

fn coerce(key: FilterKey, raw: &str) -> Option<FilterValue> {
    match key.kind() {
        ValueKind::Integer => {
            let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
            match digits.parse::<u32>() {
                Ok(n) => Some(FilterValue::Integer(n)),
                Err(_) => {
                    warn!("Value {raw:?} for filter {key} is not a valid number; ignoring it");
                    None
                }
            }
        }
        ValueKind::Boolean => {
            let token = raw.to_lowercase();
            if TRUE_TOKENS.contains(&token.as_str()) {
                Some(FilterValue::Boolean(true))
            } else if FALSE_TOKENS.contains(&token.as_str()) {
                Some(FilterValue::Boolean(false))
            } else {
                debug!("Value {raw:?} for filter {key} is neither true nor false");
                None
            }
        }
        ValueKind::Text => {
            let text = raw.lines().next().unwrap_or_default().trim();
            if is_placeholder(text) {
                return None;
            }
            let text = if key.title_cased() {
                title_case(text)
            } else {
                text.to_string()
            };
            Some(FilterValue::Text(text))
        }
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
