use log::trace;
use regex::Regex;
use std::{collections::BTreeMap, sync::LazyLock};

/// Counter name (dotted hierarchical path) to value, one per statistics block
pub type CounterMap = BTreeMap<String, f64>;

// `<name> <value> ...trailing ignored...`
// the value is a signed decimal with optional exponent, or inf/nan
static COUNTER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*([a-z0-9_.:\-/\[\]]+)\s+([+-]?(?:(?:\d+(?:\.\d*)?|\.\d+)(?:e[+-]?\d+)?|inf|nan))(?:\s|$)",
    )
    .unwrap()
});

/// Recognize one line of a statistics dump as a `(name, value)` counter sample.
///
/// Returns `None` for headers, comments, blank lines and anything whose value
/// column is not a number.
pub fn parse_counter_line(line: &str) -> Option<(&str, f64)> {
    let captures = COUNTER_LINE.captures(line)?;
    let name = captures.get(1)?.as_str();
    let text = captures.get(2)?.as_str();
    match text.parse::<f64>() {
        Ok(value) => Some((name, value)),
        Err(err) => {
            trace!("skipping counter {name}: {text:?} is not a number ({err})");
            None
        }
    }
}
