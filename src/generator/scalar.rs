//! Leaf value generators: strings, numbers, booleans, enumerations and examples.
//!
//! Numeric generation keeps the decimal precision of the tightest declared bound so
//! that narrow fractional ranges (`0.000006..0.000009`) still produce values with
//! enough digits to land strictly inside the range.

use fake::faker::lorem::en::Words;
use fake::Fake;
use rand::distributions::Distribution;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Number, Value};
use tracing::{debug, warn};

use crate::config::GeneratorSettings;
use crate::domain::Constraints;

/// Multiplier range used for `multipleOf` when no maximum is declared.
const DEFAULT_MULTIPLIERS: (f64, f64) = (1.0, 5.0);

/// Decimal places considered when turning a fractional step into an integral one.
const MAX_STEP_PLACES: usize = 18;

/// Extra digits of precision a draw may use beyond the bounds' own precision.
const PRECISION_JITTER: usize = 2;

pub fn boolean<R: Rng>(rng: &mut R) -> bool {
    rng.gen_range(0..100_000) < 50_000
}

/// One of the declared enumeration members, if any are declared.
pub fn enumerated<R: Rng>(rng: &mut R, constraints: &Constraints) -> Option<Value> {
    constraints.enum_values.choose(rng).cloned()
}

/// A declared example: one of `examples` when present, otherwise `example` verbatim.
pub fn example<R: Rng>(rng: &mut R, constraints: &Constraints) -> Option<Value> {
    let examples = constraints.example_values();
    if let Some(sampled) = examples.choose(rng) {
        return Some((*sampled).clone());
    }
    constraints.example.clone()
}

pub fn string<R: Rng>(
    rng: &mut R,
    constraints: &Constraints,
    settings: &GeneratorSettings,
) -> String {
    if let Some(pattern) = &constraints.pattern {
        match rand_regex::Regex::compile(strip_anchors(pattern), settings.pattern_max_repeat) {
            Ok(regex) => return regex.sample(rng),
            Err(e) => warn!(pattern = %pattern, error = %e, "Unusable pattern, falling back to filler text"),
        }
    }
    filler_text(rng, constraints, settings)
}

/// Lorem words cut to a length drawn from `[minLength, maxLength]`.
fn filler_text<R: Rng>(
    rng: &mut R,
    constraints: &Constraints,
    settings: &GeneratorSettings,
) -> String {
    let min_length = constraints.min_length.unwrap_or(1);
    let max_length = constraints
        .max_length
        .unwrap_or_else(|| settings.string_max_length.max(min_length))
        .max(min_length);
    let target = rng.gen_range(min_length..=max_length);
    if target == 0 {
        return String::new();
    }

    let words: Vec<String> = Words(target..target + 1).fake_with_rng(rng);
    let mut text: String = words.join(" ").chars().take(target).collect();

    // A cut right after a word leaves a trailing space; a letter takes its place so
    // the drawn length still holds.
    while text.ends_with(char::is_whitespace) {
        text.pop();
    }
    while text.chars().count() < target {
        text.push(rng.gen_range(b'a'..=b'z') as char);
    }
    text
}

/// `^` and an unescaped trailing `$` carry no meaning for a generated full string.
fn strip_anchors(pattern: &str) -> &str {
    let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
    match pattern.strip_suffix('$') {
        Some(body) => {
            let escapes = body.chars().rev().take_while(|c| *c == '\\').count();
            if escapes % 2 == 0 {
                body
            } else {
                pattern
            }
        }
        None => pattern,
    }
}

/// A number honouring `multipleOf` or the declared range.
///
/// `integral` selects integer generation; otherwise values are continuous.
pub fn number<R: Rng>(
    rng: &mut R,
    constraints: &Constraints,
    settings: &GeneratorSettings,
    integral: bool,
) -> Value {
    match constraints.multiple_of {
        Some(step) if step.is_finite() && step != 0.0 => {
            let step = if integral { integral_step(step.abs()) } else { step.abs() };
            stepped(rng, step, constraints, integral)
        }
        _ if integral => integer_in_range(rng, constraints, settings),
        _ => float_in_range(rng, constraints, settings),
    }
}

fn stepped<R: Rng>(rng: &mut R, step: f64, constraints: &Constraints, integral: bool) -> Value {
    let lowest = constraints.lower_bound().map(|minimum| (minimum / step).ceil());
    let highest = constraints.upper_bound().map(|maximum| (maximum / step).floor());

    let (low, high) = match (lowest, highest) {
        (None, None) => DEFAULT_MULTIPLIERS,
        // A maximum below one step collapses the range to [0, 0].
        (None, Some(high)) => (DEFAULT_MULTIPLIERS.0.min(high), high),
        (Some(low), None) => (low, low + DEFAULT_MULTIPLIERS.1 - DEFAULT_MULTIPLIERS.0),
        (Some(low), Some(high)) if low <= high => (low, high),
        (Some(_), Some(high)) => {
            debug!(step, "No multiple of the step lies inside the declared range");
            (high, high)
        }
    };

    let multiplier = whole_number(rng, low, high);
    let value = round_to(step * multiplier, decimal_places(step));
    number_value(value, integral)
}

/// The smallest positive integer that is a multiple of `step`.
fn integral_step(step: f64) -> f64 {
    if step.fract() == 0.0 {
        return step;
    }
    let scale = 10u64.pow(decimal_places(step).min(MAX_STEP_PLACES) as u32);
    let numerator = ((step * scale as f64).round() as u64).max(1);
    (numerator / gcd(numerator, scale)) as f64
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// A whole number in `[low, high]`; both bounds are whole numbers themselves.
fn whole_number<R: Rng>(rng: &mut R, low: f64, high: f64) -> f64 {
    if low >= i64::MIN as f64 && high < i64::MAX as f64 {
        return rng.gen_range(low as i64..=high as i64) as f64;
    }
    // Past the i64 range; every float out there is already whole.
    uniform(rng, low, high).round().clamp(low, high)
}

/// A float in `[minimum, maximum]`, including spans wider than `f64::MAX`.
fn uniform<R: Rng>(rng: &mut R, minimum: f64, maximum: f64) -> f64 {
    if (maximum - minimum).is_finite() {
        return rng.gen_range(minimum..=maximum);
    }
    let half_step = rng.gen::<f64>() * (maximum / 2.0 - minimum / 2.0);
    (minimum + half_step + half_step).min(maximum)
}

fn integer_in_range<R: Rng>(
    rng: &mut R,
    constraints: &Constraints,
    settings: &GeneratorSettings,
) -> Value {
    let declared_min = constraints.lower_bound();
    let declared_max = constraints.upper_bound();
    let (minimum, maximum) = effective_range(declared_min, declared_max, settings);
    let (low, high) = (minimum.ceil(), maximum.floor());

    if low > high {
        debug!(minimum, maximum, "No integer lies inside the declared range");
        return number_value(low, true);
    }
    if low < i64::MIN as f64 || high >= i64::MAX as f64 {
        return number_value(whole_number(rng, low, high), true);
    }

    let mut value = rng.gen_range(low as i64..=high as i64);

    let inside = |candidate: i64| {
        let candidate = candidate as f64;
        declared_min.map_or(true, |m| candidate > m) && declared_max.map_or(true, |m| candidate < m)
    };
    if !inside(value) {
        // Without an interior integer the bound itself stands.
        if let Some(neighbour) = [value.checked_sub(1), value.checked_add(1)]
            .into_iter()
            .flatten()
            .find(|candidate| inside(*candidate))
        {
            value = neighbour;
        }
    }
    Value::from(value)
}

fn float_in_range<R: Rng>(
    rng: &mut R,
    constraints: &Constraints,
    settings: &GeneratorSettings,
) -> Value {
    let declared_min = constraints.lower_bound();
    let declared_max = constraints.upper_bound();
    let (minimum, maximum) = effective_range(declared_min, declared_max, settings);

    if minimum >= maximum {
        debug!(minimum, maximum, "Empty numeric range, returning its lower bound");
        return number_value(minimum, false);
    }

    let floor = decimal_precision(minimum).max(decimal_precision(maximum));
    let ceiling = floor + rng.gen_range(0..=PRECISION_JITTER);

    let raw = uniform(rng, minimum, maximum);
    let mut value = truncate_decimals(raw, rng.gen_range(floor..=ceiling));
    if value < minimum || value > maximum {
        // Truncation stepped past a bound carrying more digits than its precision.
        value = raw;
    }

    if Some(value) == declared_max || Some(value) == declared_min {
        let half_gap = maximum / 2.0 - minimum / 2.0;
        let little_gap = truncate_decimals(rng.gen_range(0.0..=half_gap), rng.gen_range(floor..=ceiling)) / 5.0;
        let nudged = if Some(value) == declared_max {
            value - little_gap
        } else {
            value + little_gap
        };
        value = if nudged > minimum && nudged < maximum {
            nudged
        } else {
            minimum + half_gap
        };
    }

    number_value(value, false)
}

/// Declared bounds with the configured defaults filling the gaps.
fn effective_range(
    declared_min: Option<f64>,
    declared_max: Option<f64>,
    settings: &GeneratorSettings,
) -> (f64, f64) {
    let span = settings.number_max - settings.number_min;
    match (declared_min, declared_max) {
        (Some(minimum), Some(maximum)) => (minimum, maximum),
        (Some(minimum), None) => (minimum, settings.number_max.max(minimum + span / 2.0)),
        (None, Some(maximum)) => (settings.number_min.min(maximum - span / 2.0), maximum),
        (None, None) => (settings.number_min, settings.number_max),
    }
}

/// One plus the number of zeros directly after the decimal point; 1 for integers.
pub fn decimal_precision(number: f64) -> usize {
    let text = number.to_string();
    match text.split_once('.') {
        Some((_, fraction)) => fraction.chars().take_while(|c| *c == '0').count() + 1,
        None => 1,
    }
}

/// Cut the decimal representation to `digits` places after the point.
pub fn truncate_decimals(number: f64, digits: usize) -> f64 {
    let text = number.to_string();
    match text.find('.') {
        Some(dot) => {
            let end = (dot + 1 + digits).min(text.len());
            text[..end].trim_end_matches('.').parse().unwrap_or(number)
        }
        None => number,
    }
}

fn decimal_places(number: f64) -> usize {
    number
        .to_string()
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len())
}

fn round_to(number: f64, digits: usize) -> f64 {
    let scale = 10f64.powi(digits as i32);
    (number * scale).round() / scale
}

fn number_value(number: f64, integral: bool) -> Value {
    if integral && number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        return Value::from(number as i64);
    }
    Number::from_f64(number).map(Value::Number).unwrap_or(Value::Null)
}
