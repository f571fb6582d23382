//! Hulpfuncties voor het converteren van attribuutteksten naar getallen.

use super::{ParseError, ParseResult};
use crate::model::Vector3;

/// Converteert een optionele tekst naar een `f64`.
///
/// Lege of ontbrekende tekst levert `default` op; alles wat wel aanwezig is
/// maar niet als getal leesbaar is (ook alleen whitespace), faalt met
/// [`ParseError::MalformedNumber`].
pub fn coerce_float(text: Option<&str>, default: f64) -> ParseResult<f64> {
    let Some(raw) = text.filter(|value| !value.is_empty()) else {
        return Ok(default);
    };
    raw.trim().parse::<f64>().map_err(|_| ParseError::MalformedNumber {
        value: raw.to_owned(),
    })
}

/// Converteert een verplichte tekst naar een `i64`.
///
/// Integer-velden (vertex-ids, gewicht-indices) hebben nooit een default:
/// ontbrekende of lege tekst faalt met [`ParseError::MissingRequiredField`].
pub fn coerce_int(text: Option<&str>, field: &str) -> ParseResult<i64> {
    let Some(raw) = text.filter(|value| !value.is_empty()) else {
        return Err(ParseError::MissingRequiredField {
            field: field.to_owned(),
        });
    };
    raw.trim().parse::<i64>().map_err(|_| ParseError::MalformedNumber {
        value: raw.to_owned(),
    })
}

/// Leest drie componenten in vaste volgorde (x, y, z); ontbrekende
/// componenten worden 0.0.
pub fn parse_vector3(components: [Option<&str>; 3]) -> ParseResult<Vector3> {
    let [x, y, z] = components;
    Ok([
        coerce_float(x, 0.0)?,
        coerce_float(y, 0.0)?,
        coerce_float(z, 0.0)?,
    ])
}

/// Splitst een door komma's en/of whitespace gescheiden indexlijst.
pub fn split_index_list(text: &str) -> ParseResult<Vec<i64>> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyIndexList);
    }

    let indices = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::parse::<i64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ParseError::MalformedIndexList {
            value: text.to_owned(),
        })?;

    if indices.is_empty() {
        return Err(ParseError::EmptyIndexList);
    }
    Ok(indices)
}
