use hopkmc::core::models::ids::Periodicity;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),

    #[error("Invalid value for '{key}': '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Expected three comma-separated values for '{key}', got '{value}'")]
    InvalidTriplet { key: String, value: String },
}

/// Splits `KEY=VALUE` at the first `=`.
pub fn parse_key_value(pair: &str) -> Result<(&str, &str), ParseError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidKeyValue(pair.to_string())),
    }
}

pub fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parses `"a,b,c"` into three values.
pub fn parse_triplet<T: FromStr + Copy>(key: &str, value: &str) -> Result<[T; 3], ParseError> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(ParseError::InvalidTriplet {
            key: key.to_string(),
            value: value.to_string(),
        });
    };
    Ok([
        parse_value(key, x)?,
        parse_value(key, y)?,
        parse_value(key, z)?,
    ])
}

/// Accepts either a single flag for all axes (`true`) or one flag per axis (`true,false,true`).
pub fn parse_periodicity(key: &str, value: &str) -> Result<Periodicity, ParseError> {
    if value.contains(',') {
        parse_triplet::<bool>(key, value).map(Periodicity)
    } else {
        parse_value::<bool>(key, value).map(Periodicity::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_splits_at_first_equals_sign() {
        assert_eq!(parse_key_value("kmc.n-traj=4"), Ok(("kmc.n-traj", "4")));
        assert_eq!(parse_key_value("a = b=c"), Ok(("a", "b=c")));
        assert!(matches!(
            parse_key_value("no-value"),
            Err(ParseError::InvalidKeyValue(_))
        ));
        assert!(matches!(
            parse_key_value("=3"),
            Err(ParseError::InvalidKeyValue(_))
        ));
    }

    #[test]
    fn triplets_need_exactly_three_values() {
        assert_eq!(parse_triplet::<usize>("size", "4, 4,2"), Ok([4, 4, 2]));
        assert!(matches!(
            parse_triplet::<usize>("size", "4,4"),
            Err(ParseError::InvalidTriplet { .. })
        ));
        assert!(matches!(
            parse_triplet::<usize>("size", "4,x,4"),
            Err(ParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn periodicity_accepts_single_or_per_axis_flags() {
        assert_eq!(parse_periodicity("pbc", "true"), Ok(Periodicity::all()));
        assert_eq!(
            parse_periodicity("pbc", "true,false,true"),
            Ok(Periodicity([true, false, true]))
        );
        assert!(parse_periodicity("pbc", "yes").is_err());
    }
}
