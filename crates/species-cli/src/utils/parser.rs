use species::core::interpolate::linspace;
use species::core::models::boxes::FilterPair;
use thiserror::Error;

/// Upper limit on the number of masses a `START:STOP:N` range may expand to.
pub const MAX_MASS_POINTS: usize = 100_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error(
        "Invalid mass specification '{0}'. Expected 'START:STOP:N' (e.g., '10:100:10') or a comma-separated list."
    )]
    InvalidMassSpec(String),

    #[error("Mass range '{input}' asks for {count} points, the limit is {max}.")]
    TooManyMasses {
        input: String,
        count: usize,
        max: usize,
    },

    #[error("Invalid number '{value}' in '{input}'.")]
    InvalidNumber { input: String, value: String },

    #[error("Invalid filter pair '{0}'. Expected 'FILTER1,FILTER2' (e.g., 'MKO/NSFCam.J,MKO/NSFCam.H').")]
    InvalidFilterPair(String),

    #[error("Component '{component}' cannot be empty in '{input}'.")]
    EmptyComponent {
        component: &'static str,
        input: String,
    },
}

/// Masses requested from the command line, in M_Jup.
#[derive(Debug, Clone, PartialEq)]
pub struct MassGrid(pub Vec<f64>);

impl MassGrid {
    pub fn values(&self) -> &[f64] {
        &self.0
    }
}

fn parse_number(input: &str, value: &str) -> Result<f64, ParseError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber {
            input: input.to_string(),
            value: value.trim().to_string(),
        })
}

/// Parses `START:STOP:N` into `N` evenly spaced masses, or `M1,M2,...` into an
/// explicit list.
pub fn parse_masses(input: &str) -> Result<MassGrid, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::InvalidMassSpec(input.to_string()));
    }

    if input.contains(':') {
        let parts: Vec<&str> = input.split(':').collect();
        let [start, stop, count] = parts.as_slice() else {
            return Err(ParseError::InvalidMassSpec(input.to_string()));
        };
        let start = parse_number(input, start)?;
        let stop = parse_number(input, stop)?;
        let count = count
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| ParseError::InvalidMassSpec(input.to_string()))?;
        if count > MAX_MASS_POINTS {
            return Err(ParseError::TooManyMasses {
                input: input.to_string(),
                count,
                max: MAX_MASS_POINTS,
            });
        }
        return Ok(MassGrid(linspace(start, stop, count)));
    }

    input
        .split(',')
        .map(|value| parse_number(input, value))
        .collect::<Result<Vec<_>, _>>()
        .map(MassGrid)
}

/// Parses `FILTER1,FILTER2`.
pub fn parse_filter_pair(input: &str) -> Result<FilterPair, ParseError> {
    let Some((first, second)) = input.split_once(',') else {
        return Err(ParseError::InvalidFilterPair(input.to_string()));
    };
    let (first, second) = (first.trim(), second.trim());
    if second.contains(',') {
        return Err(ParseError::InvalidFilterPair(input.to_string()));
    }
    if first.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "first filter",
            input: input.to_string(),
        });
    }
    if second.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "second filter",
            input: input.to_string(),
        });
    }
    Ok(FilterPair::new(first, second))
}
