use phf::{Map, phf_map};

/// Physical columns recognised in evolutionary model tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Mass,
    Teff,
    LogLum,
    LogG,
    Radius,
    Deuterium,
    Lithium,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::Mass => "M/Ms",
            Column::Teff => "Teff(K)",
            Column::LogLum => "L/Ls",
            Column::LogG => "lg(g)",
            Column::Radius => "R(Gcm)",
            Column::Deuterium => "D",
            Column::Lithium => "Li",
        }
    }
}

/// Header spellings of the physical columns. Any other header token names a filter.
#[rustfmt::skip]
pub static HEADER_ALIASES: Map<&'static str, Column> = phf_map! {
    // --- Mass (M_sun) ---
    "M/Ms" => Column::Mass, "M/Msun" => Column::Mass, "m/ms" => Column::Mass,

    // --- Effective temperature (K) ---
    "Teff(K)" => Column::Teff, "Teff" => Column::Teff, "teff" => Column::Teff,

    // --- Luminosity, log10(L/L_sun) ---
    "L/Ls" => Column::LogLum, "log(L/Ls)" => Column::LogLum, "lg(L/Ls)" => Column::LogLum,

    // --- Surface gravity, log10(g / cm s^-2) ---
    "lg(g)" => Column::LogG, "log(g)" => Column::LogG, "logg" => Column::LogG,

    // --- Radius (10^9 cm) ---
    "R(Gcm)" => Column::Radius, "R(Gm)" => Column::Radius,

    // --- Abundances relative to initial ---
    "D" => Column::Deuterium, "Li" => Column::Lithium,
};

/// Tokens such as `(K)` that only carry a unit and occupy no data column.
pub fn is_unit_token(token: &str) -> bool {
    token.len() > 2 && token.starts_with('(') && token.ends_with(')')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_resolve_to_their_column() {
        for column in [
            Column::Mass,
            Column::Teff,
            Column::LogLum,
            Column::LogG,
            Column::Radius,
            Column::Deuterium,
            Column::Lithium,
        ] {
            assert_eq!(HEADER_ALIASES.get(column.name()), Some(&column));
        }
    }

    #[test]
    fn filter_names_are_not_physical_columns() {
        for filter in ["J", "H", "K", "L'", "Mp"] {
            assert!(HEADER_ALIASES.get(filter).is_none());
        }
    }

    #[test]
    fn unit_tokens_are_detected() {
        assert!(is_unit_token("(K)"));
        assert!(!is_unit_token("lg(g)"));
        assert!(!is_unit_token("()"));
    }
}
