use strucmotif::core::models::ids::ResidueIdentifier;
use strucmotif::core::models::residue::ResidueType;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid residue '{0}'. Expected 'CHAIN:SEQ[INSERTION]' (e.g., 'A:57' or 'A:184A').")]
    InvalidResidue(String),

    #[error("Invalid exchange '{0}'. Expected 'CHAIN:SEQ=TYPE[,TYPE...]' (e.g., 'A:195=SER,CYS').")]
    InvalidExchangeFormat(String),

    #[error("Unknown residue type '{name}' in exchange '{exchange}'.")]
    UnknownResidueType { name: String, exchange: String },

    #[error("Component '{component}' cannot be empty in '{value}'.")]
    EmptyComponent {
        component: &'static str,
        value: String,
    },
}

pub fn parse_residue(value: &str) -> Result<ResidueIdentifier, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "residue",
            value: value.to_string(),
        });
    }
    trimmed
        .parse()
        .map_err(|_| ParseError::InvalidResidue(value.to_string()))
}

pub fn parse_residues(values: &[String]) -> Result<Vec<ResidueIdentifier>, ParseError> {
    values.iter().map(|v| parse_residue(v)).collect()
}

/// Parses `CHAIN:SEQ=TYPE[,TYPE...]`; types may be three-letter names or
/// one-letter codes.
pub fn parse_exchange(value: &str) -> Result<(ResidueIdentifier, Vec<ResidueType>), ParseError> {
    let (residue, types) = value
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidExchangeFormat(value.to_string()))?;
    let residue = parse_residue(residue)?;

    let names: Vec<&str> = types
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if names.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "residue types",
            value: value.to_string(),
        });
    }

    let types = names
        .into_iter()
        .map(|name| {
            name.parse().map_err(|_| ParseError::UnknownResidueType {
                name: name.to_string(),
                exchange: value.to_string(),
            })
        })
        .collect::<Result<Vec<ResidueType>, _>>()?;
    Ok((residue, types))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_residue_lists() {
        let residues = parse_residues(&["A:57".to_string(), " B:-3 ".to_string(), "E:184A".to_string()]).unwrap();
        assert_eq!(
            residues,
            vec![
                ResidueIdentifier::new('A', 57),
                ResidueIdentifier::new('B', -3),
                ResidueIdentifier::new('E', 184).with_insertion_code('A'),
            ]
        );
    }

    #[test]
    fn rejects_malformed_residues() {
        assert_eq!(
            parse_residue("A57"),
            Err(ParseError::InvalidResidue("A57".to_string()))
        );
        assert!(matches!(
            parse_residue("  "),
            Err(ParseError::EmptyComponent { .. })
        ));
    }

    #[test]
    fn parses_exchanges_with_three_and_one_letter_names() {
        let (residue, types) = parse_exchange("A:195=SER,c, thr").unwrap();
        assert_eq!(residue, ResidueIdentifier::new('A', 195));
        assert_eq!(
            types,
            vec![ResidueType::Serine, ResidueType::Cysteine, ResidueType::Threonine]
        );
    }

    #[test]
    fn rejects_malformed_exchanges() {
        assert!(matches!(
            parse_exchange("A:195"),
            Err(ParseError::InvalidExchangeFormat(_))
        ));
        assert!(matches!(
            parse_exchange("A:195="),
            Err(ParseError::EmptyComponent { .. })
        ));
        assert_eq!(
            parse_exchange("A:195=XYZ"),
            Err(ParseError::UnknownResidueType {
                name: "XYZ".to_string(),
                exchange: "A:195=XYZ".to_string()
            })
        );
    }
}
