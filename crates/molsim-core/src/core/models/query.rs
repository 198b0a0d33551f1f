use super::error::ModelError;
use super::residue::{Residue, ResidueType};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResidueFilter {
    Type(ResidueType),
    Name(String),
    Number(isize),
}

impl ResidueFilter {
    /// Builds a filter from a key/value pair such as `("type", "protein")`.
    pub fn parse(key: &str, value: &str) -> Result<Self, ModelError> {
        let invalid = || ModelError::InvalidQueryValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key.trim() {
            "type" => value.parse().map(Self::Type).map_err(|_| invalid()),
            "name" => Ok(Self::Name(value.trim().to_string())),
            "number" => value.trim().parse().map(Self::Number).map_err(|_| invalid()),
            other => Err(ModelError::UnknownQueryKey(other.to_string())),
        }
    }

    pub fn matches(&self, residue: &Residue) -> bool {
        match self {
            Self::Type(kind) => residue.residue_type == *kind,
            Self::Name(name) => residue.name == *name,
            Self::Number(number) => residue.number == *number,
        }
    }
}

/// Conjunction of residue filters. An empty query matches every residue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResidueQuery {
    filters: Vec<ResidueFilter>,
}

impl ResidueQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: ResidueFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let filters = pairs
            .into_iter()
            .map(|(key, value)| ResidueFilter::parse(key, value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { filters })
    }

    pub fn filters(&self) -> &[ResidueFilter] {
        &self.filters
    }

    pub fn matches(&self, residue: &Residue) -> bool {
        self.filters.iter().all(|f| f.matches(residue))
    }
}

impl FromStr for ResidueQuery {
    type Err = ModelError;

    /// Parses a comma-separated list of `key=value` pairs, e.g. `type=protein,number=12`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pairs = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.split_once('=').ok_or_else(|| ModelError::InvalidQueryValue {
                    key: part.to_string(),
                    value: String::new(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_pairs(pairs)
    }
}
