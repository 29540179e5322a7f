//! Dimension specifications: the ordered search space handed to an optimizer.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::ConfigError;

/// How a single dimension is sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dimension {
    /// Continuous range [low, high]. Two coordinates closer than `precision`
    /// are considered the same point.
    Continuous { low: f64, high: f64, precision: f64 },
    /// Integer range [low, high] inclusive. `ordered` tells the optimizer
    /// whether neighbouring values are related (false = categorical).
    Discrete { low: i64, high: i64, ordered: bool },
}

impl Dimension {
    /// Lower and upper bounds as floats.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Self::Continuous { low, high, .. } => (*low, *high),
            Self::Discrete { low, high, .. } => (*low as f64, *high as f64),
        }
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self, Self::Discrete { .. })
    }

    /// Whether two coordinates on this dimension denote the same value.
    pub fn same_value(&self, a: f64, b: f64) -> bool {
        match self {
            Self::Continuous { precision, .. } => (a - b).abs() < *precision,
            Self::Discrete { .. } => a == b,
        }
    }

    /// Whether `value` lies inside the declared range.
    pub fn contains(&self, value: f64) -> bool {
        let (low, high) = self.bounds();
        value >= low && value <= high
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidDimension {
            name: name.to_string(),
            message: message.to_string(),
        };

        match self {
            Self::Continuous {
                low,
                high,
                precision,
            } => {
                if !low.is_finite() || !high.is_finite() {
                    return Err(invalid("range bounds must be finite"));
                }
                if low > high {
                    return Err(invalid("low is greater than high"));
                }
                if !precision.is_finite() || *precision <= 0.0 {
                    return Err(invalid("precision must be positive"));
                }
            }
            Self::Discrete { low, high, .. } => {
                if low > high {
                    return Err(invalid("low is greater than high"));
                }
            }
        }
        Ok(())
    }
}

/// A named dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDef {
    pub name: String,
    #[serde(flatten)]
    pub dimension: Dimension,
}

/// The full search space: an ordered list of dimensions.
///
/// Declaration order is significant. The i-th coordinate of every solution
/// belongs to the i-th dimension declared here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionSpec {
    dimensions: Vec<DimensionDef>,
}

impl DimensionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_continuous(
        mut self,
        name: impl Into<String>,
        low: f64,
        high: f64,
        precision: f64,
    ) -> Self {
        self.dimensions.push(DimensionDef {
            name: name.into(),
            dimension: Dimension::Continuous {
                low,
                high,
                precision,
            },
        });
        self
    }

    pub fn add_discrete(mut self, name: impl Into<String>, low: i64, high: i64, ordered: bool) -> Self {
        self.dimensions.push(DimensionDef {
            name: name.into(),
            dimension: Dimension::Discrete { low, high, ordered },
        });
        self
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DimensionDef> {
        self.dimensions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DimensionDef> {
        self.dimensions.iter()
    }

    /// Dimension names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.iter().map(|d| d.name.as_str())
    }

    /// Reject empty specs, duplicate names and malformed ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dimensions.is_empty() {
            return Err(ConfigError::EmptyDimensions);
        }

        let mut seen = HashSet::new();
        for def in &self.dimensions {
            if !seen.insert(def.name.as_str()) {
                return Err(ConfigError::DuplicateDimension {
                    name: def.name.clone(),
                });
            }
            def.dimension.validate(&def.name)?;
        }
        Ok(())
    }

    /// Whether `x` has one in-range coordinate per dimension.
    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.dimensions.len()
            && self
                .dimensions
                .iter()
                .zip(x)
                .all(|(def, v)| def.dimension.contains(*v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec() -> DimensionSpec {
        DimensionSpec::new()
            .add_continuous("height", -10.0, 10.0, 1e-2)
            .add_discrete("width", -10, 10, false)
    }

    #[test]
    fn builder_preserves_declaration_order() {
        let spec = DimensionSpec::new()
            .add_continuous("z", 0.0, 1.0, 0.1)
            .add_continuous("a", 0.0, 1.0, 0.1)
            .add_discrete("m", 0, 3, true);
        let names: Vec<&str> = spec.names().collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn validate_accepts_well_formed_spec() {
        assert!(sample_spec().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_spec() {
        assert_eq!(DimensionSpec::new().validate(), Err(ConfigError::EmptyDimensions));
    }

    #[test]
    fn validate_rejects_duplicates() {
        let spec = DimensionSpec::new()
            .add_continuous("x", 0.0, 1.0, 0.1)
            .add_discrete("x", 0, 1, true);
        assert_eq!(
            spec.validate(),
            Err(ConfigError::DuplicateDimension { name: "x".into() })
        );
    }

    #[test]
    fn validate_rejects_bad_ranges() {
        let inverted = DimensionSpec::new().add_continuous("x", 1.0, 0.0, 0.1);
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::InvalidDimension { .. })
        ));

        let no_precision = DimensionSpec::new().add_continuous("x", 0.0, 1.0, 0.0);
        assert!(matches!(
            no_precision.validate(),
            Err(ConfigError::InvalidDimension { .. })
        ));

        let infinite = DimensionSpec::new().add_continuous("x", 0.0, f64::INFINITY, 0.1);
        assert!(infinite.validate().is_err());

        let discrete = DimensionSpec::new().add_discrete("k", 3, 2, true);
        assert!(discrete.validate().is_err());
    }

    #[test]
    fn same_value_uses_precision_for_continuous() {
        let dim = Dimension::Continuous {
            low: 0.0,
            high: 1.0,
            precision: 0.01,
        };
        assert!(dim.same_value(0.500, 0.505));
        assert!(!dim.same_value(0.50, 0.52));

        let discrete = Dimension::Discrete {
            low: 0,
            high: 5,
            ordered: true,
        };
        assert!(discrete.same_value(3.0, 3.0));
        assert!(!discrete.same_value(3.0, 4.0));
    }

    #[test]
    fn contains_checks_arity_and_bounds() {
        let spec = sample_spec();
        assert!(spec.contains(&[0.5, 3.0]));
        assert!(!spec.contains(&[0.5]));
        assert!(!spec.contains(&[11.0, 3.0]));
    }

    #[test]
    fn json_round_trip_keeps_order() {
        let spec = sample_spec();
        let json = serde_json::to_string(&spec).unwrap();
        let back: DimensionSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
        assert!(json.find("height").unwrap() < json.find("width").unwrap());
    }
}
