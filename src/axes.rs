//! Y-axis assignment by unit of measurement

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisId {
    Left,
    Right,
}

impl AxisId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AxisId::Left => "left",
            AxisId::Right => "right",
        }
    }
}

/// Assign each entity to an axis by its unit.
///
/// The first unit seen goes left and every other unit goes right.
/// Entities without a unit share one bucket.
pub fn assign_axes<S: AsRef<str>>(entities: &[(S, Option<S>)]) -> AHashMap<String, AxisId> {
    let mut unit_axes: AHashMap<Option<&str>, AxisId> = AHashMap::new();
    let mut assigned = AHashMap::with_capacity(entities.len());

    for (entity_id, unit) in entities {
        let unit: Option<&str> = unit.as_ref().map(|unit| unit.as_ref());
        let next = if unit_axes.is_empty() {
            AxisId::Left
        } else {
            AxisId::Right
        };
        let axis = *unit_axes.entry(unit).or_insert(next);
        assigned.insert(entity_id.as_ref().to_string(), axis);
    }

    assigned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_unit_shares_axis() {
        let axes = assign_axes(&[("sensor.power1", Some("kWh")), ("sensor.power2", Some("kWh"))]);

        assert_eq!(axes["sensor.power1"], AxisId::Left);
        assert_eq!(axes["sensor.power2"], AxisId::Left);
    }

    #[test]
    fn test_first_unit_goes_left() {
        let axes = assign_axes(&[("sensor.cost", Some("£")), ("sensor.power", Some("kWh"))]);

        assert_eq!(axes["sensor.cost"], AxisId::Left);
        assert_eq!(axes["sensor.power"], AxisId::Right);
    }

    #[test]
    fn test_third_unit_goes_right() {
        let axes = assign_axes(&[
            ("sensor.power", Some("kWh")),
            ("sensor.cost", Some("£")),
            ("sensor.temp", Some("°C")),
        ]);

        assert_eq!(axes["sensor.power"], AxisId::Left);
        assert_eq!(axes["sensor.cost"], AxisId::Right);
        assert_eq!(axes["sensor.temp"], AxisId::Right);
    }

    #[test]
    fn test_missing_unit_is_its_own_bucket() {
        let axes = assign_axes(&[("sensor.power", Some("kWh")), ("sensor.unknown", None)]);

        assert_eq!(axes["sensor.power"], AxisId::Left);
        assert_eq!(axes["sensor.unknown"], AxisId::Right);
    }

    #[test]
    fn test_owned_strings() {
        let entities = vec![("sensor.a".to_string(), None), ("sensor.b".to_string(), None)];
        let axes = assign_axes(&entities);

        assert_eq!(axes["sensor.a"], AxisId::Left);
        assert_eq!(axes["sensor.b"], AxisId::Left);
    }
}
