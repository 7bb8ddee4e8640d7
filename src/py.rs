//! Python bindings for the chart query parser using PyO3

use crate::axes::assign_axes;
use crate::config::ParserConfig;
use crate::error::QueryError;
use crate::matcher::FuzzyEntityIndex;
use crate::parser::QueryParser;
use crate::range::preset_to_date_range;
use crate::statistics::{default_grouping_period, default_statistics_type};
use crate::types::EntityDescriptor;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

impl From<QueryError> for PyErr {
    fn from(err: QueryError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

/// Read one entity-registry record (`entity_id`, `name`, `original_name`)
fn descriptor_from_dict(record: &Bound<'_, PyDict>) -> PyResult<EntityDescriptor> {
    let id: String = record
        .get_item("entity_id")?
        .ok_or_else(|| PyValueError::new_err("entity record is missing 'entity_id'"))?
        .extract()?;
    let display_name: Option<String> = record
        .get_item("name")?
        .and_then(|v| v.extract().ok());
    let alternate_name: Option<String> = record
        .get_item("original_name")?
        .and_then(|v| v.extract().ok());

    Ok(EntityDescriptor {
        id,
        display_name,
        alternate_name,
    })
}

/// Python wrapper for the query parser
#[pyclass(name = "QueryParser")]
pub struct PyQueryParser {
    parser: QueryParser<FuzzyEntityIndex>,
}

#[pymethods]
impl PyQueryParser {
    /// Build from a list of entity-registry dicts and an optional JSON config
    #[new]
    #[pyo3(signature = (entities, config_json = None))]
    fn new(entities: Bound<'_, PyList>, config_json: Option<&str>) -> PyResult<Self> {
        let descriptors = entities
            .iter()
            .map(|item| descriptor_from_dict(item.downcast::<PyDict>()?))
            .collect::<PyResult<Vec<_>>>()?;

        let parser = match config_json {
            Some(raw) => {
                let config = ParserConfig::from_json_str(raw)?;
                QueryParser::with_config(descriptors, &config)?
            }
            None => QueryParser::new(descriptors),
        };

        Ok(Self { parser })
    }

    /// Parse a free-text query into a dict
    fn parse<'py>(&self, query: &str, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let result = self.parser.parse(query);

        let dict = PyDict::new_bound(py);
        dict.set_item("entities", result.entity_ids)?;
        dict.set_item("time_range_preset", result.time_range_preset)?;
        dict.set_item("chart_type", result.chart_type.map(|c| c.as_str()))?;
        dict.set_item("aggregation", result.aggregation.map(|a| a.as_str()))?;
        dict.set_item("stacked", result.stacked)?;
        dict.set_item("comparison", result.comparison)?;
        dict.set_item("raw_query", result.raw_query)?;
        Ok(dict)
    }

    /// Parse a free-text query into a JSON string
    fn parse_json(&self, query: &str) -> PyResult<String> {
        serde_json::to_string(&self.parser.parse(query)).map_err(|e| {
            PyErr::new::<PyValueError, _>(format!("Failed to serialize query: {}", e))
        })
    }

    /// Number of indexed entities
    fn __len__(&self) -> usize {
        self.parser.matcher().len()
    }
}

/// Resolve a preset such as "7d" to ISO-8601 (start, end) strings
#[pyfunction]
#[pyo3(name = "preset_to_date_range")]
pub fn py_preset_to_date_range(preset: &str) -> (String, String) {
    let range = preset_to_date_range(preset);
    (range.start.to_rfc3339(), range.end.to_rfc3339())
}

/// Map `[(entity_id, unit | None), ...]` to `{entity_id: "left" | "right"}`
#[pyfunction]
#[pyo3(name = "assign_axes")]
pub fn py_assign_axes<'py>(
    entities: Vec<(String, Option<String>)>,
    py: Python<'py>,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    for (entity_id, axis) in assign_axes(&entities) {
        dict.set_item(entity_id, axis.as_str())?;
    }
    Ok(dict)
}

#[pyfunction]
#[pyo3(name = "default_statistics_type", signature = (unit = None))]
pub fn py_default_statistics_type(unit: Option<&str>) -> &'static str {
    default_statistics_type(unit).as_str()
}

#[pyfunction]
#[pyo3(name = "default_grouping_period", signature = (unit = None))]
pub fn py_default_grouping_period(unit: Option<&str>) -> &'static str {
    default_grouping_period(unit).as_str()
}
