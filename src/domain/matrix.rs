//! Job matrices and `${{ matrix.* }}` expression resolution.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::domain::AppError;
use crate::domain::workflow::scalar_text;

/// One named matrix dimension with its ordered values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixDimension {
    pub name: String,
    pub values: Vec<String>,
}

/// A combination of dimension values, in dimension declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MatrixCell(Vec<(String, String)>);

impl MatrixCell {
    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.0.iter().find(|(name, _)| name == dimension).map(|(_, value)| value.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `os=ubuntu-latest, python-version=3.11` style label.
    pub fn label(&self) -> String {
        self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join(", ")
    }
}

/// A job matrix: the Cartesian product of its dimensions minus excluded cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Matrix {
    pub dimensions: Vec<MatrixDimension>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<Vec<(String, String)>>,
}

impl Matrix {
    pub fn new(dimensions: Vec<MatrixDimension>) -> Self {
        Self { dimensions, exclude: Vec::new() }
    }

    /// Parse a `strategy.matrix` mapping for the given job.
    pub fn from_yaml(job: &str, mapping: &Mapping) -> Result<Self, AppError> {
        let mut dimensions = Vec::new();
        let mut exclude = Vec::new();

        for (key, value) in mapping {
            let name = key
                .as_str()
                .ok_or_else(|| AppError::matrix_error(job, "dimension names must be strings"))?;

            match name {
                "include" => {
                    return Err(AppError::matrix_error(job, "'include' entries are not supported"));
                }
                "exclude" => {
                    let entries = value.as_sequence().ok_or_else(|| {
                        AppError::matrix_error(job, "'exclude' must be a list of mappings")
                    })?;
                    for entry in entries {
                        let entry = entry.as_mapping().ok_or_else(|| {
                            AppError::matrix_error(job, "'exclude' must be a list of mappings")
                        })?;
                        let mut pairs = Vec::new();
                        for (k, v) in entry {
                            let k = k.as_str().ok_or_else(|| {
                                AppError::matrix_error(job, "exclude keys must be strings")
                            })?;
                            pairs.push((k.to_string(), scalar_to_string(job, k, v)?));
                        }
                        exclude.push(pairs);
                    }
                }
                _ => {
                    let values = value.as_sequence().ok_or_else(|| {
                        AppError::matrix_error(job, format!("dimension '{}' must be a list", name))
                    })?;
                    let values = values
                        .iter()
                        .map(|v| scalar_to_string(job, name, v))
                        .collect::<Result<Vec<_>, _>>()?;
                    dimensions.push(MatrixDimension { name: name.to_string(), values });
                }
            }
        }

        let matrix = Self { dimensions, exclude };
        matrix.validate(job)?;
        Ok(matrix)
    }

    pub fn validate(&self, job: &str) -> Result<(), AppError> {
        let mut seen = std::collections::HashSet::new();
        for dimension in &self.dimensions {
            if !seen.insert(dimension.name.as_str()) {
                return Err(AppError::matrix_error(
                    job,
                    format!("dimension '{}' is declared twice", dimension.name),
                ));
            }
            if dimension.values.is_empty() {
                return Err(AppError::matrix_error(
                    job,
                    format!("dimension '{}' is empty", dimension.name),
                ));
            }
        }
        for pairs in &self.exclude {
            for (name, _) in pairs {
                if !seen.contains(name.as_str()) {
                    return Err(AppError::matrix_error(
                        job,
                        format!("exclude references undeclared dimension '{}'", name),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Cartesian product, first-declared dimension outermost.
    ///
    /// A matrix without dimensions yields a single empty cell.
    pub fn expand(&self) -> Vec<MatrixCell> {
        let mut cells: Vec<Vec<(String, String)>> = vec![Vec::new()];
        for dimension in &self.dimensions {
            let mut next = Vec::with_capacity(cells.len() * dimension.values.len());
            for cell in &cells {
                for value in &dimension.values {
                    let mut extended = cell.clone();
                    extended.push((dimension.name.clone(), value.clone()));
                    next.push(extended);
                }
            }
            cells = next;
        }

        cells
            .into_iter()
            .map(MatrixCell)
            .filter(|cell| !self.is_excluded(cell))
            .collect()
    }

    fn is_excluded(&self, cell: &MatrixCell) -> bool {
        self.exclude.iter().any(|pairs| pairs.iter().all(|(k, v)| cell.get(k) == Some(v.as_str())))
    }
}

fn scalar_to_string(job: &str, dimension: &str, value: &Value) -> Result<String, AppError> {
    scalar_text(value).ok_or_else(|| {
        AppError::matrix_error(
            job,
            format!("dimension '{}' values must be strings, numbers or booleans", dimension),
        )
    })
}

/// Substitute every `${{ matrix.<dim> }}` in `template` with the cell's value.
pub fn resolve_expressions(job: &str, template: &str, cell: &MatrixCell) -> Result<String, AppError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 3..];
        let end = after_open.find("}}").ok_or_else(|| {
            AppError::config_error(format!(
                "Job '{}': unterminated expression in '{}'",
                job, template
            ))
        })?;
        let expression = after_open[..end].trim();

        let Some(dimension) = expression.strip_prefix("matrix.") else {
            return Err(AppError::config_error(format!(
                "Job '{}': unsupported expression '${{{{ {} }}}}'",
                job, expression
            )));
        };
        let value = cell.get(dimension).ok_or_else(|| {
            AppError::matrix_error(job, format!("input references undeclared dimension '{}'", dimension))
        })?;
        output.push_str(value);
        rest = &after_open[end + 2..];
    }

    output.push_str(rest);
    Ok(output)
}
