use crate::error::{PredictError, Result};
use crate::features::{Category, Cell, Row};
use bincode::{Decode, Encode};
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryEncoder {
    Ordinal { categories: Vec<String> },
    OneHot { categories: Vec<String> },
}

impl CategoryEncoder {
    pub fn categories(&self) -> &[String] {
        match self {
            CategoryEncoder::Ordinal { categories } | CategoryEncoder::OneHot { categories } => {
                categories
            }
        }
    }

    pub fn width(&self) -> usize {
        match self {
            CategoryEncoder::Ordinal { .. } => 1,
            CategoryEncoder::OneHot { categories } => categories.len(),
        }
    }

    /// Resolve a category to its index.  Text is looked up by name, integer
    /// codes are taken as already-encoded indices.
    pub fn index_of(&self, column: &str, value: &Category) -> Result<usize> {
        let categories = self.categories();
        match value {
            Category::Text(text) => categories.iter().position(|c| c == text).ok_or_else(|| {
                PredictError::Prediction(format!(
                    "unknown category {:?} for column {} (known: {})",
                    text,
                    column,
                    categories.join(", ")
                ))
            }),
            Category::Code(code) => usize::try_from(*code)
                .ok()
                .filter(|idx| *idx < categories.len())
                .ok_or_else(|| {
                    PredictError::Prediction(format!(
                        "category code {} out of range for column {} ({} categories)",
                        code,
                        column,
                        categories.len()
                    ))
                }),
        }
    }

    pub fn encode_into(&self, column: &str, value: &Category, out: &mut Vec<f64>) -> Result<()> {
        let idx = self.index_of(column, value)?;
        match self {
            CategoryEncoder::Ordinal { .. } => out.push(idx as f64),
            CategoryEncoder::OneHot { categories } => {
                out.extend((0..categories.len()).map(|i| if i == idx { 1.0 } else { 0.0 }));
            }
        }
        Ok(())
    }

    pub fn slot_names(&self, column: &str) -> Vec<String> {
        match self {
            CategoryEncoder::Ordinal { .. } => vec![column.to_string()],
            CategoryEncoder::OneHot { categories } => categories
                .iter()
                .map(|c| format!("{}={}", column, c))
                .collect(),
        }
    }
}

/// Per-slot standardization, `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn transform(&self, x: &mut [f64]) {
        for ((v, m), s) in x.iter_mut().zip(&self.mean).zip(&self.scale) {
            *v = (*v - m) / s;
        }
    }
}

pub fn encode_row<'a, F>(row: &Row, encoder_for: F) -> Result<Vec<f64>>
where
    F: Fn(&str) -> Option<&'a CategoryEncoder>,
{
    let mut out = Vec::with_capacity(16);
    for (column, cell) in row.cells() {
        match cell {
            Cell::Number(v) => out.push(v),
            Cell::Category(value) => {
                let encoder = encoder_for(column).ok_or_else(|| {
                    PredictError::Prediction(format!("no encoder for column {}", column))
                })?;
                encoder.encode_into(column, value, &mut out)?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geography() -> CategoryEncoder {
        CategoryEncoder::OneHot {
            categories: vec!["France".into(), "Germany".into(), "Spain".into()],
        }
    }

    fn gender() -> CategoryEncoder {
        CategoryEncoder::Ordinal {
            categories: vec!["Female".into(), "Male".into()],
        }
    }

    fn row() -> Row {
        Row {
            credit_score: 650,
            geography: Category::Text("Germany".into()),
            gender: Category::Text("Male".into()),
            age: 40,
            tenure: 3,
            balance: 60000.0,
            num_of_products: 2,
            has_cr_card: 1,
            is_active_member: 1,
            estimated_salary: 50000.0,
        }
    }

    #[test]
    fn test_one_hot_and_ordinal() {
        let mut out = Vec::new();
        geography()
            .encode_into("Geography", &Category::Text("Spain".into()), &mut out)
            .unwrap();
        gender()
            .encode_into("Gender", &Category::Code(1), &mut out)
            .unwrap();
        assert_eq!(out, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_unknown_category() {
        let err = geography()
            .index_of("Geography", &Category::Text("Italy".into()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "model error: unknown category \"Italy\" for column Geography (known: France, Germany, Spain)"
        );
        assert!(gender().index_of("Gender", &Category::Code(2)).is_err());
        assert!(gender().index_of("Gender", &Category::Code(-1)).is_err());
    }

    #[test]
    fn test_encode_row_layout() {
        let (geo, sex) = (geography(), gender());
        let x = encode_row(&row(), |column| match column {
            "Geography" => Some(&geo),
            "Gender" => Some(&sex),
            _ => None,
        })
        .unwrap();
        assert_eq!(
            x,
            vec![650.0, 0.0, 1.0, 0.0, 1.0, 40.0, 3.0, 60000.0, 2.0, 1.0, 1.0, 50000.0]
        );
    }

    #[test]
    fn test_encode_row_without_encoder() {
        let geo = geography();
        let err = encode_row(&row(), |column| (column == "Geography").then_some(&geo)).unwrap_err();
        assert!(err.to_string().contains("no encoder for column Gender"));
    }

    #[test]
    fn test_scaler() {
        let scaler = StandardScaler {
            mean: vec![10.0, 0.0],
            scale: vec![2.0, 4.0],
        };
        let mut x = vec![14.0, 2.0];
        scaler.transform(&mut x);
        assert_eq!(x, vec![2.0, 0.5]);
    }

    #[test]
    fn test_slot_names() {
        assert_eq!(
            geography().slot_names("Geography"),
            vec!["Geography=France", "Geography=Germany", "Geography=Spain"]
        );
        assert_eq!(gender().slot_names("Gender"), vec!["Gender"]);
    }
}
