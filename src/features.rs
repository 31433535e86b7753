use crate::error::{PredictError, Result};
use serde_derive::Serialize;
use serde_json::{Map, Value};
use std::fmt;

pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "CreditScore",
    "Geography",
    "Gender",
    "Age",
    "Tenure",
    "Balance",
    "NumOfProducts",
    "HasCrCard",
    "IsActiveMember",
    "EstimatedSalary",
];

pub const NUM_FEATURES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    /// Boolean stored as 0/1.
    Flag,
    Categorical,
}

impl ColumnType {
    fn describe(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Flag => "integer flag",
            ColumnType::Categorical => "category",
        }
    }
}

pub const COLUMN_TYPES: [ColumnType; NUM_FEATURES] = [
    ColumnType::Integer,
    ColumnType::Categorical,
    ColumnType::Categorical,
    ColumnType::Integer,
    ColumnType::Integer,
    ColumnType::Float,
    ColumnType::Integer,
    ColumnType::Flag,
    ColumnType::Flag,
    ColumnType::Float,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Category {
    Text(String),
    Code(i64),
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Text(s) => write!(f, "{}", s),
            Category::Code(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Number(f64),
    Category(&'a Category),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Row {
    pub credit_score: i64,
    pub geography: Category,
    pub gender: Category,
    pub age: i64,
    pub tenure: i64,
    pub balance: f64,
    pub num_of_products: i64,
    pub has_cr_card: i64,
    pub is_active_member: i64,
    pub estimated_salary: f64,
}

impl Row {
    pub fn from_values(values: &[Value]) -> Result<Row> {
        if values.len() != NUM_FEATURES {
            return Err(PredictError::FeatureCount {
                expected: NUM_FEATURES,
                actual: values.len(),
            });
        }
        Ok(Row {
            credit_score: to_integer(0, &values[0])?,
            geography: to_category(1, &values[1])?,
            gender: to_category(2, &values[2])?,
            age: to_integer(3, &values[3])?,
            tenure: to_integer(4, &values[4])?,
            balance: to_float(5, &values[5])?,
            num_of_products: to_integer(6, &values[6])?,
            has_cr_card: to_integer(7, &values[7])?,
            is_active_member: to_integer(8, &values[8])?,
            estimated_salary: to_float(9, &values[9])?,
        })
    }

    pub fn cells(&self) -> [(&'static str, Cell<'_>); NUM_FEATURES] {
        [
            (FEATURE_NAMES[0], Cell::Number(self.credit_score as f64)),
            (FEATURE_NAMES[1], Cell::Category(&self.geography)),
            (FEATURE_NAMES[2], Cell::Category(&self.gender)),
            (FEATURE_NAMES[3], Cell::Number(self.age as f64)),
            (FEATURE_NAMES[4], Cell::Number(self.tenure as f64)),
            (FEATURE_NAMES[5], Cell::Number(self.balance)),
            (FEATURE_NAMES[6], Cell::Number(self.num_of_products as f64)),
            (FEATURE_NAMES[7], Cell::Number(self.has_cr_card as f64)),
            (FEATURE_NAMES[8], Cell::Number(self.is_active_member as f64)),
            (FEATURE_NAMES[9], Cell::Number(self.estimated_salary)),
        ]
    }
}

pub fn parse_feature_vector(input: &str) -> Result<Vec<Value>> {
    Ok(serde_json::from_str::<Vec<Value>>(input)?)
}

pub fn values_from_named(record: &Map<String, Value>) -> Result<Vec<Value>> {
    FEATURE_NAMES
        .iter()
        .map(|name| {
            record
                .get(*name)
                .cloned()
                .ok_or_else(|| PredictError::MissingFeature(name.to_string()))
        })
        .collect()
}

fn coercion_error(idx: usize, value: &Value) -> PredictError {
    PredictError::Coercion {
        column: FEATURE_NAMES[idx],
        value: value.to_string(),
        expected: COLUMN_TYPES[idx].describe(),
    }
}

fn to_integer(idx: usize, value: &Value) -> Result<i64> {
    let converted = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::Bool(b) => Some(*b as i64),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    converted.ok_or_else(|| coercion_error(idx, value))
}

fn to_float(idx: usize, value: &Value) -> Result<f64> {
    let converted = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    converted
        .filter(|f| f.is_finite())
        .ok_or_else(|| coercion_error(idx, value))
}

fn to_category(idx: usize, value: &Value) -> Result<Category> {
    let converted = match value {
        Value::String(s) => Some(Category::Text(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Category::Code),
        Value::Bool(b) => Some(Category::Code(*b as i64)),
        _ => None,
    };
    converted.ok_or_else(|| coercion_error(idx, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<Value> {
        parse_feature_vector(r#"[650,"France","Male",40,3,60000.0,2,1,1,50000.0]"#).unwrap()
    }

    #[test]
    fn test_row_from_values() {
        let row = Row::from_values(&sample()).unwrap();
        assert_eq!(row.credit_score, 650);
        assert_eq!(row.geography, Category::Text("France".to_string()));
        assert_eq!(row.gender, Category::Text("Male".to_string()));
        assert_eq!(row.age, 40);
        assert_eq!(row.tenure, 3);
        assert_eq!(row.balance, 60000.0);
        assert_eq!(row.num_of_products, 2);
        assert_eq!(row.has_cr_card, 1);
        assert_eq!(row.is_active_member, 1);
        assert_eq!(row.estimated_salary, 50000.0);
    }

    #[test]
    fn test_wrong_count() {
        let values = parse_feature_vector(r#"[650,"France"]"#).unwrap();
        match Row::from_values(&values) {
            Err(PredictError::FeatureCount { expected, actual }) => {
                assert_eq!(expected, 10);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_loose_types_are_coerced() {
        let values = vec![
            json!("700"),
            json!(0),
            json!(1.0),
            json!(41.9),
            json!(true),
            json!("1234.5"),
            json!(" 2 "),
            json!(false),
            json!("1"),
            json!(75000),
        ];
        let row = Row::from_values(&values).unwrap();
        assert_eq!(row.credit_score, 700);
        assert_eq!(row.geography, Category::Code(0));
        assert_eq!(row.gender, Category::Code(1));
        assert_eq!(row.age, 41);
        assert_eq!(row.tenure, 1);
        assert_eq!(row.balance, 1234.5);
        assert_eq!(row.num_of_products, 2);
        assert_eq!(row.has_cr_card, 0);
        assert_eq!(row.is_active_member, 1);
        assert_eq!(row.estimated_salary, 75000.0);
    }

    #[test]
    fn test_non_numeric_string_fails() {
        let mut values = sample();
        values[3] = json!("forty");
        let err = Row::from_values(&values).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot convert \"forty\" to integer for column Age"
        );
    }

    #[test]
    fn test_null_is_rejected() {
        let mut values = sample();
        values[9] = Value::Null;
        assert!(matches!(
            Row::from_values(&values),
            Err(PredictError::Coercion {
                column: "EstimatedSalary",
                ..
            })
        ));

        let mut values = sample();
        values[1] = Value::Null;
        assert!(matches!(
            Row::from_values(&values),
            Err(PredictError::Coercion {
                column: "Geography",
                ..
            })
        ));
    }

    #[test]
    fn test_non_finite_float_fails() {
        for text in ["NaN", "inf", "-infinity"] {
            let mut values = sample();
            values[5] = json!(text);
            assert!(
                matches!(
                    Row::from_values(&values),
                    Err(PredictError::Coercion {
                        column: "Balance",
                        ..
                    })
                ),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_fractional_category_code_fails() {
        let mut values = sample();
        values[2] = json!(0.5);
        assert!(Row::from_values(&values).is_err());
    }

    #[test]
    fn test_not_an_array() {
        assert!(matches!(
            parse_feature_vector(r#"{"CreditScore": 650}"#),
            Err(PredictError::Parse(_))
        ));
        assert!(matches!(
            parse_feature_vector("[650, France]"),
            Err(PredictError::Parse(_))
        ));
    }

    #[test]
    fn test_values_from_named() {
        let mut record = Map::new();
        for (name, value) in FEATURE_NAMES.iter().zip(sample()) {
            record.insert(name.to_string(), value);
        }
        // Key order in the object does not matter.
        record.insert("Extra".to_string(), json!("ignored"));
        let values = values_from_named(&record).unwrap();
        assert_eq!(values, sample());

        record.remove("Tenure");
        match values_from_named(&record) {
            Err(PredictError::MissingFeature(name)) => assert_eq!(name, "Tenure"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cells_follow_column_order() {
        let row = Row::from_values(&sample()).unwrap();
        let names: Vec<&str> = row.cells().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, FEATURE_NAMES.to_vec());
        assert_eq!(row.cells()[5].1, Cell::Number(60000.0));
    }

    #[test]
    fn test_row_serializes_with_column_names() {
        let row = Row::from_values(&sample()).unwrap();
        let json = serde_json::to_value(&row).unwrap();
        for name in FEATURE_NAMES {
            assert!(json.get(name).is_some(), "missing {}", name);
        }
    }
}
