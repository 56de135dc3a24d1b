use std::fmt::Display;

/// A scalar held by one cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    String(String),
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl CellValue {
    /// Whether the cell holds nothing visible. An empty string counts as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// The text a cell displays for this value.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.clone(),
            CellValue::Float(f) => excel_float_to_string(*f),
            CellValue::Int(i) => i.to_string(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

pub(crate) fn excel_float_to_string(x: f64) -> String {
    format!("{x:.9}")
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

macro_rules! cell_value_from {
    ($type:ty, $variant:ident) => {
        impl From<$type> for CellValue {
            fn from(value: $type) -> Self {
                Self::$variant(value.into())
            }
        }

        impl From<$type> for RangeValue {
            fn from(value: $type) -> Self {
                Self::Scalar(value.into())
            }
        }
    };
}

cell_value_from!(String, String);
cell_value_from!(&str, String);
cell_value_from!(f64, Float);
cell_value_from!(i64, Int);
cell_value_from!(bool, Bool);

/// The value of a range: a scalar for a single cell, rows of columns otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeValue {
    Scalar(CellValue),
    Matrix(Vec<Vec<CellValue>>),
}

impl RangeValue {
    /// All values, row by row.
    pub fn into_rows(self) -> Vec<Vec<CellValue>> {
        match self {
            RangeValue::Scalar(value) => vec![vec![value]],
            RangeValue::Matrix(rows) => rows,
        }
    }

    /// Trimmed text of the first row, one entry per column.
    pub fn first_row_text(&self) -> Vec<String> {
        match self {
            RangeValue::Scalar(value) => vec![value.to_text().trim().to_string()],
            RangeValue::Matrix(rows) => rows
                .first()
                .map(|row| {
                    row.iter()
                        .map(|value| value.to_text().trim().to_string())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl From<CellValue> for RangeValue {
    fn from(value: CellValue) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<Vec<CellValue>>> for RangeValue {
    fn from(rows: Vec<Vec<CellValue>>) -> Self {
        Self::Matrix(rows)
    }
}
