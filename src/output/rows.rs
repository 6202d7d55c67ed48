//! Report rows

/// One line of a report: a fixed-width vector of string fields
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    fields: Vec<String>,
}

impl Row {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Builds a summary row of `width` fields with `label` and `value` placed
    /// side by side starting at column `label_col`; every other field is blank
    ///
    /// A `label_col` that leaves no room for the value is clamped to the last
    /// two columns.
    pub fn summary(width: usize, label_col: usize, label: &str, value: impl ToString) -> Self {
        let width = width.max(2);
        let label_col = label_col.min(width - 2);
        let mut fields = vec![String::new(); width];
        fields[label_col] = label.to_string();
        fields[label_col + 1] = value.to_string();
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builds a [`Row`] from a list of `Display` values
macro_rules! row {
    ($($field:expr),* $(,)?) => {
        $crate::output::Row::new(vec![$($field.to_string()),*])
    };
}

pub(crate) use row;

/// Formats a flag as the report's "Yes"/"No" cell
pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}
