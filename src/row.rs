use crate::value::Value;

/// A record: column name to value, in insertion order.
///
/// The order matters when a row is used as a payload: `insert` and `update`
/// emit columns in exactly this order and bind values to match.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value, replacing any earlier value for the same column
    pub fn with_value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| name == column) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((column.to_string(), value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// The `id` column, if present and not null.
    pub fn id(&self) -> Option<&Value> {
        self.get("id").filter(|v| !v.is_null())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            let column: String = column.into();
            row.set(&column, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_and_replaces_in_place() {
        let row = Row::new()
            .with_value("name", "Donald Knuth")
            .with_value("city_id", 42)
            .with_value("name", "Dennis Ritchie");

        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["name", "city_id"]);
        assert_eq!(row.get("name"), Some(&Value::from("Dennis Ritchie")));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn collects_from_pairs() {
        let row: Row = vec![("id", Value::Integer(1)), ("name", Value::from("Paris"))]
            .into_iter()
            .collect();
        assert_eq!(
            row.iter().collect::<Vec<_>>(),
            vec![("id", &Value::Integer(1)), ("name", &Value::from("Paris"))]
        );
    }

    #[test]
    fn null_id_counts_as_missing() {
        let row = Row::new().with_value("id", Value::Null);
        assert!(row.id().is_none());
        assert_eq!(Row::new().with_value("id", 7).id(), Some(&Value::Integer(7)));
    }
}
