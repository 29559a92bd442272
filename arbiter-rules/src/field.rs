use serde_json::{Map, Value};

/// Dotted path (`address.city`, `orders.0.total`) used to reach nested
/// values in the data record a rule is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the path has more than one segment.
    pub fn is_nested(&self) -> bool {
        self.segments().nth(1).is_some()
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|segment| !segment.is_empty())
    }

    /// Walks the path from the top-level record.
    pub fn locate<'a>(&self, record: &'a Map<String, Value>) -> Option<&'a Value> {
        let mut segments = self.segments();
        let mut current = record.get(segments.next()?)?;
        for segment in segments {
            match current {
                Value::Object(map) => current = map.get(segment)?,
                Value::Array(items) => {
                    let index: usize = segment.parse().ok()?;
                    current = items.get(index)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        FieldPath::new(value)
    }
}

impl From<String> for FieldPath {
    fn from(value: String) -> Self {
        FieldPath::new(value)
    }
}
