use std::fmt;

use serde::Serialize;

/// The location of a value in a response, e.g. `["users", 2, "name"]`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Default, Serialize)]
pub struct ErrorPath(Vec<ErrorPathSegment>);

impl std::ops::Deref for ErrorPath {
    type Target = Vec<ErrorPathSegment>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for ErrorPath {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Serialize)]
#[serde(untagged)]
pub enum ErrorPathSegment {
    Field(String),
    Index(usize),
}

impl ErrorPath {
    /// A copy of this path extended by one segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<ErrorPathSegment>) -> ErrorPath {
        let mut path = self.clone();
        path.0.push(segment.into());
        path
    }

    /// Whether the path points at a list element.
    pub fn is_list_element(&self) -> bool {
        matches!(self.0.last(), Some(ErrorPathSegment::Index(_)))
    }
}

impl From<&str> for ErrorPathSegment {
    fn from(field: &str) -> Self {
        ErrorPathSegment::Field(field.to_string())
    }
}

impl From<String> for ErrorPathSegment {
    fn from(field: String) -> Self {
        ErrorPathSegment::Field(field)
    }
}

impl From<usize> for ErrorPathSegment {
    fn from(index: usize) -> Self {
        ErrorPathSegment::Index(index)
    }
}

impl<T: Into<ErrorPathSegment>> FromIterator<T> for ErrorPath {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        ErrorPath(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<ErrorPathSegment>> for ErrorPath {
    fn from(segments: Vec<ErrorPathSegment>) -> Self {
        ErrorPath(segments)
    }
}

impl fmt::Display for ErrorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                ErrorPathSegment::Field(field) if i == 0 => f.write_str(field)?,
                ErrorPathSegment::Field(field) => write!(f, ".{field}")?,
                ErrorPathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn serializes_fields_as_strings_and_indices_as_numbers() {
        let path = ErrorPath::default().child("users").child(2).child("name");
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["users",2,"name"]"#);
        assert_eq!(path.to_string(), "users[2].name");
        assert!(!path.is_list_element());
        assert!(ErrorPath::from_iter([ErrorPathSegment::Index(0)]).is_list_element());
    }
}
