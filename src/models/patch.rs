use serde::{Deserialize, Deserializer};

/// Tri-state field for partial updates. Distinguishes a field that was
/// absent from the request body (keep the stored value) from an explicit
/// `null` (clear it) and from a new value.
///
/// Use with `#[serde(default)]` so an absent key deserializes to `Missing`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    #[default]
    Missing,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    /// Resolve against the stored value of a nullable column.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Missing => current,
            Patch::Null => None,
            Patch::Value(v) => Some(v),
        }
    }

    /// Resolve against the stored value of a required column. `null` is a
    /// validation error here, reported with the field name.
    pub fn apply_required(self, current: T, field: &str) -> Result<T, String> {
        match self {
            Patch::Missing => Ok(current),
            Patch::Null => Err(format!("{} cannot be cleared", field)),
            Patch::Value(v) => Ok(v),
        }
    }

}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the key is present; serde(default) covers absence.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        note: Patch<String>,
    }

    #[test]
    fn absent_is_missing() {
        let body: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(body.note, Patch::Missing);
        assert_eq!(body.note.apply(Some("old".into())), Some("old".into()));
    }

    #[test]
    fn null_clears() {
        let body: Body = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(body.note, Patch::Null);
        assert_eq!(body.note.apply(Some("old".into())), None);
    }

    #[test]
    fn value_replaces() {
        let body: Body = serde_json::from_str(r#"{"note": "new"}"#).unwrap();
        assert_eq!(body.note.clone().apply(Some("old".into())), Some("new".into()));
        assert_eq!(body.note.apply(None), Some("new".into()));
    }

    #[test]
    fn required_field_rejects_null() {
        let body: Body = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert!(body.note.apply_required("old".into(), "note").is_err());

        let body: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(
            body.note.apply_required("old".into(), "note").unwrap(),
            "old"
        );
    }

    #[test]
    fn empty_string_is_a_value_not_unset() {
        let body: Body = serde_json::from_str(r#"{"note": ""}"#).unwrap();
        assert_eq!(body.note.apply(Some("old".into())), Some(String::new()));
    }
}
