use serde::de::DeserializeOwned;

/// Deserialization failure located at a JSON path such as `fields.age`.
#[derive(Debug, thiserror::Error)]
#[error("at JSON path {path} → {inner}")]
pub struct PathError {
    pub path: String,
    #[source]
    pub inner: serde_json::Error,
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| PathError {
        path: err.path().to_string(),
        inner: err.into_inner(),
    })
}
