use serde::de::DeserializeOwned;

/// Deserialize an already-parsed YAML tree with key-path context in error messages.
pub fn from_value_with_path<T: DeserializeOwned>(value: serde_yaml::Value) -> Result<T, String> {
    match serde_path_to_error::deserialize::<_, T>(value) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at key path {path} → {}", err.into_inner()))
        }
    }
}

pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = serde_yaml::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at key path {path} → {}", err.into_inner()))
        }
    }
}
