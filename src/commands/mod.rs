use std::collections::HashMap;

pub type CmdResult<T> = deckhand::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod deploy;
pub mod fetch;
pub mod project;
pub mod render;
pub mod service;
pub mod vars;

/// Parse repeated `--var key=value` flags into a map.
pub(crate) fn parse_var_overrides(vars: &[String]) -> deckhand::Result<HashMap<String, String>> {
    let mut overrides = HashMap::new();
    for var in vars {
        let Some((key, value)) = var.split_once('=') else {
            return Err(deckhand::Error::validation_invalid_argument(
                "var",
                "Expected key=value",
                Some(var.clone()),
            ));
        };
        if key.is_empty() {
            return Err(deckhand::Error::validation_invalid_argument(
                "var",
                "Empty key in key=value pair",
                Some(var.clone()),
            ));
        }
        overrides.insert(key.to_string(), value.to_string());
    }
    Ok(overrides)
}
