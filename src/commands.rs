pub mod check;
pub mod query;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tokio::io::AsyncReadExt;

use signon_core::RawOptions;

/// Read request options from a JSON file, or stdin for `-`
pub async fn read_request(source: &str) -> Result<RawOptions> {
    let text = if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("reading request from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("reading request file {}", source))?
    };

    parse_options(&text)
}

fn parse_options(text: &str) -> Result<RawOptions> {
    match serde_json::from_str::<Value>(text).context("request is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("request must be a JSON object, got {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let raw = parse_options(r#"{"QueryPassword": true, "UserName": "joe"}"#).unwrap();
        assert_eq!(raw["UserName"], "joe");

        assert!(parse_options("[1, 2]").is_err());
        assert!(parse_options("not json").is_err());
    }
}
