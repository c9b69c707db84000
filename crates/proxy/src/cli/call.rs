//! `godot-bridge call <method>`: one-shot call from the command line.

use anyhow::Context;
use gb_bridge::EditorBridge;
use gb_domain::config::Config;
use serde_json::Value;

/// Parse `--params`, defaulting to an empty object.
pub fn parse_params(raw: Option<&str>) -> anyhow::Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Object(Default::default()));
    };
    let value: Value = serde_json::from_str(raw).context("--params is not valid JSON")?;
    if !value.is_object() {
        anyhow::bail!("--params must be a JSON object");
    }
    Ok(value)
}

pub async fn run(
    config: &Config,
    method: &str,
    params: Option<&str>,
    pretty: bool,
) -> anyhow::Result<()> {
    let params = parse_params(params)?;
    let bridge = EditorBridge::from_config(&config.bridge).context("building editor bridge")?;
    tracing::debug!(endpoint = %bridge.endpoint(), method, "one-shot call");

    let outcome = bridge.call(method, params).await;
    bridge.stop();
    let result = outcome.with_context(|| format!("calling `{method}`"))?;

    let output = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_default_to_empty_object() {
        assert_eq!(parse_params(None).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn params_must_be_an_object() {
        assert!(parse_params(Some("[1, 2]")).is_err());
        assert!(parse_params(Some("{oops")).is_err());
        assert_eq!(
            parse_params(Some(r#"{"path": "res://main.tscn"}"#)).unwrap()["path"],
            "res://main.tscn"
        );
    }
}
