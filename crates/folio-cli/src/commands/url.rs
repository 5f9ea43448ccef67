use anyhow::{bail, Result};
use folio::RouteParams;
use serde_json::Value;
use std::path::Path;

use super::open_table;

pub fn execute(root: &Path, handler: &str, params: &[String], method: Option<&str>) -> Result<()> {
    let table = open_table(root)?;
    let params = parse_params(params)?;
    println!("{}", table.url_for(handler, &params, method)?);
    Ok(())
}

/// `key=value` arguments as string parameters
fn parse_params(args: &[String]) -> Result<RouteParams> {
    let mut params = RouteParams::new();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("Invalid parameter {:?}, expected key=value", arg);
        };
        if key.is_empty() {
            bail!("Invalid parameter {:?}, empty key", arg);
        }
        params.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        let params = parse_params(&["id=7".to_string(), "q=a=b".to_string()]).unwrap();
        assert_eq!(params["id"], "7");
        assert_eq!(params["q"], "a=b");
    }

    #[test]
    fn test_parse_params_rejects_bare_words() {
        assert!(parse_params(&["id".to_string()]).is_err());
        assert!(parse_params(&["=7".to_string()]).is_err());
    }
}
