//! Effective configuration resolution.
//!
//! Three layers, in falling precedence: an option passed explicitly on
//! the command line, the same key from the YAML configuration file, the
//! built-in default. clap counts occurrences, so an explicit command
//! line value wins even when it happens to equal the default. File keys
//! must exactly match recognized option names; anything else is fatal
//! before any container runtime interaction.

use std::fs;
use std::path::Path;

use anyhow::Result;
use clap::ArgMatches;
use serde_yaml::{Mapping, Value};

use opp_compose::{Error, SimConfig};

/// Option names a configuration file may set.
const KNOWN_KEYS: [&str; 9] = [
    "configuration",
    "first",
    "last",
    "image",
    "name",
    "user",
    "ini",
    "results-path",
    "container-result-path",
];

/// Build the effective [`SimConfig`] from command line matches and the
/// configuration file (when it exists).
pub fn resolve(matches: &ArgMatches) -> Result<SimConfig> {
    let file = matches.value_of("file").unwrap_or("simulation.yaml");
    let yaml = load_file(Path::new(file))?;
    resolve_with(matches, yaml.as_ref())
}

fn load_file(path: &Path) -> Result<Option<Mapping>> {
    if !path.exists() {
        return Ok(None);
    }
    debug!("Using compose configuration file: {}", path.display());
    let text = fs::read_to_string(path).map_err(Error::from)?;
    let mapping: Mapping = serde_yaml::from_str(&text).map_err(Error::from)?;
    for key in mapping.iter().map(|(k, _)| k) {
        let key_str = match key.as_str() {
            Some(s) => s,
            None => return Err(Error::UnknownConfigOption(format!("{:?}", key)).into()),
        };
        if !KNOWN_KEYS.contains(&key_str) {
            return Err(Error::UnknownConfigOption(key_str.to_string()).into());
        }
    }
    Ok(Some(mapping))
}

fn resolve_with(matches: &ArgMatches, yaml: Option<&Mapping>) -> Result<SimConfig> {
    let mut config = SimConfig::default();

    let configuration = effective(matches, yaml, "configuration")?.unwrap_or_default();
    if configuration.is_empty() {
        return Err(Error::MissingSetting("configuration").into());
    }
    config.configuration = configuration;

    config.first = parse_int(
        "first",
        effective(matches, yaml, "first")?.unwrap_or_else(|| "0".to_string()),
    )?;
    config.last = parse_int(
        "last",
        effective(matches, yaml, "last")?.ok_or(Error::MissingSetting("last"))?,
    )?;

    if let Some(image) = effective(matches, yaml, "image")? {
        config.image = image;
    }
    if let Some(name) = effective(matches, yaml, "name")? {
        config.name = name;
    }
    if let Some(user) = effective(matches, yaml, "user")? {
        config.user = user;
    }
    if let Some(ini) = effective(matches, yaml, "ini")? {
        config.ini = ini;
    }
    if let Some(results_path) = effective(matches, yaml, "results-path")? {
        config.results_path = results_path.into();
    }
    if let Some(container_result_path) = effective(matches, yaml, "container-result-path")? {
        config.container_result_path = container_result_path;
    }

    Ok(config)
}

/// Pick the value for one option: explicit command line occurrence, then
/// file value, then whatever clap reports (the default, possibly none).
fn effective(matches: &ArgMatches, yaml: Option<&Mapping>, key: &str) -> Result<Option<String>> {
    if matches.occurrences_of(key) > 0 {
        return Ok(matches.value_of(key).map(String::from));
    }
    if let Some(mapping) = yaml {
        if let Some(value) = mapping.get(&Value::String(key.to_string())) {
            return Ok(Some(scalar_to_string(key, value)?));
        }
    }
    Ok(matches.value_of(key).map(String::from))
}

fn scalar_to_string(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => {
            Err(Error::InvalidConfigValue(key.to_string(), "expected a scalar".to_string()).into())
        }
    }
}

fn parse_int(key: &str, value: String) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|e| Error::InvalidConfigValue(key.to_string(), e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn write_yaml(tag: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("opp-compose-config-{}.yaml", tag));
        fs::write(&path, content).unwrap();
        path
    }

    fn resolved(args: Vec<&str>) -> Result<SimConfig> {
        let matches = crate::cli::app().get_matches_from(args);
        let (_, sub_matches) = matches.subcommand();
        resolve(sub_matches.unwrap())
    }

    #[test]
    fn cli_only_with_defaults() {
        let config = resolved(vec![
            "opp-compose",
            "ps",
            "--file",
            "/nonexistent/simulation.yaml",
            "-c",
            "MeshBase",
            "--last",
            "2",
        ])
        .unwrap();
        assert_eq!(config.configuration, "MeshBase");
        assert_eq!(config.first, 0);
        assert_eq!(config.last, 2);
        assert_eq!(config.image, "mobmecmeshsim");
        assert_eq!(config.name, "sim-r");
        assert_eq!(config.results_path, PathBuf::from("/tmp/simulation"));
    }

    #[test]
    fn file_value_beats_builtin_default() {
        let path = write_yaml("file-beats-default", "image: custom-img\nlast: 3\n");
        let config = resolved(vec![
            "opp-compose",
            "ps",
            "--file",
            path.to_str().unwrap(),
            "-c",
            "MeshBase",
        ])
        .unwrap();
        assert_eq!(config.image, "custom-img");
        assert_eq!(config.last, 3);
    }

    #[test]
    fn explicit_cli_value_beats_file() {
        let path = write_yaml("cli-beats-file", "image: custom-img\nlast: 3\n");
        let config = resolved(vec![
            "opp-compose",
            "ps",
            "--file",
            path.to_str().unwrap(),
            "-c",
            "MeshBase",
            "--image",
            "other-img",
        ])
        .unwrap();
        assert_eq!(config.image, "other-img");
        assert_eq!(config.last, 3);
    }

    #[test]
    fn explicit_cli_value_equal_to_default_still_beats_file() {
        let path = write_yaml("cli-default-beats-file", "image: custom-img\nlast: 3\n");
        let config = resolved(vec![
            "opp-compose",
            "ps",
            "--file",
            path.to_str().unwrap(),
            "-c",
            "MeshBase",
            "--image",
            "mobmecmeshsim",
        ])
        .unwrap();
        assert_eq!(config.image, "mobmecmeshsim");
    }

    #[test]
    fn unknown_file_key_is_fatal() {
        let path = write_yaml("unknown-key", "bogus-option: 1\nlast: 3\n");
        let err = resolved(vec![
            "opp-compose",
            "ps",
            "--file",
            path.to_str().unwrap(),
            "-c",
            "MeshBase",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("bogus-option"));
    }

    #[test]
    fn missing_configuration_is_fatal() {
        let err = resolved(vec![
            "opp-compose",
            "ps",
            "--file",
            "/nonexistent/simulation.yaml",
            "--last",
            "2",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("configuration"));
    }

    #[test]
    fn missing_last_is_fatal() {
        let err = resolved(vec![
            "opp-compose",
            "ps",
            "--file",
            "/nonexistent/simulation.yaml",
            "-c",
            "MeshBase",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("last"));
    }

    #[test]
    fn file_may_supply_configuration_and_range() {
        let path = write_yaml(
            "full-file",
            "configuration: MeshBase\nfirst: 1\nlast: 4\nresults-path: /data/results\n",
        );
        let config = resolved(vec!["opp-compose", "ps", "--file", path.to_str().unwrap()]).unwrap();
        assert_eq!(config.configuration, "MeshBase");
        assert_eq!(config.first, 1);
        assert_eq!(config.last, 4);
        assert_eq!(config.results_path, PathBuf::from("/data/results"));
    }
}
