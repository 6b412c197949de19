use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

use cinder_passes::{CompileOptions, DEFAULT_CC, parse_override};

use crate::cli::args::{CliArgs, ColorChoice};

/// Project file looked up in the working directory when `--config` is absent.
pub const PROJECT_FILE: &str = "cinder.json";
pub const DEFAULT_OUT_DIR: &str = "cinder-out";

/// Accept `true` as well as `"true"` for boolean project settings.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
            ))),
        },
    }
}

/// Contents of `cinder.json`. Relative paths are relative to the file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub inputs: Option<Vec<String>>,
    #[serde(default)]
    pub out_dir: Option<String>,
    #[serde(default)]
    pub passlist: Option<String>,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub no_build: Option<bool>,
    /// Config-var overrides, applied before any `-s` flag.
    #[serde(default)]
    pub configs: Option<IndexMap<String, ConfigValue>>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub gen_communicated_structures: Option<bool>,
}

/// A config-var value written in the project file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl ConfigValue {
    /// The `-s` text the value stands for.
    pub fn as_override(&self) -> String {
        match self {
            ConfigValue::Bool(b) => b.to_string(),
            ConfigValue::Int(i) => i.to_string(),
            ConfigValue::Str(s) => s.clone(),
        }
    }
}

/// Everything the driver needs for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub options: CompileOptions,
    pub passlist: Option<PathBuf>,
    pub dump_fragments: bool,
    pub color: ColorChoice,
}

pub fn parse_project_config(source: &str) -> Result<ProjectConfig> {
    let normalized = strip_jsonc(source);
    let config = serde_json::from_str(&normalized).context("failed to parse project JSON")?;
    Ok(config)
}

pub fn load_project_config(path: &Path) -> Result<ProjectConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read project file: {}", path.display()))?;
    parse_project_config(&source)
        .with_context(|| format!("failed to parse project file: {}", path.display()))
}

/// Merge the project file (if any) with the command line. Command-line
/// values win; `-s` overrides replace same-named `configs` entries.
pub fn resolve_settings(args: &CliArgs, cwd: &Path) -> Result<Settings> {
    let config_path = match &args.config {
        Some(path) => Some(cwd.join(path)),
        None => Some(cwd.join(PROJECT_FILE)).filter(|p| p.is_file()),
    };
    let (config, base_dir) = match &config_path {
        Some(path) => (
            load_project_config(path)?,
            path.parent().map_or_else(|| cwd.to_path_buf(), Path::to_path_buf),
        ),
        None => (ProjectConfig::default(), cwd.to_path_buf()),
    };

    let inputs = if args.inputs.is_empty() {
        config
            .inputs
            .iter()
            .flatten()
            .map(|p| base_dir.join(p))
            .collect()
    } else {
        args.inputs.iter().map(|p| cwd.join(p)).collect()
    };
    let out_dir = match (&args.out_dir, &config.out_dir) {
        (Some(dir), _) => cwd.join(dir),
        (None, Some(dir)) => base_dir.join(dir),
        (None, None) => cwd.join(DEFAULT_OUT_DIR),
    };
    let passlist = match (&args.passlist, &config.passlist) {
        (Some(path), _) => Some(cwd.join(path)),
        (None, Some(path)) => Some(base_dir.join(path)),
        (None, None) => None,
    };

    let mut config_overrides = IndexMap::new();
    for (name, value) in config.configs.iter().flatten() {
        config_overrides.insert(name.clone(), value.as_override());
    }
    for text in &args.set {
        let over = parse_override(text);
        config_overrides.insert(over.name, over.value);
    }

    let options = CompileOptions {
        inputs,
        out_dir: Some(out_dir),
        cc: args
            .cc
            .clone()
            .or(config.cc)
            .unwrap_or_else(|| DEFAULT_CC.to_string()),
        no_build: args.no_build || config.no_build.unwrap_or(false),
        config_overrides,
        gen_communicated_structures: args.gen_communicated_structures
            || config.gen_communicated_structures.unwrap_or(false),
    };
    Ok(Settings {
        options,
        passlist,
        dump_fragments: args.dump_fragments,
        color: args.color,
    })
}

/// Drop `//` and `/* */` comments and trailing commas so hand-written
/// project files parse as JSON. String contents are left alone.
fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        out.push('\n');
                    }
                    prev = next;
                }
            }
            ',' => {
                let rest = chars.clone().find(|c| !c.is_whitespace());
                if !matches!(rest, Some('}' | ']')) {
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
    }

    out
}
