//! XML configuration support.
//! - Loads a `Config` from config.xml (quick_xml + serde).
//! - Creates a commented template when the default file is missing.
//!
//! Unknown elements are rejected so typos surface instead of being ignored.

use anyhow::anyhow;
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel, Verbosity};
use crate::errors::{KatalError, Result};
use crate::platform::{set_dir_mode_0700, set_file_mode_0600, write_config_secure_new_0600};
use crate::sieve::Sieve;

#[derive(Debug, Deserialize)]
#[serde(rename = "config", deny_unknown_fields)]
struct XmlConfig {
    source: Option<XmlSource>,
    target: Option<XmlTarget>,
    log: Option<XmlLog>,
    infos: Option<XmlInfos>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlSource {
    path: Option<String>,
    #[serde(default, rename = "sieve")]
    sieves: Vec<XmlSieve>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlSieve {
    name: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlTarget {
    path: Option<String>,
    name_of_target_files: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlLog {
    use_log_file: Option<String>,
    file: Option<String>,
    overwrite: Option<String>,
    verbosity: Option<String>,
    level: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlInfos {
    target_filename_max_length: Option<String>,
    source_filename_max_length: Option<String>,
}

/// Trimmed text of an element; empty counts as absent.
fn text(v: Option<&String>) -> Option<&str> {
    v.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn required<'a>(v: Option<&'a String>, field: &'static str) -> Result<&'a str> {
    text(v).ok_or(KatalError::MissingField(field))
}

fn parse_bool(v: Option<&String>, field: &str, default: bool) -> Result<bool> {
    match text(v) {
        None => Ok(default),
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(KatalError::Config(format!(
                "{field}: expected true or false, got '{s}'"
            ))),
        },
    }
}

fn parse_len(v: Option<&String>, field: &str, default: usize) -> Result<usize> {
    match text(v) {
        None => Ok(default),
        Some(s) => s.parse::<usize>().map_err(|_| {
            KatalError::Config(format!("{field}: expected a positive integer, got '{s}'"))
        }),
    }
}

fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let source = parsed.source.ok_or(KatalError::MissingField("source/path"))?;
    let target = parsed.target.ok_or(KatalError::MissingField("target/path"))?;

    let source_path = required(source.path.as_ref(), "source/path")?;
    let target_path = required(target.path.as_ref(), "target/path")?;
    let template = required(
        target.name_of_target_files.as_ref(),
        "target/name_of_target_files",
    )?;

    let mut cfg = Config::new(source_path, target_path, template);

    cfg.sieves = source
        .sieves
        .iter()
        .enumerate()
        .map(|(i, s)| Sieve::compile(i + 1, text(s.name.as_ref()), text(s.size.as_ref())))
        .collect::<Result<Vec<_>>>()?;

    if let Some(log) = parsed.log {
        cfg.use_log_file = parse_bool(log.use_log_file.as_ref(), "log/use_log_file", false)?;
        cfg.log_overwrite = parse_bool(log.overwrite.as_ref(), "log/overwrite", false)?;
        cfg.log_file = text(log.file.as_ref()).map(PathBuf::from);
        if let Some(v) = text(log.verbosity.as_ref()) {
            cfg.verbosity = Verbosity::parse(v).ok_or_else(|| {
                KatalError::Config(format!("log/verbosity: expected normal or high, got '{v}'"))
            })?;
        }
        if let Some(v) = text(log.level.as_ref()) {
            cfg.log_level = v
                .parse::<LogLevel>()
                .map_err(|e| KatalError::Config(format!("log/level: {e}")))?;
        }
    }
    if cfg.use_log_file && cfg.log_file.is_none() {
        cfg.log_file = default_log_path();
    }

    if let Some(infos) = parsed.infos {
        cfg.target_filename_max_length = parse_len(
            infos.target_filename_max_length.as_ref(),
            "infos/target_filename_max_length",
            cfg.target_filename_max_length,
        )?;
        cfg.source_filename_max_length = parse_len(
            infos.source_filename_max_length.as_ref(),
            "infos/source_filename_max_length",
            cfg.source_filename_max_length,
        )?;
    }

    Ok(cfg)
}

/// Parse a config document.
pub fn parse_config_str(contents: &str) -> Result<Config> {
    let parsed: XmlConfig = from_xml_str(contents)
        .map_err(|e| KatalError::Config(format!("malformed config xml: {e}")))?;
    xml_to_config(parsed)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(|e| KatalError::file_io(path, e))?;
    let cfg = parse_config_str(&contents).map_err(|e| match e {
        KatalError::Config(msg) => KatalError::Config(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    debug!(
        path = %path.display(),
        sieves = cfg.sieves.len(),
        "Loaded config"
    );
    Ok(cfg)
}

/// Write a commented template config (0600, parent 0700).
/// Refuses when an ancestor of `path` is a symlink.
pub fn create_template_config(path: &Path) -> anyhow::Result<()> {
    if path_has_symlink_ancestor(path)? {
        return Err(anyhow!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/path/to/katal.log".into());

    let content = format!(
        "<!--\n  katal configuration (XML)\n\n  source/path                 -> directory to select files from\n  source/sieve                -> one or more; a file is selected if one sieve accepts it\n      name                    -> regular expression matched at the start of the file name\n      size                    -> >N, >=N, <N, <=N or =N (bytes)\n  target/path                 -> archive directory (created if missing, holds katal.db)\n  target/name_of_target_files -> template; tokens: HASHID, SOURCENAME_WITHOUT_EXTENSION(2),\n                                 SOURCE_PATH(2), SOURCE_EXTENSION(2), SIZE, DATE2, DATABASE_INDEX\n  log/verbosity               -> normal | high (high lists every accepted/discarded file)\n  log/level                   -> quiet | normal | info | debug\n\n  CLI flags override XML values.\n-->\n<config>\n  <source>\n    <path>/path/to/source</path>\n    <sieve>\n      <name>.*\\.jpg$</name>\n      <size>&gt;1000</size>\n    </sieve>\n  </source>\n  <target>\n    <path>/path/to/archive</path>\n    <name_of_target_files>HASHID.SOURCE_EXTENSION2</name_of_target_files>\n  </target>\n  <log>\n    <use_log_file>false</use_log_file>\n    <file>{}</file>\n    <overwrite>false</overwrite>\n    <verbosity>normal</verbosity>\n    <level>normal</level>\n  </log>\n  <infos>\n    <target_filename_max_length>{}</target_filename_max_length>\n    <source_filename_max_length>{}</source_filename_max_length>\n  </infos>\n</config>\n",
        suggested_log,
        super::TARGET_FILENAME_MAX_LENGTH_DEFAULT,
        super::SOURCE_FILENAME_MAX_LENGTH_DEFAULT,
    );

    write_config_secure_new_0600(path, content.as_bytes())?;
    let _ = set_file_mode_0600(path);

    info!(path = %path.display(), "Created template config");
    Ok(())
}
