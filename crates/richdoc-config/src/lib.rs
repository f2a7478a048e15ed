//! Configuration primitives and loader for the richdoc toolkit.
//!
//! `.richdoc.toml` files are resolved with the precedence
//! override flag → working directory → git root → built-in defaults.
//! Each value remembers the layer it came from so validation failures can
//! point at the file that introduced them.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use richdoc_reconcile::DiffMode;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".richdoc.toml";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub history: HistorySettings,
    pub reconcile: ReconcileSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
    pub sources: ConfigSources,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistorySettings {
    /// Undo depth; 0 keeps every snapshot.
    pub max_levels: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        HistorySettings { max_levels: 0 }
    }
}

/// Settings applied when turning model output into edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconcileSettings {
    pub strict: bool,
    /// Run the repair layer before rewrite diffs.
    pub repair: bool,
    pub default_mode: DiffMode,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        ReconcileSettings {
            strict: false,
            repair: true,
            default_mode: DiffMode::Rewrite,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputSettings {
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: LogLevel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "plain" => Ok(OutputFormat::Plain),
            "json" => Ok(OutputFormat::Json),
            _ => Err(()),
        }
    }
}

/// Default log verbosity when neither `RUST_LOG` nor `-v` is given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Level `steps` notches more verbose, saturating at trace.
    pub fn raised(self, steps: u8) -> Self {
        const ORDER: [LogLevel; 5] = [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ];
        let index = ORDER.iter().position(|level| *level == self).unwrap_or(1);
        ORDER[(index + usize::from(steps)).min(ORDER.len() - 1)]
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(()),
        }
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// One layer that contributed settings, with the file it was read from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    fn defaults() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: Some(path),
        }
    }

}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => f.write_str("built-in defaults"),
            (kind, Some(path)) => write!(f, "{kind} at {}", path.display()),
            (kind, None) => write!(f, "{kind}"),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Failures while locating, reading or checking `.richdoc.toml` layers.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot use {attempted} as the working directory: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("config file given with --config does not exist: {path}")]
    OverrideNotFound { path: PathBuf },
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("{path} is not a valid richdoc config: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid richdoc settings:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Merge every applicable file layer over the built-in defaults.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = working_dir(options.working_dir)?;
        let defaults = ConfigSource::defaults();
        let mut merged = defaults_layer(&defaults);
        let mut layers = vec![defaults];

        for (kind, path) in discover_layers(&working_dir, options.override_path.as_deref())? {
            let source = ConfigSource::for_file(kind, path);
            merged.merge(read_layer(&source)?);
            layers.push(source);
        }

        let settings = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            history: settings.history,
            reconcile: settings.reconcile,
            output: settings.output,
            logging: settings.logging,
            sources: ConfigSources {
                working_directory: working_dir,
                layers,
            },
        })
    }

    /// Built-in defaults without touching the filesystem.
    pub fn builtin(working_dir: impl Into<PathBuf>) -> Self {
        Config {
            history: HistorySettings::default(),
            reconcile: ReconcileSettings::default(),
            output: OutputSettings::default(),
            logging: LoggingSettings::default(),
            sources: ConfigSources {
                working_directory: working_dir.into(),
                layers: vec![ConfigSource::defaults()],
            },
        }
    }
}

fn working_dir(requested: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    let attempted = requested.unwrap_or_else(|| PathBuf::from("."));
    fs::canonicalize(&attempted)
        .map_err(|source| ConfigError::WorkingDirectory { attempted, source })
}

/// File layers in ascending precedence. A file reachable through more than
/// one layer is only read at its highest-precedence position.
fn discover_layers(
    working_dir: &Path,
    override_path: Option<&Path>,
) -> Result<Vec<(ConfigSourceKind, PathBuf)>, ConfigError> {
    // `join` keeps absolute override paths as they are.
    let override_path = override_path.map(|path| working_dir.join(path));
    if let Some(path) = &override_path {
        if !path.exists() {
            return Err(ConfigError::OverrideNotFound { path: path.clone() });
        }
    }

    let candidates = [
        (
            ConfigSourceKind::GitRoot,
            git_root(working_dir).map(|root| root.join(CONFIG_FILE_NAME)),
        ),
        (ConfigSourceKind::Local, Some(working_dir.join(CONFIG_FILE_NAME))),
        (ConfigSourceKind::Override, override_path),
    ];

    let mut layers: Vec<(ConfigSourceKind, PathBuf)> = Vec::new();
    for (kind, path) in candidates {
        let Some(path) = path.filter(|path| path.exists()) else {
            continue;
        };
        layers.retain(|(_, seen)| *seen != path);
        layers.push((kind, path));
    }
    Ok(layers)
}

fn read_layer(source: &ConfigSource) -> Result<PartialConfig, ConfigError> {
    let path = source.path.clone().unwrap_or_default();
    let contents = fs::read_to_string(&path).map_err(|err| ConfigError::Io {
        path: path.clone(),
        source: err,
    })?;
    let raw: RawConfig =
        toml::from_str(&contents).map_err(|err| ConfigError::Parse { path, source: err })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: &ConfigSource) -> PartialConfig {
    let history = HistorySettings::default();
    let reconcile = ReconcileSettings::default();
    let located = |value: String| Some(Located::new(value, source.clone()));

    PartialConfig {
        history: HistoryPartial {
            max_levels: Some(Located::new(history.max_levels as i64, source.clone())),
        },
        reconcile: ReconcilePartial {
            strict: Some(Located::new(reconcile.strict, source.clone())),
            repair: Some(Located::new(reconcile.repair, source.clone())),
            default_mode: located(reconcile.default_mode.as_str().to_string()),
        },
        output: OutputPartial {
            format: located(OutputFormat::default().as_str().to_string()),
        },
        logging: LoggingPartial {
            level: located(LogLevel::default().as_str().to_string()),
        },
    }
}

/// Nearest ancestor of `start` (itself included) holding a `.git` entry.
fn git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

fn take_newer<T>(slot: &mut Option<Located<T>>, other: Option<Located<T>>) {
    if other.is_some() {
        *slot = other;
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    history: HistoryPartial,
    reconcile: ReconcilePartial,
    output: OutputPartial,
    logging: LoggingPartial,
}

#[derive(Clone, Debug, Default)]
struct HistoryPartial {
    max_levels: Option<Located<i64>>,
}

#[derive(Clone, Debug, Default)]
struct ReconcilePartial {
    strict: Option<Located<bool>>,
    repair: Option<Located<bool>>,
    default_mode: Option<Located<String>>,
}

#[derive(Clone, Debug, Default)]
struct OutputPartial {
    format: Option<Located<String>>,
}

#[derive(Clone, Debug, Default)]
struct LoggingPartial {
    level: Option<Located<String>>,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        take_newer(&mut self.history.max_levels, other.history.max_levels);
        take_newer(&mut self.reconcile.strict, other.reconcile.strict);
        take_newer(&mut self.reconcile.repair, other.reconcile.repair);
        take_newer(&mut self.reconcile.default_mode, other.reconcile.default_mode);
        take_newer(&mut self.output.format, other.output.format);
        take_newer(&mut self.logging.level, other.logging.level);
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();

        let mut history = HistorySettings::default();
        if let Some(located) = self.history.max_levels {
            match usize::try_from(located.value) {
                Ok(value) => history.max_levels = value,
                Err(_) => errors.push(
                    ConfigValidationError::new(
                        "history.max_levels",
                        located.source,
                        format!("must be zero or positive (received {})", located.value),
                    ),
                ),
            }
        }

        let mut reconcile = ReconcileSettings::default();
        if let Some(located) = self.reconcile.strict {
            reconcile.strict = located.value;
        }
        if let Some(located) = self.reconcile.repair {
            reconcile.repair = located.value;
        }
        if let Some(located) = self.reconcile.default_mode {
            match located.value.parse::<DiffMode>() {
                Ok(mode) => reconcile.default_mode = mode,
                Err(_) => errors.push(
                    ConfigValidationError::new(
                        "reconcile.default_mode",
                        located.source,
                        format!(
                            "unknown mode '{}' (expected rewrite, summarize or expand)",
                            located.value
                        ),
                    ),
                ),
            }
        }

        let mut output = OutputSettings::default();
        if let Some(located) = self.output.format {
            match located.value.parse::<OutputFormat>() {
                Ok(format) => output.format = format,
                Err(()) => errors.push(
                    ConfigValidationError::new(
                        "output.format",
                        located.source,
                        format!("unknown format '{}' (expected plain or json)", located.value),
                    ),
                ),
            }
        }

        let mut logging = LoggingSettings::default();
        if let Some(located) = self.logging.level {
            match located.value.parse::<LogLevel>() {
                Ok(level) => logging.level = level,
                Err(()) => errors.push(
                    ConfigValidationError::new(
                        "logging.level",
                        located.source,
                        format!("unknown log level '{}'", located.value),
                    ),
                ),
            }
        }

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            history,
            reconcile,
            output,
            logging,
        })
    }
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    history: HistorySettings,
    reconcile: ReconcileSettings,
    output: OutputSettings,
    logging: LoggingSettings,
}

/// Every invalid setting found while resolving the layers, one per line.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.0.iter().map(|err| format!("- {err}")).collect();
        f.write_str(&lines.join("\n"))
    }
}

/// An invalid value for `key`, blamed on the layer that set it.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub key: &'static str,
    pub message: String,
    pub source: ConfigSource,
}

impl ConfigValidationError {
    fn new(key: &'static str, source: ConfigSource, message: String) -> Self {
        ConfigValidationError {
            key,
            message,
            source,
        }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.key, self.message, self.source)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    history: Option<RawHistory>,
    #[serde(default)]
    reconcile: Option<RawReconcile>,
    #[serde(default)]
    output: Option<RawOutput>,
    #[serde(default)]
    logging: Option<RawLogging>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHistory {
    #[serde(default)]
    max_levels: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReconcile {
    #[serde(default)]
    strict: Option<bool>,
    #[serde(default)]
    repair: Option<bool>,
    #[serde(default)]
    default_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutput {
    #[serde(default)]
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLogging {
    #[serde(default)]
    level: Option<String>,
}

impl RawConfig {
    fn into_partial(self, source: &ConfigSource) -> PartialConfig {
        let locate = |value| Located::new(value, source.clone());
        let mut partial = PartialConfig::default();

        if let Some(history) = self.history {
            partial.history.max_levels = history.max_levels.map(|v| Located::new(v, source.clone()));
        }
        if let Some(reconcile) = self.reconcile {
            partial.reconcile.strict = reconcile.strict.map(|v| Located::new(v, source.clone()));
            partial.reconcile.repair = reconcile.repair.map(|v| Located::new(v, source.clone()));
            partial.reconcile.default_mode = reconcile.default_mode.map(locate);
        }
        if let Some(output) = self.output {
            partial.output.format = output.format.map(locate);
        }
        if let Some(logging) = self.logging {
            partial.logging.level = logging.level.map(locate);
        }
        partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_source(name: &str) -> ConfigSource {
        ConfigSource::for_file(ConfigSourceKind::Local, PathBuf::from(name))
    }

    fn parse(contents: &str, name: &str) -> PartialConfig {
        let raw: RawConfig = toml::from_str(contents).unwrap();
        raw.into_partial(&file_source(name))
    }

    #[test]
    fn later_layers_override_only_what_they_set() {
        let mut merged = defaults_layer(&ConfigSource::defaults());
        merged.merge(parse("[reconcile]\nstrict = true\n", "a.toml"));
        merged.merge(parse("[reconcile]\ndefault_mode = \"expand\"\n", "b.toml"));

        let resolved = merged.finalize().unwrap();
        assert!(resolved.reconcile.strict);
        assert!(resolved.reconcile.repair);
        assert_eq!(resolved.reconcile.default_mode, DiffMode::Expand);
    }

    #[test]
    fn validation_errors_are_aggregated_with_their_layer() {
        let mut merged = defaults_layer(&ConfigSource::defaults());
        merged.merge(parse(
            "[history]\nmax_levels = -1\n[output]\nformat = \"yaml\"\n",
            "bad.toml",
        ));

        let errors = merged.finalize().unwrap_err();
        assert_eq!(errors.iter().count(), 2);
        let rendered = errors.to_string();
        assert!(rendered.contains("history.max_levels: must be zero or positive (received -1) (local config at bad.toml)"));
        assert!(rendered.contains("output.format: unknown format 'yaml'"));
    }

    #[test]
    fn log_level_raises_saturate() {
        assert_eq!(LogLevel::Warn.raised(1), LogLevel::Info);
        assert_eq!(LogLevel::Warn.raised(2), LogLevel::Debug);
        assert_eq!(LogLevel::Info.raised(9), LogLevel::Trace);
    }
}
