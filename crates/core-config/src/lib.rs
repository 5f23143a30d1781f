//! Configuration loading and parsing.
//!
//! Parses `braille.toml` (or an override path supplied by the embedder):
//!
//! ```toml
//! [display]
//! rows = 1
//! columns = 40
//! spacing = true      # multi-row dot spacing, only honoured for even geometry
//!
//! [pan]
//! strategy = "wrapped"   # or "fixed"
//!
//! [cursor]
//! show = true
//! ```
//!
//! Every field is optional. Unknown fields are ignored so older binaries keep
//! reading newer files. A missing or unparsable file yields defaults.
//!
//! The configured display size is a virtual size used while no hardware is
//! attached. `Config::apply_context` folds in the geometry reported by the
//! display driver and decides whether the multi-row spacing transform can run.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

/// Which layout the viewport reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanMode {
    /// Cells exactly as translated (dot-spaced on multi-row displays).
    #[default]
    Fixed,
    /// Cells reflowed so words do not split across rows.
    Wrapped,
}

impl PanMode {
    pub fn from_wrapped(wrapped: bool) -> Self {
        if wrapped { Self::Wrapped } else { Self::Fixed }
    }

    pub fn is_wrapped(self) -> bool {
        matches!(self, Self::Wrapped)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default)]
    pub rows: usize,
    #[serde(default)]
    pub columns: usize,
    #[serde(default = "DisplayConfig::default_spacing")]
    pub spacing: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            rows: 0,
            columns: 0,
            spacing: Self::default_spacing(),
        }
    }
}

impl DisplayConfig {
    const fn default_spacing() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PanConfig {
    #[serde(default)]
    pub strategy: PanMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CursorConfig {
    #[serde(default = "CursorConfig::default_show")]
    pub show: bool,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            show: Self::default_show(),
        }
    }
}

impl CursorConfig {
    const fn default_show() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub pan: PanConfig,
    #[serde(default)]
    pub cursor: CursorConfig,
}

/// Geometry reported by the display driver at apply time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigContext {
    pub hardware_rows: usize,
    pub hardware_columns: usize,
}

impl ConfigContext {
    pub fn new(hardware_rows: usize, hardware_columns: usize) -> Self {
        Self {
            hardware_rows,
            hardware_columns,
        }
    }

    pub fn no_hardware() -> Self {
        Self::default()
    }

    pub fn has_hardware(&self) -> bool {
        self.hardware_rows * self.hardware_columns != 0
    }
}

/// Display geometry the engine should run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectiveDisplay {
    pub rows: usize,
    pub columns: usize,
    /// Multi-row spacing requested and permitted by the geometry.
    pub spacing: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,          // file contents as read, when present
    pub file: ConfigFile,             // parsed (or default) data
    pub effective: EffectiveDisplay, // resolved against the attached display
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("braille.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("braille-pan").join("braille.toml");
    }
    PathBuf::from("braille.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            let mut cfg = Config {
                raw: Some(content),
                file,
                effective: EffectiveDisplay::default(),
            };
            cfg.apply_context(ConfigContext::no_hardware());
            Ok(cfg)
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Resolve the effective geometry. Attached hardware wins over the
    /// configured virtual size; spacing needs more than one row and even
    /// dimensions.
    pub fn apply_context(&mut self, ctx: ConfigContext) -> EffectiveDisplay {
        let display = &self.file.display;
        let (rows, columns, source) = if ctx.has_hardware() {
            (ctx.hardware_rows, ctx.hardware_columns, "hardware")
        } else {
            (display.rows, display.columns, "config")
        };
        let wants_spacing = display.spacing && rows > 1;
        let spacing = wants_spacing && rows % 2 == 0 && columns % 2 == 0;

        if wants_spacing && !spacing {
            info!(
                target: "config",
                rows,
                columns,
                source,
                "multiline_spacing_disabled"
            );
        }
        self.effective = EffectiveDisplay {
            rows,
            columns,
            spacing,
        };
        self.effective
    }

    /// Re-resolve after the display driver reports a change. Returns the new
    /// geometry when it differs from the previous one.
    pub fn recompute_with_context(&mut self, ctx: ConfigContext) -> Option<EffectiveDisplay> {
        let prev = self.effective;
        let current = self.apply_context(ctx);
        if current != prev { Some(current) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), body).unwrap();
        tmp
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.file.display.rows, 0);
        assert_eq!(cfg.file.display.columns, 0);
        assert_eq!(cfg.file.pan.strategy, PanMode::Fixed);
        assert!(cfg.file.cursor.show);
        assert!(cfg.file.display.spacing);
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn parses_display_and_strategy() {
        let tmp = write_config(
            "[display]\nrows = 1\ncolumns = 40\n[pan]\nstrategy = \"wrapped\"\n[cursor]\nshow = false\n",
        );
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.display.rows, 1);
        assert_eq!(cfg.file.display.columns, 40);
        assert_eq!(cfg.file.pan.strategy, PanMode::Wrapped);
        assert!(!cfg.file.cursor.show);
        assert_eq!(
            cfg.effective,
            EffectiveDisplay {
                rows: 1,
                columns: 40,
                spacing: false
            }
        );
    }

    #[test]
    fn parse_error_falls_back_to_defaults() {
        let tmp = write_config("[pan]\nstrategy = \"diagonal\"\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.pan.strategy, PanMode::Fixed);
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let tmp = write_config("[display]\ncolumns = 20\nbrand = \"x\"\n[extra]\nk = 1\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.display.columns, 20);
    }

    #[test]
    fn hardware_geometry_overrides_config() {
        let tmp = write_config("[display]\nrows = 1\ncolumns = 40\n");
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let eff = cfg.apply_context(ConfigContext::new(4, 20));
        assert_eq!(
            eff,
            EffectiveDisplay {
                rows: 4,
                columns: 20,
                spacing: true
            }
        );
    }

    #[test]
    fn recompute_reports_only_changes() {
        let mut cfg = Config::default();
        assert_eq!(cfg.recompute_with_context(ConfigContext::no_hardware()), None);
        let changed = cfg.recompute_with_context(ConfigContext::new(2, 32));
        assert_eq!(changed.map(|e| (e.rows, e.columns, e.spacing)), Some((2, 32, true)));
        assert_eq!(cfg.recompute_with_context(ConfigContext::new(2, 32)), None);
    }

    #[test]
    fn odd_multirow_geometry_logs_spacing_disabled() {
        let mut cfg = Config::default();
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let eff = with_default(subscriber, || cfg.apply_context(ConfigContext::new(3, 20)));

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("multiline_spacing_disabled"));
        assert!(!eff.spacing);
        assert_eq!((eff.rows, eff.columns), (3, 20));
    }

    #[test]
    fn spacing_can_be_turned_off() {
        let tmp = write_config("[display]\nrows = 4\ncolumns = 20\nspacing = false\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(!cfg.effective.spacing);
    }
}
