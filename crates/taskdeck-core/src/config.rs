use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone)]
pub struct Config {
    map: HashMap<String, String>,
    pub loaded_files: Vec<PathBuf>,
}

impl Config {
    #[tracing::instrument(skip(rcfile_override))]
    pub fn load(rcfile_override: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = Config {
            map: HashMap::new(),
            loaded_files: vec![],
        };

        cfg.map.insert(
            "api.base".to_string(),
            "http://127.0.0.1:5000".to_string(),
        );
        cfg.map
            .insert("default.command".to_string(), "list".to_string());
        cfg.map.insert("color".to_string(), "on".to_string());

        let rcfile = resolve_rcfile_path(rcfile_override)?;
        if let Some(path) = rcfile {
            info!(rcfile = %path.display(), "loading rc file");
            cfg.load_file(&path)?;
        } else {
            debug!("no rc file found; using defaults");
        }

        Ok(cfg)
    }

    #[tracing::instrument(skip(self, overrides))]
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (k, v) in overrides {
            let key = k.strip_prefix("rc.").unwrap_or(&k).to_string();
            debug!(key = %key, value = %v, "applying override");
            self.map.insert(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).map(|v| parse_bool(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.map.iter()
    }

    #[tracing::instrument(skip(self))]
    fn load_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let path = expand_tilde(path);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        self.loaded_files.push(path.clone());

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        for (line_num, raw_line) in text.lines().enumerate() {
            let mut line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((before, _)) = line.split_once('#') {
                line = before.trim();
            }

            if line.is_empty() {
                continue;
            }

            if let Some(include_rest) = line.strip_prefix("include ") {
                let include_path = resolve_include_path(&base_dir, include_rest.trim())?;
                debug!(
                    file = %path.display(),
                    include = %include_path.display(),
                    line = line_num + 1,
                    "processing include"
                );

                if include_path.exists() {
                    self.load_file(&include_path)?;
                } else {
                    warn!(include = %include_path.display(), "include file does not exist; skipping");
                }
                continue;
            }

            let (k, v) = line.split_once('=').ok_or_else(|| {
                anyhow!(
                    "invalid config line {}:{}: {}",
                    path.display(),
                    line_num + 1,
                    raw_line
                )
            })?;

            let key = k.trim().to_string();
            let value = v.trim().to_string();
            trace!(key = %key, value = %value, "loaded config key");
            self.map.insert(key, value);
        }

        Ok(())
    }
}

/// Base address of the task service: the `--api` flag wins over the
/// `api.base` config key. The trailing slash is stripped so path joins stay
/// uniform.
#[tracing::instrument(skip(cfg, override_base))]
pub fn resolve_api_base(cfg: &Config, override_base: Option<&str>) -> String {
    let base = if let Some(explicit) = override_base {
        explicit.to_string()
    } else {
        cfg.get("api.base")
            .unwrap_or_else(|| "http://127.0.0.1:5000".to_string())
    };

    let trimmed = base.trim_end_matches('/').to_string();
    info!(api_base = %trimmed, "resolved api base");
    trimmed
}

#[tracing::instrument(skip(override_path))]
fn resolve_rcfile_path(override_path: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = override_path {
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(rc_env) = std::env::var("TASKDECKRC") {
        if rc_env == "/dev/null" {
            return Ok(None);
        }
        return Ok(Some(PathBuf::from(rc_env)));
    }

    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    let candidate = home.join(".taskdeckrc");
    if candidate.exists() {
        return Ok(Some(candidate));
    }

    Ok(None)
}

fn resolve_include_path(base_dir: &Path, include: &str) -> anyhow::Result<PathBuf> {
    if include.trim().is_empty() {
        return Err(anyhow!("include path cannot be empty"));
    }

    let raw = PathBuf::from(include);
    let expanded = expand_tilde(&raw);
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(base_dir.join(expanded))
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "y" | "yes" | "on" | "true"
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{Config, resolve_api_base};

    #[test]
    fn rc_file_overrides_defaults_and_skips_comments() {
        let mut rc = tempfile::NamedTempFile::new().expect("rc file");
        writeln!(rc, "# taskdeck rc").expect("write");
        writeln!(rc, "api.base = http://10.0.0.2:8080  # staging").expect("write");
        writeln!(rc).expect("write");
        writeln!(rc, "color = off").expect("write");
        rc.flush().expect("flush");

        let cfg = Config::load(Some(rc.path())).expect("load config");
        assert_eq!(
            cfg.get("api.base").as_deref(),
            Some("http://10.0.0.2:8080")
        );
        assert_eq!(cfg.get_bool("color"), Some(false));
        assert_eq!(cfg.get("default.command").as_deref(), Some("list"));
    }

    #[test]
    fn overrides_strip_rc_prefix_and_win_last() {
        let mut rc = tempfile::NamedTempFile::new().expect("rc file");
        writeln!(rc, "color = on").expect("write");
        rc.flush().expect("flush");

        let mut cfg = Config::load(Some(rc.path())).expect("load config");
        cfg.apply_overrides(vec![
            ("rc.color".to_string(), "off".to_string()),
            ("default.command".to_string(), "insights".to_string()),
        ]);

        assert_eq!(cfg.get_bool("color"), Some(false));
        assert_eq!(cfg.get("default.command").as_deref(), Some("insights"));
    }

    #[test]
    fn invalid_line_is_an_error() {
        let mut rc = tempfile::NamedTempFile::new().expect("rc file");
        writeln!(rc, "this is not a key value pair").expect("write");
        rc.flush().expect("flush");

        assert!(Config::load(Some(rc.path())).is_err());
    }

    #[test]
    fn api_base_flag_wins_and_loses_trailing_slash() {
        let mut rc = tempfile::NamedTempFile::new().expect("rc file");
        writeln!(rc, "api.base = http://127.0.0.1:5000").expect("write");
        rc.flush().expect("flush");

        let cfg = Config::load(Some(rc.path())).expect("load config");
        assert_eq!(
            resolve_api_base(&cfg, Some("http://192.168.1.9:5000/")),
            "http://192.168.1.9:5000"
        );
        assert_eq!(resolve_api_base(&cfg, None), "http://127.0.0.1:5000");
    }
}
