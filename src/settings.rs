use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "vitrine.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSection {
    pub title: String,
    pub asset_path: PathBuf,
    pub fps: u64,
}

impl Default for ViewerSection {
    fn default() -> Self {
        Self {
            title: "Vitrine".into(),
            asset_path: PathBuf::from("templates/3d_model.glb"),
            fps: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSection {
    pub path: PathBuf,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("vitrine.state.toml"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub viewer: ViewerSection,
    pub state: StateSection,
    #[serde(skip)]
    pub root: PathBuf,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let mut settings: Settings =
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        settings.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(settings)
    }

    /// Missing file means defaults. A broken one is reported and ignored.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("{} not found, using defaults", path.display());
            return Self {
                root: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                ..Self::default()
            };
        }
        Self::load(path).unwrap_or_else(|err| {
            log::warn!("ignoring settings: {err:#}");
            Self::default()
        })
    }

    pub fn asset_path(&self) -> PathBuf {
        self.root.join(&self.viewer.asset_path)
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(&self.state.path)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    theme: Theme,
}

/// Theme preference persisted between runs.
#[derive(Debug)]
pub struct ThemeStore {
    path: PathBuf,
    theme: Theme,
}

impl ThemeStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let theme = fs::read_to_string(&path)
            .ok()
            .and_then(|text| match toml::from_str::<StateFile>(&text) {
                Ok(state) => Some(state.theme),
                Err(err) => {
                    log::warn!("ignoring {}: {err}", path.display());
                    None
                }
            })
            .unwrap_or_default();
        Self { path, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set(&mut self, theme: Theme) -> anyhow::Result<()> {
        self.theme = theme;
        self.save()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let text = toml::to_string(&StateFile { theme: self.theme })?;
        fs::write(&self.path, text).with_context(|| format!("writing {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_settings_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(dir.path().join(SETTINGS_FILE));
        assert_eq!(settings.viewer.fps, 120);
        assert_eq!(
            settings.asset_path(),
            dir.path().join("templates/3d_model.glb")
        );
    }

    #[test]
    fn test_partial_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "[viewer]\nasset_path = \"models/boat.glb\"\n").unwrap();

        let settings = Settings::load_or_default(&path);
        assert_eq!(settings.viewer.title, "Vitrine");
        assert_eq!(settings.asset_path(), dir.path().join("models/boat.glb"));
        assert_eq!(settings.state_path(), dir.path().join("vitrine.state.toml"));
    }

    #[test]
    fn test_broken_settings_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "[viewer\nfps = ").unwrap();
        assert!(Settings::load(&path).is_err());
        assert_eq!(Settings::load_or_default(&path).viewer, ViewerSection::default());
    }

    #[test]
    fn test_theme_defaults_to_light() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThemeStore::load(dir.path().join("state.toml"));
        assert_eq!(store.theme(), Theme::Light);

        let garbage = dir.path().join("garbage.toml");
        fs::write(&garbage, "theme = \"sepia\"").unwrap();
        assert_eq!(ThemeStore::load(&garbage).theme(), Theme::Light);
    }

    #[test]
    fn test_theme_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");

        let mut store = ThemeStore::load(&path);
        store.set(store.theme().toggled()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "theme = \"dark\"");
        assert_eq!(ThemeStore::load(&path).theme(), Theme::Dark);
    }
}
