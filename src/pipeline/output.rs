//! Output destinations.

use crate::error::{Result, StitchError};
use std::path::{Path, PathBuf};

/// Name of the CS2 install root directory.
pub const CS2_ROOT_NAME: &str = "Counter-Strike Global Offensive";

/// Where the atlas should be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Explicit atlas file path. A path without extension gets `.png`.
    File(PathBuf),
    /// `<cs2>/content/csgo_addons/<addon>/materials/skybox/<file_name>`.
    Addon {
        cs2_path: PathBuf,
        addon: String,
        /// Atlas file name; derived from the face names when `None`.
        file_name: Option<String>,
    },
}

impl OutputTarget {
    /// Resolve the final atlas path. `default_stem` names the file when the
    /// target does not.
    pub fn resolve(&self, default_stem: &str) -> Result<PathBuf> {
        match self {
            OutputTarget::File(path) => {
                if path.as_os_str().is_empty() {
                    return Err(StitchError::InvalidInput("empty output path".to_string()));
                }
                if path.extension().is_some() {
                    Ok(path.clone())
                } else {
                    Ok(path.with_extension("png"))
                }
            }
            OutputTarget::Addon {
                cs2_path,
                addon,
                file_name,
            } => {
                let root = find_cs2_root(cs2_path).ok_or_else(|| {
                    StitchError::InvalidInput(format!(
                        "could not find '{}' above {}",
                        CS2_ROOT_NAME,
                        cs2_path.display()
                    ))
                })?;
                let name = file_name
                    .clone()
                    .unwrap_or_else(|| format!("{}.png", default_stem));
                Ok(addon_material_dir(&root, addon).join(name))
            }
        }
    }
}

/// Whether an existing atlas may be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    #[default]
    Refuse,
    Replace,
}

/// Walk up from `path` to the CS2 install root.
pub fn find_cs2_root(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy() == CS2_ROOT_NAME)
                .unwrap_or(false)
        })
        .map(Path::to_path_buf)
}

/// Skybox material directory of an addon.
pub fn addon_material_dir(cs2_root: &Path, addon: &str) -> PathBuf {
    cs2_root
        .join("content")
        .join("csgo_addons")
        .join(addon)
        .join("materials")
        .join("skybox")
}

/// List addon names of a CS2 install, sorted. Hidden directories are skipped.
pub fn list_addons(cs2_path: &Path) -> Result<Vec<String>> {
    let root = find_cs2_root(cs2_path).ok_or_else(|| {
        StitchError::InvalidInput(format!(
            "could not find '{}' above {}",
            CS2_ROOT_NAME,
            cs2_path.display()
        ))
    })?;
    let addons_dir = root.join("content").join("csgo_addons");
    if !addons_dir.is_dir() {
        log::info!("Addons directory not found at: {}", addons_dir.display());
        return Ok(Vec::new());
    }

    let mut addons = Vec::new();
    for entry in std::fs::read_dir(&addons_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type()?.is_dir() && !name.starts_with('.') {
            addons.push(name);
        }
    }
    addons.sort();
    Ok(addons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_target_gets_png_extension() {
        let target = OutputTarget::File(PathBuf::from("out/night"));
        assert_eq!(target.resolve("sky").unwrap(), PathBuf::from("out/night.png"));

        let target = OutputTarget::File(PathBuf::from("out/night.png"));
        assert_eq!(target.resolve("sky").unwrap(), PathBuf::from("out/night.png"));
    }

    #[test]
    fn test_find_cs2_root() {
        let path = Path::new("/steam/common/Counter-Strike Global Offensive/game/bin/win64");
        assert_eq!(
            find_cs2_root(path),
            Some(PathBuf::from("/steam/common/Counter-Strike Global Offensive"))
        );
        assert_eq!(find_cs2_root(Path::new("/steam/common/other")), None);
    }

    #[test]
    fn test_addon_target_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(CS2_ROOT_NAME);
        let addons = root.join("content").join("csgo_addons");
        for name in ["kz_zeta", "kz_alpha", ".hidden"] {
            std::fs::create_dir_all(addons.join(name)).unwrap();
        }
        std::fs::write(addons.join("notes.txt"), b"x").unwrap();

        let game_dir = root.join("game").join("csgo");
        assert_eq!(list_addons(&game_dir).unwrap(), vec!["kz_alpha", "kz_zeta"]);

        let target = OutputTarget::Addon {
            cs2_path: game_dir,
            addon: "kz_alpha".to_string(),
            file_name: None,
        };
        assert_eq!(
            target.resolve("sky").unwrap(),
            addons.join("kz_alpha").join("materials").join("skybox").join("sky.png")
        );
    }
}
