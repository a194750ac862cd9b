//! Config file commands.

use std::path::Path;

use super::{ConfigAction, Context};
use crate::config::{self, Config};

/// Show or edit the config file
pub fn cmd_config(ctx: &Context, action: &ConfigAction) -> anyhow::Result<()> {
    let path = ctx.config_path()?;

    match action {
        ConfigAction::Show => {
            let note = if path.exists() {
                ""
            } else {
                " (not created yet, showing defaults)"
            };
            println!("Config file: {:?}{}\n", path, note);
            print!("{}", toml::to_string_pretty(&masked(&ctx.config))?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("{:?} already exists; pass --force to overwrite it", path);
            }
            config::save_to(&Config::default(), &path)?;
            println!("✓ Wrote default config to {:?}", path);
        }
        ConfigAction::SetPlex {
            url,
            token,
            section,
        } => {
            let mut updated = ctx.config.clone();
            if let Some(url) = url {
                updated.plex.url = url.clone();
            }
            if let Some(token) = token {
                updated.plex.token = Some(token.clone());
            }
            if let Some(section) = section {
                updated.plex.section_id = Some(section.clone());
            }
            store(&updated, &path, "Plex settings")?;
        }
        ConfigAction::SetLibrary {
            base_path,
            library_root,
        } => {
            let mut updated = ctx.config.clone();
            if let Some(base) = base_path {
                updated.library.base_path = Some(base.clone());
            }
            if let Some(root) = library_root {
                updated.library.library_root = Some(root.clone());
            }
            store(&updated, &path, "library settings")?;
        }
    }
    Ok(())
}

fn store(updated: &Config, path: &Path, what: &str) -> anyhow::Result<()> {
    config::save_to(updated, path)?;
    println!("✓ Saved {} to {:?}", what, path);
    Ok(())
}

/// Copy of the config safe to print.
fn masked(config: &Config) -> Config {
    let mut shown = config.clone();
    if shown.plex.token.is_some() {
        shown.plex.token = Some("********".to_string());
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn context(config_path: PathBuf) -> Context {
        Context {
            config: config::load_from(&config_path),
            session_path: config_path.with_file_name("session.json"),
            config_path: Some(config_path),
        }
    }

    #[test]
    fn test_set_plex_keeps_other_settings() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("conf").join("config.toml");

        let mut existing = Config::default();
        existing.library.library_root = Some(PathBuf::from("/plex/music"));
        config::save_to(&existing, &path).unwrap();

        let action = ConfigAction::SetPlex {
            url: None,
            token: Some("abc123".to_string()),
            section: Some("4".to_string()),
        };
        cmd_config(&context(path.clone()), &action).unwrap();

        let saved = config::load_from(&path);
        assert_eq!(saved.plex.token.as_deref(), Some("abc123"));
        assert_eq!(saved.plex.section_id.as_deref(), Some("4"));
        assert_eq!(saved.plex.url, "http://localhost:32400");
        assert_eq!(saved.library.library_root, Some(PathBuf::from("/plex/music")));
    }

    #[test]
    fn test_set_library_creates_the_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");

        let action = ConfigAction::SetLibrary {
            base_path: Some(PathBuf::from("/incoming")),
            library_root: None,
        };
        cmd_config(&context(path.clone()), &action).unwrap();

        assert!(path.exists());
        assert_eq!(
            config::load_from(&path).library.base_path,
            Some(PathBuf::from("/incoming"))
        );
    }

    #[test]
    fn test_init_does_not_overwrite_without_force() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        let mut existing = Config::default();
        existing.plex.token = Some("keep-me".to_string());
        config::save_to(&existing, &path).unwrap();
        let ctx = context(path.clone());

        assert!(cmd_config(&ctx, &ConfigAction::Init { force: false }).is_err());
        assert_eq!(config::load_from(&path).plex.token.as_deref(), Some("keep-me"));

        cmd_config(&ctx, &ConfigAction::Init { force: true }).unwrap();
        assert!(config::load_from(&path).plex.token.is_none());
    }

    #[test]
    fn test_masked_hides_token() {
        let mut config = Config::default();
        config.plex.token = Some("secret".to_string());
        let text = toml::to_string_pretty(&masked(&config)).unwrap();
        assert!(!text.contains("secret"));
        assert!(text.contains("********"));
    }
}
