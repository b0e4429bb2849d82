use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use cabinet_core::config::{self, CabinetConfig};

/// A place `cabinet config` can write to, with what it is good for.
struct Location {
    path: PathBuf,
    level: &'static str,
    scope: &'static str,
}

fn locations() -> Vec<Location> {
    config::default_config_search_paths()
        .into_iter()
        .map(|(path, level)| Location {
            path,
            level,
            scope: match level {
                "project" => "this directory only (e.g. a shared games folder)",
                "user" => "your account; the store defaults to ~/.cabinet",
                _ => "every user on this machine",
            },
        })
        .collect()
}

/// The user-level location when it exists in the search order.
fn default_choice(locations: &[Location]) -> usize {
    locations
        .iter()
        .position(|l| l.level == "user")
        .unwrap_or(0)
}

pub(crate) fn run_config_generate(dest: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let path = match dest {
        Some(d) => PathBuf::from(d),
        None => choose_location()?,
    };
    if path.exists() {
        return Err(format!("file already exists: {}", path.display()).into());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(&path, config::minimal_config_template())?;
    let defaults = CabinetConfig::default();
    println!("Config written to: {}", path.display());
    println!("  store root: {}", defaults.store.root_path().display());
    println!("  backups on install: {}", defaults.backup.on_install);
    println!("Add entries under `runtimes:` to register more interpreters.");
    Ok(())
}

fn choose_location() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut options = locations();
    if options.is_empty() {
        return Err("no config locations available; pass --dest".into());
    }
    let fallback = default_choice(&options);
    if !io::stdin().is_terminal() {
        return Ok(options.swap_remove(fallback).path);
    }

    eprintln!("Where should the config file live?");
    for (i, location) in options.iter().enumerate() {
        eprintln!("  [{}] {}", i + 1, location.path.display());
        eprintln!("      applies to {}", location.scope);
    }
    eprint!("Choice [{}]: ", fallback + 1);
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let index = match input.trim() {
        "" => fallback,
        raw => match raw.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => n - 1,
            _ => return Err(format!("invalid choice: '{raw}'").into()),
        },
    };
    Ok(options.swap_remove(index).path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(path: &str, level: &'static str) -> Location {
        Location {
            path: PathBuf::from(path),
            level,
            scope: "",
        }
    }

    #[test]
    fn user_location_is_preferred() {
        let options = vec![
            location("cabinet.yaml", "project"),
            location("/home/a/.config/cabinet/config.yaml", "user"),
            location("/etc/cabinet/config.yaml", "system"),
        ];
        assert_eq!(default_choice(&options), 1);
    }

    #[test]
    fn first_location_without_a_user_dir() {
        let options = vec![
            location("cabinet.yaml", "project"),
            location("/etc/cabinet/config.yaml", "system"),
        ];
        assert_eq!(default_choice(&options), 0);
    }

    #[test]
    fn every_search_path_is_offered() {
        assert_eq!(locations().len(), config::default_config_search_paths().len());
    }
}
