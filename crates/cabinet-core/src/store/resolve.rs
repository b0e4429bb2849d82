use super::{IndexEntry, Store};
use crate::error::{CabinetError, Result};

impl Store {
    /// Find an installed unit from user input.
    ///
    /// Tried in order: exact identifier, exact name (case-insensitive),
    /// 1-based position in the listing, then a case-insensitive substring of
    /// the name or identifier. Any step matching several units is ambiguous.
    pub fn resolve(&self, selector: &str) -> Result<&IndexEntry> {
        let selector = selector.trim();
        let units = self.units();

        if let Some(entry) = units.iter().find(|u| u.identifier == selector) {
            return Ok(entry);
        }

        let lower = selector.to_lowercase();
        let by_name: Vec<&IndexEntry> = units
            .iter()
            .filter(|u| u.descriptor.name.to_lowercase() == lower)
            .collect();
        match by_name.len() {
            0 => {}
            1 => return Ok(by_name[0]),
            _ => return Err(ambiguous(selector, &by_name)),
        }

        if let Ok(position) = selector.parse::<usize>() {
            if position >= 1 {
                if let Some(entry) = units.get(position - 1) {
                    return Ok(entry);
                }
            }
        }

        if !lower.is_empty() {
            let partial: Vec<&IndexEntry> = units
                .iter()
                .filter(|u| {
                    u.descriptor.name.to_lowercase().contains(&lower)
                        || u.identifier.contains(&lower)
                })
                .collect();
            match partial.len() {
                0 => {}
                1 => return Ok(partial[0]),
                _ => return Err(ambiguous(selector, &partial)),
            }
        }

        Err(CabinetError::NotFound(format!("no installed unit matches '{selector}'")))
    }

    /// Find a backup archive from user input: exact identifier, 1-based
    /// position in lexical order, or a unique substring.
    pub fn resolve_backup(&self, selector: &str) -> Result<String> {
        let selector = selector.trim();
        let ids = self.backup_identifiers()?;

        if let Some(id) = ids.iter().find(|id| id.as_str() == selector) {
            return Ok(id.clone());
        }

        if let Ok(position) = selector.parse::<usize>() {
            if position >= 1 {
                if let Some(id) = ids.get(position - 1) {
                    return Ok(id.clone());
                }
            }
        }

        let lower = selector.to_lowercase();
        if !lower.is_empty() {
            let partial: Vec<&String> = ids.iter().filter(|id| id.contains(&lower)).collect();
            match partial.len() {
                0 => {}
                1 => return Ok(partial[0].clone()),
                _ => {
                    return Err(CabinetError::AmbiguousName {
                        selector: selector.to_string(),
                        matches: partial.into_iter().cloned().collect(),
                    })
                }
            }
        }

        Err(CabinetError::NotFound(format!("no backup matches '{selector}'")))
    }
}

fn ambiguous(selector: &str, matches: &[&IndexEntry]) -> CabinetError {
    CabinetError::AmbiguousName {
        selector: selector.to_string(),
        matches: matches.iter().map(|u| u.identifier.clone()).collect(),
    }
}
