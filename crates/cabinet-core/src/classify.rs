use crate::error::{CabinetError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Single,
    Collection,
}

/// Decide whether a source holds one unit or a collection.
///
/// Without `force_collection` only a source with exactly one valid unit is
/// accepted; anything else is ambiguous and the caller must decide.
pub fn classify(origin: &str, valid_count: usize, force_collection: bool) -> Result<Classification> {
    if force_collection {
        return Ok(Classification::Collection);
    }
    if valid_count == 1 {
        return Ok(Classification::Single);
    }
    Err(CabinetError::AmbiguousSource {
        origin: origin.to_string(),
        found: valid_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_unit_without_force() {
        assert_eq!(classify("src", 1, false).unwrap(), Classification::Single);
    }

    #[test]
    fn several_units_need_force() {
        let err = classify("src", 2, false).unwrap_err();
        assert!(matches!(err, CabinetError::AmbiguousSource { found: 2, .. }));
        assert!(err.to_string().contains("--collection"));
        assert_eq!(classify("src", 2, true).unwrap(), Classification::Collection);
    }

    #[test]
    fn nothing_found_is_ambiguous() {
        assert!(matches!(
            classify("src", 0, false),
            Err(CabinetError::AmbiguousSource { found: 0, .. })
        ));
    }

    #[test]
    fn force_wins_for_one_unit() {
        assert_eq!(classify("src", 1, true).unwrap(), Classification::Collection);
    }
}
