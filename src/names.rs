//! Region name resolution between boundary features and the store.

use crate::error::{CrimeMapError, CrimeMapResult};
use std::collections::HashMap;

/// Spellings used by the boundary dataset that differ from the store.
const BUILTIN_OVERRIDES: &[(&str, &str)] = &[
    ("Andaman and Nicobar", "A & N Islands"),
    ("Dadra and Nagar Haveli", "D&N Haveli"),
    ("Daman and Diu", "Daman & Diu"),
    ("Jammu and Kashmir", "Jammu & Kashmir"),
    ("Orissa", "Odisha"),
    ("Uttaranchal", "Uttarakhand"),
    ("Pondicherry", "Puducherry"),
];

#[derive(Debug, Clone)]
pub struct CanonicalNameMap {
    entries: HashMap<String, String>,
}

impl CanonicalNameMap {
    /// The built-in override table.
    pub fn builtin() -> Self {
        CanonicalNameMap {
            entries: BUILTIN_OVERRIDES
                .iter()
                .map(|(display, canonical)| (display.to_string(), canonical.to_string()))
                .collect(),
        }
    }

    /// Extends the built-in table with extra `(display, canonical)` pairs.
    ///
    /// A pair for a display name already in the table replaces its target.
    /// Fails if two distinct display names would end up on the same
    /// canonical name.
    pub fn with_overrides<I, D, C>(overrides: I) -> CrimeMapResult<Self>
    where
        I: IntoIterator<Item = (D, C)>,
        D: Into<String>,
        C: Into<String>,
    {
        let mut map = Self::builtin();
        for (display, canonical) in overrides {
            map.entries.insert(display.into(), canonical.into());
        }
        map.check_collisions()?;
        Ok(map)
    }

    fn check_collisions(&self) -> CrimeMapResult<()> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        // Sorted so the reported pair does not depend on hash order.
        let mut pairs: Vec<(&String, &String)> = self.entries.iter().collect();
        pairs.sort();
        for (display, canonical) in pairs {
            if let Some(first) = seen.insert(canonical.as_str(), display.as_str()) {
                return Err(CrimeMapError::NameCollision {
                    first: first.to_string(),
                    second: display.clone(),
                    canonical: canonical.clone(),
                });
            }
        }
        Ok(())
    }

    /// Returns the canonical name for `display_name`, or the name itself.
    ///
    /// Exact, case-sensitive match.
    pub fn resolve<'a>(&'a self, display_name: &'a str) -> &'a str {
        self.entries
            .get(display_name)
            .map(String::as_str)
            .unwrap_or(display_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CanonicalNameMap {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_variants() {
        let names = CanonicalNameMap::builtin();
        assert_eq!(names.resolve("Orissa"), "Odisha");
        assert_eq!(names.resolve("Uttaranchal"), "Uttarakhand");
        assert_eq!(names.resolve("Andaman and Nicobar"), "A & N Islands");
    }

    #[test]
    fn unmapped_names_pass_through() {
        let names = CanonicalNameMap::builtin();
        assert_eq!(names.resolve("Delhi"), "Delhi");
        assert_eq!(names.resolve(""), "");
    }

    #[test]
    fn matching_is_case_sensitive() {
        let names = CanonicalNameMap::builtin();
        assert_eq!(names.resolve("orissa"), "orissa");
        assert_eq!(names.resolve("ORISSA"), "ORISSA");
    }

    #[test]
    fn overrides_extend_the_table() {
        let names = CanonicalNameMap::with_overrides([("NCT of Delhi", "Delhi")]).unwrap();
        assert_eq!(names.resolve("NCT of Delhi"), "Delhi");
        assert_eq!(names.resolve("Orissa"), "Odisha");
        assert_eq!(names.len(), BUILTIN_OVERRIDES.len() + 1);
    }

    #[test]
    fn override_replaces_existing_entry() {
        let names = CanonicalNameMap::with_overrides([("Orissa", "Odisha State")]).unwrap();
        assert_eq!(names.resolve("Orissa"), "Odisha State");
    }

    #[test]
    fn colliding_targets_are_rejected() {
        let err = CanonicalNameMap::with_overrides([("Odisha Province", "Odisha")]).unwrap_err();
        match err {
            CrimeMapError::NameCollision { canonical, .. } => assert_eq!(canonical, "Odisha"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
