//! Input environment: ordered name/value pairs plus optional write-back slots

use std::collections::HashMap;

/// Where a flattened entry lives in a structured file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    /// Section name; `None` for entries outside any section
    pub section: Option<String>,
    /// Key within the section
    pub key: String,
}

/// Ordered `(name, value)` pairs to resolve.
///
/// When the input comes from a structured file, `slots` maps each flattened name back
/// to its section/key so resolved values can be written to the right place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    entries: Vec<(String, String)>,
    slots: HashMap<String, Slot>,
}

impl Environment {
    /// Create an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from name/value pairs, keeping their order.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            slots: HashMap::new(),
        }
    }

    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    #[must_use]
    pub fn from_process() -> Self {
        Self::from_pairs(std::env::vars_os().filter_map(|(name, value)| {
            match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (Ok(name), Err(_)) => {
                    tracing::debug!(name, "Skipping variable with non UTF-8 value");
                    None
                }
                _ => {
                    tracing::debug!("Skipping variable with non UTF-8 name");
                    None
                }
            }
        }))
    }

    /// Append an entry that maps back to a structured-file slot.
    pub fn push_with_slot(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        slot: Slot,
    ) {
        let name = name.into();
        self.slots.insert(name.clone(), slot);
        self.entries.push((name, value.into()));
    }

    /// Entries in input order.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Write-back slot for a flattened name.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split `NAME=VALUE` at the first `=`; the value may itself contain `=`.
#[must_use]
pub fn parse_assignment(assignment: &str) -> Option<(&str, &str)> {
    assignment.split_once('=')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_assignment_splits_on_first_equals() {
        assert_eq!(parse_assignment("A=b=c"), Some(("A", "b=c")));
        assert_eq!(parse_assignment("EMPTY="), Some(("EMPTY", "")));
        assert_eq!(parse_assignment("NOEQUALS"), None);
    }

    #[test]
    fn from_pairs_keeps_order() {
        let env = Environment::from_pairs([("B", "2"), ("A", "1=x")]);
        assert_eq!(
            env.entries(),
            &[
                ("B".to_string(), "2".to_string()),
                ("A".to_string(), "1=x".to_string())
            ]
        );
    }

    #[test]
    fn slots_are_looked_up_by_name() {
        let mut env = Environment::from_pairs([("PLAIN", "y")]);
        env.push_with_slot(
            "db.password",
            "x",
            Slot {
                section: Some("db".to_string()),
                key: "password".to_string(),
            },
        );

        assert_eq!(env.len(), 2);
        assert_eq!(env.slot("db.password").unwrap().key, "password");
        assert!(env.slot("PLAIN").is_none());
    }

    #[test]
    fn from_process_sees_current_variables() {
        let env = Environment::from_process();
        if std::env::var("PATH").is_ok() {
            assert!(env.entries().iter().any(|(name, _)| name == "PATH"));
        }
    }
}
