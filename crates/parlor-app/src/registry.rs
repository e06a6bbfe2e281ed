use parlor_types::models::ChatPartner;

use crate::error::RegistryError;

pub const DEFAULT_USERS: [&str; 3] = ["Alice", "Bob", "Charlie"];

/// In-memory list of chat partners, unique by exact name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRegistry {
    users: Vec<ChatPartner>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded() -> Self {
        Self {
            users: DEFAULT_USERS.iter().map(|name| ChatPartner::new(*name)).collect(),
        }
    }

    pub fn users(&self) -> &[ChatPartner] {
        &self.users
    }

    pub fn contains(&self, name: &str) -> bool {
        self.users.iter().any(|u| u.name == name)
    }

    /// Add a partner. The name is trimmed; comparison is case-sensitive.
    pub fn create(&mut self, name: &str) -> Result<&ChatPartner, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.contains(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        self.users.push(ChatPartner::new(name));
        Ok(&self.users[self.users.len() - 1])
    }

    pub fn delete(&mut self, name: &str) -> Result<ChatPartner, RegistryError> {
        let index = self
            .users
            .iter()
            .position(|u| u.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        Ok(self.users.remove(index))
    }
}

/// Case-insensitive substring filter. An empty term matches everyone.
pub fn filter<'a>(users: &'a [ChatPartner], term: &str) -> Vec<&'a ChatPartner> {
    if term.is_empty() {
        return users.iter().collect();
    }
    let needle = term.to_lowercase();
    users
        .iter()
        .filter(|u| u.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(users: &[&ChatPartner]) -> Vec<String> {
        users.iter().map(|u| u.name.clone()).collect()
    }

    #[test]
    fn seeded_with_three_users() {
        let registry = UserRegistry::seeded();
        assert_eq!(registry.users().len(), 3);
        assert!(registry.contains("Alice"));
    }

    #[test]
    fn duplicate_is_rejected_without_change() {
        let mut registry = UserRegistry::seeded();
        let before = registry.clone();

        let err = registry.create("Alice").unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("Alice".into()));
        assert_eq!(err.to_string(), "User already exists");
        assert_eq!(registry, before);

        // trimmed before comparison
        assert!(registry.create("  Alice ").is_err());
        assert_eq!(registry, before);
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut registry = UserRegistry::seeded();
        assert_eq!(registry.create("alice").unwrap().name, "alice");
        assert_eq!(registry.users().len(), 4);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut registry = UserRegistry::new();
        assert_eq!(registry.create("   "), Err(RegistryError::EmptyName));
        assert!(registry.users().is_empty());
    }

    #[test]
    fn delete_removes_exact_match() {
        let mut registry = UserRegistry::seeded();
        assert_eq!(registry.delete("Bob").unwrap().name, "Bob");
        assert!(!registry.contains("Bob"));
        assert_eq!(
            registry.delete("Bob"),
            Err(RegistryError::NotFound("Bob".into()))
        );
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let registry = UserRegistry::seeded();
        assert_eq!(names(&filter(registry.users(), "AR")), vec!["Charlie"]);
        assert_eq!(names(&filter(registry.users(), "b")), vec!["Bob"]);
        assert_eq!(filter(registry.users(), "").len(), 3);
        assert!(filter(registry.users(), "zed").is_empty());
    }
}
