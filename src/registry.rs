use std::cell::RefCell;
use std::sync::Arc;

use ahash::AHashMap;

use crate::error::BuildPathError;
use crate::pattern::PathPattern;

/// Flat name → pattern index shared by every group of one route tree.
///
/// The root group creates the registry and hands a clone of the handle to each
/// child, so naming a route deep inside nested groups registers it at the root
/// and duplicate names are caught the moment they are declared.
#[derive(Debug, Default)]
pub(crate) struct NameRegistry {
    named: RefCell<AHashMap<String, Arc<PathPattern>>>,
}

impl NameRegistry {
    /// # Panics
    /// Panics if `name` is already taken anywhere in the tree.
    pub(crate) fn register(&self, name: &str, pattern: Arc<PathPattern>) {
        let previous = self.named.borrow_mut().insert(name.to_owned(), pattern);

        if let Some(previous) = previous {
            panic!(
                r#"route name "{}" is already registered for pattern "{}""#,
                name,
                previous.template()
            );
        }
    }

    pub(crate) fn build_path<K, V>(
        &self,
        name: &str,
        values: &[(K, V)],
    ) -> Result<String, BuildPathError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let named = self.named.borrow();
        let pattern = named
            .get(name)
            .ok_or_else(|| BuildPathError::UnknownName(name.to_owned()))?;

        pattern.build_path(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name() {
        let registry = NameRegistry::default();
        assert_eq!(
            registry.build_path::<&str, &str>("nope", &[]),
            Err(BuildPathError::UnknownName("nope".to_owned()))
        );
    }

    #[test]
    fn register_and_build() {
        let registry = NameRegistry::default();
        registry.register("user", Arc::new(PathPattern::new("/user/{id}")));

        let path = registry.build_path("user", &[("id", "9")]).unwrap();
        assert_eq!(path, "/user/9");
    }

    #[test]
    #[should_panic]
    fn duplicate_name_panics() {
        let registry = NameRegistry::default();
        registry.register("user", Arc::new(PathPattern::new("/user/{id}")));
        registry.register("user", Arc::new(PathPattern::new("/u/{id}")));
    }
}
