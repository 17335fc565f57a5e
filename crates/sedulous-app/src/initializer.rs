//! Startup system collection.

use crate::system::System;

/// Collects the systems a [`Context`](crate::Context) activates at startup.
///
/// Systems are moved in, so a single instance can never be added twice.
#[derive(Default)]
pub struct ContextInitializer {
    systems: Vec<Box<dyn System>>,
}

impl ContextInitializer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system. Returns `self` for chaining.
    pub fn add_system<S: System>(&mut self, system: S) -> &mut Self {
        self.add_boxed_system(Box::new(system))
    }

    /// Append an already boxed system.
    pub fn add_boxed_system(&mut self, system: Box<dyn System>) -> &mut Self {
        self.systems.push(system);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Names of the collected systems, in initialization order.
    pub fn system_names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|system| system.name())
    }

    pub(crate) fn into_systems(self) -> Vec<Box<dyn System>> {
        self.systems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl System for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn preserves_insertion_order() {
        let mut initializer = ContextInitializer::new();
        initializer
            .add_system(Named("input"))
            .add_system(Named("physics"))
            .add_boxed_system(Box::new(Named("graphics")));

        assert_eq!(initializer.len(), 3);
        let names: Vec<_> = initializer.system_names().collect();
        assert_eq!(names, ["input", "physics", "graphics"]);
    }

    #[test]
    fn starts_empty() {
        let initializer = ContextInitializer::new();
        assert!(initializer.is_empty());
    }
}
