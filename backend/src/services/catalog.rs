//! Subject lookup

use std::collections::HashMap;

use shared::{Subject, SubjectId};

/// Resolves the subject a demand line or stock unit refers to
pub trait SubjectResolver {
    fn resolve(&self, id: SubjectId) -> Option<&Subject>;
}

/// In-memory subject catalog
#[derive(Debug, Clone, Default)]
pub struct SubjectCatalog {
    subjects: HashMap<SubjectId, Subject>,
}

impl SubjectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, subject: Subject) {
        self.subjects.insert(subject.id, subject);
    }

    pub fn with(mut self, subject: Subject) -> Self {
        self.insert(subject);
        self
    }
}

impl SubjectResolver for SubjectCatalog {
    fn resolve(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(&id)
    }
}
