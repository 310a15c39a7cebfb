use std::collections::BTreeMap;

use crate::config::VocabularyConfig;
use crate::record::RelationTable;

/// Maps raw relation-type tokens to their display vocabulary.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    mappings: BTreeMap<String, String>,
}

impl Vocabulary {
    pub fn new(config: &VocabularyConfig) -> Self {
        Self {
            mappings: config.mappings.clone(),
        }
    }

    /// Rewrite every record whose `value` is a mapped raw token.
    /// Returns the number of rewritten records.
    pub fn normalize(&self, table: &mut RelationTable) -> usize {
        let mut rewritten = 0;
        for record in table.iter_mut() {
            if let Some(display) = self.mappings.get(&record.value) {
                record.value = display.clone();
                rewritten += 1;
            }
        }
        rewritten
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(&VocabularyConfig::default())
    }
}
