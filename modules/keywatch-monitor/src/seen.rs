use std::collections::{HashMap, HashSet, VecDeque};

const DEFAULT_MAX_PER_ENTITY: usize = 1000;
const DEFAULT_KEEP_PER_ENTITY: usize = 500;

/// Item ids already handled, per entity. In memory only.
///
/// When an entity's set grows past `max_per_entity` it is cut back to the
/// `keep_per_entity` most recently marked ids.
#[derive(Debug)]
pub struct SeenStore {
    entities: HashMap<String, EntitySeen>,
    max_per_entity: usize,
    keep_per_entity: usize,
}

#[derive(Debug, Default)]
struct EntitySeen {
    ids: HashSet<i64>,
    order: VecDeque<i64>,
}

impl Default for SeenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SeenStore {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_PER_ENTITY, DEFAULT_KEEP_PER_ENTITY)
    }

    pub fn with_limits(max_per_entity: usize, keep_per_entity: usize) -> Self {
        Self {
            entities: HashMap::new(),
            max_per_entity,
            keep_per_entity: keep_per_entity.min(max_per_entity),
        }
    }

    pub fn has_seen(&self, entity_key: &str, item_id: i64) -> bool {
        self.entities
            .get(entity_key)
            .is_some_and(|e| e.ids.contains(&item_id))
    }

    /// Record `item_id`. Returns false if it was already recorded.
    pub fn mark_seen(&mut self, entity_key: &str, item_id: i64) -> bool {
        let entry = self.entities.entry(entity_key.to_string()).or_default();
        if !entry.ids.insert(item_id) {
            return false;
        }
        entry.order.push_back(item_id);

        if entry.ids.len() > self.max_per_entity {
            while entry.order.len() > self.keep_per_entity {
                if let Some(oldest) = entry.order.pop_front() {
                    entry.ids.remove(&oldest);
                }
            }
        }
        true
    }

    pub fn len(&self, entity_key: &str) -> usize {
        self.entities.get(entity_key).map_or(0, |e| e.ids.len())
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.values().all(|e| e.ids.is_empty())
    }
}
