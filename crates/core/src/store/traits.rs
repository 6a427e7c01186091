/// An entity mirrored from a remote-owned collection.
///
/// Stores key entities by [`SyncedEntity::id`]; at most one entity per id is
/// held at any time.
pub trait SyncedEntity: Clone + Send + Sync + 'static {
    /// Partial update shallow-merged by [`SyncedEntity::apply_patch`].
    type Patch: Send + 'static;

    fn id(&self) -> &str;

    /// Owner or foreign reference used for secondary lookups.
    fn foreign_key(&self) -> Option<&str>;

    /// Whether `id` identifies this entity. Entities with secondary
    /// identifiers override this.
    fn matches(&self, id: &str) -> bool {
        self.id() == id
    }

    fn apply_patch(&mut self, patch: Self::Patch);
}
