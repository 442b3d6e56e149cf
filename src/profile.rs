//! Resolved per-type field metadata and the process-wide profile cache.

use crate::error::BencodeError;
use crate::record::{parse_tag, FieldDef, Record};
use dashmap::DashMap;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// One serializable field of a record type, resolved from its declaration
/// and tag.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// External dictionary key.
    pub name: &'static str,
    /// Skip this field on encode when its value is zero.
    pub omit_empty: bool,
    /// Declared field name, used to address the field through
    /// [`Record`].
    pub slot: &'static str,
}

/// The resolved field set of one record type.
///
/// Built once per type on first use, cached for the process lifetime, and
/// immutable afterwards.
#[derive(Debug)]
pub struct TypeProfile {
    by_name: HashMap<&'static str, usize>,
    ordered: Vec<FieldDescriptor>,
}

impl TypeProfile {
    /// Resolves a declared field table into a profile.
    ///
    /// Fields tagged `"-"` are dropped. Fails with
    /// [`BencodeError::DuplicateFieldName`] when two fields map to the same
    /// external name.
    pub fn resolve(fields: &'static [FieldDef]) -> Result<Self, BencodeError> {
        let mut ordered = Vec::with_capacity(fields.len());
        for field in fields {
            if field.tag == "-" {
                continue;
            }
            let (alias, option) = parse_tag(field.tag);
            let name = if alias.is_empty() { field.name } else { alias };
            ordered.push(FieldDescriptor {
                name,
                omit_empty: option == "omitempty",
                slot: field.name,
            });
        }
        ordered.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        let mut by_name = HashMap::with_capacity(ordered.len());
        for (index, field) in ordered.iter().enumerate() {
            if by_name.insert(field.name, index).is_some() {
                return Err(BencodeError::DuplicateFieldName(field.name));
            }
        }
        Ok(TypeProfile { by_name, ordered })
    }

    /// Descriptors in canonical (byte-lexicographic) key order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.ordered
    }

    /// Looks up a descriptor by its external name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&index| &self.ordered[index])
    }
}

/// Process-wide memo from record type to its [`TypeProfile`].
///
/// Read-mostly after warm-up: the first use of a type resolves its profile,
/// every later call returns the cached [`Arc`]. Concurrent first calls for
/// the same type may both resolve it; the results are structurally
/// identical and one insert wins, so the race is benign. Entries are never
/// evicted.
///
/// [`marshal`](crate::marshal) and [`unmarshal`](crate::unmarshal) go
/// through a process-global instance; tests that want isolation can
/// construct their own.
#[derive(Debug, Default)]
pub struct ProfileCache {
    profiles: DashMap<TypeId, Arc<TypeProfile>>,
}

impl ProfileCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        ProfileCache {
            profiles: DashMap::new(),
        }
    }

    /// Returns the profile for `T`, resolving and caching it on first use.
    pub fn profile_for<T: Record>(&self) -> Result<Arc<TypeProfile>, BencodeError> {
        let id = TypeId::of::<T>();
        if let Some(profile) = self.profiles.get(&id) {
            return Ok(Arc::clone(&profile));
        }
        let profile = Arc::new(TypeProfile::resolve(T::FIELDS)?);
        tracing::trace!(
            "resolved profile for {} ({} fields)",
            std::any::type_name::<T>(),
            profile.fields().len()
        );
        let entry = self.profiles.entry(id).or_insert(profile);
        Ok(Arc::clone(entry.value()))
    }
}

static GLOBAL: LazyLock<ProfileCache> = LazyLock::new(ProfileCache::new);

/// The cache behind [`marshal`](crate::marshal) and
/// [`unmarshal`](crate::unmarshal).
pub(crate) fn global() -> &'static ProfileCache {
    &GLOBAL
}
