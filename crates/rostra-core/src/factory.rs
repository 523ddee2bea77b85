//! Entity factories
//!
//! Each protocol supplies a factory producing empty entities of its own type.

use core::marker::PhantomData;

use crate::entity::UserEntity;

/// Produces empty, protocol-specific entities
///
/// An "empty" entity is fully valid: missing data is expressed as default
/// field values, never as a missing entity.
pub trait EntityFactory<E: UserEntity> {
    /// Construct a new empty entity
    fn new_user(&self) -> E;

    /// Construct a new empty entity carrying the given id
    fn new_user_with_id(&self, id: &str) -> E {
        let mut user = self.new_user();
        user.set_id(id.to_string());
        user
    }
}

impl<E, F> EntityFactory<E> for F
where
    E: UserEntity,
    F: Fn() -> E,
{
    fn new_user(&self) -> E {
        self()
    }
}

/// Factory for entities whose `Default` value is the empty entity
pub struct DefaultFactory<E> {
    _entity: PhantomData<fn() -> E>,
}

impl<E> DefaultFactory<E> {
    pub fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }
}

impl<E> Default for DefaultFactory<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: UserEntity + Default> EntityFactory<E> for DefaultFactory<E> {
    fn new_user(&self) -> E {
        E::default()
    }
}
