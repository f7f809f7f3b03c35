use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, PrimaryKeyTrait};
use std::marker::PhantomData;
use uuid::Uuid;

/// Shared plumbing for SeaORM repositories keyed by a UUID primary key.
///
/// Domain repositories embed this and add their own queries on top of [`db`](Self::db).
#[derive(Debug)]
pub struct BaseRepository<E: EntityTrait> {
    db: DatabaseConnection,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> Clone for BaseRepository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> BaseRepository<E>
where
    E: EntityTrait,
    Uuid: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    E::Model: Sync,
{
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, DbErr> {
        Ok(E::find_by_id(id).count(&self.db).await? > 0)
    }
}
