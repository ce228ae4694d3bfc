//! `PostgreSQL` repository implementation for tagging storage.

use super::{
    models::{AssociationRow, NewAssociationRow, NewTagRow, TagRow},
    schema::{application_tags, tags},
};
use crate::pipeline::domain::ApplicationId;
use crate::tagging::{
    domain::{
        AppliedTag, AssociationId, PersistedAssociationData, PersistedTagData, Tag,
        TagAssociation, TagColor, TagId, TagLabel,
    },
    ports::{TagRepository, TagRepositoryError, TagRepositoryResult},
};
use crate::tenant::{CompanyId, UserId};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use std::collections::HashMap;

/// `PostgreSQL` connection pool type used by tagging adapters.
pub type TagPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed tag repository.
#[derive(Debug, Clone)]
pub struct PostgresTagRepository {
    pool: TagPgPool,
}

impl PostgresTagRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TagPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TagRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TagRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TagRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TagRepositoryError::persistence)?
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn create_tag(&self, tag: &Tag) -> TagRepositoryResult<()> {
        let company = tag.company_id();
        let label = tag.label().clone();
        let new_row = tag_to_new_row(tag);

        self.run_blocking(move |connection| {
            diesel::insert_into(tags::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_label_unique_violation(info.as_ref()) =>
                    {
                        TagRepositoryError::DuplicateLabel {
                            company,
                            label: label.clone(),
                        }
                    }
                    _ => TagRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_tag(&self, tag: &Tag) -> TagRepositoryResult<()> {
        let tag_id = tag.id();
        let company = tag.company_id();
        let label = tag.label().clone();
        let color = tag.color().as_str().to_owned();
        let text_color = tag.text_color().as_str().to_owned();
        let updated_at = tag.updated_at();

        self.run_blocking(move |connection| {
            let updated = diesel::update(tags::table.filter(tags::id.eq(tag_id.into_inner())))
                .set((
                    tags::label.eq(label.as_str().to_owned()),
                    tags::color.eq(color),
                    tags::text_color.eq(text_color),
                    tags::updated_at.eq(updated_at),
                ))
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_label_unique_violation(info.as_ref()) =>
                    {
                        TagRepositoryError::DuplicateLabel {
                            company,
                            label: label.clone(),
                        }
                    }
                    _ => TagRepositoryError::persistence(err),
                })?;
            if updated == 0 {
                return Err(TagRepositoryError::UnknownTag(tag_id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_tag(&self, company: CompanyId, tag: TagId) -> TagRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            // Associations cascade at the schema level; deleting the tag
            // row is sufficient.
            let deleted = diesel::delete(
                tags::table
                    .filter(tags::id.eq(tag.into_inner()))
                    .filter(tags::company_id.eq(company.into_inner())),
            )
            .execute(connection)
            .map_err(TagRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn find_tag(
        &self,
        company: CompanyId,
        tag: TagId,
    ) -> TagRepositoryResult<Option<Tag>> {
        self.run_blocking(move |connection| {
            let row = tags::table
                .filter(tags::id.eq(tag.into_inner()))
                .filter(tags::company_id.eq(company.into_inner()))
                .select(TagRow::as_select())
                .first::<TagRow>(connection)
                .optional()
                .map_err(TagRepositoryError::persistence)?;
            row.map(row_to_tag).transpose()
        })
        .await
    }

    async fn list_tags(&self, company: CompanyId) -> TagRepositoryResult<Vec<Tag>> {
        self.run_blocking(move |connection| {
            let rows = tags::table
                .filter(tags::company_id.eq(company.into_inner()))
                .order(tags::label.asc())
                .select(TagRow::as_select())
                .load::<TagRow>(connection)
                .map_err(TagRepositoryError::persistence)?;
            rows.into_iter().map(row_to_tag).collect()
        })
        .await
    }

    async fn attach(
        &self,
        association: &TagAssociation,
    ) -> TagRepositoryResult<TagAssociation> {
        let new_row = association_to_new_row(association);
        let application = association.application_id();
        let tag = association.tag_id();
        let stored = association.clone();

        self.run_blocking(move |connection| {
            let inserted = diesel::insert_into(application_tags::table)
                .values(&new_row)
                .execute(connection);
            match inserted {
                Ok(_) => Ok(stored),
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    // The pair already exists; surface the surviving row so
                    // a duplicate-add race resolves without a visible error.
                    find_association(connection, application, tag)?
                        .ok_or_else(|| TagRepositoryError::UnknownTag(tag))
                }
                Err(err) => Err(TagRepositoryError::persistence(err)),
            }
        })
        .await
    }

    async fn detach(
        &self,
        application: ApplicationId,
        tag: TagId,
    ) -> TagRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                application_tags::table
                    .filter(application_tags::application_id.eq(application.into_inner()))
                    .filter(application_tags::tag_id.eq(tag.into_inner())),
            )
            .execute(connection)
            .map_err(TagRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_for_application(
        &self,
        application: ApplicationId,
    ) -> TagRepositoryResult<Vec<AppliedTag>> {
        self.run_blocking(move |connection| {
            let rows = application_tags::table
                .filter(application_tags::application_id.eq(application.into_inner()))
                .order(application_tags::created_at.desc())
                .select(AssociationRow::as_select())
                .load::<AssociationRow>(connection)
                .map_err(TagRepositoryError::persistence)?;

            let tag_ids: Vec<uuid::Uuid> = rows.iter().map(|row| row.tag_id).collect();
            let tag_rows = tags::table
                .filter(tags::id.eq_any(tag_ids))
                .select(TagRow::as_select())
                .load::<TagRow>(connection)
                .map_err(TagRepositoryError::persistence)?;
            let catalog: HashMap<TagId, Tag> = tag_rows
                .into_iter()
                .map(|row| row_to_tag(row).map(|tag| (tag.id(), tag)))
                .collect::<TagRepositoryResult<_>>()?;

            Ok(rows
                .into_iter()
                .filter_map(|row| {
                    let association = row_to_association(row);
                    catalog
                        .get(&association.tag_id())
                        .map(|tag| AppliedTag::new(association, tag))
                })
                .collect())
        })
        .await
    }

    async fn associations_for_tag(
        &self,
        tag: TagId,
    ) -> TagRepositoryResult<Vec<TagAssociation>> {
        self.run_blocking(move |connection| {
            let rows = application_tags::table
                .filter(application_tags::tag_id.eq(tag.into_inner()))
                .order(application_tags::created_at.desc())
                .select(AssociationRow::as_select())
                .load::<AssociationRow>(connection)
                .map_err(TagRepositoryError::persistence)?;
            Ok(rows.into_iter().map(row_to_association).collect())
        })
        .await
    }
}

fn is_label_unique_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == "tags_company_id_label_key")
}

fn find_association(
    connection: &mut PgConnection,
    application: ApplicationId,
    tag: TagId,
) -> TagRepositoryResult<Option<TagAssociation>> {
    let row = application_tags::table
        .filter(application_tags::application_id.eq(application.into_inner()))
        .filter(application_tags::tag_id.eq(tag.into_inner()))
        .select(AssociationRow::as_select())
        .first::<AssociationRow>(connection)
        .optional()
        .map_err(TagRepositoryError::persistence)?;
    Ok(row.map(row_to_association))
}

fn tag_to_new_row(tag: &Tag) -> NewTagRow {
    NewTagRow {
        id: tag.id().into_inner(),
        company_id: tag.company_id().into_inner(),
        label: tag.label().as_str().to_owned(),
        color: tag.color().as_str().to_owned(),
        text_color: tag.text_color().as_str().to_owned(),
        created_at: tag.created_at(),
        updated_at: tag.updated_at(),
    }
}

fn row_to_tag(row: TagRow) -> TagRepositoryResult<Tag> {
    let label = TagLabel::new(row.label).map_err(TagRepositoryError::persistence)?;
    let color = TagColor::new(row.color).map_err(TagRepositoryError::persistence)?;
    let text_color = TagColor::new(row.text_color).map_err(TagRepositoryError::persistence)?;
    Ok(Tag::from_persisted(PersistedTagData {
        id: TagId::from_uuid(row.id),
        company_id: CompanyId::from_uuid(row.company_id),
        label,
        color,
        text_color,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn association_to_new_row(association: &TagAssociation) -> NewAssociationRow {
    NewAssociationRow {
        id: association.id().into_inner(),
        application_id: association.application_id().into_inner(),
        tag_id: association.tag_id().into_inner(),
        added_by_user_id: association.added_by().into_inner(),
        created_at: association.created_at(),
    }
}

fn row_to_association(row: AssociationRow) -> TagAssociation {
    TagAssociation::from_persisted(PersistedAssociationData {
        id: AssociationId::from_uuid(row.id),
        application_id: ApplicationId::from_uuid(row.application_id),
        tag_id: TagId::from_uuid(row.tag_id),
        added_by: UserId::from_uuid(row.added_by_user_id),
        created_at: row.created_at,
    })
}
