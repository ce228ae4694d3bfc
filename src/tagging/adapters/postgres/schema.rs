//! Diesel schema for tagging persistence.

diesel::table! {
    /// Company-scoped tag catalog; `(company_id, label)` is unique.
    tags (id) {
        /// Tag identifier.
        id -> Uuid,
        /// Owning company.
        company_id -> Uuid,
        /// Display label, unique within the company.
        #[max_length = 100]
        label -> Varchar,
        /// Badge background colour as `#RRGGBB`.
        #[max_length = 7]
        color -> Varchar,
        /// Badge text colour as `#RRGGBB`.
        #[max_length = 7]
        text_color -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tag-to-application associations; `(application_id, tag_id)` is
    /// unique and both foreign keys cascade on delete.
    application_tags (id) {
        /// Association identifier.
        id -> Uuid,
        /// Tagged application.
        application_id -> Uuid,
        /// Attached tag.
        tag_id -> Uuid,
        /// User who attached the tag.
        added_by_user_id -> Uuid,
        /// Attachment timestamp.
        created_at -> Timestamptz,
    }
}
