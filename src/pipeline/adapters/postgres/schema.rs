//! Diesel schema for pipeline persistence.

diesel::table! {
    /// Job postings carried for tenancy checks and stage ownership.
    jobs (id) {
        /// Job identifier.
        id -> Uuid,
        /// Owning company.
        company_id -> Uuid,
        /// Publication status.
        #[max_length = 50]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ordered hiring stages of a job.
    job_stages (id) {
        /// Stage identifier.
        id -> Uuid,
        /// Owning job.
        job_id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Pipeline position, unique within a job.
        order_index -> Int4,
        /// Whether the stage accepts new placements.
        is_active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Candidate applications with the live stage pointer.
    applications (id) {
        /// Application identifier.
        id -> Uuid,
        /// Job the candidate applied to.
        job_id -> Uuid,
        /// Owning company, denormalised from the job.
        company_id -> Uuid,
        /// Candidate first name.
        #[max_length = 255]
        first_name -> Varchar,
        /// Candidate last name.
        #[max_length = 255]
        last_name -> Nullable<Varchar>,
        /// Candidate contact email.
        #[max_length = 255]
        email -> Varchar,
        /// Current board position; null until first placement.
        current_stage_id -> Nullable<Uuid>,
        /// Resume-screening score from the external evaluator.
        ai_score -> Nullable<Float8>,
        /// Aggregate evaluation score from the external evaluator.
        overall_score -> Nullable<Float8>,
        /// Provider-specific evaluation breakdown.
        evaluation_details -> Nullable<Jsonb>,
        /// Submission timestamp.
        submitted_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only ledger of stage transitions.
    application_stage_history (id) {
        /// Ledger row identifier.
        id -> Uuid,
        /// Application the row belongs to.
        application_id -> Uuid,
        /// Owning job, denormalised.
        job_id -> Uuid,
        /// Owning company, denormalised.
        company_id -> Uuid,
        /// Origin stage; null for the first placement.
        from_stage_id -> Nullable<Uuid>,
        /// Destination stage.
        to_stage_id -> Uuid,
        /// Acting user.
        changed_by -> Uuid,
        /// Optional free-form note.
        notes -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
