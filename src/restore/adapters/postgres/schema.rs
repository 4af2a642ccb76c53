//! Diesel schema for staged restores.

diesel::table! {
    /// Pending restores, at most one per pipeline and connector.
    staged_restores (id) {
        /// Staged restore identifier.
        id -> Uuid,
        /// Owning pipeline.
        pipeline_id -> Uuid,
        /// Connector being restored.
        connector_id -> Uuid,
        /// Registry name of the target version.
        #[max_length = 255]
        registry_name -> Varchar,
        /// `source` or `sink`.
        #[max_length = 16]
        connector_type -> Varchar,
        /// Version to restore.
        target_version -> Int4,
        /// Checksum of the target payload.
        #[max_length = 64]
        checksum -> Varchar,
        /// Target payload.
        staged_config -> Json,
        /// Flattened previous and current sides of the diff.
        diff -> Json,
        /// Staging timestamp.
        staged_at -> Timestamptz,
    }
}
