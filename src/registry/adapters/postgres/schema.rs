//! Diesel schema for configuration history and deployment state.

diesel::table! {
    /// Registry entries, one per connector configuration history.
    connector_registries (name) {
        /// Registry name.
        #[max_length = 255]
        name -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Immutable configuration versions.
    connector_config_versions (registry_name, version) {
        /// Owning registry name.
        #[max_length = 255]
        registry_name -> Varchar,
        /// Version number, gapless per registry.
        version -> Int4,
        /// Configuration payload. Stored as `json` so the text round-trips
        /// unchanged and still matches `checksum`.
        config -> Json,
        /// SHA-256 checksum of the canonical payload.
        #[max_length = 64]
        checksum -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Mutable per-connector deployment bookkeeping.
    connector_deployment_states (connector_id) {
        /// Connector identifier.
        connector_id -> Uuid,
        /// Registry name the connector tracks.
        #[max_length = 255]
        registry_name -> Varchar,
        /// Version last applied to the deployment target.
        last_deployed_version -> Nullable<Int4>,
        /// Pinned active registry version.
        registry_version -> Nullable<Int4>,
        /// Last-known runtime configuration.
        last_known_config -> Nullable<Json>,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(connector_registries, connector_config_versions);
