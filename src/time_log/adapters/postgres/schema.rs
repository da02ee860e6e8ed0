//! Diesel schema for time-log persistence.

diesel::table! {
    /// Time-log records.
    time_logs (id) {
        /// Time-log identifier.
        id -> Uuid,
        /// Task the time was logged against.
        task_id -> Uuid,
        /// Owner of the session.
        user_id -> Uuid,
        /// Session start.
        start_time -> Timestamptz,
        /// Session end, null while running.
        end_time -> Nullable<Timestamptz>,
        /// Elapsed milliseconds, null while running.
        duration_ms -> Nullable<Int8>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
