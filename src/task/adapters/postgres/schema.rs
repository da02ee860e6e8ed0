//! Diesel schema for task persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task title.
        title -> Text,
        /// Free-form description.
        description -> Text,
        /// Priority label.
        #[max_length = 20]
        priority -> Varchar,
        /// Status label.
        #[max_length = 20]
        status -> Varchar,
        /// Optional due date.
        due_date -> Nullable<Timestamptz>,
        /// Creating administrator.
        created_by -> Uuid,
        /// Ordered assignment set.
        assigned_to -> Array<Uuid>,
        /// Attachment links as a JSON array of strings.
        attachments -> Jsonb,
        /// Checklist as a JSON array of `{text, completed}` objects.
        todo_checklist -> Jsonb,
        /// Derived completion percentage.
        progress -> Int2,
        /// Remarks as a JSON array.
        remarks -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Write counter checked by conditional updates.
        revision -> Int8,
    }
}
