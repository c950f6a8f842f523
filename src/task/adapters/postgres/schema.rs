//! Diesel schema for task lifecycle persistence.

diesel::table! {
    /// Task records with hierarchy and scheduling columns.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task title.
        #[max_length = 500]
        title -> Varchar,
        /// Optional free-text description.
        description -> Nullable<Text>,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Priority band.
        #[max_length = 50]
        priority -> Varchar,
        /// Owning team identifier.
        team_id -> Uuid,
        /// Optional parent task for subtasks.
        parent_task_id -> Nullable<Uuid>,
        /// Creating user identifier.
        creator_id -> Uuid,
        /// Optional assignee identifier.
        assignee_id -> Nullable<Uuid>,
        /// Optional scheduled start.
        start_time -> Nullable<Timestamptz>,
        /// Optional due date.
        due_time -> Nullable<Timestamptz>,
        /// Completion timestamp, stamped on transition into completed.
        completed_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Follower associations between tasks and users.
    task_followers (task_id, user_id) {
        /// Followed task identifier.
        task_id -> Uuid,
        /// Following user identifier.
        user_id -> Uuid,
        /// When the user started following.
        followed_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit log of task activity.
    task_history (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Owning task identifier.
        task_id -> Uuid,
        /// Acting user identifier.
        user_id -> Uuid,
        /// Action kind.
        #[max_length = 50]
        action -> Varchar,
        /// Optional structured diff payload.
        changes -> Nullable<Jsonb>,
        /// Optional comment text.
        comment -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(task_followers -> tasks (task_id));
diesel::joinable!(task_history -> tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(tasks, task_followers, task_history);
