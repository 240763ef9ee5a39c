diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Text,
        first_name -> Nullable<Varchar>,
        last_name -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    leads (id) {
        id -> Uuid,
        owner_id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        phone -> Varchar,
        company -> Nullable<Varchar>,
        stage -> Varchar,
        status -> Varchar,
        source -> Nullable<Varchar>,
        value -> Numeric,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    lead_notes (id) {
        id -> Uuid,
        lead_id -> Uuid,
        body -> Text,
        created_by -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    lead_activities (id) {
        id -> Uuid,
        lead_id -> Uuid,
        activity_type -> Varchar,
        subject -> Nullable<Varchar>,
        created_by -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    deals (id) {
        id -> Uuid,
        owner_id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        client -> Nullable<Varchar>,
        stage -> Varchar,
        status -> Varchar,
        amount -> Numeric,
        due_date -> Nullable<Date>,
        assignee_initials -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    deal_comments (id) {
        id -> Uuid,
        deal_id -> Uuid,
        text -> Text,
        created_by -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    deal_attachments (id) {
        id -> Uuid,
        deal_id -> Uuid,
        file_name -> Varchar,
        file_size -> Int8,
        uploaded_by -> Uuid,
        uploaded_at -> Timestamptz,
    }
}

diesel::table! {
    tasks (id) {
        id -> Uuid,
        owner_id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        client -> Varchar,
        priority -> Varchar,
        stage -> Varchar,
        due_date -> Nullable<Date>,
        is_overdue -> Bool,
        assignee_id -> Nullable<Uuid>,
        created_by -> Uuid,
        related_kind -> Nullable<Varchar>,
        related_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    task_comments (id) {
        id -> Uuid,
        task_id -> Uuid,
        text -> Text,
        author_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    task_attachments (id) {
        id -> Uuid,
        task_id -> Uuid,
        file_name -> Varchar,
        file_size -> Int8,
        uploaded_by -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    calendar_events (id) {
        id -> Uuid,
        owner_id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        event_type -> Varchar,
        event_date -> Date,
        start_time -> Time,
        end_time -> Time,
        location -> Nullable<Varchar>,
        attendees -> Nullable<Text>,
        reminder_set -> Bool,
        reminder_minutes_before -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    event_attendees (id) {
        id -> Uuid,
        event_id -> Uuid,
        email -> Varchar,
        name -> Nullable<Varchar>,
        status -> Varchar,
        responded_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    event_reminders (id) {
        id -> Uuid,
        event_id -> Uuid,
        reminder_time -> Timestamptz,
        is_sent -> Bool,
        sent_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    dashboard_metrics (id) {
        id -> Uuid,
        owner_id -> Uuid,
        total_leads -> Int4,
        new_leads_this_month -> Int4,
        active_deals -> Int4,
        deals_in_progress -> Int4,
        won_deals_total -> Int4,
        lost_deals_total -> Int4,
        total_deal_value -> Numeric,
        customer_satisfaction_rate -> Float8,
        last_calculated -> Timestamptz,
    }
}

diesel::table! {
    dashboard_activities (id) {
        id -> Uuid,
        owner_id -> Uuid,
        activity_type -> Varchar,
        title -> Varchar,
        description -> Nullable<Text>,
        action -> Nullable<Varchar>,
        lead_id -> Nullable<Uuid>,
        deal_id -> Nullable<Uuid>,
        task_id -> Nullable<Uuid>,
        old_value -> Nullable<Text>,
        new_value -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ai_suggestions (id) {
        id -> Uuid,
        owner_id -> Uuid,
        suggestion_type -> Varchar,
        priority -> Varchar,
        title -> Varchar,
        description -> Text,
        confidence_score -> Float8,
        metric_value -> Nullable<Varchar>,
        metric_change -> Nullable<Varchar>,
        is_actioned -> Bool,
        actioned_at -> Nullable<Timestamptz>,
        action_notes -> Nullable<Text>,
        created_at -> Timestamptz,
        expires_at -> Timestamptz,
    }
}

diesel::table! {
    audit_log (id) {
        id -> Uuid,
        actor_id -> Nullable<Uuid>,
        entity_kind -> Varchar,
        entity_id -> Uuid,
        action -> Varchar,
        detail -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(leads -> users (owner_id));
diesel::joinable!(lead_notes -> leads (lead_id));
diesel::joinable!(lead_activities -> leads (lead_id));
diesel::joinable!(deals -> users (owner_id));
diesel::joinable!(deal_comments -> deals (deal_id));
diesel::joinable!(deal_attachments -> deals (deal_id));
diesel::joinable!(task_comments -> tasks (task_id));
diesel::joinable!(task_attachments -> tasks (task_id));
diesel::joinable!(calendar_events -> users (owner_id));
diesel::joinable!(event_attendees -> calendar_events (event_id));
diesel::joinable!(event_reminders -> calendar_events (event_id));
diesel::joinable!(dashboard_metrics -> users (owner_id));
diesel::joinable!(dashboard_activities -> users (owner_id));
diesel::joinable!(ai_suggestions -> users (owner_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    leads,
    lead_notes,
    lead_activities,
    deals,
    deal_comments,
    deal_attachments,
    tasks,
    task_comments,
    task_attachments,
    calendar_events,
    event_attendees,
    event_reminders,
    dashboard_metrics,
    dashboard_activities,
    ai_suggestions,
    audit_log,
);
