diesel::table! {
    reminders (id) {
        id -> Integer,
        activity -> Text,
        scheduled_time -> Text,
        completed -> Bool,
    }
}
