/// Display label of a sort field. Unknown fields are shown as-is.
pub fn field_label(field: &str) -> String {
    match field {
        "user_updated_time" => "Updated date",
        "user_created_time" => "Created date",
        "title" => "Title",
        "order" => "Custom order",
        other => other,
    }
    .to_string()
}

/// Toolbar icon for the sort field button; unknown fields borrow the title icon.
pub fn field_icon(field: &str) -> String {
    let icon = match field {
        "user_updated_time" => "fas fa-calendar-alt",
        "user_created_time" => "fas fa-calendar-plus",
        "order" => "far fa-hand-point-up",
        _ => "fas fa-heading",
    };
    format!("{icon} {field}")
}

pub fn reverse_icon(reverse: bool) -> &'static str {
    if reverse {
        "fas fa-long-arrow-alt-up"
    } else {
        "fas fa-long-arrow-alt-down"
    }
}
