//! Shared naming utilities.

/// Make a legal module name from a file name.
///
/// Letters, digits and underscores are kept, `.` becomes `_`, everything
/// else is dropped. Names that would be empty or not start with a letter get
/// a `file_` prefix, and `_` is appended while the name collides with one of
/// the `reserved` module names.
pub fn safe_module_name(file_name: &str, reserved: &[&str]) -> String {
    let mut name: String = file_name
        .chars()
        .filter_map(|c| match c {
            '.' => Some('_'),
            c if c.is_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .collect();

    if !name.chars().next().is_some_and(char::is_alphabetic) {
        name.insert_str(0, "file_");
    }

    while reserved.contains(&name.as_str()) {
        name.push('_');
    }

    name
}
