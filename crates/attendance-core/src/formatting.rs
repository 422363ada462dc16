use crate::session::Session;

/// Format an attendance percentage with exactly one decimal place.
///
/// # Examples
///
/// ```
/// use attendance_core::formatting::format_percentage;
///
/// assert_eq!(format_percentage(50.0), "50.0");
/// assert_eq!(format_percentage(200.0 / 3.0), "66.7");
/// assert_eq!(format_percentage(0.0), "0.0");
/// ```
pub fn format_percentage(value: f64) -> String {
    if !value.is_finite() {
        return "0.0".to_string();
    }
    format!("{:.1}", value)
}

/// Join session labels for the `AbsentList` report column.
///
/// # Examples
///
/// ```
/// use attendance_core::formatting::format_session_list;
/// use attendance_core::session::Session;
///
/// let sessions = [
///     Session::parse("240331-14-2").unwrap(),
///     Session::parse("240401-09-1").unwrap(),
/// ];
/// assert_eq!(format_session_list(&sessions), "240331-14-2, 240401-09-1");
/// assert_eq!(format_session_list(&[]), "");
/// ```
pub fn format_session_list(sessions: &[Session]) -> String {
    sessions
        .iter()
        .map(Session::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// English ordinal for a letter tier (`1st`, `2nd`, `3rd`, `4th`, ...).
pub fn ordinal(n: u8) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// Make a student name usable as a single path component.
///
/// Names occasionally carry `A/L` or `A/P` patronymics, which would otherwise
/// split the path.
pub fn path_safe_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percentage_rounds_to_one_decimal() {
        assert_eq!(format_percentage(33.333), "33.3");
        assert_eq!(format_percentage(87.56), "87.6");
        assert_eq!(format_percentage(100.0), "100.0");
    }

    #[test]
    fn test_format_percentage_non_finite_is_zero() {
        assert_eq!(format_percentage(f64::NAN), "0.0");
        assert_eq!(format_percentage(f64::INFINITY), "0.0");
    }

    #[test]
    fn test_format_session_list_keeps_order() {
        let sessions = [
            Session::parse("240401-09-1").unwrap(),
            Session::parse("240331-14-2").unwrap(),
        ];
        assert_eq!(format_session_list(&sessions), "240401-09-1, 240331-14-2");
    }

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(22), "22nd");
    }

    #[test]
    fn test_path_safe_name() {
        assert_eq!(path_safe_name("MUTHU A/L RAMAN"), "MUTHU A_L RAMAN");
        assert_eq!(path_safe_name("ALI BIN ABU"), "ALI BIN ABU");
    }
}
