//! Request field validation shared by the planner routes.

use crate::rest::error::ApiError;

/// Letter grades on the 4.5 scale, plus `P` for pass/fail courses.
pub const GRADE_LETTERS: &[&str] = &[
    "A+", "A0", "B+", "B0", "C+", "C0", "D+", "D0", "F", "P",
];

/// Grade points for GPA computation. `P` earns credits but no points and is
/// excluded from the divisor, so it maps to `None`.
pub fn grade_points(grade: &str) -> Option<f64> {
    match grade {
        "A+" => Some(4.5),
        "A0" => Some(4.0),
        "B+" => Some(3.5),
        "B0" => Some(3.0),
        "C+" => Some(2.5),
        "C0" => Some(2.0),
        "D+" => Some(1.5),
        "D0" => Some(1.0),
        "F" => Some(0.0),
        _ => None,
    }
}

pub fn non_empty(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn day_of_week(day: i64) -> Result<(), ApiError> {
    if !(0..=6).contains(&day) {
        return Err(ApiError::Invalid(format!(
            "day_of_week must be 0 (Monday) through 6 (Sunday), got {day}"
        )));
    }
    Ok(())
}

/// Parse `"HH:MM"` into minutes since midnight.
pub fn clock_minutes(value: &str, field: &str) -> Result<u32, ApiError> {
    let invalid = || ApiError::Invalid(format!("{field} must be \"HH:MM\", got {value:?}"));
    let (h, m) = value.split_once(':').ok_or_else(invalid)?;
    if h.len() != 2 || m.len() != 2 {
        return Err(invalid());
    }
    let h: u32 = h.parse().map_err(|_| invalid())?;
    let m: u32 = m.parse().map_err(|_| invalid())?;
    if h > 23 || m > 59 {
        return Err(invalid());
    }
    Ok(h * 60 + m)
}

/// Validate a schedule time range: both bounds well-formed, end after start.
pub fn time_range(starts_at: &str, ends_at: &str) -> Result<(), ApiError> {
    let start = clock_minutes(starts_at, "starts_at")?;
    let end = clock_minutes(ends_at, "ends_at")?;
    if end <= start {
        return Err(ApiError::Invalid(format!(
            "ends_at ({ends_at}) must be after starts_at ({starts_at})"
        )));
    }
    Ok(())
}

pub fn grade_letter(grade: &str) -> Result<(), ApiError> {
    if !GRADE_LETTERS.contains(&grade) {
        return Err(ApiError::Invalid(format!(
            "grade must be one of {GRADE_LETTERS:?}, got {grade:?}"
        )));
    }
    Ok(())
}

pub fn credits(credits: i64) -> Result<(), ApiError> {
    if !(1..=6).contains(&credits) {
        return Err(ApiError::Invalid(format!(
            "credits must be 1 through 6, got {credits}"
        )));
    }
    Ok(())
}

/// Semesters are `"YYYY-N"` with N in {1, 2}.
pub fn semester(value: &str) -> Result<(), ApiError> {
    let invalid = || {
        ApiError::Invalid(format!(
            "semester must be \"YYYY-1\" or \"YYYY-2\", got {value:?}"
        ))
    };
    let (year, term) = value.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || year.parse::<u16>().is_err() {
        return Err(invalid());
    }
    if term != "1" && term != "2" {
        return Err(invalid());
    }
    Ok(())
}

/// Dates are `"YYYY-MM-DD"`; chrono does the range checking.
pub fn date(value: &str, field: &str) -> Result<(), ApiError> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::Invalid(format!("{field} must be \"YYYY-MM-DD\", got {value:?}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_minutes_accepts_valid() {
        assert_eq!(clock_minutes("09:30", "t").unwrap(), 570);
        assert_eq!(clock_minutes("00:00", "t").unwrap(), 0);
        assert_eq!(clock_minutes("23:59", "t").unwrap(), 1439);
    }

    #[test]
    fn clock_minutes_rejects_garbage() {
        for bad in ["24:00", "9:30", "09:60", "0930", "", "ab:cd"] {
            assert!(clock_minutes(bad, "t").is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn time_range_requires_end_after_start() {
        assert!(time_range("09:00", "10:30").is_ok());
        assert!(time_range("10:30", "10:30").is_err());
        assert!(time_range("10:30", "09:00").is_err());
    }

    #[test]
    fn semester_format() {
        assert!(semester("2025-1").is_ok());
        assert!(semester("2025-2").is_ok());
        for bad in ["2025-3", "25-1", "2025", "2025-01"] {
            assert!(semester(bad).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn grade_points_scale() {
        assert_eq!(grade_points("A+"), Some(4.5));
        assert_eq!(grade_points("F"), Some(0.0));
        assert_eq!(grade_points("P"), None);
    }

    #[test]
    fn date_format() {
        assert!(date("2025-03-02", "d").is_ok());
        assert!(date("2025-02-30", "d").is_err());
        assert!(date("03/02/2025", "d").is_err());
    }
}
