//! Letter grade scale.

/// Value of an unrecognised grade. Lower than any real grade, so it fails
/// every minimum-grade comparison.
pub const UNKNOWN_GRADE: i32 = -100;

/// Convert a school-style letter grade to a 0-100 value.
///
/// Matching is exact: the feed reports upper-case grades and configured
/// minimums are normalised with [`normalize_grade`] before comparison.
pub fn grade_value(grade: &str) -> i32 {
    match grade {
        "A+" => 100,
        "A" => 95,
        "A-" => 90,
        "B+" => 89,
        "B" => 85,
        "B-" => 80,
        "C+" => 79,
        "C" => 75,
        "C-" => 70,
        "D+" => 69,
        "D" => 65,
        "D-" => 60,
        "F" => 50,
        _ => UNKNOWN_GRADE,
    }
}

/// Trim and upper-case a configured grade (`" b+ "` → `"B+"`).
pub fn normalize_grade(grade: &str) -> String {
    grade.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERED: [&str; 13] = [
        "A+", "A", "A-", "B+", "B", "B-", "C+", "C", "C-", "D+", "D", "D-", "F",
    ];

    #[test]
    fn test_scale_is_monotonic() {
        for pair in ORDERED.windows(2) {
            assert!(
                grade_value(pair[0]) >= grade_value(pair[1]),
                "{} should not rank below {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_unknown_grades_rank_below_f() {
        for grade in ["", "E", "a+", "A++", "unknown"] {
            assert_eq!(grade_value(grade), UNKNOWN_GRADE);
            assert!(grade_value(grade) < grade_value("F"));
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(grade_value(&normalize_grade(" b+ ")), 89);
    }
}
