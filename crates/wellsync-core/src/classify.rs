//! Keyword-based category classification and the managed-event marker.
//!
//! Classification is a pure function of an event's title and description.
//! Categories are tested in a fixed priority order and the first category
//! with a matching keyword wins, so the result is deterministic:
//!
//! | Priority | Category    | Keywords                                        |
//! |----------|-------------|-------------------------------------------------|
//! | 1        | `fitness`   | workout, gym, run, fitness, exercise            |
//! | 2        | `mental`    | meditation, therapy, mindfulness, mental        |
//! | 3        | `nutrition` | meal, lunch, dinner, breakfast, nutrition       |
//! | 4        | `medical`   | doctor, appointment, medical, checkup           |
//! | 5        | `work`      | work, meeting, conference, project              |
//! | -        | `personal`  | (fallback)                                      |
//!
//! Matching is a case-insensitive substring test, so "Brunch" matches the
//! `run` keyword.

use crate::event::Category;

/// Literal token embedded in descriptions of events this system authored.
///
/// The exact bytes are part of the on-calendar format and must not change.
pub const MANAGED_MARKER: &str = "[MANAGED]";

/// Keyword table in priority order.
const RULES: &[(Category, &[&str])] = &[
    (
        Category::Fitness,
        &["workout", "gym", "run", "fitness", "exercise"],
    ),
    (
        Category::Mental,
        &["meditation", "therapy", "mindfulness", "mental"],
    ),
    (
        Category::Nutrition,
        &["meal", "lunch", "dinner", "breakfast", "nutrition"],
    ),
    (
        Category::Medical,
        &["doctor", "appointment", "medical", "checkup"],
    ),
    (Category::Work, &["work", "meeting", "conference", "project"]),
];

/// Classifies an event from its title and optional description.
pub fn classify(title: &str, description: Option<&str>) -> Category {
    let haystack = match description {
        Some(desc) => format!("{} {}", title, desc),
        None => title.to_string(),
    }
    .to_lowercase();

    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Personal)
}

/// Returns true if the description carries the managed marker.
pub fn is_managed(description: Option<&str>) -> bool {
    description.is_some_and(|d| d.contains(MANAGED_MARKER))
}

/// Appends the managed marker suffix to a description.
///
/// The suffix is `"\n[MANAGED] - Created by <app_name>"`. A description that
/// already carries the marker is returned unchanged, so stamping the same
/// event on every update does not accumulate suffixes.
pub fn stamp_managed(description: Option<&str>, app_name: &str) -> String {
    let body = description.unwrap_or_default();
    if body.contains(MANAGED_MARKER) {
        return body.to_string();
    }
    format!("{}\n{} - Created by {}", body, MANAGED_MARKER, app_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitness_wins_over_work() {
        assert_eq!(classify("Gym meeting", None), Category::Fitness);
    }

    #[test]
    fn each_category_matches_its_keywords() {
        assert_eq!(classify("Morning Run", None), Category::Fitness);
        assert_eq!(classify("Guided meditation", None), Category::Mental);
        assert_eq!(classify("Team lunch", None), Category::Nutrition);
        assert_eq!(classify("Dentist", Some("annual checkup")), Category::Medical);
        assert_eq!(classify("Project sync", None), Category::Work);
        assert_eq!(classify("Call mom", None), Category::Personal);
    }

    #[test]
    fn priority_order_is_fixed() {
        // mental before nutrition
        assert_eq!(classify("Therapy over dinner", None), Category::Mental);
        // nutrition before medical
        assert_eq!(classify("Breakfast before doctor", None), Category::Nutrition);
        // medical before work
        assert_eq!(classify("Work medical form", None), Category::Medical);
    }

    #[test]
    fn matching_is_case_insensitive_and_includes_description() {
        assert_eq!(classify("Saturday", Some("WORKOUT with Sam")), Category::Fitness);
        assert_eq!(classify("EXERCISE", None), Category::Fitness);
    }

    #[test]
    fn substring_matches_count() {
        assert_eq!(classify("Sunday brunch", None), Category::Fitness);
    }

    #[test]
    fn managed_marker_detection() {
        assert!(is_managed(Some("notes\n[MANAGED] - Created by WellSync")));
        assert!(!is_managed(Some("managed by someone")));
        assert!(!is_managed(None));
    }

    #[test]
    fn stamp_appends_suffix_once() {
        let stamped = stamp_managed(Some("Leg day"), "WellSync");
        assert_eq!(stamped, "Leg day\n[MANAGED] - Created by WellSync");
        assert!(is_managed(Some(&stamped)));

        let again = stamp_managed(Some(&stamped), "WellSync");
        assert_eq!(again, stamped);
    }

    #[test]
    fn stamp_without_description() {
        assert_eq!(
            stamp_managed(None, "WellSync"),
            "\n[MANAGED] - Created by WellSync"
        );
    }
}
