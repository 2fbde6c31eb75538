use crate::model::GradeEntry;

struct SectionGrade {
    percentage: f64,
    weight: Option<f64>,
}

/// Overall grade in percent, rounded to 2 decimals.
///
/// Sections are averaged by weight when at least one of them has a weight, otherwise
/// every point counts the same.
#[tracing::instrument(skip(entries), fields(entries = entries.len()))]
pub fn calculate_overall_grade(entries: &[GradeEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }

    let section_grades: Vec<SectionGrade> = sections(entries)
        .into_iter()
        .filter_map(|section| {
            let rows: Vec<&GradeEntry> = entries.iter().filter(|e| e.section == section).collect();
            let achieved: f64 = rows.iter().map(|e| e.achieved).sum();
            let total: f64 = rows.iter().map(|e| e.total).sum();

            (total > 0.0).then(|| SectionGrade {
                percentage: achieved / total * 100.0,
                weight: rows.iter().find_map(|e| e.weight),
            })
        })
        .collect();

    let (weighted_sum, total_weight) = section_grades
        .iter()
        .filter_map(|grade| grade.weight.map(|weight| (grade.percentage, weight)))
        .fold((0.0, 0.0), |(sum, total), (percentage, weight)| {
            (sum + percentage * (weight / 100.0), total + weight)
        });

    if total_weight > 0.0 {
        return round2(weighted_sum * (100.0 / total_weight));
    }

    let achieved: f64 = entries.iter().map(|e| e.achieved).sum();
    let possible: f64 = entries.iter().map(|e| e.total).sum();
    if possible > 0.0 {
        round2(achieved / possible * 100.0)
    } else {
        0.0
    }
}

/// Grade as displayed to the user, `87.50%`
pub fn format_percentage(grade: f64) -> String {
    format!("{:.2}%", grade)
}

/// Distinct sections, in order of first appearance
fn sections(entries: &[GradeEntry]) -> Vec<&str> {
    let mut sections: Vec<&str> = Vec::new();
    for entry in entries {
        if !sections.contains(&entry.section.as_str()) {
            sections.push(&entry.section);
        }
    }
    sections
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(section: &str, achieved: f64, total: f64, weight: Option<f64>) -> GradeEntry {
        GradeEntry {
            section: section.to_owned(),
            item: String::from("item"),
            achieved,
            total,
            weight,
        }
    }

    #[test]
    fn no_entries_means_zero() {
        assert_eq!(calculate_overall_grade(&[]), 0.0);
    }

    #[test]
    fn single_section_is_a_plain_ratio() {
        let entries = vec![
            GradeEntry::new("Quiz", 8.0, 10.0),
            GradeEntry::new("Homework", 45.0, 50.0),
        ];

        // 53 / 60
        assert_eq!(calculate_overall_grade(&entries), 88.33);
    }

    #[test]
    fn sections_are_weighted() {
        let entries = vec![
            entry("Exams", 50.0, 100.0, Some(60.0)),
            entry("Labs", 10.0, 10.0, Some(40.0)),
        ];

        // 50% * 0.6 + 100% * 0.4
        assert_eq!(calculate_overall_grade(&entries), 70.0);
    }

    #[test]
    fn weights_are_normalised_when_they_do_not_add_up_to_100() {
        let entries = vec![
            entry("Exams", 50.0, 100.0, Some(30.0)),
            entry("Labs", 10.0, 10.0, Some(20.0)),
        ];

        assert_eq!(calculate_overall_grade(&entries), 70.0);
    }

    #[test]
    fn unweighted_sections_are_ignored_when_others_have_weights() {
        let entries = vec![
            entry("Exams", 50.0, 100.0, Some(100.0)),
            entry("Bonus", 0.0, 10.0, None),
        ];

        assert_eq!(calculate_overall_grade(&entries), 50.0);
    }

    #[test]
    fn section_weight_comes_from_its_first_weighted_entry() {
        let entries = vec![
            entry("Exams", 40.0, 50.0, None),
            entry("Exams", 10.0, 50.0, Some(50.0)),
            entry("Labs", 5.0, 10.0, Some(50.0)),
        ];

        assert_eq!(calculate_overall_grade(&entries), 50.0);
    }

    #[test]
    fn without_any_weight_every_point_counts_the_same() {
        let entries = vec![
            entry("Exams", 50.0, 100.0, None),
            entry("Labs", 10.0, 10.0, None),
        ];

        // 60 / 110
        assert_eq!(calculate_overall_grade(&entries), 54.55);
    }

    #[test]
    fn sections_without_points_are_skipped() {
        let entries = vec![
            entry("Exams", 45.0, 50.0, Some(50.0)),
            entry("Extra", 3.0, 0.0, Some(50.0)),
        ];

        assert_eq!(calculate_overall_grade(&entries), 90.0);
    }

    #[test]
    fn zero_points_everywhere_means_zero() {
        let entries = vec![entry("Exams", 0.0, 0.0, Some(100.0))];

        assert_eq!(calculate_overall_grade(&entries), 0.0);
    }

    #[test]
    fn percentage_has_two_decimals() {
        assert_eq!(format_percentage(88.333), "88.33%");
        assert_eq!(format_percentage(70.0), "70.00%");
    }
}
