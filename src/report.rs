use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{RankedStudent, ScoreBandSummary, StudentRecord};
use crate::ranking;
use crate::scoring::ScoringPolicy;

const SCORE_BANDS: [(&str, i64); 4] = [
    ("Excellent (90-100)", 90),
    ("Good (75-89)", 75),
    ("Average (50-74)", 50),
    ("Needs Support (0-49)", i64::MIN),
];

pub fn score_band(total_score: i64) -> &'static str {
    SCORE_BANDS
        .iter()
        .find(|(_, floor)| total_score >= *floor)
        .map(|(band, _)| *band)
        .unwrap_or(SCORE_BANDS[SCORE_BANDS.len() - 1].0)
}

pub fn summarize_by_band(ranked: &[RankedStudent]) -> Vec<ScoreBandSummary> {
    SCORE_BANDS
        .iter()
        .map(|(band, _)| {
            let totals: Vec<i64> = ranked
                .iter()
                .map(|entry| entry.score.total_score)
                .filter(|total| score_band(*total) == *band)
                .collect();
            ScoreBandSummary {
                band: *band,
                count: totals.len(),
                avg_total: mean(totals.iter().map(|total| *total as f64)),
            }
        })
        .collect()
}

fn mean<I: Iterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn build_report(
    policy: &ScoringPolicy,
    students: &[StudentRecord],
    limit: usize,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Student Performance Report");
    let _ = writeln!(
        output,
        "Generated {} for {} students",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        students.len()
    );
    let _ = writeln!(output);

    let ranked = match ranking::rank_students(policy, students) {
        Ok(ranked) => ranked,
        Err(err) => {
            let _ = writeln!(output, "{}.", capitalize(&err.to_string()));
            return output;
        }
    };

    let _ = writeln!(output, "## Best Performing Student");
    match ranking::best_student(policy, students) {
        Some(best) => {
            let _ = writeln!(
                output,
                "{} ({}) with total score {}",
                best.best_student.name, best.best_student.email, best.total_score
            );
        }
        None => {
            let _ = writeln!(output, "No student has a positive score yet.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Score Bands");
    for summary in summarize_by_band(&ranked) {
        let _ = writeln!(
            output,
            "- {}: {} students (avg total {:.1})",
            summary.band, summary.count, summary.avg_total
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Component Averages");
    let _ = writeln!(
        output,
        "- Academic: {:.1}",
        mean(ranked.iter().map(|entry| entry.score.academic_score as f64))
    );
    let _ = writeln!(
        output,
        "- Extracurricular: {:.1}",
        mean(ranked.iter().map(|entry| entry.score.extra_curricular_score as f64))
    );
    let _ = writeln!(
        output,
        "- Remarks: {:.1}",
        mean(ranked.iter().map(|entry| entry.score.remarks_score as f64))
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Ranking");
    for (position, entry) in ranked.iter().take(limit).enumerate() {
        let _ = writeln!(
            output,
            "{}. {} ({}) total {} (academic {}, extracurricular {}, remarks {})",
            position + 1,
            entry.name,
            entry.email,
            entry.score.total_score,
            entry.score.academic_score,
            entry.score.extra_curricular_score,
            entry.score.remarks_score
        );
    }

    output
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Performance;
    use chrono::TimeZone;
    use serde_json::json;
    use uuid::Uuid;

    fn student(name: &str, marks: f64, grade: f64) -> StudentRecord {
        StudentRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.edu", name.to_lowercase()),
            photo: None,
            performance: Some(Performance::from_document(&json!({
                "academic": { "1": { "semester": { "1": [ { "subject": "Math", "marks": marks } ] } } },
                "extracurricular": [ { "activity": "Chess", "grade": grade } ],
                "teacherRemarks": [ { "teacherName": "Ms. Rao", "remark": "ok", "grade": grade } ]
            }))),
        }
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 2, 9, 30, 0).unwrap()
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(score_band(100), "Excellent (90-100)");
        assert_eq!(score_band(90), "Excellent (90-100)");
        assert_eq!(score_band(89), "Good (75-89)");
        assert_eq!(score_band(50), "Average (50-74)");
        assert_eq!(score_band(0), "Needs Support (0-49)");
    }

    #[test]
    fn report_lists_best_student_and_ranking() {
        let students = vec![
            student("Avery", 60.0, 5.0),
            student("Jules", 95.0, 10.0),
            student("Kiara", 80.0, 8.0),
        ];

        let report = build_report(&ScoringPolicy::default(), &students, 2, generated_at());
        assert!(report.contains("Generated 2026-02-02 09:30 UTC for 3 students"));
        assert!(report.contains("Jules (jules@example.edu) with total score 97"));
        assert!(report.contains("- Excellent (90-100): 1 students (avg total 97.0)"));
        assert!(report.contains("- Good (75-89): 1 students (avg total 80.0)"));
        assert!(report.contains("1. Jules"));
        assert!(report.contains("2. Kiara"));
        assert!(!report.contains("3. Avery"));
    }

    #[test]
    fn empty_roster_reports_no_students() {
        let report = build_report(&ScoringPolicy::default(), &[], 10, generated_at());
        assert!(report.contains("No students found."));
        assert!(!report.contains("## Ranking"));
    }
}
