use crate::error::LookupError;
use crate::models::{
    BestStudent, RankedStudent, StudentDashboard, StudentProfile, StudentRecord, YearDashboard,
};
use crate::scale;
use crate::scoring::ScoringPolicy;

impl StudentRecord {
    pub fn profile(&self) -> StudentProfile {
        StudentProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            photo: self.photo.clone(),
        }
    }
}

/// Scores every student and orders them by total score, highest first.
/// Students with equal totals keep their roster order.
pub fn rank_students(
    policy: &ScoringPolicy,
    students: &[StudentRecord],
) -> Result<Vec<RankedStudent>, LookupError> {
    if students.is_empty() {
        return Err(LookupError::NoStudents);
    }

    let mut ranked: Vec<RankedStudent> = students
        .iter()
        .map(|student| {
            let performance = student.performance.as_ref();
            RankedStudent {
                id: student.id,
                name: student.name.clone(),
                email: student.email.clone(),
                score: policy.compute(performance),
                extracurricular: performance
                    .map(|record| record.extracurricular.clone())
                    .unwrap_or_default(),
                teacher_remarks: performance
                    .map(|record| record.teacher_remarks.clone())
                    .unwrap_or_default(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_score.cmp(&a.score.total_score));
    tracing::debug!(students = ranked.len(), "ranked roster");
    Ok(ranked)
}

/// Student with the strictly highest total score. The first student seen
/// wins a tie, and nobody is returned unless some total is above zero.
pub fn best_student(policy: &ScoringPolicy, students: &[StudentRecord]) -> Option<BestStudent> {
    let mut best: Option<&StudentRecord> = None;
    let mut best_score = 0;

    for student in students {
        let total = policy.compute(student.performance.as_ref()).total_score;
        if total > best_score {
            best_score = total;
            best = Some(student);
        }
    }

    best.map(|student| BestStudent {
        best_student: student.profile(),
        total_score: best_score,
    })
}

pub fn dashboard(policy: &ScoringPolicy, student: &StudentRecord) -> StudentDashboard {
    let score = policy.compute(student.performance.as_ref());
    let years = score
        .academic_by_year
        .iter()
        .map(|(year, average)| YearDashboard {
            year: year.to_string(),
            subjects: average.subjects,
            average: average.average,
            sgpa: scale::percent_to_sgpa(average.average),
        })
        .collect();

    StudentDashboard {
        student: student.profile(),
        years,
        academic_average: score.academic_average,
        cumulative_sgpa: scale::percent_to_sgpa(score.academic_average),
        score,
    }
}
