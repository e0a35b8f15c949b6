use crate::models::{AcademicByYear, Activity, ComputedScore, Performance, TeacherRemark, YearAverage};

/// Weights and scale bounds used to turn a performance record into scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    pub academic_weight: f64,
    pub extracurricular_weight: f64,
    pub remarks_weight: f64,
    /// Highest grade a single activity or remark can carry.
    pub max_entry_grade: f64,
    /// Scale the stored subject marks are recorded on.
    pub marks_scale: f64,
    pub max_score: i64,
}

pub const ACADEMIC_WEIGHT: f64 = 0.7;
pub const EXTRACURRICULAR_WEIGHT: f64 = 0.2;
pub const REMARKS_WEIGHT: f64 = 0.1;
pub const MAX_ENTRY_GRADE: f64 = 10.0;
pub const MARKS_SCALE: f64 = 100.0;
pub const MAX_SCORE: i64 = 100;

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            academic_weight: ACADEMIC_WEIGHT,
            extracurricular_weight: EXTRACURRICULAR_WEIGHT,
            remarks_weight: REMARKS_WEIGHT,
            max_entry_grade: MAX_ENTRY_GRADE,
            marks_scale: MARKS_SCALE,
            max_score: MAX_SCORE,
        }
    }
}

/// Nearest integer, halves rounded towards positive infinity.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

pub fn round_one_decimal(x: f64) -> f64 {
    round_half_up(x * 10.0) / 10.0
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcademicSummary {
    pub by_year: AcademicByYear,
    pub average: f64,
}

/// Averages the numeric marks of every year. Entries without numeric marks
/// are left out of both the sum and the count.
pub fn academic_summary(performance: &Performance) -> AcademicSummary {
    let mut by_year = Vec::with_capacity(performance.academic.len());
    let mut total_marks = 0.0;
    let mut total_subjects = 0usize;

    for year in &performance.academic {
        let mut year_total = 0.0;
        let mut year_subjects = 0usize;

        for semester in &year.semesters {
            for marks in semester.subjects.iter().filter_map(|subject| subject.marks) {
                year_total += marks;
                year_subjects += 1;
            }
        }

        let average = if year_subjects > 0 {
            round_one_decimal(year_total / year_subjects as f64)
        } else {
            0.0
        };
        by_year.push((
            year.year.clone(),
            YearAverage {
                total: year_total,
                subjects: year_subjects,
                average,
            },
        ));

        total_marks += year_total;
        total_subjects += year_subjects;
    }

    let average = if total_subjects > 0 {
        round_one_decimal(total_marks / total_subjects as f64)
    } else {
        0.0
    };

    AcademicSummary {
        by_year: AcademicByYear(by_year),
        average,
    }
}

impl ScoringPolicy {
    pub fn academic_score(&self, academic_average: f64) -> i64 {
        let scaled = round_half_up(academic_average / self.marks_scale * 100.0) as i64;
        scaled.min(self.max_score)
    }

    /// Fraction of the best possible total, as a percentage. Entries with no
    /// grade count as zero but still count towards the possible total.
    pub fn graded_entries_score<I>(&self, grades: I) -> i64
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut raw_sum = 0.0;
        let mut count = 0usize;
        for grade in grades {
            raw_sum += grade.unwrap_or(0.0);
            count += 1;
        }

        let ratio = raw_sum / (count as f64 * self.max_entry_grade);
        if ratio.is_nan() {
            return 0;
        }
        (round_half_up(ratio * 100.0) as i64).min(self.max_score)
    }

    pub fn extracurricular_score(&self, entries: &[Activity]) -> i64 {
        self.graded_entries_score(entries.iter().map(|entry| entry.grade))
    }

    pub fn remarks_score(&self, entries: &[TeacherRemark]) -> i64 {
        self.graded_entries_score(entries.iter().map(|entry| entry.grade))
    }

    /// Weighted in the fixed order academic, extracurricular, remarks and
    /// rounded once at the end.
    pub fn total_score(&self, academic: i64, extracurricular: i64, remarks: i64) -> i64 {
        let weighted = academic as f64 * self.academic_weight
            + extracurricular as f64 * self.extracurricular_weight
            + remarks as f64 * self.remarks_weight;
        round_half_up(weighted) as i64
    }

    pub fn compute(&self, performance: Option<&Performance>) -> ComputedScore {
        let Some(performance) = performance else {
            return ComputedScore::default();
        };

        let academic = academic_summary(performance);
        let academic_score = self.academic_score(academic.average);
        let extra_curricular_score = self.extracurricular_score(&performance.extracurricular);
        let remarks_score = self.remarks_score(&performance.teacher_remarks);

        ComputedScore {
            academic_by_year: academic.by_year,
            academic_average: academic.average,
            academic_score,
            extra_curricular_score,
            remarks_score,
            total_score: self.total_score(academic_score, extra_curricular_score, remarks_score),
        }
    }
}
