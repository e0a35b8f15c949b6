use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
    pub performance: Option<Performance>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Performance {
    pub academic: Vec<YearRecord>,
    pub extracurricular: Vec<Activity>,
    pub teacher_remarks: Vec<TeacherRemark>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearRecord {
    pub year: String,
    pub semesters: Vec<SemesterRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemesterRecord {
    pub semester: String,
    pub subjects: Vec<SubjectMark>,
}

/// `marks` is `None` when the stored value was missing or not a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectMark {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub activity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRemark {
    pub teacher_name: String,
    pub remark: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearAverage {
    pub total: f64,
    pub subjects: usize,
    pub average: f64,
}

/// Per-year breakdown, serialized as a JSON object in year order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcademicByYear(pub Vec<(String, YearAverage)>);

impl AcademicByYear {
    #[cfg(test)]
    pub fn get(&self, year: &str) -> Option<&YearAverage> {
        self.0
            .iter()
            .find(|(label, _)| label == year)
            .map(|(_, average)| average)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &YearAverage)> {
        self.0.iter().map(|(label, average)| (label.as_str(), average))
    }
}

impl Serialize for AcademicByYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (year, average) in &self.0 {
            map.serialize_entry(year, average)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedScore {
    pub academic_by_year: AcademicByYear,
    #[serde(skip)]
    pub academic_average: f64,
    pub academic_score: i64,
    pub extra_curricular_score: i64,
    pub remarks_score: i64,
    pub total_score: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedStudent {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(flatten)]
    pub score: ComputedScore,
    pub extracurricular: Vec<Activity>,
    pub teacher_remarks: Vec<TeacherRemark>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestStudent {
    pub best_student: StudentProfile,
    pub total_score: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearDashboard {
    pub year: String,
    pub subjects: usize,
    pub average: f64,
    pub sgpa: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboard {
    pub student: StudentProfile,
    pub years: Vec<YearDashboard>,
    pub academic_average: f64,
    pub cumulative_sgpa: f64,
    #[serde(flatten)]
    pub score: ComputedScore,
}

#[derive(Debug, Clone)]
pub struct ScoreBandSummary {
    pub band: &'static str,
    pub count: usize,
    pub avg_total: f64,
}
