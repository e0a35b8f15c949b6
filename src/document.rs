use std::cmp::Ordering;

use serde_json::{json, Map, Value};

use crate::models::{Activity, Performance, SemesterRecord, SubjectMark, TeacherRemark, YearRecord};

impl Performance {
    /// Never fails; fields of the wrong shape are dropped or read as missing.
    pub fn from_document(document: &Value) -> Performance {
        Performance {
            academic: document
                .get("academic")
                .map(decode_academic)
                .unwrap_or_default(),
            extracurricular: list_items(document.get("extracurricular"))
                .map(|item| Activity {
                    activity: string_field(item, "activity"),
                    grade: number_field(item, "grade"),
                })
                .collect(),
            teacher_remarks: list_items(document.get("teacherRemarks"))
                .map(|item| TeacherRemark {
                    teacher_name: string_field(item, "teacherName"),
                    remark: string_field(item, "remark"),
                    grade: number_field(item, "grade"),
                })
                .collect(),
        }
    }

    pub fn to_document(&self) -> Value {
        let mut academic = Map::new();
        for year in &self.academic {
            let mut semesters = Map::new();
            for semester in &year.semesters {
                let subjects = semester
                    .subjects
                    .iter()
                    .map(|subject| match subject.marks {
                        Some(marks) => json!({ "subject": subject.subject, "marks": marks }),
                        None => json!({ "subject": subject.subject }),
                    })
                    .collect();
                semesters.insert(semester.semester.clone(), Value::Array(subjects));
            }
            academic.insert(year.year.clone(), json!({ "semester": semesters }));
        }

        let extracurricular: Vec<Value> = self
            .extracurricular
            .iter()
            .map(|entry| match entry.grade {
                Some(grade) => json!({ "activity": entry.activity, "grade": grade }),
                None => json!({ "activity": entry.activity }),
            })
            .collect();

        let teacher_remarks: Vec<Value> = self
            .teacher_remarks
            .iter()
            .map(|entry| match entry.grade {
                Some(grade) => json!({
                    "teacherName": entry.teacher_name,
                    "remark": entry.remark,
                    "grade": grade,
                }),
                None => json!({ "teacherName": entry.teacher_name, "remark": entry.remark }),
            })
            .collect();

        json!({
            "academic": academic,
            "extracurricular": extracurricular,
            "teacherRemarks": teacher_remarks,
        })
    }
}

fn decode_academic(academic: &Value) -> Vec<YearRecord> {
    let Some(years) = academic.as_object() else {
        tracing::debug!("academic is not an object, ignoring");
        return Vec::new();
    };

    let mut records: Vec<YearRecord> = years
        .iter()
        .map(|(year, record)| YearRecord {
            year: year.clone(),
            semesters: decode_semesters(year, record),
        })
        .collect();
    records.sort_by(|a, b| compare_labels(&a.year, &b.year));
    records
}

fn decode_semesters(year: &str, record: &Value) -> Vec<SemesterRecord> {
    let Some(semesters) = record.get("semester").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut records = Vec::with_capacity(semesters.len());
    for (semester, subjects) in semesters {
        let Some(subjects) = subjects.as_array() else {
            tracing::debug!(year, semester = semester.as_str(), "semester is not a list, skipping");
            continue;
        };
        records.push(SemesterRecord {
            semester: semester.clone(),
            subjects: subjects
                .iter()
                .map(|item| SubjectMark {
                    subject: string_field(item, "subject"),
                    marks: number_field(item, "marks"),
                })
                .collect(),
        });
    }
    records.sort_by(|a, b| compare_labels(&a.semester, &b.semester));
    records
}

fn list_items(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter())
        .into_iter()
        .flatten()
}

fn string_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn number_field(item: &Value, key: &str) -> Option<f64> {
    item.get(key).and_then(Value::as_f64)
}

/// Integer labels sort numerically and ahead of any other label; the rest
/// sort as plain strings.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
