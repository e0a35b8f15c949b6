use anyhow::Context;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Row};
use uuid::Uuid;

use crate::models::{
    Activity, Performance, SemesterRecord, StudentRecord, SubjectMark, TeacherRemark, YearRecord,
};
use crate::scale::MarksScale;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn upsert_student<'e, E>(
    executor: E,
    name: &str,
    email: &str,
    photo: Option<&str>,
    performance: Option<&Performance>,
) -> anyhow::Result<Uuid>
where
    E: PgExecutor<'e>,
{
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO student_performance.students (id, full_name, email, photo, performance)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            photo = COALESCE(EXCLUDED.photo, student_performance.students.photo),
            performance = EXCLUDED.performance
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(photo)
    .bind(performance.map(Performance::to_document))
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to upsert student {email}"))?
    .get("id");

    Ok(id)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (
            "Avery Lee",
            "avery.lee@example.edu",
            Some("photos/avery-lee.jpg"),
            Some(seed_performance(
                &[
                    ("1", "1", &[("Mathematics", 82.0), ("Physics", 74.0)]),
                    ("1", "2", &[("Chemistry", 88.0)]),
                ],
                &[("Chess", 9.0), ("Debate", 7.0)],
                &[("Ms. Rao", "Consistent and curious", 8.0)],
            )),
        ),
        (
            "Jules Moreno",
            "jules.moreno@example.edu",
            None,
            Some(seed_performance(
                &[
                    ("1", "1", &[("Mathematics", 91.0), ("Physics", 87.0)]),
                    ("2", "1", &[("Statistics", 93.0)]),
                ],
                &[("Robotics", 10.0)],
                &[("Mr. Ito", "Leads group work", 9.0), ("Ms. Rao", "Excellent lab notes", 10.0)],
            )),
        ),
        ("Kiara Patel", "kiara.patel@example.edu", None, None),
    ];

    for (name, email, photo, performance) in students {
        upsert_student(pool, name, email, photo, performance.as_ref()).await?;
    }

    Ok(())
}

type SeedSemester<'a> = (&'a str, &'a str, &'a [(&'a str, f64)]);

fn seed_performance(
    semesters: &[SeedSemester<'_>],
    activities: &[(&str, f64)],
    remarks: &[(&str, &str, f64)],
) -> Performance {
    let mut performance = Performance::default();
    for (year, semester, subjects) in semesters {
        let subjects = subjects
            .iter()
            .map(|(subject, marks)| SubjectMark {
                subject: subject.to_string(),
                marks: Some(*marks),
            })
            .collect();
        year_entry(&mut performance, year)
            .semesters
            .push(SemesterRecord {
                semester: semester.to_string(),
                subjects,
            });
    }
    performance.extracurricular = activities
        .iter()
        .map(|(activity, grade)| Activity {
            activity: activity.to_string(),
            grade: Some(*grade),
        })
        .collect();
    performance.teacher_remarks = remarks
        .iter()
        .map(|(teacher_name, remark, grade)| TeacherRemark {
            teacher_name: teacher_name.to_string(),
            remark: remark.to_string(),
            grade: Some(*grade),
        })
        .collect();
    performance
}

fn year_entry<'a>(performance: &'a mut Performance, year: &str) -> &'a mut YearRecord {
    let index = match performance.academic.iter().position(|record| record.year == year) {
        Some(index) => index,
        None => {
            performance.academic.push(YearRecord {
                year: year.to_string(),
                semesters: Vec::new(),
            });
            performance.academic.len() - 1
        }
    };
    &mut performance.academic[index]
}

fn semester_entry<'a>(record: &'a mut YearRecord, semester: &str) -> &'a mut SemesterRecord {
    let index = match record.semesters.iter().position(|entry| entry.semester == semester) {
        Some(index) => index,
        None => {
            record.semesters.push(SemesterRecord {
                semester: semester.to_string(),
                subjects: Vec::new(),
            });
            record.semesters.len() - 1
        }
    };
    &mut record.semesters[index]
}

fn student_from_row(row: &PgRow) -> StudentRecord {
    let document: Option<serde_json::Value> = row.get("performance");
    StudentRecord {
        id: row.get("id"),
        name: row.get("full_name"),
        email: row.get("email"),
        photo: row.get("photo"),
        performance: document.as_ref().map(Performance::from_document),
    }
}

/// Full roster in the order students were first stored.
pub async fn fetch_students(pool: &PgPool) -> anyhow::Result<Vec<StudentRecord>> {
    let rows = sqlx::query(
        "SELECT id, full_name, email, photo, performance \
         FROM student_performance.students \
         ORDER BY seq",
    )
    .fetch_all(pool)
    .await
    .context("failed to load students")?;

    let students: Vec<StudentRecord> = rows.iter().map(student_from_row).collect();
    tracing::debug!(count = students.len(), "loaded roster");
    Ok(students)
}

pub async fn fetch_student_by_email(
    pool: &PgPool,
    email: &str,
) -> anyhow::Result<Option<StudentRecord>> {
    let row = sqlx::query(
        "SELECT id, full_name, email, photo, performance \
         FROM student_performance.students \
         WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to load student {email}"))?;

    Ok(row.as_ref().map(student_from_row))
}

#[derive(Debug, serde::Deserialize)]
pub struct CsvRow {
    full_name: String,
    email: String,
    kind: String,
    year: Option<String>,
    semester: Option<String>,
    label: String,
    value: Option<String>,
    teacher_name: Option<String>,
}

#[derive(Debug)]
pub struct ImportedStudent {
    pub name: String,
    pub email: String,
    pub performance: Performance,
}

fn parse_value(row: &CsvRow, line: u64) -> Option<f64> {
    let raw = row.value.as_deref().map(str::trim).filter(|raw| !raw.is_empty())?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            tracing::warn!(
                line,
                email = row.email.as_str(),
                value = raw,
                "non-numeric value imported without a score"
            );
            None
        }
    }
}

/// Groups rows per email, in the order each email first appears.
/// Academic marks are converted from `marks_scale` to percent; activity and
/// remark grades are stored as given.
pub fn group_rows<I>(rows: I, marks_scale: MarksScale) -> anyhow::Result<Vec<ImportedStudent>>
where
    I: IntoIterator<Item = (u64, CsvRow)>,
{
    let mut students: Vec<ImportedStudent> = Vec::new();

    for (line, row) in rows {
        let value = parse_value(&row, line);
        let index = match students.iter().position(|student| student.email == row.email) {
            Some(index) => index,
            None => {
                students.push(ImportedStudent {
                    name: row.full_name.clone(),
                    email: row.email.clone(),
                    performance: Performance::default(),
                });
                students.len() - 1
            }
        };
        let performance = &mut students[index].performance;

        match row.kind.trim().to_ascii_lowercase().as_str() {
            "academic" => {
                let year = row
                    .year
                    .as_deref()
                    .with_context(|| format!("line {line}: academic row needs a year"))?;
                let semester = row
                    .semester
                    .as_deref()
                    .with_context(|| format!("line {line}: academic row needs a semester"))?;
                let marks = match value {
                    Some(marks) => Some(marks_scale.to_percent(marks).with_context(|| {
                        format!("line {line}: mark {marks} is outside the 0-10 SGPA scale")
                    })?),
                    None => None,
                };
                semester_entry(year_entry(performance, year.trim()), semester.trim())
                    .subjects
                    .push(SubjectMark {
                        subject: row.label.clone(),
                        marks,
                    });
            }
            "extracurricular" => performance.extracurricular.push(Activity {
                activity: row.label.clone(),
                grade: value,
            }),
            "remark" => performance.teacher_remarks.push(TeacherRemark {
                teacher_name: row.teacher_name.clone().unwrap_or_default(),
                remark: row.label.clone(),
                grade: value,
            }),
            other => anyhow::bail!("line {line}: unknown row kind {other:?}"),
        }
    }

    Ok(students)
}

pub async fn import_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
    marks_scale: MarksScale,
) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or_default();
        let row: CsvRow = record
            .deserialize(Some(&headers))
            .with_context(|| format!("line {line}: invalid row"))?;
        rows.push((line, row));
    }

    let students = group_rows(rows, marks_scale)?;
    let mut tx = pool.begin().await?;
    for student in &students {
        upsert_student(
            &mut *tx,
            &student.name,
            &student.email,
            None,
            Some(&student.performance),
        )
        .await?;
    }
    tx.commit().await.context("failed to commit import")?;

    Ok(students.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &str) -> Vec<(u64, CsvRow)> {
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        reader
            .deserialize::<CsvRow>()
            .enumerate()
            .map(|(index, row)| (index as u64 + 2, row.expect("row")))
            .collect()
    }

    const HEADER: &str = "full_name,email,kind,year,semester,label,value,teacher_name\n";

    #[test]
    fn groups_rows_by_student_in_first_seen_order() {
        let data = format!(
            "{HEADER}\
             Jules Moreno,jules@example.edu,academic,1,1,Math,91,\n\
             Avery Lee,avery@example.edu,extracurricular,,,Chess,9,\n\
             Jules Moreno,jules@example.edu,academic,1,2,Physics,87,\n\
             Jules Moreno,jules@example.edu,remark,,,Leads group work,9,Mr. Ito\n"
        );

        let students = group_rows(rows(&data), MarksScale::Percent).expect("grouped");
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].email, "jules@example.edu");
        assert_eq!(students[1].email, "avery@example.edu");

        let jules = &students[0].performance;
        assert_eq!(jules.academic.len(), 1);
        assert_eq!(jules.academic[0].semesters.len(), 2);
        assert_eq!(jules.teacher_remarks[0].teacher_name, "Mr. Ito");
        assert_eq!(jules.teacher_remarks[0].grade, Some(9.0));
        assert_eq!(students[1].performance.extracurricular[0].grade, Some(9.0));
    }

    #[test]
    fn non_numeric_values_import_without_score() {
        let data = format!(
            "{HEADER}\
             Avery Lee,avery@example.edu,academic,1,1,Art,A+,\n\
             Avery Lee,avery@example.edu,extracurricular,,,Choir,,\n"
        );

        let students = group_rows(rows(&data), MarksScale::Percent).expect("grouped");
        let performance = &students[0].performance;
        assert_eq!(performance.academic[0].semesters[0].subjects[0].marks, None);
        assert_eq!(performance.extracurricular[0].grade, None);
    }

    #[test]
    fn sgpa_marks_are_stored_as_percent() {
        let data = format!(
            "{HEADER}\
             Avery Lee,avery@example.edu,academic,1,1,Math,8.5,\n\
             Avery Lee,avery@example.edu,extracurricular,,,Chess,8.5,\n"
        );

        let students = group_rows(rows(&data), MarksScale::Sgpa).expect("grouped");
        let performance = &students[0].performance;
        assert_eq!(performance.academic[0].semesters[0].subjects[0].marks, Some(85.0));
        assert_eq!(performance.extracurricular[0].grade, Some(8.5));
    }

    #[test]
    fn sgpa_marks_outside_range_fail_the_import() {
        for mark in ["85", "-3"] {
            let data = format!(
                "{HEADER}\
                 Avery Lee,avery@example.edu,academic,1,1,Math,8,\n\
                 Avery Lee,avery@example.edu,academic,1,1,Art,{mark},\n"
            );
            let err = group_rows(rows(&data), MarksScale::Sgpa).expect_err("out of range");
            assert!(err.to_string().starts_with("line 3:"), "{err}");
        }
    }

    #[test]
    fn percent_marks_above_hundred_import_unchanged() {
        let data = format!("{HEADER}Avery Lee,avery@example.edu,academic,1,1,Math,110,\n");
        let students = group_rows(rows(&data), MarksScale::Percent).expect("grouped");
        assert_eq!(students[0].performance.academic[0].semesters[0].subjects[0].marks, Some(110.0));
    }

    #[test]
    fn rejects_unknown_kind() {
        let data = format!("{HEADER}Avery Lee,avery@example.edu,sports,,,Track,8,\n");
        let err = group_rows(rows(&data), MarksScale::Percent).expect_err("unknown kind");
        assert!(err.to_string().contains("unknown row kind"));
    }

    #[test]
    fn academic_rows_need_a_year() {
        let data = format!("{HEADER}Avery Lee,avery@example.edu,academic,,1,Math,80,\n");
        let err = group_rows(rows(&data), MarksScale::Percent).expect_err("missing year");
        assert!(err.to_string().contains("needs a year"));
    }

    #[test]
    fn seed_performance_groups_semesters_by_year() {
        let performance = seed_performance(
            &[("1", "1", &[("Math", 80.0)]), ("1", "2", &[("Physics", 70.0)])],
            &[],
            &[],
        );
        assert_eq!(performance.academic.len(), 1);
        assert_eq!(performance.academic[0].semesters.len(), 2);
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn failed_import_writes_no_students() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let pool = PgPool::connect(&url).await.expect("connect");
        init_db(&pool).await.expect("migrate");

        let email = format!("import-{}@example.edu", Uuid::new_v4());
        let path = std::env::temp_dir().join(format!("import-{}.csv", Uuid::new_v4()));
        // Postgres rejects NUL in text, so the second upsert fails.
        let data = format!(
            "{HEADER}\
             Avery Lee,{email},academic,1,1,Math,80,\n\
             Bad\u{0}Name,second-{email},academic,1,1,Math,70,\n"
        );
        std::fs::write(&path, data).expect("write csv");

        let result = import_csv(&pool, &path, MarksScale::Percent).await;
        let _ = std::fs::remove_file(&path);
        assert!(result.is_err());
        assert!(fetch_student_by_email(&pool, &email)
            .await
            .expect("fetch")
            .is_none());
    }
}
