use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no students found")]
    NoStudents,
    #[error("no student with email {email}")]
    StudentNotFound { email: String },
}
