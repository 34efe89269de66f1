//! Student enrollment: create, list and look up students.

use crate::school::{NewStudent, SchoolContext, Student, StudentId};
use chrono::{NaiveDate, Utc};
use mediator_core::{
    BoxFuture, DispatchError, FieldError, Handler, HandlerResult, Request, Validator,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Longest accepted name, in characters
pub const MAX_NAME_LENGTH: usize = 50;

/// Enroll a new student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateStudent {
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Given and middle names
    #[serde(default)]
    pub first_mid_name: String,
    /// First day of enrollment
    #[serde(default)]
    pub enrollment_date: Option<NaiveDate>,
}

impl Request for CreateStudent {
    type Response = StudentCreated;
}

/// Response to [`CreateStudent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StudentCreated {
    /// Id of the new student
    pub id: StudentId,
}

/// List students, optionally filtered by a name fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListStudents {
    /// Case-insensitive match against either name
    #[serde(default)]
    pub search: Option<String>,
}

impl Request for ListStudents {
    type Response = Vec<Student>;
}

/// Look up one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StudentDetails {
    /// Student id
    pub id: StudentId,
}

impl Request for StudentDetails {
    type Response = Option<Student>;
}

/// Domain failures raised by the student handlers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StudentError {
    /// Same name and enrollment date as an existing student
    #[error("{first_mid_name} {last_name} is already enrolled as student {existing}")]
    Duplicate {
        /// Family name
        last_name: String,
        /// Given and middle names
        first_mid_name: String,
        /// Id of the existing row
        existing: StudentId,
    },

    /// Reached the handler without an enrollment date
    #[error("enrollment date is missing")]
    MissingEnrollmentDate,
}

/// Name rules for [`CreateStudent`]: both names required, at most
/// [`MAX_NAME_LENGTH`] characters.
#[must_use]
pub fn student_name_rules(request: &CreateStudent) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for (field, value) in [
        ("LastName", &request.last_name),
        ("FirstMidName", &request.first_mid_name),
    ] {
        if value.trim().is_empty() {
            errors.push(FieldError::new(field, "required"));
        } else if value.chars().count() > MAX_NAME_LENGTH {
            errors.push(FieldError::new(
                field,
                format!("must be at most {MAX_NAME_LENGTH} characters"),
            ));
        }
    }
    errors
}

/// Enrollment date rule for [`CreateStudent`]: present and not in the future.
#[derive(Clone)]
pub struct EnrollmentDateRules {
    today: Arc<dyn Fn() -> NaiveDate + Send + Sync>,
}

impl EnrollmentDateRules {
    /// Judge dates against the current UTC date
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(|| Utc::now().date_naive())
    }

    /// Judge dates against `today`
    #[must_use]
    pub fn with_clock<F>(today: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        Self {
            today: Arc::new(today),
        }
    }
}

impl Default for EnrollmentDateRules {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnrollmentDateRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrollmentDateRules").finish_non_exhaustive()
    }
}

impl Validator<CreateStudent> for EnrollmentDateRules {
    fn validate(&self, request: &CreateStudent) -> Vec<FieldError> {
        match request.enrollment_date {
            None => vec![FieldError::new("EnrollmentDate", "required")],
            Some(date) if date > (self.today)() => {
                vec![FieldError::new("EnrollmentDate", "must not be in the future")]
            },
            Some(_) => Vec::new(),
        }
    }
}

/// Stages the new student; the pipeline commits it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateStudentHandler;

impl Handler<CreateStudent, SchoolContext> for CreateStudentHandler {
    fn handle<'a>(
        &'a self,
        request: CreateStudent,
        db: &'a SchoolContext,
    ) -> BoxFuture<'a, HandlerResult<CreateStudent>> {
        Box::pin(async move {
            let enrollment_date = request
                .enrollment_date
                .ok_or_else(|| DispatchError::handler(StudentError::MissingEnrollmentDate))?;
            let last_name = request.last_name.trim().to_string();
            let first_mid_name = request.first_mid_name.trim().to_string();

            // Committed rows plus our own staged ones; the commit re-checks
            // against rows other scopes committed in the meantime
            let existing = db.students().await?.into_iter().find(|student| {
                student.is_same_enrollment(&last_name, &first_mid_name, enrollment_date)
            });
            if let Some(existing) = existing {
                return Err(DispatchError::handler(StudentError::Duplicate {
                    last_name,
                    first_mid_name,
                    existing: existing.id,
                }));
            }

            let id = db.add_student(NewStudent {
                last_name,
                first_mid_name,
                enrollment_date,
            })?;
            tracing::info!(student_id = id, "student enrolled");
            Ok(StudentCreated { id })
        })
    }
}

/// Reads the roster, filtered by [`ListStudents::search`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ListStudentsHandler;

impl Handler<ListStudents, SchoolContext> for ListStudentsHandler {
    fn handle<'a>(
        &'a self,
        request: ListStudents,
        db: &'a SchoolContext,
    ) -> BoxFuture<'a, HandlerResult<ListStudents>> {
        Box::pin(async move {
            let students = db.students().await?;
            let Some(search) = request
                .search
                .map(|search| search.trim().to_lowercase())
                .filter(|search| !search.is_empty())
            else {
                return Ok(students);
            };

            Ok(students
                .into_iter()
                .filter(|student| {
                    student.last_name.to_lowercase().contains(&search)
                        || student.first_mid_name.to_lowercase().contains(&search)
                })
                .collect())
        })
    }
}

/// Finds one student by id
#[derive(Debug, Clone, Copy, Default)]
pub struct StudentDetailsHandler;

impl Handler<StudentDetails, SchoolContext> for StudentDetailsHandler {
    fn handle<'a>(
        &'a self,
        request: StudentDetails,
        db: &'a SchoolContext,
    ) -> BoxFuture<'a, HandlerResult<StudentDetails>> {
        Box::pin(async move { db.find(request.id).await.map_err(DispatchError::from) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::school::SchoolStore;
    use mediator_core::PersistenceContext;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    fn request(last_name: &str, first_mid_name: &str) -> CreateStudent {
        CreateStudent {
            last_name: last_name.to_string(),
            first_mid_name: first_mid_name.to_string(),
            enrollment_date: Some(date(2020, 9, 1)),
        }
    }

    #[test]
    fn test_names_are_required() {
        let errors = student_name_rules(&request(" ", ""));

        assert_eq!(
            errors,
            vec![
                FieldError::new("LastName", "required"),
                FieldError::new("FirstMidName", "required"),
            ]
        );
    }

    #[test]
    fn test_names_have_a_length_limit() {
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        let errors = student_name_rules(&request(&long, "Meredith"));

        assert_eq!(
            errors,
            vec![FieldError::new("LastName", "must be at most 50 characters")]
        );
        assert!(student_name_rules(&request(&"x".repeat(MAX_NAME_LENGTH), "M")).is_empty());
    }

    #[test]
    fn test_enrollment_date_must_not_be_in_the_future() {
        let rules = EnrollmentDateRules::with_clock(|| date(2020, 9, 1));

        let mut future = request("Alonso", "Meredith");
        future.enrollment_date = Some(date(2020, 9, 2));
        let mut missing = future.clone();
        missing.enrollment_date = None;

        assert!(rules.validate(&request("Alonso", "Meredith")).is_empty());
        assert_eq!(
            rules.validate(&future),
            vec![FieldError::new("EnrollmentDate", "must not be in the future")]
        );
        assert_eq!(
            rules.validate(&missing),
            vec![FieldError::new("EnrollmentDate", "required")]
        );
    }

    #[tokio::test]
    async fn test_duplicate_student_keeps_its_domain_error() {
        let store = SchoolStore::new();
        let db = store.context();
        assert_eq!(db.begin_transaction(), Ok(()));

        let first = CreateStudentHandler.handle(request("Li", "Yan"), &db).await;
        let second = CreateStudentHandler.handle(request("Li", "Yan"), &db).await;

        assert_eq!(first.ok(), Some(StudentCreated { id: 1 }));
        let Err(error) = second else {
            unreachable!("second enrollment is a duplicate");
        };
        assert!(matches!(
            error.handler_error::<StudentError>(),
            Some(StudentError::Duplicate { existing: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_search_matches_either_name() {
        let store = SchoolStore::new();
        let db = store.context();
        assert_eq!(db.begin_transaction(), Ok(()));
        for (last, first) in [("Justice", "Peggy"), ("Norman", "Laura"), ("Olivetto", "Nino")] {
            assert!(CreateStudentHandler.handle(request(last, first), &db).await.is_ok());
        }

        let found = ListStudentsHandler
            .handle(
                ListStudents {
                    search: Some("NO".to_string()),
                },
                &db,
            )
            .await
            .unwrap_or_default();

        let names: Vec<_> = found.iter().map(|s| s.last_name.as_str()).collect();
        assert_eq!(names, ["Norman", "Olivetto"]);
    }
}
