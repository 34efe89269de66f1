//! HTTP surface of the student feature.
//!
//! Listing goes through the generic [`dispatch_query`]. Creation and lookup
//! need their own handlers to turn domain outcomes into 409 and 404.

use crate::features::students::{
    CreateStudent, ListStudents, StudentCreated, StudentDetails, StudentError,
};
use crate::school::{SchoolContext, Student, StudentId};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use mediator_web::{AppError, AppState, WebResult, handlers::dispatch_query};

/// Student routes, ready for [`mediator_web::build_router`]
pub fn routes() -> Router<AppState<SchoolContext>> {
    Router::new()
        .route(
            "/students",
            get(dispatch_query::<ListStudents, SchoolContext>).post(create_student),
        )
        .route("/students/:id", get(student_details))
}

/// `POST /students`
///
/// # Errors
///
/// 400 with the model state when validation fails, 409 for a duplicate
/// student, 500 otherwise.
pub async fn create_student(
    State(state): State<AppState<SchoolContext>>,
    Json(request): Json<CreateStudent>,
) -> WebResult<(StatusCode, Json<StudentCreated>)> {
    match state.scope().send(request).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(error) => {
            if let Some(duplicate) = error
                .handler_error::<StudentError>()
                .filter(|failure| matches!(failure, StudentError::Duplicate { .. }))
            {
                return Err(AppError::new(
                    StatusCode::CONFLICT,
                    duplicate.to_string(),
                    "DUPLICATE_STUDENT".to_string(),
                ));
            }
            Err(error.into())
        },
    }
}

/// `GET /students/:id`
///
/// # Errors
///
/// 404 when no student has the id.
pub async fn student_details(
    State(state): State<AppState<SchoolContext>>,
    Path(id): Path<StudentId>,
) -> WebResult<Json<Student>> {
    state
        .scope()
        .send(StudentDetails { id })
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Student", id))
}
