pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::error::AppError;

/// Registers every `/api` route. Expects to be mounted under a scope wrapped in
/// `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid JSON body: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid query string: {}", err)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid path parameter: {}", err)).into()
    }))
    .service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::get_profile)
            .service(auth::update_profile),
    )
    .service(
        web::scope("/user")
            .service(users::list_users)
            .service(users::get_user)
            .service(users::delete_user),
    )
    .service(
        // fixed segments first so they are not parsed as `{id}`
        web::scope("/tasks")
            .service(tasks::dashboard_data)
            .service(tasks::user_dashboard_data)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::update_task_status)
            .service(tasks::update_task_checklist)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
