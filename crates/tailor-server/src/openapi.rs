use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Resume Tailor API",
        version = "0.1.0",
        description = "Tailors a PDF resume to a job posting with a language model, then serves the editable result as PDF or JSON."
    ),
    paths(
        crate::routes::tailor,
        crate::routes::get_session,
        crate::routes::replace_record,
        crate::routes::delete_session,
        crate::routes::update_skills,
        crate::routes::update_experience_points,
        crate::routes::update_project_points,
        crate::routes::export_pdf,
        crate::routes::export_json,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::TailorForm,
        crate::dto::TailorResponse,
        crate::dto::SessionResponse,
        crate::dto::TextUpdateRequest,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
        tailor_core::ResumeRecord,
        tailor_core::PersonalInfo,
        tailor_core::JobEntry,
        tailor_core::ProjectEntry,
        tailor_core::EduEntry,
    )),
    tags(
        (name = "tailor", description = "Run the tailoring pipeline"),
        (name = "sessions", description = "Review and edit a tailored resume"),
        (name = "export", description = "Download the record as PDF or JSON"),
        (name = "system", description = "Health and free-tier status"),
    )
)]
pub struct ApiDoc;
