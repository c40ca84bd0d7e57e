use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SCM Demo API",
        version = "1.0.0",
        description = r#"
# Supply Chain Demo Sandboxes

Provisions isolated demo environments for the supply-chain ERP: seeds
reference data, creates demo-scoped users with roles, and looks up or tears
down demos by their guid.

## Error Handling

Failures share one JSON body:

```json
{
  "error": "Not Found",
  "message": "Not found: No Demo with this guid",
  "requestId": "3f0c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

Every response carries an `x-request-id` header.
        "#,
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development")
    ),
    tags(
        (name = "Demos", description = "Demo sandbox lifecycle")
    ),
    paths(
        crate::handlers::demos::seed_all,
        crate::handlers::demos::reset_all,
        crate::handlers::demos::create_demo,
        crate::handlers::demos::find_by_guid,
        crate::handlers::demos::list_retailers,
        crate::handlers::demos::login_as,
        crate::handlers::demos::delete_by_guid,
        crate::handlers::demos::create_retail_manager,
    ),
    components(
        schemas(
            crate::handlers::demos::CreateDemoRequest,
            crate::handlers::demos::LoginAsRequest,
            crate::handlers::demos::CreateUserRequest,
            crate::handlers::demos::IdInput,
            crate::handlers::demos::DemoView,
            crate::handlers::demos::UserView,
            crate::handlers::demos::RoleView,
            crate::handlers::demos::RetailerView,
            crate::services::seeding::SeedReport,
            crate::services::seeding::SeededTable,
            crate::services::seeding::ResetReport,
            crate::services::seeding::ClearedTable,
            crate::auth::AccessToken,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_demo_routes() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("SCM Demo API"));
        assert!(json.contains("/api/Demos/findByGuid/{guid}"));
        assert!(json.contains("/api/Demos/{guid}/loginAs"));
        assert!(json.contains("ErrorResponse"));
    }
}
