pub mod forms;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::SharedState;
use crate::submission::intake::IntakeProfile;

pub fn api_routes(profile: IntakeProfile) -> Router<SharedState> {
    let router = Router::new()
        .route("/api/submit-form", post(forms::submit_form))
        .route("/api/get-form-data", get(forms::get_form_data))
        .route("/api/delete-form-data", delete(forms::delete_form_data));

    match profile {
        IntakeProfile::Images => router,
        IntakeProfile::Documents => router.route("/api/initialize", get(forms::initialize)),
    }
}
