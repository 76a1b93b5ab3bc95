use utoipa::OpenApi;

use crate::models::{CreateBookingRequest, CreateClassRequest, MessageResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::create_class,
        crate::handlers::create_booking
    ),
    components(schemas(CreateClassRequest, CreateBookingRequest, MessageResponse)),
    tags(
        (name = "booking", description = "Service status"),
        (name = "classes", description = "Class scheduling"),
        (name = "bookings", description = "Member bookings")
    ),
)]
pub struct ApiDoc;
