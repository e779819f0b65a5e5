//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pixform API",
        version = "0.1.0",
        description = "Stateless image transforms: upload an image as multipart form data and receive the converted, resized or compressed result in the response body."
    ),
    paths(
        handlers::image::check_connection,
        handlers::image::convert_image,
        handlers::image::resize_image,
        handlers::image::compress_image,
    ),
    components(schemas(error::ErrorResponse)),
    tags(
        (name = "image", description = "Image conversion, resizing and compression")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
