//! Cookie-session protection for Swagger/OpenAPI documentation, with a small
//! hyper host to mount it on.

pub mod application;
pub mod docs;
pub mod handler;
pub mod logging;
pub mod protect;
pub mod router;
mod server;

pub use application::App;
pub use docs::SwaggerModule;
pub use protect::SwaggerProtect;

pub fn app() -> App {
    App::default()
}
