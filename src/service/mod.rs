pub mod http;
#[cfg(test)]
pub mod mock;
pub mod traits;

pub use http::HttpGenerationService;
pub use traits::GenerationService;
