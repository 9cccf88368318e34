pub mod claims;
pub mod errors;
pub mod generator;

pub use claims::Claims;
pub use claims::TokenPayload;
pub use errors::JwtError;
pub use generator::JwtSettings;
pub use generator::JwtTokenGenerator;
pub use generator::TokenGenerator;
