pub mod phone_validation;
pub use phone_validation::validate_phone_number;
pub mod public_url;
pub use public_url::public_origin;
