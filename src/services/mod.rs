pub mod attribute_service;
pub mod category_service;
pub mod error;
pub mod identity_service;
pub mod media_service;
pub mod pricing_service;
pub mod product_service;

pub use attribute_service::AttributeService;
pub use category_service::CategoryService;
pub use error::ServiceError;
pub use identity_service::{IdentityClient, IdentityError};
pub use media_service::MediaService;
pub use pricing_service::PricingService;
pub use product_service::ProductService;
