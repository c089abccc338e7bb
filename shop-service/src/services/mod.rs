mod auth;
mod cart;
mod catalog;
mod orders;
mod users;

pub use auth::AuthService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use orders::OrderService;
pub use users::UserService;
