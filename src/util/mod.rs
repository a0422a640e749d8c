pub mod media;
mod query;
pub mod shopping_cart;
pub mod shortlink;

pub use media::{media_url, MediaStore};
pub use query::QueryParams;
pub use shortlink::generate_short_link;
