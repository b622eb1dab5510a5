//! Catalog module for the storefront system.
//!
//! Product catalog management and browsing, per-user shopping carts with
//! compensating stock adjustments, and favorites. All persistence goes
//! through the document-store collaborator; these services only issue
//! reads, writes and light client-side derivations.

pub mod cart;
pub mod favorites;
pub mod products;

pub use cart::{cart_total, CartError, CartService};
pub use favorites::FavoritesService;
pub use products::{CatalogError, CatalogView, NewProduct, ProductService, ProductUpdate};
