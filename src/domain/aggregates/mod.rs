//! Aggregates module
pub mod edition;
pub mod order;
pub mod cart;
pub mod cancellation;
pub mod customer;
pub mod statistics;

pub use edition::{Category, Comic, ComicEdition, EditionPatch, NewEdition, StockLevel};
pub use order::{DiscountCode, NewOrder, Order, OrderDetails, OrderFilter, OrderStatus, PlaceOrder, StockEffect, UnknownStatus};
pub use cart::{AddToCart, Cart, CartItem, CartLine, SetQuantity};
pub use cancellation::{CancellationDetails, CancellationFilter, CancellationRequest, CancellationUpdate, Decision, NewCancellation};
pub use customer::{ShippingAddress, User, UserSummary};
pub use statistics::{CatalogCounts, Overview, RevenueBucket, RevenuePeriod, RevenueSummary, Sale};
