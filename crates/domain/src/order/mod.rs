//! Order model and related value objects.

mod model;
mod state;
mod value_objects;

pub use model::{Order, OrderRecord};
pub use state::OrderStatus;
pub use value_objects::{CustomerId, Money, OrderLine, ProductId};
