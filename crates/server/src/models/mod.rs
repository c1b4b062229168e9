//! Domain models persisted by the store.

pub mod address;
pub mod notification;
pub mod order;
pub mod product;
pub mod user;

pub use address::Address;
pub use notification::NotificationLog;
pub use order::{Order, OrderItem, OrderItemView, OrderView};
pub use product::Product;
pub use user::User;
