//! Business services: the order workflow and outbound notifications.

pub mod notify;
pub mod whatsapp;
pub mod workflow;

pub use notify::{ItemLine, NotificationChannel, OrderConfirmation, SendOutcome, StatusUpdate};
pub use whatsapp::WhatsAppClient;
pub use workflow::{CreatedOrder, OrderWorkflow, WorkflowError};
