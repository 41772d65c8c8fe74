pub mod audit_logs;
pub mod cart_items;
pub mod items;
pub mod order_lines;
pub mod orders;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use items::Entity as Items;
pub use order_lines::Entity as OrderLines;
pub use orders::Entity as Orders;
pub use users::Entity as Users;
