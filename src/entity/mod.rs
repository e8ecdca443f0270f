pub mod audit_logs;
pub mod booking_sessions;
pub mod bookings;
pub mod payment_orders;
pub mod seat_locks;
pub mod seats;
pub mod session_items;
pub mod showtimes;
pub mod tickets;
pub mod voucher_reservations;
pub mod vouchers;

pub use audit_logs::Entity as AuditLogs;
pub use booking_sessions::Entity as BookingSessions;
pub use bookings::Entity as Bookings;
pub use payment_orders::Entity as PaymentOrders;
pub use seat_locks::Entity as SeatLocks;
pub use seats::Entity as Seats;
pub use session_items::Entity as SessionItems;
pub use showtimes::Entity as Showtimes;
pub use tickets::Entity as Tickets;
pub use voucher_reservations::Entity as VoucherReservations;
pub use vouchers::Entity as Vouchers;
