pub mod booking_service;
pub mod finalizer_service;
pub mod payment_service;
pub mod reaper;
pub mod seat_lock_service;
pub mod session_service;
pub mod voucher_service;
