pub mod booking_service;
pub mod payment_service;
pub mod report_service;
pub mod show_service;
pub mod user_service;
