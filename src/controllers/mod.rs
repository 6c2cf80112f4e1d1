pub mod admin_controller;
pub mod booking_controller;
pub mod home_controller;
pub mod show_controller;
pub mod stripe_controller;
pub mod user_controller;
