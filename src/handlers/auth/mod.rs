mod login;
mod password;
mod register;
mod session;

pub use login::login;
pub use password::{forgot_password, reset_password};
pub use register::register;
pub use session::logout;
