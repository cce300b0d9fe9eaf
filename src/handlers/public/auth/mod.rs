// handlers/public/auth/mod.rs - Public authentication handlers
//
// Account lifecycle entry points: a registered account stays `pending` until
// its emailed token is exchanged at verify-email, and only `active` accounts
// receive a JWT from login.

pub mod login;
pub mod register;
pub mod verify_email;

pub use login::login_post;
pub use register::register_post;
pub use verify_email::verify_email_get;
