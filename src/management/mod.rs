mod auth;
mod login;

pub use auth::TokenStore;
pub use login::AuthFlow;
