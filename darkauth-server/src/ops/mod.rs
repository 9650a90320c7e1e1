pub mod admin;
pub mod authorize;
pub mod crypto;
pub mod logout;
pub mod opaque;
pub mod otp;
pub mod token;
