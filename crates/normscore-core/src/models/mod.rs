pub mod demographics;
pub mod question;
pub mod response;
pub mod scale;
