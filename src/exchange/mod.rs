pub mod exchange_error;
pub mod message_exchanger;
pub mod wait;
