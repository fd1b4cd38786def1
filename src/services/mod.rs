pub mod dispatch;
pub mod messaging;
