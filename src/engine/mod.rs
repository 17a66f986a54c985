pub mod assets;
pub mod chat;
pub mod daynight;
pub mod intent;
pub mod period;
pub mod responses;
pub mod timer;
