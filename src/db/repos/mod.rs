pub mod client_state;
pub mod visits;
