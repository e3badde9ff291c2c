pub mod gate;
pub mod request_id;

pub use gate::GateMiddleware;
pub use request_id::{get_request_id, RequestIdMiddleware};
