pub mod record;
pub mod status;
pub mod user_state;

pub use record::{AttendanceRecord, Coordinates, Sender};
pub use status::AttendanceStatus;
pub use user_state::{decide, ChatEvent, ChatState, Decision};
