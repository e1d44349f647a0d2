pub mod phase;
pub mod session;

pub use phase::{Action, Phase};
pub use session::{
    AnalyzeTicket, AttemptToken, Completion, Session, SessionState, SessionView, SubmitTicket,
};
