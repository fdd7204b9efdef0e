pub mod form_surface;
pub mod submission_ctx;
pub mod submission_flow;

pub use form_surface::{
    CdpFormSurface, ControlHandle, Criteria, DateInputs, FormSurface,
};
pub use submission_ctx::SubmissionCtx;
pub use submission_flow::{FlowTiming, SubmissionFlow};
