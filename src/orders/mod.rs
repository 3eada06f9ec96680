pub mod poller;
pub mod request;
pub mod response;
pub mod validate;

pub use poller::{COLLECT_INTERVAL, OrderPoller, OrderUpdates};
pub use request::{
    AuthRequest, CALL_INITIATOR_RP, CALL_INITIATOR_USER, CancelRequest, CollectRequest,
    DisplayText, OrderRequest, PhoneAuthRequest, PhoneSignRequest, Requirement, SignRequest,
};
pub use response::{
    CancelResponse, CollectResponse, CompletionData, Device, HintCode, OrderHandle,
    OrderResponse, Status, StepUp, User,
};
