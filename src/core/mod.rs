pub mod access;
pub mod backend;
pub mod itinerary;
pub mod seating;
pub mod wallet;
pub mod wizard;

pub use crate::domain::model::{
    Activity, Balance, Conversion, Currency, DayGroup, Faq, Location, Package, Role,
    ServiceDraft, ServicePayload, Session, Transfer, WalletBalance, WalletResponse,
};
pub use crate::domain::ports::{ConfigProvider, SessionResolver};
pub use crate::utils::error::Result;
