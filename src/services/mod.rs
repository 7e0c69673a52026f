pub mod classifier;
pub mod dispatcher;
pub mod sheets;

pub use classifier::classify;
pub use dispatcher::{dispatch, ORDERS_MASTER, PAYMENTS_STATUS};
pub use sheets::{RecordSink, SheetsSink};
