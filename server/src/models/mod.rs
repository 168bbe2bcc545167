pub mod booking;
pub mod booking_chart;
pub mod buyer;
pub mod event;
pub mod ticket;
pub mod vendor;

pub use booking::{Booking, BookingStatus};
pub use booking_chart::BookingChartEntry;
pub use buyer::Buyer;
pub use event::Event;
pub use ticket::BookedTicket;
pub use vendor::Vendor;
