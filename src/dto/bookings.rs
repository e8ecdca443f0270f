use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Booking, Ticket};

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDetail {
    pub booking: Booking,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<Booking>,
}
