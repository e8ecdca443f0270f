use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        bookings::{BookingDetail, BookingList},
        payments::CallbackAck,
        sessions::{ApplyVoucherRequest, CreateSessionRequest, SessionDetail, SetItemsRequest},
    },
    models::{
        Booking, BookingSession, BookingStatus, ConcessionSelection, OrderStatus, PaymentOrder,
        PricingSnapshot, Seat, SessionItem, SessionState, Showtime, Ticket, TicketStatus,
    },
    provider::{CallbackStatus, ProviderCallback},
    response::{ApiResponse, Meta},
    routes::{bookings, health, params, payments, sessions},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        sessions::create_session,
        sessions::get_session,
        sessions::set_items,
        sessions::apply_voucher,
        sessions::begin_checkout,
        sessions::cancel_session,
        payments::provider_webhook,
        bookings::list_bookings,
        bookings::get_booking
    ),
    components(
        schemas(
            Showtime,
            Seat,
            BookingSession,
            SessionItem,
            SessionState,
            PricingSnapshot,
            ConcessionSelection,
            PaymentOrder,
            OrderStatus,
            Booking,
            BookingStatus,
            Ticket,
            TicketStatus,
            ProviderCallback,
            CallbackStatus,
            CallbackAck,
            CreateSessionRequest,
            SetItemsRequest,
            ApplyVoucherRequest,
            SessionDetail,
            BookingDetail,
            BookingList,
            params::Pagination,
            Meta,
            ApiResponse<SessionDetail>,
            ApiResponse<BookingDetail>,
            ApiResponse<BookingList>,
            ApiResponse<CallbackAck>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Sessions", description = "Booking session lifecycle"),
        (name = "Payments", description = "Payment provider callbacks"),
        (name = "Bookings", description = "Finalized bookings and tickets"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
