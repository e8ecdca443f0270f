use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Showtimes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Showtimes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Showtimes::MovieTitle).string().not_null())
                    .col(ColumnDef::new(Showtimes::Auditorium).string().not_null())
                    .col(
                        ColumnDef::new(Showtimes::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Showtimes::SaleClosesAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Showtimes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Seats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Seats::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Seats::ShowtimeId).uuid().not_null())
                    .col(ColumnDef::new(Seats::Row).string().not_null())
                    .col(ColumnDef::new(Seats::Number).integer().not_null())
                    .col(ColumnDef::new(Seats::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(Seats::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seats_showtime")
                            .from(Seats::Table, Seats::ShowtimeId)
                            .to(Showtimes::Table, Showtimes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_seats_showtime_row_number")
                    .table(Seats::Table)
                    .col(Seats::ShowtimeId)
                    .col(Seats::Row)
                    .col(Seats::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Vouchers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vouchers::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Vouchers::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Vouchers::PercentOff).integer().not_null())
                    .col(ColumnDef::new(Vouchers::UsageLimit).integer().not_null())
                    .col(
                        ColumnDef::new(Vouchers::CommittedUses)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Vouchers::FirstPurchaseOnly)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Vouchers::ValidFrom)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Vouchers::ValidUntil)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Vouchers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BookingSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookingSessions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BookingSessions::UserId).uuid())
                    .col(ColumnDef::new(BookingSessions::ShowtimeId).uuid().not_null())
                    .col(ColumnDef::new(BookingSessions::VoucherId).uuid())
                    .col(ColumnDef::new(BookingSessions::VoucherReservationId).uuid())
                    .col(
                        ColumnDef::new(BookingSessions::State)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BookingSessions::PricingSnapshot)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BookingSessions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BookingSessions::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BookingSessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BookingSessions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_sessions_showtime")
                            .from(BookingSessions::Table, BookingSessions::ShowtimeId)
                            .to(Showtimes::Table, Showtimes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SessionItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SessionItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SessionItems::SessionId).uuid().not_null())
                    .col(ColumnDef::new(SessionItems::SeatId).uuid())
                    .col(ColumnDef::new(SessionItems::ConcessionCode).string())
                    .col(ColumnDef::new(SessionItems::Quantity).integer().not_null())
                    .col(ColumnDef::new(SessionItems::Position).integer().not_null())
                    .col(
                        ColumnDef::new(SessionItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_items_session")
                            .from(SessionItems::Table, SessionItems::SessionId)
                            .to(BookingSessions::Table, BookingSessions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SeatLocks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SeatLocks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SeatLocks::ShowtimeId).uuid().not_null())
                    .col(ColumnDef::new(SeatLocks::SeatId).uuid().not_null())
                    .col(ColumnDef::new(SeatLocks::SessionId).uuid().not_null())
                    .col(
                        ColumnDef::new(SeatLocks::LockedUntil)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SeatLocks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seat_locks_session")
                            .from(SeatLocks::Table, SeatLocks::SessionId)
                            .to(BookingSessions::Table, BookingSessions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // The mutual-exclusion invariant lives here.
        manager
            .create_index(
                Index::create()
                    .name("ux_seat_locks_showtime_seat")
                    .table(SeatLocks::Table)
                    .col(SeatLocks::ShowtimeId)
                    .col(SeatLocks::SeatId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VoucherReservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VoucherReservations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VoucherReservations::VoucherId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VoucherReservations::SessionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VoucherReservations::UserId).uuid())
                    .col(
                        ColumnDef::new(VoucherReservations::ReservedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VoucherReservations::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VoucherReservations::ReleasedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(VoucherReservations::CommittedAt).timestamp_with_time_zone(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_voucher_reservations_voucher")
                            .from(VoucherReservations::Table, VoucherReservations::VoucherId)
                            .to(Vouchers::Table, Vouchers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_voucher_reservations_session")
                            .from(VoucherReservations::Table, VoucherReservations::SessionId)
                            .to(BookingSessions::Table, BookingSessions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookings::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Bookings::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Bookings::ShowtimeId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::CustomerId).uuid())
                    .col(ColumnDef::new(Bookings::VoucherId).uuid())
                    .col(ColumnDef::new(Bookings::TotalAmount).big_integer().not_null())
                    .col(ColumnDef::new(Bookings::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Bookings::PaymentProvider).string().not_null())
                    .col(ColumnDef::new(Bookings::PaymentTransactionId).string())
                    .col(ColumnDef::new(Bookings::PaymentStatus).string().not_null())
                    .col(ColumnDef::new(Bookings::SessionId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::PricingSnapshot).json().not_null())
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_showtime")
                            .from(Bookings::Table, Bookings::ShowtimeId)
                            .to(Showtimes::Table, Showtimes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tickets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tickets::ShowtimeId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::SeatId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::BookingId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::Price).big_integer().not_null())
                    .col(ColumnDef::new(Tickets::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Tickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_booking")
                            .from(Tickets::Table, Tickets::BookingId)
                            .to(Bookings::Table, Bookings::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_seat")
                            .from(Tickets::Table, Tickets::SeatId)
                            .to(Seats::Table, Seats::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // A seat is ticketed at most once per showtime, ever.
        manager
            .create_index(
                Index::create()
                    .name("ux_tickets_showtime_seat")
                    .table(Tickets::Table)
                    .col(Tickets::ShowtimeId)
                    .col(Tickets::SeatId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentOrders::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentOrders::SessionId).uuid().not_null())
                    .col(ColumnDef::new(PaymentOrders::UserId).uuid())
                    .col(ColumnDef::new(PaymentOrders::ShowtimeId).uuid().not_null())
                    .col(ColumnDef::new(PaymentOrders::Amount).big_integer().not_null())
                    .col(ColumnDef::new(PaymentOrders::Currency).string().not_null())
                    .col(ColumnDef::new(PaymentOrders::Provider).string().not_null())
                    .col(
                        ColumnDef::new(PaymentOrders::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentOrders::OrderCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PaymentOrders::PaymentLink).string().not_null())
                    .col(ColumnDef::new(PaymentOrders::QrPayload).string().not_null())
                    .col(
                        ColumnDef::new(PaymentOrders::LinkExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentOrders::BookingId).uuid())
                    .col(
                        ColumnDef::new(PaymentOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentOrders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_orders_session")
                            .from(PaymentOrders::Table, PaymentOrders::SessionId)
                            .to(BookingSessions::Table, BookingSessions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLogs::UserId).uuid())
                    .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                    .col(ColumnDef::new(AuditLogs::Resource).string())
                    .col(ColumnDef::new(AuditLogs::Metadata).json())
                    .col(
                        ColumnDef::new(AuditLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tickets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VoucherReservations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SeatLocks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SessionItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BookingSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vouchers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Seats::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Showtimes::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Showtimes {
    Table,
    Id,
    MovieTitle,
    Auditorium,
    StartsAt,
    SaleClosesAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Seats {
    Table,
    Id,
    ShowtimeId,
    Row,
    Number,
    Price,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Vouchers {
    Table,
    Id,
    Code,
    PercentOff,
    UsageLimit,
    CommittedUses,
    FirstPurchaseOnly,
    ValidFrom,
    ValidUntil,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BookingSessions {
    Table,
    Id,
    UserId,
    ShowtimeId,
    VoucherId,
    VoucherReservationId,
    State,
    PricingSnapshot,
    ExpiresAt,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SessionItems {
    Table,
    Id,
    SessionId,
    SeatId,
    ConcessionCode,
    Quantity,
    Position,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SeatLocks {
    Table,
    Id,
    ShowtimeId,
    SeatId,
    SessionId,
    LockedUntil,
    CreatedAt,
}

#[derive(DeriveIden)]
enum VoucherReservations {
    Table,
    Id,
    VoucherId,
    SessionId,
    UserId,
    ReservedAt,
    ExpiresAt,
    ReleasedAt,
    CommittedAt,
}

#[derive(DeriveIden)]
enum Bookings {
    Table,
    Id,
    Code,
    ShowtimeId,
    CustomerId,
    VoucherId,
    TotalAmount,
    Status,
    PaymentProvider,
    PaymentTransactionId,
    PaymentStatus,
    SessionId,
    PricingSnapshot,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    ShowtimeId,
    SeatId,
    BookingId,
    Price,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PaymentOrders {
    Table,
    Id,
    SessionId,
    UserId,
    ShowtimeId,
    Amount,
    Currency,
    Provider,
    Status,
    OrderCode,
    PaymentLink,
    QrPayload,
    LinkExpiresAt,
    BookingId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    UserId,
    Action,
    Resource,
    Metadata,
    CreatedAt,
}
