use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use axum_cinema_booking::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{seats, showtimes, vouchers},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let showtime_id = seed_showtime(&orm).await?;
    seed_vouchers(&orm).await?;

    println!("Seed completed. Showtime ID: {showtime_id}");
    Ok(())
}

async fn seed_showtime(orm: &DatabaseConnection) -> anyhow::Result<Uuid> {
    let now = Utc::now();

    if let Some(existing) = showtimes::Entity::find().one(orm).await? {
        println!("Showtime already seeded");
        return Ok(existing.id);
    }

    let showtime = showtimes::ActiveModel {
        id: Set(Uuid::new_v4()),
        movie_title: Set("Dune: Part Three".into()),
        auditorium: Set("A1".into()),
        starts_at: Set((now + Duration::hours(6)).into()),
        sale_closes_at: Set((now + Duration::hours(5) + Duration::minutes(30)).into()),
        created_at: Set(now.into()),
    }
    .insert(orm)
    .await?;

    for row in ["A", "B", "C", "D", "E"] {
        // Front row sells at a premium.
        let price = if row == "A" { 120_000 } else { 80_000 };
        for number in 1..=8 {
            seats::ActiveModel {
                id: Set(Uuid::new_v4()),
                showtime_id: Set(showtime.id),
                row: Set(row.into()),
                number: Set(number),
                price: Set(price),
                created_at: Set(now.into()),
            }
            .insert(orm)
            .await?;
        }
    }

    println!("Seeded showtime {} with 40 seats", showtime.id);
    Ok(showtime.id)
}

async fn seed_vouchers(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let now = Utc::now();
    let catalog = [
        ("SUMMER10", 10, 100, false),
        ("WELCOME15", 15, 1000, true),
    ];

    for (code, percent_off, usage_limit, first_purchase_only) in catalog {
        let exists = vouchers::Entity::find()
            .filter(vouchers::Column::Code.eq(code))
            .count(orm)
            .await?
            > 0;
        if exists {
            continue;
        }

        vouchers::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.into()),
            percent_off: Set(percent_off),
            usage_limit: Set(usage_limit),
            committed_uses: Set(0),
            first_purchase_only: Set(first_purchase_only),
            valid_from: Set((now - Duration::days(1)).into()),
            valid_until: Set((now + Duration::days(90)).into()),
            created_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
        println!("Seeded voucher {code} ({percent_off}% off)");
    }

    Ok(())
}
