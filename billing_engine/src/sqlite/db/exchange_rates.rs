use chrono::{DateTime, Utc};
use log::trace;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;

/// Rates are stored as decimal text so that no precision is lost to floating point.
pub async fn set_rate(
    base: &str,
    quote: &str,
    rate: Decimal,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO exchange_rates (base_currency, quote_currency, rate, updated_at) VALUES ($1, $2, $3, $4)
            ON CONFLICT (base_currency, quote_currency) DO UPDATE SET rate = excluded.rate, updated_at = excluded.updated_at;
        "#,
    )
    .bind(base.to_ascii_uppercase())
    .bind(quote.to_ascii_uppercase())
    .bind(rate.to_string())
    .bind(now)
    .execute(conn)
    .await?;
    trace!("🗃️ Exchange rate {base}/{quote} set to {rate}");
    Ok(())
}

/// The rate converting one unit of `base` into `quote`. If only the inverse pair is stored, its reciprocal is used.
pub async fn fetch_rate(base: &str, quote: &str, conn: &mut SqliteConnection) -> Result<Option<Decimal>, sqlx::Error> {
    let direct = fetch_stored_rate(base, quote, conn).await?;
    if direct.is_some() {
        return Ok(direct);
    }
    let inverse = fetch_stored_rate(quote, base, conn).await?;
    Ok(inverse.filter(|r| !r.is_zero()).and_then(|r| Decimal::ONE.checked_div(r)))
}

async fn fetch_stored_rate(base: &str, quote: &str, conn: &mut SqliteConnection) -> Result<Option<Decimal>, sqlx::Error> {
    let rate: Option<String> =
        sqlx::query_scalar("SELECT rate FROM exchange_rates WHERE base_currency = $1 AND quote_currency = $2")
            .bind(base.to_ascii_uppercase())
            .bind(quote.to_ascii_uppercase())
            .fetch_optional(conn)
            .await?;
    match rate {
        None => Ok(None),
        Some(s) => s.parse::<Decimal>().map(Some).map_err(|e| sqlx::Error::Decode(Box::new(e))),
    }
}
