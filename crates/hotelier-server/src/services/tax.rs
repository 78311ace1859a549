use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{TaxRate, TaxRateInput};

pub fn list_rates(pool: &DbPool) -> AppResult<Vec<TaxRate>> {
    let conn = pool.get()?;
    let mut stmt =
        conn.prepare("SELECT id, country, province, rate FROM taxes ORDER BY country, province")?;
    let rows = stmt.query_map([], |row| {
        Ok(TaxRate {
            id: row.get(0)?,
            country: row.get(1)?,
            province: row.get(2)?,
            tax_rate: row.get(3)?,
        })
    })?;
    let rates: Result<Vec<_>, _> = rows.collect();
    Ok(rates?)
}

/// Inserts or replaces the rate for a country/province pair.
pub fn upsert_rate(pool: &DbPool, input: TaxRateInput) -> AppResult<TaxRate> {
    let country = input.country.trim().to_string();
    let province = input.province.trim().to_string();
    if country.is_empty() {
        return Err(AppError::BadRequest("Country is required".into()));
    }
    if !(0.0..=1.0).contains(&input.tax_rate) {
        return Err(AppError::BadRequest(
            "Tax rate must be a fraction between 0 and 1".into(),
        ));
    }

    let conn = pool.get()?;
    let id: String = conn.query_row(
        "INSERT INTO taxes (id, country, province, rate) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (country, province) DO UPDATE SET rate = excluded.rate
         RETURNING id",
        rusqlite::params![Uuid::new_v4().to_string(), country, province, input.tax_rate],
        |row| row.get(0),
    )?;

    tracing::info!(%country, %province, rate = input.tax_rate, "Tax rate set");
    Ok(TaxRate {
        id,
        country,
        province,
        tax_rate: input.tax_rate,
    })
}

pub fn delete_rate(pool: &DbPool, id: &str) -> AppResult<()> {
    let conn = pool.get()?;
    let affected = conn.execute("DELETE FROM taxes WHERE id = ?1", rusqlite::params![id])?;
    if affected == 0 {
        return Err(AppError::NotFound("Tax rate not found".into()));
    }
    Ok(())
}

/// The province rate if one exists, else the country-wide rate, else zero.
pub(crate) fn rate_for(conn: &Connection, country: &str, province: &str) -> rusqlite::Result<f64> {
    let rate: Option<f64> = conn
        .query_row(
            "SELECT rate FROM taxes
             WHERE country = ?1 AND (province = ?2 OR province = '')
             ORDER BY province = '' ASC
             LIMIT 1",
            rusqlite::params![country, province],
            |row| row.get(0),
        )
        .optional()?;
    Ok(rate.unwrap_or(0.0))
}
